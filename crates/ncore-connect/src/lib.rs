//! Procedural connectivity generation for the ncore per-core runtime
//!
//! A core never receives a dense connection matrix. It receives a compact
//! stream of connection blocks, each naming a connectivity pattern and the
//! generators for its weights and delays, and expands them into synaptic
//! matrix rows at load time.
//!
//! ```
//! use ncore_connect::{
//!     encode_projections, expand_connections, BlockGeometry, ConfigCursor, ConnectorSpec,
//!     GeneratorHeap, ParamSpec, ProjectionSpec, SynapseLayout, SynapticMatrix, WtaParams,
//!     DEFAULT_HEAP_BYTES,
//! };
//! use ncore_fixed::{Accum, LongAccum};
//!
//! let layout = SynapseLayout::for_population(4, 1, 4).unwrap();
//! let projection = ProjectionSpec {
//!     geometry: BlockGeometry::full(4, 4, LongAccum::from_num(1)),
//!     connector: ConnectorSpec::Wta(WtaParams { n_values: 2 }),
//!     weight: ParamSpec::Constant(Accum::from_num(1)),
//!     delay: ParamSpec::Constant(Accum::from_num(1)),
//! };
//! let stream = encode_projections(&[projection]);
//!
//! let heap = GeneratorHeap::new(DEFAULT_HEAP_BYTES);
//! let mut matrix = SynapticMatrix::new(layout, 4, 4);
//! let summary = expand_connections(&mut ConfigCursor::new(&stream), &heap, &mut matrix).unwrap();
//! assert_eq!(summary.synapses_written, 4);
//! assert_eq!(heap.in_use(), 0);
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod cursor;
pub mod error;
pub mod expander;
pub mod generator;
pub mod heap;
pub mod layout;
pub mod matrix;
pub mod param;

// Re-export essential types
pub use cursor::{ConfigCursor, FixedRecord, RecordWriter};
pub use error::{ConnectError, Result};
pub use expander::{
    encode_projections, expand_connections, BlockGeometry, ConnectionBlock, ConnectorSpec,
    ExpandSummary, ParamSpec, ProjectionSpec,
};
pub use generator::{
    ConnectionGenerator, ConnectorHandle, ConnectorKind, GenerateRequest, WtaConnector, WtaParams,
};
pub use heap::{GeneratorHeap, HeapBox};
pub use layout::{DecodedSynapse, SynapseLayout, SynapseWord};
pub use matrix::{MatrixRowWriter, MatrixWriter, SynapticMatrix};
pub use param::{ConstantParams, ParamGenerator, ParamHandle, ParamKind, UniformParams};

/// Default generator heap size in bytes
pub const DEFAULT_HEAP_BYTES: usize = 4096;
