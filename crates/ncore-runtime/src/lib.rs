//! Per-core runtime for the ncore neuromorphic simulator
//!
//! This crate provides the hard-real-time side of a core: the ring-buffer
//! synaptic accumulator that turns delayed spike arrivals into decayed
//! per-neuron input, and the timestep scheduler that drives it with bounded
//! background admission and a pause/resume protocol.
//!
//! ```
//! use ncore_connect::{SynapseLayout, SynapticMatrix};
//! use ncore_runtime::{
//!     Accumulator, AccumulatorConfig, InputProbe, Scheduler, SchedulerConfig, StaticSynapses,
//! };
//!
//! let layout = SynapseLayout::for_population(4, 1, 4).unwrap();
//! let accumulator = Accumulator::new(&AccumulatorConfig::new(4, 1, layout)).unwrap();
//! let matrix = SynapticMatrix::new(layout, 4, 4);
//! let mut scheduler = Scheduler::new(
//!     SchedulerConfig::new(10),
//!     accumulator,
//!     matrix,
//!     InputProbe::new(),
//!     StaticSynapses::new(),
//! )
//! .unwrap();
//!
//! scheduler.start().unwrap();
//! assert_eq!(scheduler.run_to_pause(|_| Vec::new()).unwrap(), 10);
//! assert_eq!(scheduler.neuron().updated_ticks().len(), 10);
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod accumulator;
pub mod channels;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod priority;
pub mod provenance;
pub mod recording;
pub mod ring_buffer;
pub mod scheduler;
pub mod spike_buffer;

// Re-export essential types
pub use accumulator::Accumulator;
pub use channels::{ChannelState, SynapseChannels};
pub use collaborators::{InputProbe, NeuronModel, ProbeSample, StaticSynapses, SynapseSubsystem};
pub use config::{AccumulatorConfig, SchedulerConfig};
pub use error::{Result, RuntimeError};
pub use priority::{ChannelLock, CriticalSection, Priority};
pub use provenance::{
    NeuronProvenance, ProvenanceRecord, ProvenanceSink, SpikeProvenance, SynapseProvenance,
};
pub use recording::{InputRecorder, InputSample};
pub use ring_buffer::RingBuffer;
pub use scheduler::{AdmissionCounter, RunState, Scheduler, SimulationClock, TickOutcome};
pub use spike_buffer::SpikeInputBuffer;

/// Runtime crate version for compatibility checking
pub const RUNTIME_VERSION: u32 = 1;
