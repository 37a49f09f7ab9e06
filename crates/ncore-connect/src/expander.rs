//! Connection expander
//!
//! The connection stream starts with a block count, followed by one entry per
//! block:
//!
//! ```text
//! ConnectionBlock header | connector params | weight params | delay params
//! ```
//!
//! Each block is expanded with the full initialise, generate, free lifecycle
//! of its three generators before the next block is read, so at most one
//! block's generator state is charged against the heap at a time.

use ncore_fixed::{Accum, LongAccum};

use crate::cursor::{word, ConfigCursor, FixedRecord, RecordWriter};
use crate::error::Result;
use crate::generator::{ConnectionGenerator, ConnectorHandle, ConnectorKind, GenerateRequest, WtaParams};
use crate::heap::GeneratorHeap;
use crate::matrix::SynapticMatrix;
use crate::param::{ConstantParams, ParamHandle, ParamKind, UniformParams};

/// Population ranges and conversion factors of one connection block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockGeometry {
    /// First pre-neuron
    pub pre_lo: u32,
    /// Last pre-neuron (inclusive)
    pub pre_hi: u32,
    /// First post-neuron
    pub post_lo: u32,
    /// Last post-neuron (inclusive)
    pub post_hi: u32,
    /// First post-neuron stored on this core
    pub post_slice_start: u32,
    /// Number of post-neurons stored on this core
    pub post_slice_count: u32,
    /// Synapse type the block's synapses target
    pub synapse_type: u32,
    /// Weight storage scale
    pub weight_scale: LongAccum,
    /// Timesteps per unit of drawn delay
    pub timestep_per_delay: Accum,
}

impl BlockGeometry {
    /// All of an `n_pre` population onto all of an `n_post` population held
    /// entirely on this core, type 0, one timestep per delay unit
    pub fn full(n_pre: u32, n_post: u32, weight_scale: LongAccum) -> Self {
        Self {
            pre_lo: 0,
            pre_hi: n_pre.saturating_sub(1),
            post_lo: 0,
            post_hi: n_post.saturating_sub(1),
            post_slice_start: 0,
            post_slice_count: n_post,
            synapse_type: 0,
            weight_scale,
            timestep_per_delay: Accum::from_num(1),
        }
    }

    /// Set the synapse type
    pub fn with_synapse_type(mut self, synapse_type: u32) -> Self {
        self.synapse_type = synapse_type;
        self
    }

    /// Restrict generation to the post-neurons `post_lo..=post_hi`
    pub fn with_post_range(mut self, post_lo: u32, post_hi: u32) -> Self {
        self.post_lo = post_lo;
        self.post_hi = post_hi;
        self
    }

    /// Set the locally stored post slice
    pub fn with_post_slice(mut self, start: u32, count: u32) -> Self {
        self.post_slice_start = start;
        self.post_slice_count = count;
        self
    }

    /// Set the delay conversion factor
    pub fn with_timestep_per_delay(mut self, timestep_per_delay: Accum) -> Self {
        self.timestep_per_delay = timestep_per_delay;
        self
    }

    /// Generation request covering the whole block
    pub fn request(&self) -> GenerateRequest {
        GenerateRequest {
            pre_lo: self.pre_lo,
            pre_hi: self.pre_hi,
            post_lo: self.post_lo,
            post_hi: self.post_hi,
            post_slice_start: self.post_slice_start,
            post_slice_count: self.post_slice_count,
            weight_scale: self.weight_scale,
            timestep_per_delay: self.timestep_per_delay,
        }
    }
}

/// Header record of one connection block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionBlock {
    /// Ranges and conversion factors
    pub geometry: BlockGeometry,
    /// Connector id, see [`ConnectorKind`]
    pub connector_id: u32,
    /// Weight generator id, see [`ParamKind`]
    pub weight_id: u32,
    /// Delay generator id, see [`ParamKind`]
    pub delay_id: u32,
}

impl FixedRecord for ConnectionBlock {
    const SIZE: usize = 13 * 4;

    fn decode(bytes: &[u8]) -> Self {
        let scale = word(bytes, 7) as u64 | (word(bytes, 8) as u64) << 32;
        Self {
            geometry: BlockGeometry {
                pre_lo: word(bytes, 0),
                pre_hi: word(bytes, 1),
                post_lo: word(bytes, 2),
                post_hi: word(bytes, 3),
                post_slice_start: word(bytes, 4),
                post_slice_count: word(bytes, 5),
                synapse_type: word(bytes, 6),
                weight_scale: LongAccum::from_bits(scale),
                timestep_per_delay: Accum::from_bits(word(bytes, 9) as i32),
            },
            connector_id: word(bytes, 10),
            weight_id: word(bytes, 11),
            delay_id: word(bytes, 12),
        }
    }

    fn encode(&self, out: &mut Vec<u8>) {
        let g = &self.geometry;
        let scale = g.weight_scale.to_bits();
        for value in [
            g.pre_lo,
            g.pre_hi,
            g.post_lo,
            g.post_hi,
            g.post_slice_start,
            g.post_slice_count,
            g.synapse_type,
            scale as u32,
            (scale >> 32) as u32,
            g.timestep_per_delay.to_bits() as u32,
            self.connector_id,
            self.weight_id,
            self.delay_id,
        ] {
            out.extend_from_slice(&value.to_le_bytes());
        }
    }
}

/// Connector of a projection, with its parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorSpec {
    /// Winner-take-all groups
    Wta(WtaParams),
}

impl ConnectorSpec {
    /// Connector variant
    pub fn kind(&self) -> ConnectorKind {
        match self {
            Self::Wta(_) => ConnectorKind::Wta,
        }
    }

    fn encode(&self, writer: &mut RecordWriter) {
        match self {
            Self::Wta(params) => writer.push(params),
        };
    }
}

/// Weight or delay generator of a projection, with its parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSpec {
    /// Fixed value
    Constant(Accum),
    /// Seeded uniform draw
    Uniform(UniformParams),
}

impl ParamSpec {
    /// Generator variant
    pub fn kind(&self) -> ParamKind {
        match self {
            Self::Constant(_) => ParamKind::Constant,
            Self::Uniform(_) => ParamKind::Uniform,
        }
    }

    fn encode(&self, writer: &mut RecordWriter) {
        match self {
            Self::Constant(value) => writer.push(&ConstantParams { value: *value }),
            Self::Uniform(params) => writer.push(params),
        };
    }
}

/// A projection to be encoded into the connection stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionSpec {
    /// Ranges and conversion factors
    pub geometry: BlockGeometry,
    /// Connectivity pattern
    pub connector: ConnectorSpec,
    /// Weight generator
    pub weight: ParamSpec,
    /// Delay generator
    pub delay: ParamSpec,
}

/// Encode projections into a connection stream
pub fn encode_projections(projections: &[ProjectionSpec]) -> Vec<u8> {
    let mut writer = RecordWriter::new();
    writer.push_u32(projections.len() as u32);
    for projection in projections {
        writer.push(&ConnectionBlock {
            geometry: projection.geometry,
            connector_id: projection.connector.kind().id(),
            weight_id: projection.weight.kind().id(),
            delay_id: projection.delay.kind().id(),
        });
        projection.connector.encode(&mut writer);
        projection.weight.encode(&mut writer);
        projection.delay.encode(&mut writer);
    }
    writer.into_bytes()
}

/// Outcome of a successful expansion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpandSummary {
    /// Connection blocks expanded
    pub blocks: u32,
    /// Synapses added to the matrix
    pub synapses_written: usize,
    /// High-water mark of the generator heap
    pub peak_heap_bytes: usize,
}

/// Expand every block of the connection stream at `cursor` into `matrix`
///
/// Stops at the first failure. Synapses of earlier blocks stay in the
/// matrix, but the error invalidates the whole network.
pub fn expand_connections(
    cursor: &mut ConfigCursor<'_>,
    heap: &GeneratorHeap,
    matrix: &mut SynapticMatrix,
) -> Result<ExpandSummary> {
    let n_blocks = cursor.read_u32()?;
    let synapses_before = matrix.n_synapses();
    log::debug!("Expanding {} connection blocks", n_blocks);

    for index in 0..n_blocks {
        let block: ConnectionBlock = cursor.read_record()?;
        let connector = ConnectorHandle::initialise(block.connector_id, cursor, heap)?;
        let mut weights = ParamHandle::initialise(block.weight_id, cursor, heap)?;
        let mut delays = ParamHandle::initialise(block.delay_id, cursor, heap)?;

        let request = block.geometry.request();
        let result = connector.generate(
            &request,
            &mut weights,
            &mut delays,
            &mut matrix.writer(block.geometry.synapse_type),
        );

        delays.free();
        weights.free();
        connector.free();

        if let Err(err) = result {
            log::error!("Connection block {} failed: {}", index, err);
            return Err(err);
        }
    }

    let summary = ExpandSummary {
        blocks: n_blocks,
        synapses_written: matrix.n_synapses() - synapses_before,
        peak_heap_bytes: heap.peak(),
    };
    log::info!(
        "Expanded {} blocks into {} synapses (peak heap {} bytes)",
        summary.blocks,
        summary.synapses_written,
        summary.peak_heap_bytes
    );
    Ok(summary)
}
