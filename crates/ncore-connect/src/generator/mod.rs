//! Connection generator framework
//!
//! A connection generator turns a small parameter record into the synapses
//! between a range of pre-neurons and a range of post-neurons. Every pattern
//! follows the same lifecycle:
//!
//! 1. [`ConnectorHandle::initialise`] copies the pattern's record out of the
//!    configuration stream into heap-owned storage.
//! 2. [`ConnectionGenerator::generate`] is called zero or more times, once
//!    per requested sub-range, writing through a [`MatrixWriter`].
//! 3. [`ConnectorHandle::free`] returns the storage to the heap.

use ncore_fixed::{rescale_delay, Accum, LongAccum};

use crate::cursor::ConfigCursor;
use crate::error::{ConnectError, Result};
use crate::heap::{GeneratorHeap, HeapBox};
use crate::matrix::MatrixWriter;
use crate::param::ParamGenerator;

pub mod wta;

pub use wta::{WtaConnector, WtaParams};

/// What to generate in one call
///
/// Pre and post ranges are inclusive and refer to indices within the whole
/// pre and post populations. Only the part of the post range that falls in
/// the locally stored post slice is generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateRequest {
    /// First pre-neuron of the pre-population
    pub pre_lo: u32,
    /// Last pre-neuron of the pre-population
    pub pre_hi: u32,
    /// First post-neuron to generate
    pub post_lo: u32,
    /// Last post-neuron to generate
    pub post_hi: u32,
    /// First post-neuron stored on this core
    pub post_slice_start: u32,
    /// Number of post-neurons stored on this core
    pub post_slice_count: u32,
    /// Multiplier converting weights to their stored integer form
    pub weight_scale: LongAccum,
    /// Timesteps per unit of drawn delay
    pub timestep_per_delay: Accum,
}

impl GenerateRequest {
    /// Inclusive bounds of the post range clipped to the local slice, or
    /// `None` when they do not overlap
    ///
    /// A slice that runs past `u32::MAX` is rejected with `OutOfRange`.
    pub fn local_post_range(&self) -> Result<Option<(u32, u32)>> {
        if self.post_slice_count == 0 {
            return Ok(None);
        }
        let slice_end = self
            .post_slice_start
            .checked_add(self.post_slice_count - 1)
            .ok_or(ConnectError::OutOfRange {
                index: self.post_slice_start,
                max: u32::MAX - (self.post_slice_count - 1),
            })?;
        let start = self.post_slice_start.max(self.post_lo);
        let end = slice_end.min(self.post_hi);
        Ok((start <= end).then_some((start, end)))
    }
}

/// A connectivity pattern
pub trait ConnectionGenerator {
    /// Write the synapses described by `request` into `matrix`
    ///
    /// Stops at the first rejected write and returns its error; synapses
    /// already written stay in the matrix.
    fn generate(
        &self,
        request: &GenerateRequest,
        weights: &mut dyn ParamGenerator,
        delays: &mut dyn ParamGenerator,
        matrix: &mut dyn MatrixWriter,
    ) -> Result<()>;
}

/// Draw a weight and delay and write one synapse
///
/// `post` is the index relative to the local post slice.
pub fn emit_synapse(
    request: &GenerateRequest,
    weights: &mut dyn ParamGenerator,
    delays: &mut dyn ParamGenerator,
    matrix: &mut dyn MatrixWriter,
    pre: u32,
    post: u32,
) -> Result<()> {
    let weight = weights.generate();
    let delay = rescale_delay(delays.generate(), request.timestep_per_delay);
    matrix
        .write_synapse(pre, post, weight, delay, request.weight_scale)
        .map_err(|err| {
            log::error!("Matrix not sized correctly! ({})", err);
            err
        })
}

/// Connector variants, by configuration id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ConnectorKind {
    /// Winner-take-all groups without self-connection
    Wta = 0,
}

impl ConnectorKind {
    /// Look up a variant by its configuration id
    pub fn from_id(id: u32) -> Result<Self> {
        match id {
            0 => Ok(Self::Wta),
            _ => Err(ConnectError::UnknownGenerator { family: "connector", id }),
        }
    }

    /// Configuration id of the variant
    pub const fn id(self) -> u32 {
        self as u32
    }
}

#[derive(Debug)]
enum Connector {
    Wta(WtaConnector),
}

/// Heap-owned connection generator selected by configuration id
///
/// Release with [`ConnectorHandle::free`] before initialising the next
/// pattern instance; dropping the handle releases it as well.
#[derive(Debug)]
pub struct ConnectorHandle<'h> {
    connector: HeapBox<'h, Connector>,
}

impl<'h> ConnectorHandle<'h> {
    /// Read the parameters of connector `id` at `cursor` and take ownership
    /// of them
    pub fn initialise(id: u32, cursor: &mut ConfigCursor<'_>, heap: &'h GeneratorHeap) -> Result<Self> {
        let connector = match ConnectorKind::from_id(id)? {
            ConnectorKind::Wta => Connector::Wta(WtaConnector::new(cursor.read_record()?)?),
        };
        Ok(Self { connector: heap.alloc(connector)? })
    }

    /// Variant of this connector
    pub fn kind(&self) -> ConnectorKind {
        match &*self.connector {
            Connector::Wta(_) => ConnectorKind::Wta,
        }
    }

    /// Release the connector's heap storage
    pub fn free(self) {
        self.connector.free();
    }
}

impl ConnectionGenerator for ConnectorHandle<'_> {
    fn generate(
        &self,
        request: &GenerateRequest,
        weights: &mut dyn ParamGenerator,
        delays: &mut dyn ParamGenerator,
        matrix: &mut dyn MatrixWriter,
    ) -> Result<()> {
        match &*self.connector {
            Connector::Wta(wta) => wta.generate(request, weights, delays, matrix),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::RecordWriter;

    fn request(post_lo: u32, post_hi: u32, start: u32, count: u32) -> GenerateRequest {
        GenerateRequest {
            pre_lo: 0,
            pre_hi: 9,
            post_lo,
            post_hi,
            post_slice_start: start,
            post_slice_count: count,
            weight_scale: LongAccum::from_num(1),
            timestep_per_delay: Accum::from_num(1),
        }
    }

    #[test]
    fn test_local_post_range() {
        assert_eq!(request(0, 9, 0, 10).local_post_range().unwrap(), Some((0, 9)));
        assert_eq!(request(2, 20, 5, 3).local_post_range().unwrap(), Some((5, 7)));
        assert_eq!(request(0, 3, 5, 3).local_post_range().unwrap(), None);
        assert_eq!(request(0, 9, 0, 0).local_post_range().unwrap(), None);
    }

    #[test]
    fn test_slice_past_u32_max_is_out_of_range() {
        let err = request(0, u32::MAX, u32::MAX - 1, 4).local_post_range().unwrap_err();
        assert_eq!(err, ConnectError::OutOfRange { index: u32::MAX - 1, max: u32::MAX - 3 });
        assert_eq!(
            request(0, u32::MAX, u32::MAX - 3, 4).local_post_range().unwrap(),
            Some((u32::MAX - 3, u32::MAX))
        );
    }

    #[test]
    fn test_handle_lifecycle() {
        let mut writer = RecordWriter::new();
        writer.push(&WtaParams { n_values: 3 }).push_u32(0xFFFF);
        let bytes = writer.into_bytes();

        let heap = GeneratorHeap::new(64);
        let mut cursor = ConfigCursor::new(&bytes);
        let handle = ConnectorHandle::initialise(ConnectorKind::Wta.id(), &mut cursor, &heap).unwrap();
        assert_eq!(handle.kind(), ConnectorKind::Wta);
        // cursor sits just past the record
        assert_eq!(cursor.read_u32().unwrap(), 0xFFFF);
        assert_eq!(heap.live_allocations(), 1);

        handle.free();
        assert_eq!(heap.live_allocations(), 0);
    }

    #[test]
    fn test_initialise_fails_when_heap_full() {
        let mut writer = RecordWriter::new();
        writer.push(&WtaParams { n_values: 3 });
        let bytes = writer.into_bytes();

        let heap = GeneratorHeap::new(0);
        let mut cursor = ConfigCursor::new(&bytes);
        let err = ConnectorHandle::initialise(0, &mut cursor, &heap).unwrap_err();
        assert!(matches!(err, ConnectError::OutOfMemory { .. }));
    }

    #[test]
    fn test_unknown_connector() {
        let heap = GeneratorHeap::new(64);
        let mut cursor = ConfigCursor::new(&[]);
        assert_eq!(
            ConnectorHandle::initialise(7, &mut cursor, &heap).unwrap_err(),
            ConnectError::UnknownGenerator { family: "connector", id: 7 }
        );
    }
}
