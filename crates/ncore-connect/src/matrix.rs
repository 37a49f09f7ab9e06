//! Synaptic matrix storage and the writer interface generators target

use ncore_fixed::{scale_weight, Accum, LongAccum};

use crate::error::{ConnectError, Result};
use crate::layout::{SynapseLayout, SynapseWord};

/// Destination for generated synapses
pub trait MatrixWriter {
    /// Store one synapse
    ///
    /// `post` is relative to the start of the locally stored post slice.
    /// Weight and delay are converted to the storage encoding here. An
    /// `Err` means the matrix region cannot take the synapse; callers must
    /// treat it as fatal for the whole generation pass.
    fn write_synapse(
        &mut self,
        pre: u32,
        post: u32,
        weight: Accum,
        delay: u16,
        weight_scale: LongAccum,
    ) -> Result<()>;
}

/// Row-per-pre-neuron synaptic matrix with fixed row capacity
///
/// Rows are allocated up front and never grow past `max_row_length`.
#[derive(Debug, Clone)]
pub struct SynapticMatrix {
    layout: SynapseLayout,
    max_row_length: usize,
    rows: Vec<Vec<SynapseWord>>,
    n_synapses: usize,
    n_delay_clamps: u32,
}

impl SynapticMatrix {
    /// Allocate `n_pre` empty rows of `max_row_length` synapses each
    pub fn new(layout: SynapseLayout, n_pre: u32, max_row_length: usize) -> Self {
        let rows = (0..n_pre)
            .map(|_| Vec::with_capacity(max_row_length))
            .collect();
        Self {
            layout,
            max_row_length,
            rows,
            n_synapses: 0,
            n_delay_clamps: 0,
        }
    }

    /// Word layout of stored synapses
    pub fn layout(&self) -> &SynapseLayout {
        &self.layout
    }

    /// Number of rows (pre-neurons)
    pub fn n_rows(&self) -> u32 {
        self.rows.len() as u32
    }

    /// Capacity of each row
    pub fn max_row_length(&self) -> usize {
        self.max_row_length
    }

    /// Synapses of pre-neuron `pre`; empty if out of range
    pub fn row(&self, pre: u32) -> &[SynapseWord] {
        self.rows.get(pre as usize).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total synapses stored
    pub fn n_synapses(&self) -> usize {
        self.n_synapses
    }

    /// Delays that had to be clamped into the storable range
    pub fn n_delay_clamps(&self) -> u32 {
        self.n_delay_clamps
    }

    /// Writer that stores synapses with the given synapse type
    pub fn writer(&mut self, synapse_type: u32) -> MatrixRowWriter<'_> {
        MatrixRowWriter { matrix: self, synapse_type }
    }

    fn push(&mut self, pre: u32, word: SynapseWord) -> Result<()> {
        let max_row_length = self.max_row_length;
        let n_rows = self.n_rows();
        let row = self
            .rows
            .get_mut(pre as usize)
            .ok_or(ConnectError::OutOfRange { index: pre, max: n_rows.saturating_sub(1) })?;
        if row.len() >= max_row_length {
            return Err(ConnectError::MatrixFull { pre, max_row_length });
        }
        row.push(word);
        self.n_synapses += 1;
        Ok(())
    }
}

/// [`MatrixWriter`] over a [`SynapticMatrix`] for one synapse type
#[derive(Debug)]
pub struct MatrixRowWriter<'m> {
    matrix: &'m mut SynapticMatrix,
    synapse_type: u32,
}

impl MatrixWriter for MatrixRowWriter<'_> {
    fn write_synapse(
        &mut self,
        pre: u32,
        post: u32,
        weight: Accum,
        delay: u16,
        weight_scale: LongAccum,
    ) -> Result<()> {
        let layout = self.matrix.layout;
        if post > layout.index_mask() {
            return Err(ConnectError::OutOfRange { index: post, max: layout.index_mask() });
        }
        if self.synapse_type > layout.type_mask() {
            return Err(ConnectError::OutOfRange {
                index: self.synapse_type,
                max: layout.type_mask(),
            });
        }

        let requested = delay as u32;
        let stored = requested.clamp(1, layout.max_delay());
        if stored != requested {
            self.matrix.n_delay_clamps += 1;
            log::debug!("Delay {} clamped to {} for {} -> {}", requested, stored, pre, post);
        }

        let word = layout.encode(scale_weight(weight, weight_scale), stored, self.synapse_type, post);
        self.matrix.push(pre, word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> SynapseLayout {
        SynapseLayout::new(4, 1, 3).unwrap()
    }

    #[test]
    fn test_write_encodes_word() {
        let mut matrix = SynapticMatrix::new(layout(), 4, 8);
        matrix
            .writer(1)
            .write_synapse(2, 9, Accum::from_num(0.5), 3, LongAccum::from_num(64))
            .unwrap();

        let row = matrix.row(2);
        assert_eq!(row.len(), 1);
        let synapse = matrix.layout().decode(row[0]);
        assert_eq!(synapse.weight, 32);
        assert_eq!(synapse.delay, 3);
        assert_eq!(synapse.synapse_type, 1);
        assert_eq!(synapse.index, 9);
        assert_eq!(matrix.n_synapses(), 1);
    }

    #[test]
    fn test_delay_clamped_into_window() {
        let mut matrix = SynapticMatrix::new(layout(), 1, 8);
        let scale = LongAccum::from_num(1);
        let mut writer = matrix.writer(0);
        writer.write_synapse(0, 0, Accum::from_num(1), 0, scale).unwrap();
        writer.write_synapse(0, 1, Accum::from_num(1), 40, scale).unwrap();

        let delays: Vec<u32> = matrix.row(0).iter().map(|w| matrix.layout().delay(*w)).collect();
        assert_eq!(delays, vec![1, 7]);
        assert_eq!(matrix.n_delay_clamps(), 2);
    }

    #[test]
    fn test_full_row_rejected() {
        let mut matrix = SynapticMatrix::new(layout(), 2, 2);
        let scale = LongAccum::from_num(1);
        let mut writer = matrix.writer(0);
        writer.write_synapse(1, 0, Accum::from_num(1), 1, scale).unwrap();
        writer.write_synapse(1, 1, Accum::from_num(1), 1, scale).unwrap();
        let err = writer.write_synapse(1, 2, Accum::from_num(1), 1, scale).unwrap_err();
        assert_eq!(err, ConnectError::MatrixFull { pre: 1, max_row_length: 2 });
        assert_eq!(matrix.row(1).len(), 2);
    }

    #[test]
    fn test_out_of_range_indices_rejected() {
        let mut matrix = SynapticMatrix::new(layout(), 2, 2);
        let scale = LongAccum::from_num(1);
        assert!(matrix.writer(0).write_synapse(5, 0, Accum::ZERO, 1, scale).is_err());
        assert!(matrix.writer(0).write_synapse(0, 16, Accum::ZERO, 1, scale).is_err());
        assert!(matrix.writer(2).write_synapse(0, 0, Accum::ZERO, 1, scale).is_err());
        assert!(matrix.row(99).is_empty());
    }
}
