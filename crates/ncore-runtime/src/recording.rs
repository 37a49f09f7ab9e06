//! Per-tick recording of channel inputs
//!
//! Samples accumulate while running. Pausing flushes them into a checkpoint;
//! resuming starts a fresh sample list. The recorder retains at most
//! `capacity` samples across all checkpoints; later samples are dropped and
//! counted.

use ncore_fixed::Accum;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::channels::SynapseChannels;

/// Channel inputs at the end of one tick's accumulation
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InputSample {
    /// Tick the sample belongs to
    pub time: u32,
    /// Raw `s1615` bits of every channel input, neuron-major
    pub inputs: Vec<i32>,
}

/// Recorder of channel inputs
#[derive(Debug, Clone, Default)]
pub struct InputRecorder {
    enabled: bool,
    capacity: usize,
    retained: usize,
    dropped: u32,
    current: Vec<InputSample>,
    checkpoints: Vec<Vec<InputSample>>,
}

impl InputRecorder {
    /// Create a recorder keeping at most `capacity` samples; a disabled
    /// recorder ignores every sample
    pub fn new(enabled: bool, capacity: usize) -> Self {
        Self {
            enabled,
            capacity,
            ..Default::default()
        }
    }

    /// Whether samples are taken
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Sample the channels for tick `time`
    pub fn record(&mut self, time: u32, channels: &SynapseChannels) {
        if !self.enabled {
            return;
        }
        if self.retained >= self.capacity {
            if self.dropped == 0 {
                log::warn!("Recording full at {} samples; dropping from tick {}", self.capacity, time);
            }
            self.dropped = self.dropped.saturating_add(1);
            return;
        }
        self.current.push(InputSample {
            time,
            inputs: channels.inputs().map(Accum::to_bits).collect(),
        });
        self.retained += 1;
    }

    /// Move the pending samples into a checkpoint
    ///
    /// Returns the number of samples flushed.
    pub fn flush(&mut self) -> usize {
        if !self.enabled {
            return 0;
        }
        let samples = std::mem::take(&mut self.current);
        let flushed = samples.len();
        self.checkpoints.push(samples);
        log::debug!("Recording flushed {} samples", flushed);
        flushed
    }

    /// Start a fresh sample list
    pub fn reset(&mut self) {
        self.retained -= self.current.len();
        self.current.clear();
    }

    /// Samples discarded because the recorder was full
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Samples not yet flushed
    pub fn pending(&self) -> &[InputSample] {
        &self.current
    }

    /// Flushed checkpoints, oldest first
    pub fn checkpoints(&self) -> &[Vec<InputSample>] {
        &self.checkpoints
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ncore_fixed::ExpSynapseParams;

    #[test]
    fn test_flush_and_reset() {
        let mut channels = SynapseChannels::new(2, &[ExpSynapseParams::passthrough()]);
        let mut recorder = InputRecorder::new(true, 16);
        recorder.record(0, &channels);
        channels.add_input(0, 1, Accum::from_num(1)).unwrap();
        recorder.record(1, &channels);
        assert_eq!(recorder.pending()[1].inputs, vec![0, 1 << 15]);

        assert_eq!(recorder.flush(), 2);
        assert!(recorder.pending().is_empty());
        assert_eq!(recorder.checkpoints().len(), 1);

        recorder.record(2, &channels);
        recorder.reset();
        assert!(recorder.pending().is_empty());
    }

    #[test]
    fn test_disabled_recorder() {
        let channels = SynapseChannels::new(1, &[ExpSynapseParams::passthrough()]);
        let mut recorder = InputRecorder::new(false, 16);
        recorder.record(0, &channels);
        assert!(recorder.pending().is_empty());
        assert_eq!(recorder.flush(), 0);
        assert!(recorder.checkpoints().is_empty());
    }

    #[test]
    fn test_capacity_bounds_retained_samples() {
        let channels = SynapseChannels::new(1, &[ExpSynapseParams::passthrough()]);
        let mut recorder = InputRecorder::new(true, 3);
        recorder.record(0, &channels);
        recorder.record(1, &channels);
        assert_eq!(recorder.flush(), 2);

        for time in 2..10 {
            recorder.record(time, &channels);
        }
        assert_eq!(recorder.pending().len(), 1);
        assert_eq!(recorder.dropped(), 7);

        // discarding pending samples frees their room
        recorder.reset();
        recorder.record(10, &channels);
        assert_eq!(recorder.pending()[0].time, 10);
        assert_eq!(recorder.dropped(), 7);
    }
}
