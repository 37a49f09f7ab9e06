//! Ring-buffer synaptic accumulator
//!
//! Owns the ring buffer and the synapse channels. Spike delivery writes into
//! the ring buffer; [`Accumulator::process`] moves the current time slot into
//! the channels once per tick.

use ncore_connect::{SynapseLayout, SynapseWord};
use ncore_fixed::convert_weight_to_input;

use crate::channels::SynapseChannels;
use crate::config::AccumulatorConfig;
use crate::error::Result;
use crate::ring_buffer::RingBuffer;

/// Ring buffer and channel state of the local population
#[derive(Debug, Clone)]
pub struct Accumulator {
    n_neurons: u32,
    n_types: u32,
    left_shifts: Vec<u32>,
    ring: RingBuffer,
    channels: SynapseChannels,
}

impl Accumulator {
    /// Allocate the ring buffer and channels described by `config`
    pub fn new(config: &AccumulatorConfig) -> Result<Self> {
        config.validate()?;
        log::debug!(
            "Accumulator: {} neurons, {} types, {} ring-buffer slots",
            config.n_neurons,
            config.n_types,
            config.layout.ring_buffer_size()
        );
        Ok(Self {
            n_neurons: config.n_neurons,
            n_types: config.n_types,
            left_shifts: config.left_shifts.clone(),
            ring: RingBuffer::new(config.layout),
            channels: SynapseChannels::new(config.n_neurons, &config.channels),
        })
    }

    /// Field widths of the ring buffer
    pub fn layout(&self) -> &SynapseLayout {
        self.ring.layout()
    }

    /// Deliver one matrix row for a spike received at `time`
    ///
    /// Returns the number of synapses delivered.
    pub fn deliver(&mut self, time: u32, row: &[SynapseWord]) -> usize {
        for word in row {
            self.ring.add_synapse(time, *word);
        }
        row.len()
    }

    /// Consume the time slot of `time`
    ///
    /// For every neuron and type: convert the slot's raw weight, inject it
    /// into the channel, clear the slot, then decay the channel.
    pub fn process(&mut self, time: u32) {
        for neuron in 0..self.n_neurons {
            for synapse_type in 0..self.n_types {
                let raw = self.ring.take(time, synapse_type, neuron);
                let input = convert_weight_to_input(raw, self.left_shifts[synapse_type as usize]);
                self.channels.accumulate_and_decay(synapse_type, neuron, input);
            }
        }
    }

    /// Channel state read by the neuron model
    pub fn channels(&self) -> &SynapseChannels {
        &self.channels
    }

    /// The ring buffer
    pub fn ring_buffer(&self) -> &RingBuffer {
        &self.ring
    }

    /// Mutable ring buffer
    pub fn ring_buffer_mut(&mut self) -> &mut RingBuffer {
        &mut self.ring
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ncore_fixed::{decay_s1615, Accum, Decay, ExpSynapseParams};

    fn accumulator() -> Accumulator {
        let layout = SynapseLayout::new(2, 1, 3).unwrap();
        let half = ExpSynapseParams {
            decay: Decay::from_bits(1 << 31),
            init: Decay::MAX,
        };
        let config = AccumulatorConfig::new(4, 2, layout)
            .with_left_shifts(vec![15, 14])
            .with_channels(vec![half, ExpSynapseParams::passthrough()]);
        Accumulator::new(&config).unwrap()
    }

    #[test]
    fn test_process_converts_decays_and_clears() {
        let mut acc = accumulator();
        acc.ring_buffer_mut().add(3, 0, 1, 4);
        acc.process(3);

        // 4 << 15 is 4.0; init keeps it, decay halves it
        let expected = decay_s1615(Accum::from_num(4), Decay::from_bits(1 << 31));
        assert_eq!(acc.channels().input(0, 1).unwrap(), expected);
        assert_eq!(acc.ring_buffer().peek(3, 0, 1), 0);
    }

    #[test]
    fn test_left_shift_per_type() {
        let mut acc = accumulator();
        acc.ring_buffer_mut().add(0, 1, 0, 4);
        acc.process(0);
        // 4 << 14 is 2.0; pass-through channel drops it after one step
        assert_eq!(acc.channels().input(1, 0).unwrap(), Accum::ZERO);
        assert_eq!(acc.ring_buffer().peek(0, 1, 0), 0);
    }

    #[test]
    fn test_deliver_targets_future_slot() {
        let mut acc = accumulator();
        let word = acc.layout().encode(2, 2, 0, 3);
        assert_eq!(acc.deliver(5, &[word, word]), 2);
        assert_eq!(acc.ring_buffer().peek(7, 0, 3), 4);

        acc.process(6);
        assert_eq!(acc.channels().input(0, 3).unwrap(), Accum::ZERO);
        acc.process(7);
        assert_eq!(acc.channels().input(0, 3).unwrap(), Accum::from_num(2));
    }
}
