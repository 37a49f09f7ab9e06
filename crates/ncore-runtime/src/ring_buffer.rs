//! Time-indexed synaptic delay line
//!
//! One flat array holds a slot for every combination of time slot, synapse
//! type and neuron. Arrivals accumulate into the slot of their arrival time;
//! the slot for the current time is read and cleared once per tick.

use ncore_connect::{SynapseLayout, SynapseWord};

/// Accumulating ring buffer of raw synaptic weights
#[derive(Debug, Clone)]
pub struct RingBuffer {
    layout: SynapseLayout,
    slots: Vec<u32>,
    saturations: u32,
}

impl RingBuffer {
    /// Allocate a zeroed buffer sized for `layout`
    pub fn new(layout: SynapseLayout) -> Self {
        Self {
            layout,
            slots: vec![0; layout.ring_buffer_size()],
            saturations: 0,
        }
    }

    /// Field widths the buffer is indexed with
    pub fn layout(&self) -> &SynapseLayout {
        &self.layout
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the buffer has no slots
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Add `weight` to the slot for `time`, `synapse_type` and `neuron`
    ///
    /// Saturates at `u32::MAX` and counts the saturation.
    #[inline]
    pub fn add(&mut self, time: u32, synapse_type: u32, neuron: u32, weight: u32) {
        let index = self.layout.ring_buffer_index(time, synapse_type, neuron);
        self.accumulate(index, weight);
    }

    /// Deliver a synaptic word for a spike received at `time`
    ///
    /// The weight lands in the slot of `time + delay`.
    #[inline]
    pub fn add_synapse(&mut self, time: u32, word: SynapseWord) {
        let arrival = time.wrapping_add(self.layout.delay(word));
        let index = ((arrival & self.layout.delay_mask()) << self.layout.type_index_bits())
            | self.layout.type_index(word);
        self.accumulate(index as usize, word.weight() as u32);
    }

    /// Current value of a slot
    pub fn peek(&self, time: u32, synapse_type: u32, neuron: u32) -> u32 {
        self.slots[self.layout.ring_buffer_index(time, synapse_type, neuron)]
    }

    /// Read a slot and reset it to zero
    #[inline]
    pub fn take(&mut self, time: u32, synapse_type: u32, neuron: u32) -> u32 {
        let index = self.layout.ring_buffer_index(time, synapse_type, neuron);
        core::mem::take(&mut self.slots[index])
    }

    /// Additions that hit `u32::MAX`
    pub fn saturation_count(&self) -> u32 {
        self.saturations
    }

    fn accumulate(&mut self, index: usize, weight: u32) {
        let slot = &mut self.slots[index];
        match slot.checked_add(weight) {
            Some(sum) => *slot = sum,
            None => {
                *slot = u32::MAX;
                self.saturations += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer() -> RingBuffer {
        RingBuffer::new(SynapseLayout::new(3, 1, 3).unwrap())
    }

    #[test]
    fn test_writes_accumulate() {
        let mut ring = buffer();
        ring.add(5, 1, 2, 10);
        ring.add(5, 1, 2, 7);
        assert_eq!(ring.peek(5, 1, 2), 17);
        assert_eq!(ring.take(5, 1, 2), 17);
        assert_eq!(ring.peek(5, 1, 2), 0);
    }

    #[test]
    fn test_synapse_lands_at_arrival_time() {
        let mut ring = buffer();
        let layout = *ring.layout();
        ring.add_synapse(6, layout.encode(300, 3, 1, 4));
        // 6 + 3 wraps to slot 1 of the 8-slot window
        assert_eq!(ring.peek(9, 1, 4), 300);
        assert_eq!(ring.peek(1, 1, 4), 300);
        assert_eq!(ring.peek(6, 1, 4), 0);
    }

    #[test]
    fn test_saturation_is_counted() {
        let mut ring = buffer();
        ring.add(0, 0, 0, u32::MAX - 1);
        ring.add(0, 0, 0, 5);
        assert_eq!(ring.peek(0, 0, 0), u32::MAX);
        assert_eq!(ring.saturation_count(), 1);
    }
}
