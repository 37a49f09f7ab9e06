//! Bit layout shared by synaptic words and the ring buffer
//!
//! The low 16 bits of a synaptic word hold `delay | type | index`; the ring
//! buffer index replaces the delay field with the masked arrival time, so a
//! synapse can be turned into a buffer slot with one add and one mask.

use crate::error::{ConnectError, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of low bits of a synaptic word available to the layout
pub const LAYOUT_BITS: u32 = 16;

/// A 32-bit synaptic word: `weight:16 | delay | type | index`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct SynapseWord(pub u32);

impl SynapseWord {
    /// Stored weight
    #[inline(always)]
    pub const fn weight(self) -> u16 {
        (self.0 >> LAYOUT_BITS) as u16
    }
}

/// A synaptic word split into its fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedSynapse {
    /// Stored weight
    pub weight: u16,
    /// Delay in timesteps
    pub delay: u32,
    /// Synapse type (receptor)
    pub synapse_type: u32,
    /// Post-neuron index within the local slice
    pub index: u32,
}

/// Widths of the index, type and delay fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SynapseLayout {
    index_bits: u32,
    type_bits: u32,
    delay_bits: u32,
}

impl SynapseLayout {
    /// Create a layout, checking that the fields fit in [`LAYOUT_BITS`]
    pub fn new(index_bits: u32, type_bits: u32, delay_bits: u32) -> Result<Self> {
        if delay_bits == 0 {
            return Err(ConnectError::invalid_parameter("delay_bits", "0", ">= 1"));
        }
        let total = index_bits + type_bits + delay_bits;
        if total > LAYOUT_BITS {
            return Err(ConnectError::invalid_parameter(
                "index_bits + type_bits + delay_bits",
                total.to_string(),
                format!("<= {}", LAYOUT_BITS),
            ));
        }
        Ok(Self { index_bits, type_bits, delay_bits })
    }

    /// Smallest layout that holds `n_neurons` and `n_types` with the given
    /// delay window bits
    pub fn for_population(n_neurons: u32, n_types: u32, delay_bits: u32) -> Result<Self> {
        Self::new(bits_for(n_neurons), bits_for(n_types), delay_bits)
    }

    /// Bits of the neuron index field
    pub const fn index_bits(&self) -> u32 {
        self.index_bits
    }

    /// Bits of the synapse type field
    pub const fn type_bits(&self) -> u32 {
        self.type_bits
    }

    /// Bits of the delay field
    pub const fn delay_bits(&self) -> u32 {
        self.delay_bits
    }

    /// Combined width of the type and index fields
    pub const fn type_index_bits(&self) -> u32 {
        self.index_bits + self.type_bits
    }

    /// Mask of the neuron index field
    pub const fn index_mask(&self) -> u32 {
        (1 << self.index_bits) - 1
    }

    /// Mask of the synapse type field (after shifting down)
    pub const fn type_mask(&self) -> u32 {
        (1 << self.type_bits) - 1
    }

    /// Mask applied to times and delays
    pub const fn delay_mask(&self) -> u32 {
        (1 << self.delay_bits) - 1
    }

    /// Largest storable delay; also the widest gap the ring buffer can span
    pub const fn max_delay(&self) -> u32 {
        self.delay_mask()
    }

    /// Number of neurons addressable by the index field
    pub const fn max_neurons(&self) -> u32 {
        1 << self.index_bits
    }

    /// Number of synapse types addressable by the type field
    pub const fn max_types(&self) -> u32 {
        1 << self.type_bits
    }

    /// Number of slots in a ring buffer with this layout
    pub const fn ring_buffer_size(&self) -> usize {
        1 << (self.delay_bits + self.type_bits + self.index_bits)
    }

    /// Ring-buffer slot for `time`, `synapse_type` and `neuron`
    #[inline(always)]
    pub const fn ring_buffer_index(&self, time: u32, synapse_type: u32, neuron: u32) -> usize {
        (((time & self.delay_mask()) << self.type_index_bits())
            | (synapse_type << self.index_bits)
            | neuron) as usize
    }

    /// Pack a synapse into a word; fields are masked to their widths
    pub const fn encode(&self, weight: u16, delay: u32, synapse_type: u32, index: u32) -> SynapseWord {
        SynapseWord(
            ((weight as u32) << LAYOUT_BITS)
                | ((delay & self.delay_mask()) << self.type_index_bits())
                | ((synapse_type & self.type_mask()) << self.index_bits)
                | (index & self.index_mask()),
        )
    }

    /// Split a word into its fields
    pub const fn decode(&self, word: SynapseWord) -> DecodedSynapse {
        DecodedSynapse {
            weight: word.weight(),
            delay: (word.0 >> self.type_index_bits()) & self.delay_mask(),
            synapse_type: (word.0 >> self.index_bits) & self.type_mask(),
            index: word.0 & self.index_mask(),
        }
    }

    /// The `type | index` bits of a word
    #[inline(always)]
    pub const fn type_index(&self, word: SynapseWord) -> u32 {
        word.0 & ((1 << self.type_index_bits()) - 1)
    }

    /// The delay field of a word
    #[inline(always)]
    pub const fn delay(&self, word: SynapseWord) -> u32 {
        (word.0 >> self.type_index_bits()) & self.delay_mask()
    }
}

/// Bits needed to index `count` items
fn bits_for(count: u32) -> u32 {
    if count <= 1 {
        0
    } else {
        32 - (count - 1).leading_zeros()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_rejects_oversize() {
        assert!(SynapseLayout::new(8, 1, 4).is_ok());
        assert!(SynapseLayout::new(10, 2, 5).is_err());
        assert!(SynapseLayout::new(8, 1, 0).is_err());
    }

    #[test]
    fn test_for_population() {
        let layout = SynapseLayout::for_population(100, 2, 4).unwrap();
        assert_eq!(layout.index_bits(), 7);
        assert_eq!(layout.type_bits(), 1);
        assert_eq!(layout.max_neurons(), 128);

        let single = SynapseLayout::for_population(1, 1, 3).unwrap();
        assert_eq!(single.type_index_bits(), 0);
        assert_eq!(single.ring_buffer_size(), 8);
    }

    #[test]
    fn test_encode_decode() {
        let layout = SynapseLayout::new(8, 1, 4).unwrap();
        let word = layout.encode(1234, 5, 1, 200);
        let decoded = layout.decode(word);
        assert_eq!(decoded.weight, 1234);
        assert_eq!(decoded.delay, 5);
        assert_eq!(decoded.synapse_type, 1);
        assert_eq!(decoded.index, 200);
        assert_eq!(layout.type_index(word), (1 << 8) | 200);
    }

    #[test]
    fn test_ring_buffer_index_wraps_with_time() {
        let layout = SynapseLayout::new(4, 1, 3).unwrap();
        assert_eq!(layout.ring_buffer_size(), 256);
        let a = layout.ring_buffer_index(2, 1, 3);
        let b = layout.ring_buffer_index(2 + 8, 1, 3);
        assert_eq!(a, b);
        assert_ne!(a, layout.ring_buffer_index(3, 1, 3));
        assert!(layout.ring_buffer_index(7, 1, 15) < layout.ring_buffer_size());
    }
}
