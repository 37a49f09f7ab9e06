//! Per-neuron synaptic input channels
//!
//! Each neuron has one channel per synapse type. A channel holds the current
//! input together with the decay and injection factors of its exponential
//! synapse shape. Input is mutated only inside the critical section; the
//! neuron model reads it from background work.

use ncore_fixed::{decay_s1615, Accum, ExpSynapseParams};

use crate::error::{Result, RuntimeError};

/// State of one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelState {
    /// Accumulated input
    pub input: Accum,
    /// Shape factors
    pub params: ExpSynapseParams,
}

/// All input channels of the local population
#[derive(Debug, Clone)]
pub struct SynapseChannels {
    n_neurons: u32,
    n_types: u32,
    // neuron-major: neuron * n_types + type
    states: Vec<ChannelState>,
}

impl SynapseChannels {
    /// Create channels with zero input and per-type shape factors
    pub fn new(n_neurons: u32, per_type: &[ExpSynapseParams]) -> Self {
        let states = (0..n_neurons)
            .flat_map(|_| {
                per_type.iter().map(|params| ChannelState {
                    input: Accum::ZERO,
                    params: *params,
                })
            })
            .collect();
        Self {
            n_neurons,
            n_types: per_type.len() as u32,
            states,
        }
    }

    /// Neurons in the population
    pub fn n_neurons(&self) -> u32 {
        self.n_neurons
    }

    /// Synapse types per neuron
    pub fn n_types(&self) -> u32 {
        self.n_types
    }

    /// Inject `value` into a channel, scaled by its injection factor
    pub fn add_input(&mut self, synapse_type: u32, neuron: u32, value: Accum) -> Result<()> {
        let index = self.index(synapse_type, neuron)?;
        self.inject(index, value);
        Ok(())
    }

    /// Current input of a channel
    pub fn input(&self, synapse_type: u32, neuron: u32) -> Result<Accum> {
        Ok(self.states[self.index(synapse_type, neuron)?].input)
    }

    /// Sum of one type's input over all neurons
    pub fn total_input(&self, synapse_type: u32) -> Accum {
        self.states
            .iter()
            .skip(synapse_type as usize)
            .step_by(self.n_types.max(1) as usize)
            .fold(Accum::ZERO, |sum, state| sum.saturating_add(state.input))
    }

    /// Inputs of every channel, neuron-major
    pub fn inputs(&self) -> impl Iterator<Item = Accum> + '_ {
        self.states.iter().map(|state| state.input)
    }

    /// Add then decay one channel; indices must be in range
    #[inline]
    pub(crate) fn accumulate_and_decay(&mut self, synapse_type: u32, neuron: u32, value: Accum) {
        let index = (neuron * self.n_types + synapse_type) as usize;
        self.inject(index, value);
        let state = &mut self.states[index];
        state.input = decay_s1615(state.input, state.params.decay);
    }

    #[inline]
    fn inject(&mut self, index: usize, value: Accum) {
        let state = &mut self.states[index];
        state.input = state.input.saturating_add(decay_s1615(value, state.params.init));
    }

    fn index(&self, synapse_type: u32, neuron: u32) -> Result<usize> {
        if neuron >= self.n_neurons {
            return Err(RuntimeError::NeuronOutOfRange {
                neuron,
                n_neurons: self.n_neurons,
            });
        }
        if synapse_type >= self.n_types {
            return Err(RuntimeError::invalid_parameter(
                "synapse_type",
                synapse_type.to_string(),
                format!("< {}", self.n_types),
            ));
        }
        Ok((neuron * self.n_types + synapse_type) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ncore_fixed::Decay;

    fn half() -> ExpSynapseParams {
        ExpSynapseParams {
            decay: Decay::from_bits(1 << 31),
            init: Decay::from_bits(1 << 31),
        }
    }

    #[test]
    fn test_add_input_applies_init() {
        let mut channels = SynapseChannels::new(2, &[half(), ExpSynapseParams::passthrough()]);
        channels.add_input(0, 1, Accum::from_num(4)).unwrap();
        assert_eq!(channels.input(0, 1).unwrap(), Accum::from_num(2));
        assert_eq!(channels.input(1, 1).unwrap(), Accum::ZERO);

        // pass-through injects (almost) unchanged
        channels.add_input(1, 0, Accum::from_num(3)).unwrap();
        assert_eq!(channels.input(1, 0).unwrap(), Accum::from_num(3));
    }

    #[test]
    fn test_out_of_range() {
        let mut channels = SynapseChannels::new(2, &[half()]);
        assert_eq!(
            channels.add_input(0, 2, Accum::from_num(1)).unwrap_err(),
            RuntimeError::NeuronOutOfRange { neuron: 2, n_neurons: 2 }
        );
        assert!(channels.input(1, 0).is_err());
    }

    #[test]
    fn test_accumulate_and_decay() {
        let mut channels = SynapseChannels::new(1, &[half()]);
        channels.accumulate_and_decay(0, 0, Accum::from_num(8));
        // injected at half, then decayed by half
        assert_eq!(channels.input(0, 0).unwrap(), Accum::from_num(2));
        channels.accumulate_and_decay(0, 0, Accum::ZERO);
        assert_eq!(channels.input(0, 0).unwrap(), Accum::from_num(1));
    }

    #[test]
    fn test_total_input_per_type() {
        let mut channels = SynapseChannels::new(3, &[half(), half()]);
        for neuron in 0..3 {
            channels.add_input(1, neuron, Accum::from_num(2)).unwrap();
        }
        assert_eq!(channels.total_input(1), Accum::from_num(3));
        assert_eq!(channels.total_input(0), Accum::ZERO);
    }
}
