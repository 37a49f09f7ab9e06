//! Scheduler and accumulator configuration

use ncore_connect::SynapseLayout;
use ncore_fixed::ExpSynapseParams;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, RuntimeError};

/// Timing and queueing parameters of the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SchedulerConfig {
    /// Ticks to run before pausing
    pub simulation_ticks: u32,
    /// Never pause on the tick budget
    pub infinite_run: bool,
    /// Background jobs that may be queued at once
    pub background_capacity: usize,
    /// Spikes the input buffer holds between ticks
    pub spike_buffer_capacity: usize,
    /// Record channel inputs every tick
    pub record_inputs: bool,
    /// Samples the recorder retains before dropping new ones
    pub recording_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            simulation_ticks: 1000,
            infinite_run: false,
            background_capacity: 4,
            spike_buffer_capacity: 256,
            record_inputs: false,
            recording_capacity: 4096,
        }
    }
}

impl SchedulerConfig {
    /// Create a configuration that pauses after `simulation_ticks` ticks
    pub fn new(simulation_ticks: u32) -> Self {
        Self {
            simulation_ticks,
            ..Default::default()
        }
    }

    /// Run until stopped externally
    pub fn with_infinite_run(mut self, infinite: bool) -> Self {
        self.infinite_run = infinite;
        self
    }

    /// Set the background queue capacity
    pub fn with_background_capacity(mut self, capacity: usize) -> Self {
        self.background_capacity = capacity;
        self
    }

    /// Set the spike input buffer capacity
    pub fn with_spike_buffer_capacity(mut self, capacity: usize) -> Self {
        self.spike_buffer_capacity = capacity;
        self
    }

    /// Enable per-tick recording of channel inputs
    pub fn with_input_recording(mut self, enabled: bool) -> Self {
        self.record_inputs = enabled;
        self
    }

    /// Bound the number of recorded samples kept
    pub fn with_recording_capacity(mut self, capacity: usize) -> Self {
        self.recording_capacity = capacity;
        self
    }

    /// Validate parameters
    pub fn validate(&self) -> Result<()> {
        if self.background_capacity == 0 {
            return Err(RuntimeError::invalid_parameter("background_capacity", "0", "> 0"));
        }
        if self.spike_buffer_capacity == 0 {
            return Err(RuntimeError::invalid_parameter("spike_buffer_capacity", "0", "> 0"));
        }
        if self.record_inputs && self.recording_capacity == 0 {
            return Err(RuntimeError::invalid_parameter("recording_capacity", "0", "> 0"));
        }
        if self.simulation_ticks == u32::MAX && !self.infinite_run {
            return Err(RuntimeError::invalid_parameter(
                "simulation_ticks",
                self.simulation_ticks.to_string(),
                "< u32::MAX (use infinite_run instead)",
            ));
        }
        Ok(())
    }
}

/// Shape of the ring buffer and synapse channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccumulatorConfig {
    /// Neurons on this core
    pub n_neurons: u32,
    /// Synapse types (receptors) per neuron
    pub n_types: u32,
    /// Field widths shared with the synaptic matrix
    pub layout: SynapseLayout,
    /// Per-type left shift converting ring-buffer weights to input
    pub left_shifts: Vec<u32>,
    /// Per-type decay and injection factors
    pub channels: Vec<ExpSynapseParams>,
}

impl AccumulatorConfig {
    /// Create a configuration with zero shifts and pass-through channels
    pub fn new(n_neurons: u32, n_types: u32, layout: SynapseLayout) -> Self {
        Self {
            n_neurons,
            n_types,
            layout,
            left_shifts: vec![0; n_types as usize],
            channels: vec![ExpSynapseParams::passthrough(); n_types as usize],
        }
    }

    /// Set every type's left shift
    pub fn with_left_shifts(mut self, shifts: Vec<u32>) -> Self {
        self.left_shifts = shifts;
        self
    }

    /// Set every type's channel factors
    pub fn with_channels(mut self, channels: Vec<ExpSynapseParams>) -> Self {
        self.channels = channels;
        self
    }

    /// Validate the shape against the layout
    pub fn validate(&self) -> Result<()> {
        if self.n_neurons == 0 {
            return Err(RuntimeError::invalid_parameter("n_neurons", "0", "> 0"));
        }
        if self.n_neurons > self.layout.max_neurons() {
            return Err(RuntimeError::invalid_parameter(
                "n_neurons",
                self.n_neurons.to_string(),
                format!("<= {} (index bits {})", self.layout.max_neurons(), self.layout.index_bits()),
            ));
        }
        if self.n_types == 0 || self.n_types > self.layout.max_types() {
            return Err(RuntimeError::invalid_parameter(
                "n_types",
                self.n_types.to_string(),
                format!("1..={}", self.layout.max_types()),
            ));
        }
        if self.left_shifts.len() != self.n_types as usize {
            return Err(RuntimeError::invalid_config(format!(
                "{} left shifts for {} synapse types",
                self.left_shifts.len(),
                self.n_types
            )));
        }
        if self.channels.len() != self.n_types as usize {
            return Err(RuntimeError::invalid_config(format!(
                "{} channel parameter sets for {} synapse types",
                self.channels.len(),
                self.n_types
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduler_config_builder() {
        let config = SchedulerConfig::new(50)
            .with_background_capacity(2)
            .with_input_recording(true);
        assert_eq!(config.simulation_ticks, 50);
        assert_eq!(config.background_capacity, 2);
        assert!(config.record_inputs);
        assert!(config.validate().is_ok());

        assert!(SchedulerConfig::new(10).with_background_capacity(0).validate().is_err());
        assert!(SchedulerConfig::new(10).with_spike_buffer_capacity(0).validate().is_err());
        assert!(SchedulerConfig::new(10)
            .with_input_recording(true)
            .with_recording_capacity(0)
            .validate()
            .is_err());
        assert!(SchedulerConfig::new(u32::MAX).validate().is_err());
        assert!(SchedulerConfig::new(u32::MAX).with_infinite_run(true).validate().is_ok());
    }

    #[test]
    fn test_accumulator_config_validation() {
        let layout = SynapseLayout::new(3, 1, 4).unwrap();
        assert!(AccumulatorConfig::new(8, 2, layout).validate().is_ok());
        assert!(AccumulatorConfig::new(9, 2, layout).validate().is_err());
        assert!(AccumulatorConfig::new(8, 3, layout).validate().is_err());
        assert!(AccumulatorConfig::new(0, 1, layout).validate().is_err());
        assert!(AccumulatorConfig::new(8, 2, layout)
            .with_left_shifts(vec![1])
            .validate()
            .is_err());
    }
}
