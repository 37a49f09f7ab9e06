//! Run configuration for the ncore CLI
//!
//! A run is described by one TOML file:
//!
//! ```toml
//! [run]
//! ticks = 100
//! timestep_ms = 1.0
//!
//! [population]
//! neurons = 16
//!
//! [synapses]
//! delay_bits = 4
//! max_row_length = 16
//! weight_scale = 256.0
//!
//! [[channel]]
//! name = "excitatory"
//! tau_ms = 5.0
//! left_shift = 7
//!
//! [[projection]]
//! connector = { type = "wta", n_values = 4 }
//! weight = { type = "constant", value = 0.5 }
//! delay = { type = "constant", value = 1.0 }
//!
//! [[stimulus]]
//! pre = 0
//! period = 10
//! ```

use std::path::Path;

use anyhow::Context;
use ncore_connect::{
    BlockGeometry, ConnectorSpec, ParamSpec, ProjectionSpec, SynapseLayout, UniformParams, WtaParams,
    DEFAULT_HEAP_BYTES,
};
use ncore_fixed::{Accum, ExpSynapseParams, LongAccum};
use ncore_runtime::{AccumulatorConfig, SchedulerConfig};
use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

/// Complete run description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Timing and queueing
    pub run: RunSection,
    /// Population sizes
    pub population: PopulationSection,
    /// Synaptic matrix shape
    #[serde(default)]
    pub synapses: SynapseSection,
    /// One entry per synapse type, in type order
    #[serde(rename = "channel", default)]
    pub channels: Vec<ChannelSection>,
    /// Connection blocks
    #[serde(rename = "projection", default)]
    pub projections: Vec<ProjectionSection>,
    /// Input spike sources
    #[serde(rename = "stimulus", default)]
    pub stimuli: Vec<StimulusSection>,
}

/// `[run]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSection {
    /// Ticks before the first pause
    pub ticks: u32,
    /// Length of one tick in milliseconds
    #[serde(default = "default_timestep_ms")]
    pub timestep_ms: f64,
    /// Background queue capacity
    #[serde(default = "default_background_capacity")]
    pub background_capacity: usize,
    /// Spike input buffer capacity
    #[serde(default = "default_spike_buffer_capacity")]
    pub spike_buffer_capacity: usize,
    /// Record channel inputs every tick
    #[serde(default)]
    pub record_inputs: bool,
    /// Recorded samples kept before new ones are dropped
    #[serde(default = "default_recording_capacity")]
    pub recording_capacity: usize,
    /// Generator heap size in bytes
    #[serde(default = "default_heap_bytes")]
    pub heap_bytes: usize,
}

/// `[population]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationSection {
    /// Post-neurons simulated on this core
    pub neurons: u32,
    /// Size of the source population; defaults to `neurons`
    #[serde(default)]
    pub pre_neurons: Option<u32>,
}

/// `[synapses]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynapseSection {
    /// Bits of the delay field
    #[serde(default = "default_delay_bits")]
    pub delay_bits: u32,
    /// Synapses each matrix row can hold
    #[serde(default = "default_max_row_length")]
    pub max_row_length: usize,
    /// Multiplier from weight to stored integer
    #[serde(default = "default_weight_scale")]
    pub weight_scale: f64,
}

impl Default for SynapseSection {
    fn default() -> Self {
        Self {
            delay_bits: default_delay_bits(),
            max_row_length: default_max_row_length(),
            weight_scale: default_weight_scale(),
        }
    }
}

/// `[[channel]]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSection {
    /// Label used in logs
    #[serde(default)]
    pub name: Option<String>,
    /// Synaptic time constant in milliseconds
    pub tau_ms: f64,
    /// Left shift from ring-buffer weight to input
    #[serde(default)]
    pub left_shift: u32,
}

/// `[[projection]]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionSection {
    /// Connectivity pattern
    pub connector: ConnectorSection,
    /// Synapse type targeted
    #[serde(default)]
    pub synapse_type: u32,
    /// Weight generator
    pub weight: ParamSection,
    /// Delay generator, in milliseconds
    pub delay: ParamSection,
    /// First post-neuron to connect
    #[serde(default)]
    pub post_lo: Option<u32>,
    /// Last post-neuron to connect
    #[serde(default)]
    pub post_hi: Option<u32>,
}

/// Connector selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConnectorSection {
    /// Winner-take-all groups
    Wta {
        /// Group size
        n_values: u32,
    },
}

/// Parameter generator selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ParamSection {
    /// Fixed value
    Constant {
        /// The value
        value: f64,
    },
    /// Seeded uniform draw
    Uniform {
        /// Inclusive lower bound
        low: f64,
        /// Inclusive upper bound
        high: f64,
        /// Random seed
        #[serde(default)]
        seed: u64,
    },
}

/// `[[stimulus]]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StimulusSection {
    /// Pre-neuron that fires
    pub pre: u32,
    /// Explicit firing ticks
    #[serde(default)]
    pub times: Vec<u32>,
    /// Fire every `period` ticks from `start`
    #[serde(default)]
    pub period: Option<u32>,
    /// First periodic tick
    #[serde(default)]
    pub start: u32,
}

impl StimulusSection {
    /// Whether the source fires at `time`
    pub fn fires_at(&self, time: u32) -> bool {
        if self.times.contains(&time) {
            return true;
        }
        match self.period {
            Some(period) if period > 0 => time >= self.start && (time - self.start) % period == 0,
            _ => false,
        }
    }
}

fn default_timestep_ms() -> f64 {
    1.0
}

fn default_background_capacity() -> usize {
    SchedulerConfig::default().background_capacity
}

fn default_spike_buffer_capacity() -> usize {
    SchedulerConfig::default().spike_buffer_capacity
}

fn default_recording_capacity() -> usize {
    SchedulerConfig::default().recording_capacity
}

fn default_heap_bytes() -> usize {
    DEFAULT_HEAP_BYTES
}

fn default_delay_bits() -> u32 {
    4
}

fn default_max_row_length() -> usize {
    32
}

fn default_weight_scale() -> f64 {
    256.0
}

impl RunConfig {
    /// Load and validate a configuration file
    pub fn load_from_file(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-section constraints
    pub fn validate(&self) -> CliResult<()> {
        if self.population.neurons == 0 {
            return Err(CliError::config("population.neurons must be > 0"));
        }
        if self.pre_neurons() == 0 {
            return Err(CliError::config("population.pre_neurons must be > 0"));
        }
        if self.channels.is_empty() {
            return Err(CliError::config("at least one [[channel]] is required"));
        }
        if self.run.timestep_ms.is_nan() || self.run.timestep_ms <= 0.0 {
            return Err(CliError::config("run.timestep_ms must be > 0"));
        }
        for (index, projection) in self.projections.iter().enumerate() {
            if projection.synapse_type as usize >= self.channels.len() {
                return Err(CliError::config(format!(
                    "projection {} targets synapse type {} but only {} channels exist",
                    index,
                    projection.synapse_type,
                    self.channels.len()
                )));
            }
        }
        for stimulus in &self.stimuli {
            if stimulus.pre >= self.pre_neurons() {
                return Err(CliError::config(format!(
                    "stimulus pre-neuron {} outside population of {}",
                    stimulus.pre,
                    self.pre_neurons()
                )));
            }
        }
        Ok(())
    }

    /// Size of the source population
    pub fn pre_neurons(&self) -> u32 {
        self.population.pre_neurons.unwrap_or(self.population.neurons)
    }

    /// Scheduler settings
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig::new(self.run.ticks)
            .with_background_capacity(self.run.background_capacity)
            .with_spike_buffer_capacity(self.run.spike_buffer_capacity)
            .with_input_recording(self.run.record_inputs)
            .with_recording_capacity(self.run.recording_capacity)
    }

    /// Word layout for the local population
    pub fn layout(&self) -> CliResult<SynapseLayout> {
        Ok(SynapseLayout::for_population(
            self.population.neurons,
            self.channels.len() as u32,
            self.synapses.delay_bits,
        )?)
    }

    /// Ring buffer and channel settings
    pub fn accumulator_config(&self) -> CliResult<AccumulatorConfig> {
        let channels = self
            .channels
            .iter()
            .map(|channel| ExpSynapseParams::from_tau(channel.tau_ms, self.run.timestep_ms))
            .collect();
        let shifts = self.channels.iter().map(|channel| channel.left_shift).collect();
        Ok(AccumulatorConfig::new(self.population.neurons, self.channels.len() as u32, self.layout()?)
            .with_channels(channels)
            .with_left_shifts(shifts))
    }

    /// Connection blocks for the expander
    pub fn projection_specs(&self) -> Vec<ProjectionSpec> {
        let neurons = self.population.neurons;
        let weight_scale = LongAccum::saturating_from_num(self.synapses.weight_scale);
        let timestep_per_delay = Accum::saturating_from_num(1.0 / self.run.timestep_ms);

        self.projections
            .iter()
            .map(|projection| {
                let geometry = BlockGeometry::full(self.pre_neurons(), neurons, weight_scale)
                    .with_synapse_type(projection.synapse_type)
                    .with_post_range(
                        projection.post_lo.unwrap_or(0),
                        projection.post_hi.unwrap_or(neurons - 1),
                    )
                    .with_timestep_per_delay(timestep_per_delay);
                ProjectionSpec {
                    geometry,
                    connector: match projection.connector {
                        ConnectorSection::Wta { n_values } => ConnectorSpec::Wta(WtaParams { n_values }),
                    },
                    weight: param_spec(&projection.weight),
                    delay: param_spec(&projection.delay),
                }
            })
            .collect()
    }

    /// Pre-neurons firing at `time`
    pub fn spikes_at(&self, time: u32) -> Vec<u32> {
        self.stimuli
            .iter()
            .filter(|stimulus| stimulus.fires_at(time))
            .map(|stimulus| stimulus.pre)
            .collect()
    }
}

fn param_spec(section: &ParamSection) -> ParamSpec {
    match *section {
        ParamSection::Constant { value } => ParamSpec::Constant(Accum::saturating_from_num(value)),
        ParamSection::Uniform { low, high, seed } => ParamSpec::Uniform(UniformParams {
            low: Accum::saturating_from_num(low),
            high: Accum::saturating_from_num(high),
            seed,
        }),
    }
}
