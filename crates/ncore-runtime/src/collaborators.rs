//! Interfaces of the neuron model and synapse subsystem
//!
//! The scheduler drives both through these traits. [`InputProbe`] and
//! [`StaticSynapses`] are minimal implementations for runs that only need
//! the synaptic input path.

use ncore_fixed::Accum;

use crate::channels::SynapseChannels;
use crate::provenance::{NeuronProvenance, SynapseProvenance};

/// Neuron-model side of the scheduler
pub trait NeuronModel {
    /// Prepare to continue after a pause; `false` is fatal
    fn resume(&mut self) -> bool;

    /// Store state ahead of a pause
    fn pause(&mut self);

    /// Advance every neuron by one tick, reading the channel inputs
    fn do_timestep_update(&mut self, time: u32, timer_count: u32, channels: &SynapseChannels);

    /// Counters for the provenance record
    fn provenance(&self) -> NeuronProvenance;
}

/// Synapse-subsystem side of the scheduler
pub trait SynapseSubsystem {
    /// Prepare to continue at `time`; `false` is fatal
    fn resume(&mut self, time: u32) -> bool;

    /// Structural plasticity work for tick `time`
    fn do_timestep_update(&mut self, time: u32);

    /// Counters for the provenance record
    fn provenance_snapshot(&self) -> SynapseProvenance;
}

/// Total input of each synapse type seen by one update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSample {
    /// Tick of the update
    pub time: u32,
    /// Timer count passed with the update
    pub timer_count: u32,
    /// Sum over neurons, per synapse type
    pub totals: Vec<Accum>,
}

/// Neuron model that records the input it is given
#[derive(Debug, Clone, Default)]
pub struct InputProbe {
    samples: Vec<ProbeSample>,
    refuse_resume: bool,
    provenance: NeuronProvenance,
}

impl InputProbe {
    /// Create an empty probe
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every resume fail
    pub fn with_refused_resume(mut self, refuse: bool) -> Self {
        self.refuse_resume = refuse;
        self
    }

    /// Updates seen, in order
    pub fn samples(&self) -> &[ProbeSample] {
        &self.samples
    }

    /// Ticks updated, in order
    pub fn updated_ticks(&self) -> Vec<u32> {
        self.samples.iter().map(|sample| sample.time).collect()
    }
}

impl NeuronModel for InputProbe {
    fn resume(&mut self) -> bool {
        if self.refuse_resume {
            log::error!("Input probe refusing to resume");
            return false;
        }
        self.provenance.n_resumes += 1;
        true
    }

    fn pause(&mut self) {
        self.provenance.n_pauses += 1;
    }

    fn do_timestep_update(&mut self, time: u32, timer_count: u32, channels: &SynapseChannels) {
        let totals = (0..channels.n_types()).map(|t| channels.total_input(t)).collect();
        self.samples.push(ProbeSample {
            time,
            timer_count,
            totals,
        });
        self.provenance.current_timer_tick = timer_count;
        self.provenance.n_timestep_updates += 1;
    }

    fn provenance(&self) -> NeuronProvenance {
        self.provenance
    }
}

/// Synapse subsystem without plasticity
#[derive(Debug, Clone, Default)]
pub struct StaticSynapses {
    refuse_resume: bool,
    last_resume_time: Option<u32>,
    provenance: SynapseProvenance,
}

impl StaticSynapses {
    /// Create the subsystem
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every resume fail
    pub fn with_refused_resume(mut self, refuse: bool) -> Self {
        self.refuse_resume = refuse;
        self
    }

    /// Time passed to the most recent successful resume
    pub fn last_resume_time(&self) -> Option<u32> {
        self.last_resume_time
    }
}

impl SynapseSubsystem for StaticSynapses {
    fn resume(&mut self, time: u32) -> bool {
        if self.refuse_resume {
            log::error!("Synapses refusing to resume at {}", time);
            return false;
        }
        self.last_resume_time = Some(time);
        self.provenance.n_resumes += 1;
        true
    }

    fn do_timestep_update(&mut self, _time: u32) {
        self.provenance.n_structural_updates += 1;
    }

    fn provenance_snapshot(&self) -> SynapseProvenance {
        self.provenance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ncore_fixed::ExpSynapseParams;

    #[test]
    fn test_probe_records_totals() {
        let mut channels = SynapseChannels::new(2, &[ExpSynapseParams::passthrough(); 2]);
        channels.add_input(1, 0, Accum::from_num(1)).unwrap();
        channels.add_input(1, 1, Accum::from_num(2)).unwrap();

        let mut probe = InputProbe::new();
        probe.do_timestep_update(7, 8, &channels);
        assert_eq!(probe.samples()[0].totals, vec![Accum::ZERO, Accum::from_num(3)]);
        assert_eq!(probe.updated_ticks(), vec![7]);
        assert_eq!(probe.provenance().current_timer_tick, 8);
    }

    #[test]
    fn test_refusals() {
        assert!(!InputProbe::new().with_refused_resume(true).resume());
        let mut synapses = StaticSynapses::new();
        assert!(synapses.resume(5));
        assert_eq!(synapses.last_resume_time(), Some(5));
        assert!(!StaticSynapses::new().with_refused_resume(true).resume(0));
    }
}
