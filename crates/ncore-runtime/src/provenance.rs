//! Provenance counters collected at shutdown
//!
//! A [`ProvenanceRecord`] is a point-in-time snapshot. Its word layout is
//! fixed so a host can read it back without schema negotiation:
//!
//! ```text
//! neuron   : current_timer_tick, n_timestep_updates, n_pauses, n_resumes
//! synapse  : n_structural_updates, n_resumes
//! spikes   : n_received, n_input_buffer_overflows, n_late_spikes,
//!            n_pre_synaptic_events, n_synapses_delivered,
//!            n_weight_saturations, max_filled_input_buffer
//! scheduler: max_backgrounds_queued, n_background_queue_overloads
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Counters contributed by the neuron model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NeuronProvenance {
    /// Timer count of the last update
    pub current_timer_tick: u32,
    /// Timestep updates performed
    pub n_timestep_updates: u32,
    /// Pauses observed
    pub n_pauses: u32,
    /// Successful resumes
    pub n_resumes: u32,
}

/// Counters contributed by the synapse subsystem
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SynapseProvenance {
    /// Structural plasticity updates performed
    pub n_structural_updates: u32,
    /// Successful resumes
    pub n_resumes: u32,
}

/// Counters of the spike input path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpikeProvenance {
    /// Spikes offered to the input buffer
    pub n_received: u32,
    /// Spikes rejected by a full input buffer
    pub n_input_buffer_overflows: u32,
    /// Spikes still buffered at tick entry, dropped
    pub n_late_spikes: u32,
    /// Spikes expanded through the synaptic matrix
    pub n_pre_synaptic_events: u32,
    /// Synapses written into the ring buffer
    pub n_synapses_delivered: u32,
    /// Ring-buffer additions that saturated
    pub n_weight_saturations: u32,
    /// Highest input buffer fill level
    pub max_filled_input_buffer: u32,
}

/// Combined provenance of one core
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProvenanceRecord {
    /// Neuron model counters
    pub neuron: NeuronProvenance,
    /// Synapse subsystem counters
    pub synapse: SynapseProvenance,
    /// Spike input counters
    pub spikes: SpikeProvenance,
    /// Highest number of background jobs queued at once
    pub max_backgrounds_queued: u32,
    /// Ticks whose background work was rejected
    pub n_background_queue_overloads: u32,
}

impl ProvenanceRecord {
    /// Number of words in the fixed layout
    pub const WORDS: usize = 15;

    /// Encode in the fixed word layout
    pub fn to_words(&self) -> [u32; Self::WORDS] {
        let n = &self.neuron;
        let sy = &self.synapse;
        let sp = &self.spikes;
        [
            n.current_timer_tick,
            n.n_timestep_updates,
            n.n_pauses,
            n.n_resumes,
            sy.n_structural_updates,
            sy.n_resumes,
            sp.n_received,
            sp.n_input_buffer_overflows,
            sp.n_late_spikes,
            sp.n_pre_synaptic_events,
            sp.n_synapses_delivered,
            sp.n_weight_saturations,
            sp.max_filled_input_buffer,
            self.max_backgrounds_queued,
            self.n_background_queue_overloads,
        ]
    }

    /// Encode as little-endian bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_words().iter().flat_map(|word| word.to_le_bytes()).collect()
    }
}

/// Destination for provenance at shutdown
pub trait ProvenanceSink {
    /// Accept one record
    fn store(&mut self, record: &ProvenanceRecord);
}

impl ProvenanceSink for Vec<ProvenanceRecord> {
    fn store(&mut self, record: &ProvenanceRecord) {
        self.push(*record);
    }
}
