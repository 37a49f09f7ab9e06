//! Simulation run command

use std::path::PathBuf;

use clap::Args;
use ncore_runtime::{
    Accumulator, InputProbe, InputSample, ProvenanceRecord, Scheduler, StaticSynapses,
};
use serde::Serialize;
use tracing::info;

use crate::commands::{emit_json, expand::build_matrix};
use crate::config::RunConfig;
use crate::error::CliResult;

/// Expand connectivity and run the scheduler
#[derive(Args, Debug)]
pub struct RunCommand {
    /// Run configuration file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Resume for this many extra ticks after the first pause
    #[arg(long)]
    pub resume_ticks: Option<u32>,

    /// Include recorded input samples in the report
    #[arg(long)]
    pub samples: bool,
}

/// Output of `ncore run`
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Ticks processed across every run segment
    pub ticks_run: u32,
    /// Synapses in the expanded matrix
    pub synapses: usize,
    /// Final provenance counters
    pub provenance: ProvenanceRecord,
    /// Provenance in its fixed word layout
    pub provenance_words: Vec<u32>,
    /// Largest total input seen per synapse type
    pub peak_input: Vec<f64>,
    /// Total input per synapse type at the last update
    pub final_input: Vec<f64>,
    /// Recorded samples, one list per pause
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded: Option<Vec<Vec<InputSample>>>,
}

impl RunCommand {
    /// Execute the command
    pub fn execute(self) -> CliResult<()> {
        let config = RunConfig::load_from_file(&self.config)?;
        let (matrix, summary) = build_matrix(&config)?;
        let accumulator = Accumulator::new(&config.accumulator_config()?)?;

        let mut scheduler = Scheduler::new(
            config.scheduler_config(),
            accumulator,
            matrix,
            InputProbe::new(),
            StaticSynapses::new(),
        )?;
        scheduler.start()?;

        let mut ticks_run = scheduler.run_to_pause(|time| config.spikes_at(time))?;
        info!("Paused after {} ticks", ticks_run);

        if let Some(extra) = self.resume_ticks {
            scheduler.resume(extra)?;
            let resumed = scheduler.run_to_pause(|time| config.spikes_at(time))?;
            info!("Paused again after {} more ticks", resumed);
            ticks_run += resumed;
        }

        let provenance = scheduler.exit()?;
        let report = RunReport {
            ticks_run,
            synapses: summary.synapses_written,
            provenance,
            provenance_words: provenance.to_words().to_vec(),
            peak_input: peak_input(scheduler.neuron(), config.channels.len()),
            final_input: scheduler
                .neuron()
                .samples()
                .last()
                .map(|sample| sample.totals.iter().map(|total| total.to_num::<f64>()).collect())
                .unwrap_or_else(|| vec![0.0; config.channels.len()]),
            recorded: self.samples.then(|| scheduler.recorder().checkpoints().to_vec()),
        };

        if provenance.n_background_queue_overloads > 0 {
            tracing::warn!(
                "{} ticks lost their background update",
                provenance.n_background_queue_overloads
            );
        }
        emit_json(&serde_json::to_string_pretty(&report)?, self.output.as_deref())
    }
}

fn peak_input(probe: &InputProbe, n_types: usize) -> Vec<f64> {
    let mut peaks = vec![0.0_f64; n_types];
    for sample in probe.samples() {
        for (peak, total) in peaks.iter_mut().zip(&sample.totals) {
            *peak = peak.max(total.to_num::<f64>());
        }
    }
    peaks
}
