//! Connectivity expansion command

use std::path::PathBuf;

use clap::Args;
use ncore_connect::{
    encode_projections, expand_connections, ConfigCursor, ExpandSummary, GeneratorHeap,
    SynapticMatrix,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::commands::emit_json;
use crate::config::RunConfig;
use crate::error::CliResult;

/// Expand connectivity and summarise the matrix
#[derive(Args, Debug)]
pub struct ExpandCommand {
    /// Run configuration file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Include every decoded row in the output
    #[arg(long)]
    pub rows: bool,

    /// Write the summary here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// One decoded synapse
#[derive(Debug, Clone, Serialize)]
pub struct SynapseEntry {
    /// Post-neuron index local to the core
    pub index: u32,
    /// Synapse type
    pub synapse_type: u32,
    /// Delay in ticks
    pub delay: u32,
    /// Stored integer weight
    pub weight: u16,
}

/// Synapses of one pre-neuron
#[derive(Debug, Clone, Serialize)]
pub struct RowEntry {
    /// Pre-neuron index
    pub pre: u32,
    /// The row's synapses in stored order
    pub synapses: Vec<SynapseEntry>,
}

/// Output of `ncore expand`
#[derive(Debug, Clone, Serialize)]
pub struct ExpandReport {
    /// Connection blocks expanded
    pub blocks: u32,
    /// Synapses written
    pub synapses: usize,
    /// Generator heap high-water mark
    pub peak_heap_bytes: usize,
    /// Delays clamped into the storable range
    pub delay_clamps: u32,
    /// Decoded rows, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<RowEntry>>,
}

impl ExpandCommand {
    /// Execute the command
    pub fn execute(self) -> CliResult<()> {
        let config = RunConfig::load_from_file(&self.config)?;
        let (matrix, summary) = build_matrix(&config)?;

        let rows = self.rows.then(|| decode_rows(&matrix));
        let report = ExpandReport {
            blocks: summary.blocks,
            synapses: summary.synapses_written,
            peak_heap_bytes: summary.peak_heap_bytes,
            delay_clamps: matrix.n_delay_clamps(),
            rows,
        };
        emit_json(&serde_json::to_string_pretty(&report)?, self.output.as_deref())
    }
}

/// Encode the configured projections and expand them into a fresh matrix
pub fn build_matrix(config: &RunConfig) -> CliResult<(SynapticMatrix, ExpandSummary)> {
    let layout = config.layout()?;
    let projections = config.projection_specs();
    let stream = encode_projections(&projections);
    debug!("Connection stream is {} bytes for {} projections", stream.len(), projections.len());

    let heap = GeneratorHeap::new(config.run.heap_bytes);
    let mut matrix = SynapticMatrix::new(layout, config.pre_neurons(), config.synapses.max_row_length);
    let summary = expand_connections(&mut ConfigCursor::new(&stream), &heap, &mut matrix)?;

    info!(
        "Matrix holds {} synapses over {} rows",
        matrix.n_synapses(),
        matrix.n_rows()
    );
    Ok((matrix, summary))
}

fn decode_rows(matrix: &SynapticMatrix) -> Vec<RowEntry> {
    let layout = *matrix.layout();
    (0..matrix.n_rows())
        .map(|pre| RowEntry {
            pre,
            synapses: matrix
                .row(pre)
                .iter()
                .map(|word| {
                    let decoded = layout.decode(*word);
                    SynapseEntry {
                        index: decoded.index,
                        synapse_type: decoded.synapse_type,
                        delay: decoded.delay,
                        weight: decoded.weight,
                    }
                })
                .collect(),
        })
        .collect()
}
