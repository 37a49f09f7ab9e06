//! ncore CLI crate
//!
//! Drives a single simulated core from a TOML run description:
//! - `expand` encodes the configured projections as a connection stream and
//!   expands it into a synaptic matrix, printing a summary.
//! - `run` expands the same way, then runs the timestep scheduler with the
//!   configured stimulus, optionally resumes once, and prints a JSON report
//!   with the final provenance.
//!
//! The binary (src/main.rs) wires up logging and argument parsing and calls
//! [`NcoreCli::execute`].

pub mod commands;
pub mod config;
pub mod error;

pub use commands::NcoreCli;
