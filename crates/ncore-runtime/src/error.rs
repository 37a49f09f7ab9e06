//! Error types for the per-core runtime

use ncore_connect::ConnectError;
use thiserror::Error;

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Errors that can occur in the per-core runtime
///
/// Admission-queue overflow is not an error: it is absorbed and reported
/// through provenance.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// Connectivity expansion failed
    #[error("Connectivity error: {source}")]
    Connect {
        #[from]
        /// Source connectivity error
        source: ConnectError,
    },

    /// Invalid runtime configuration
    #[error("Invalid runtime configuration: {reason}")]
    InvalidConfiguration {
        /// Reason for invalid configuration
        reason: String,
    },

    /// Invalid parameter value
    #[error("Invalid parameter {parameter}: {value} (expected {constraint})")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Invalid value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Operation not allowed in the scheduler's current state
    #[error("Invalid scheduler state: expected {expected}, found {actual}")]
    InvalidState {
        /// State the operation requires
        expected: String,
        /// State the scheduler is in
        actual: String,
    },

    /// A collaborator refused to resume
    #[error("The {subsystem} subsystem refused to resume")]
    ResumeRefused {
        /// Subsystem that refused
        subsystem: &'static str,
    },

    /// A neuron index outside the local population
    #[error("Neuron {neuron} out of range (population size: {n_neurons})")]
    NeuronOutOfRange {
        /// Offending neuron index
        neuron: u32,
        /// Size of the local population
        n_neurons: u32,
    },
}

impl RuntimeError {
    /// Create an invalid configuration error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(
        parameter: impl Into<String>,
        value: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            constraint: constraint.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(expected: impl Into<String>, actual: impl ToString) -> Self {
        Self::InvalidState {
            expected: expected.into(),
            actual: actual.to_string(),
        }
    }

    /// Whether the error ends the run
    ///
    /// Configuration and resource errors are fatal. State and index errors
    /// are caller mistakes that leave the scheduler untouched.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Connect { .. }
            | Self::InvalidConfiguration { .. }
            | Self::InvalidParameter { .. }
            | Self::ResumeRefused { .. } => true,
            Self::InvalidState { .. } | Self::NeuronOutOfRange { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = RuntimeError::invalid_config("no neurons");
        assert!(matches!(err, RuntimeError::InvalidConfiguration { .. }));
        assert!(err.is_fatal());

        let err = RuntimeError::invalid_state("Running", "Paused");
        assert_eq!(err.to_string(), "Invalid scheduler state: expected Running, found Paused");
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_connect_errors_are_fatal() {
        let err: RuntimeError = ConnectError::MatrixFull { pre: 1, max_row_length: 2 }.into();
        assert!(err.is_fatal());
        assert!(err.to_string().starts_with("Connectivity error"));
        assert!(RuntimeError::ResumeRefused { subsystem: "neuron" }.is_fatal());
    }
}
