//! Error types for connectivity generation

use thiserror::Error;

/// Result type for connectivity operations
pub type Result<T> = std::result::Result<T, ConnectError>;

/// Errors that can occur while synthesizing connectivity
///
/// None of these are retryable: any of them invalidates the whole
/// network expansion.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    /// The configuration stream ended inside a record
    #[error("Configuration stream truncated at offset {offset}: needed {needed} bytes, {available} available")]
    Truncated {
        /// Cursor position of the failed read
        offset: usize,
        /// Bytes required by the record
        needed: usize,
        /// Bytes left in the stream
        available: usize,
    },

    /// The generator heap has no room for a new allocation
    #[error("Generator heap exhausted: requested {requested} bytes, {available} of {capacity} free")]
    OutOfMemory {
        /// Bytes requested
        requested: usize,
        /// Bytes still free
        available: usize,
        /// Total heap size
        capacity: usize,
    },

    /// A parameter record holds a value the generator cannot use
    #[error("Invalid parameter {parameter}: {value} (expected {constraint})")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Offending value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// A generator id does not name any known variant
    #[error("Unknown {family} generator id {id}")]
    UnknownGenerator {
        /// Generator family ("connector" or "param")
        family: &'static str,
        /// Id read from the stream
        id: u32,
    },

    /// The synaptic matrix was sized too small for the generated synapses
    #[error("Matrix not sized correctly: row for pre-neuron {pre} is full (max row length {max_row_length})")]
    MatrixFull {
        /// Pre-neuron whose row overflowed
        pre: u32,
        /// Configured row capacity
        max_row_length: usize,
    },

    /// A neuron index or range lies outside what the target can store
    #[error("Index {index} out of range (max: {max})")]
    OutOfRange {
        /// Offending index
        index: u32,
        /// Largest accepted index
        max: u32,
    },
}

impl ConnectError {
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

    /// Whether the error means the synaptic matrix region is undersized
    pub fn is_capacity_violation(&self) -> bool {
        matches!(self, Self::MatrixFull { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConnectError::MatrixFull { pre: 7, max_row_length: 4 };
        let msg = err.to_string();
        assert!(msg.contains("pre-neuron 7"));
        assert!(err.is_capacity_violation());

        let err = ConnectError::invalid_parameter("n_values", "0", "> 0");
        assert!(err.to_string().contains("n_values"));
        assert!(!err.is_capacity_violation());
    }
}
