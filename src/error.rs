//! Error taxonomy for the simulation core.
//!
//! Every failure mode is a variant of [`QecError`]:
//! - **InvalidGate**: malformed gate or qubit arguments; a caller bug.
//! - **InvalidLayout**: a broken code definition (non-commuting generators,
//!   dependent logicals), detected at layout construction and fatal.
//! - **NoPerfectMatching**: the matcher could not cover every node; an
//!   internal invariant violation that signals a graph-builder bug.
//! - **Configuration**: out-of-range probabilities, zero rounds and the
//!   like, rejected before any simulation work begins.
//!
//! None of these are recoverable mid-trial: a trial that fails propagates
//! the error and must not be counted as either success or failure.

use thiserror::Error;

/// Crate-wide error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QecError {
    /// Malformed gate or qubit arguments.
    #[error("invalid gate: {reason}")]
    InvalidGate { reason: String },

    /// A code layout that cannot define a meaningful experiment.
    #[error("invalid layout: {reason}")]
    InvalidLayout { reason: String },

    /// The decoding graph admits no perfect matching.
    #[error("no perfect matching over {nodes} nodes: {reason}")]
    NoPerfectMatching { nodes: usize, reason: String },

    /// Rejected experiment configuration.
    #[error("invalid configuration: {reason}")]
    Configuration { reason: String },
}

impl QecError {
    pub(crate) fn invalid_gate(reason: impl Into<String>) -> Self {
        QecError::InvalidGate { reason: reason.into() }
    }

    pub(crate) fn invalid_layout(reason: impl Into<String>) -> Self {
        QecError::InvalidLayout { reason: reason.into() }
    }

    pub(crate) fn configuration(reason: impl Into<String>) -> Self {
        QecError::Configuration { reason: reason.into() }
    }
}

/// Convenience alias used throughout the crate.
pub type QecResult<T> = Result<T, QecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_the_failure() {
        let err = QecError::invalid_gate("qubit 7 out of range for 5 qubits");
        assert_eq!(
            err.to_string(),
            "invalid gate: qubit 7 out of range for 5 qubits"
        );

        let err = QecError::NoPerfectMatching {
            nodes: 3,
            reason: "odd defect count".into(),
        };
        assert!(err.to_string().contains("3 nodes"));
    }

    #[test]
    fn test_errors_are_comparable() {
        let a = QecError::configuration("rounds must be positive");
        let b = QecError::configuration("rounds must be positive");
        assert_eq!(a, b);
    }
}
