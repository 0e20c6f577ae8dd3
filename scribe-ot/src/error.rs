//! Error taxonomy for the OT core.
//!
//! Every variant is recoverable at the session boundary: the embedder
//! discards local pending state and refetches authoritative content.

use thiserror::Error;

/// Errors produced by operation construction, transformation, and application.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OtError {
    /// Malformed operation, rejected before entering any queue.
    #[error("invalid operation: {reason}")]
    Validation { reason: String },

    /// The two operations were generated against different document versions.
    ///
    /// The caller must resynchronize rather than guess.
    #[error("version mismatch: operation based on {actual}, expected base {expected}")]
    VersionMismatch { expected: u64, actual: u64 },

    /// Position/length exceeds current content bounds.
    #[error("range {position}..{position}+{length} exceeds content length {content_len}")]
    OutOfRange {
        position: usize,
        length: usize,
        content_len: usize,
    },
}

impl OtError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message() {
        let err = OtError::validation("insert text must be non-empty");
        assert_eq!(
            err.to_string(),
            "invalid operation: insert text must be non-empty"
        );
    }

    #[test]
    fn test_version_mismatch_message() {
        let err = OtError::VersionMismatch {
            expected: 7,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "version mismatch: operation based on 3, expected base 7"
        );
    }

    #[test]
    fn test_out_of_range_message() {
        let err = OtError::OutOfRange {
            position: 5,
            length: 2,
            content_len: 6,
        };
        assert_eq!(err.to_string(), "range 5..5+2 exceeds content length 6");
    }
}
