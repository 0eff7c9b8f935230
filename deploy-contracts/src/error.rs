// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure taxonomy shared across the disk engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployErrorKind {
    /// Configuration/contract violation; fail fast, never retried
    InvalidInput,
    NotFound,
    Unsupported,
    /// Cancellation observed via the caller's token
    Cancelled,
    /// Native backend call failed
    Backend,
    /// Backend unavailable at construction time; fatal, no fallback
    Unavailable,
    /// Malformed store or value (BCD parse, expression compile)
    ParseFailure,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind:?}: {message}")]
pub struct DeployError {
    pub kind: DeployErrorKind,
    pub message: String,
}

impl DeployError {
    pub fn new(kind: DeployErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(DeployErrorKind::InvalidInput, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(DeployErrorKind::NotFound, message)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(DeployErrorKind::Unsupported, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(DeployErrorKind::Cancelled, message)
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::new(DeployErrorKind::Backend, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(DeployErrorKind::Unavailable, message)
    }

    pub fn parse_failure(message: impl Into<String>) -> Self {
        Self::new(DeployErrorKind::ParseFailure, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(DeployErrorKind::Internal, message)
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == DeployErrorKind::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deploy_error_round_trips() {
        let error = DeployError::backend("format returned status 0x80042405");
        let json = serde_json::to_string(&error).expect("serialize error");
        let parsed: DeployError = serde_json::from_str(&json).expect("deserialize error");
        assert_eq!(parsed, error);
    }

    #[test]
    fn display_includes_kind_and_message() {
        let error = DeployError::invalid_input("step carries no predicate");
        assert_eq!(
            error.to_string(),
            "InvalidInput: step carries no predicate"
        );
    }
}
