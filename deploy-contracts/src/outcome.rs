// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};

/// Structured result of an advanced disk operation.
///
/// Long-running hardware operations report their outcome as a status
/// code plus an optional extended error instead of an exception; the
/// caller decides whether a non-success code is fatal to its sequence.
/// Retrying is caller policy, never done by the operation itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationOutcome {
    /// Backend status code; 0 is success
    pub status: i32,

    /// Backend-specific detail accompanying a non-success status
    pub extended_error: Option<String>,
}

impl OperationOutcome {
    pub fn success() -> Self {
        Self {
            status: 0,
            extended_error: None,
        }
    }

    pub fn failure(status: i32, extended_error: impl Into<String>) -> Self {
        Self {
            status,
            extended_error: Some(extended_error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 0
    }
}

impl std::fmt::Display for OperationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.extended_error {
            Some(detail) => write!(f, "status {:#x} ({detail})", self.status),
            None => write!(f, "status {:#x}", self.status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_round_trips() {
        let outcome =
            OperationOutcome::failure(0x80042413u32 as i32, "clean failed: media write protected");
        let json = serde_json::to_string(&outcome).expect("serialize outcome");
        let parsed: OperationOutcome = serde_json::from_str(&json).expect("deserialize outcome");
        assert_eq!(parsed, outcome);
    }

    #[test]
    fn zero_status_is_success() {
        assert!(OperationOutcome::success().is_success());
        assert!(!OperationOutcome::failure(1, "boom").is_success());
    }
}
