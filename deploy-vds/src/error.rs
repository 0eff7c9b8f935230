// SPDX-License-Identifier: GPL-3.0-only

use thiserror::Error;

use deploy_contracts::DeployError;

/// Backend-local errors of the virtual-disk-service provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VdsError {
    /// The service readiness wait returned a non-zero status
    #[error("disk service not ready (status {status:#x})")]
    ServiceNotReady { status: i32 },

    #[error("native call failed: {0}")]
    Native(String),

    #[error("object is gone: {0}")]
    ObjectGone(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl From<VdsError> for DeployError {
    fn from(err: VdsError) -> Self {
        match err {
            VdsError::ServiceNotReady { .. } => DeployError::unavailable(err.to_string()),
            VdsError::Cancelled => DeployError::cancelled("virtual-disk-service call cancelled"),
            VdsError::ObjectGone(detail) => DeployError::not_found(detail),
            VdsError::Native(detail) => DeployError::backend(detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deploy_contracts::DeployErrorKind;

    #[test]
    fn not_ready_maps_to_unavailable() {
        let err: DeployError = VdsError::ServiceNotReady { status: 0x10 }.into();
        assert_eq!(err.kind, DeployErrorKind::Unavailable);
        assert!(err.message.contains("0x10"));
    }

    #[test]
    fn cancellation_maps_to_cancelled() {
        let err: DeployError = VdsError::Cancelled.into();
        assert!(err.is_cancelled());
    }
}
