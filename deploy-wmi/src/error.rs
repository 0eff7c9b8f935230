// SPDX-License-Identifier: GPL-3.0-only

use thiserror::Error;

use deploy_contracts::DeployError;

/// Backend-local errors of the management-query provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WmiError {
    #[error("management query failed: {0}")]
    QueryFailed(String),

    #[error("object {0} was already released")]
    ObjectReleased(String),

    #[error("property {property} missing or of unexpected shape on {class}")]
    InvalidProperty { class: String, property: String },

    #[error("operation cancelled")]
    Cancelled,
}

impl From<WmiError> for DeployError {
    fn from(err: WmiError) -> Self {
        match err {
            WmiError::Cancelled => DeployError::cancelled("management query cancelled"),
            WmiError::ObjectReleased(_) => DeployError::internal(err.to_string()),
            WmiError::InvalidProperty { .. } => DeployError::backend(err.to_string()),
            WmiError::QueryFailed(detail) => DeployError::backend(detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deploy_contracts::DeployErrorKind;

    #[test]
    fn query_failure_maps_to_backend() {
        let err: DeployError = WmiError::QueryFailed("provider rpc fault".to_string()).into();
        assert_eq!(err.kind, DeployErrorKind::Backend);
    }

    #[test]
    fn invalid_property_carries_class_and_name() {
        let err = WmiError::InvalidProperty {
            class: "VirtualDisk".to_string(),
            property: "Size".to_string(),
        };
        assert!(err.to_string().contains("Size"));
        assert!(err.to_string().contains("VirtualDisk"));
    }
}
