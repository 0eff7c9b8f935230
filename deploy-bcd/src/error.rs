// SPDX-License-Identifier: GPL-3.0-only

use thiserror::Error;

/// Errors of the BCD store model.
///
/// Store reconstruction never partially succeeds: any structural
/// violation rejects the whole object with the key path that broke.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BcdError {
    /// Required subkey or value missing, or a key name malformed
    #[error("invalid store: {detail} (at {path})")]
    InvalidStore { path: String, detail: String },

    /// An element value does not match its declared format
    #[error("malformed element value at {path}: {detail}")]
    MalformedValue { path: String, detail: String },

    /// Hive load/unload failure
    #[error("hive mount failed: {0}")]
    Mount(String),
}

impl BcdError {
    pub fn invalid_store(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::InvalidStore {
            path: path.into(),
            detail: detail.into(),
        }
    }

    pub fn malformed_value(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::MalformedValue {
            path: path.into(),
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_store_names_the_offending_key() {
        let err = BcdError::invalid_store(r"Objects\{guid}\Description", "missing Type value");
        assert!(err.to_string().contains(r"Objects\{guid}\Description"));
        assert!(err.to_string().contains("missing Type value"));
    }
}
