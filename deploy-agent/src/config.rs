// SPDX-License-Identifier: GPL-3.0-only

//! Agent configuration
//!
//! One TOML file with a section per concern; every section is
//! optional and defaults match the deployment baseline.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use deploy_types::{PartitioningOptions, VdsOptions};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AgentConfig {
    pub partitioning: PartitioningOptions,
    pub vds: VdsOptions,
}

impl AgentConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Missing file means defaults, not an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
