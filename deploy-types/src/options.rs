// SPDX-License-Identifier: GPL-3.0-only

//! Deployment configuration options
//!
//! Loaded from the agent's TOML configuration; every field has a
//! default so a missing file or section is valid.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::common::MIB;

fn default_reserved_size() -> u64 {
    499 * MIB
}

fn default_efi_size() -> u64 {
    499 * MIB
}

fn default_system_label() -> String {
    "SYSTEM".to_string()
}

fn default_windows_label() -> String {
    "Windows".to_string()
}

fn default_recovery_label() -> String {
    "Recovery".to_string()
}

/// Sizing and labels used when synthesizing a default partition
/// scheme for a disk the user supplied no explicit plan for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PartitioningOptions {
    /// BIOS system-reserved partition size in bytes
    pub bios_system_reserved_size: u64,

    /// EFI system partition size in bytes
    pub efi_size: u64,

    /// Recovery partition size in bytes; 0 disables the partition
    pub recovery_size: u64,

    /// Label of the boot/system partition
    pub system_label: String,

    /// Label of the installation partition
    pub installation_label: String,

    /// Label of the recovery partition
    pub recovery_label: String,
}

impl Default for PartitioningOptions {
    fn default() -> Self {
        Self {
            bios_system_reserved_size: default_reserved_size(),
            efi_size: default_efi_size(),
            recovery_size: 0,
            system_label: default_system_label(),
            installation_label: default_windows_label(),
            recovery_label: default_recovery_label(),
        }
    }
}

/// Caller-side retry policy for advanced disk operations.
///
/// The operations themselves never retry; the count and timeout here
/// govern how callers re-invoke a failed operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VdsOptions {
    /// Number of retries after the initial attempt
    pub retry_count: u32,

    /// Delay between attempts, in seconds
    pub retry_timeout_secs: u64,
}

impl VdsOptions {
    pub fn retry_timeout(&self) -> Duration {
        Duration::from_secs(self.retry_timeout_secs)
    }
}

impl Default for VdsOptions {
    fn default() -> Self {
        Self {
            retry_count: 3,
            retry_timeout_secs: 5,
        }
    }
}
