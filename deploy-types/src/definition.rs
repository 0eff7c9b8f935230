// SPDX-License-Identifier: GPL-3.0-only

//! Declarative partition target state
//!
//! A [`PartitionDefinition`] describes a partition a deployment task
//! intends to create, not one observed on hardware. It exposes both
//! partition-like and volume-like read accessors so dry validation can
//! use it wherever either shape is expected.

use enumflags2::{BitFlags, bitflags};
use serde::{Deserialize, Serialize};

use crate::partition_types::PartitionType;
use crate::volume::FileSystemType;

/// Deployment intent of a partition, orthogonal to its type.
#[bitflags]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartitionUsage {
    /// Holds the boot manager / boot loader
    Boot = 1 << 0,
    /// Firmware-required system partition
    System = 1 << 1,
    /// Receives the operating system image
    Installation = 1 << 2,
}

/// Target state for one partition in a partitioning plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartitionDefinition {
    /// Start offset in bytes; None lets the backend place the
    /// partition after the previous one
    pub offset: Option<u64>,

    /// Size in bytes; None claims the remaining disk space
    pub size: Option<u64>,

    /// Partition type to stamp
    pub partition_type: PartitionType,

    /// Deployment intent flags
    pub usage: BitFlags<PartitionUsage>,

    /// Filesystem to format with
    pub file_system: FileSystemType,

    /// Volume label
    pub label: String,

    /// Mount paths to assign after formatting
    pub mounts: Vec<String>,
}

impl PartitionDefinition {
    // Partition-like read surface.

    pub fn partition_type(&self) -> PartitionType {
        self.partition_type
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    pub fn size(&self) -> Option<u64> {
        self.size
    }

    // Volume-like read surface.

    pub fn file_system(&self) -> FileSystemType {
        self.file_system
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn mounts(&self) -> &[String] {
        &self.mounts
    }

    pub fn is_installation_target(&self) -> bool {
        self.usage.contains(PartitionUsage::Installation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_serialization_round_trips() {
        let definition = PartitionDefinition {
            offset: None,
            size: Some(499 * 1024 * 1024),
            partition_type: PartitionType::efi_system(),
            usage: PartitionUsage::System | PartitionUsage::Boot,
            file_system: FileSystemType::Fat32,
            label: "SYSTEM".to_string(),
            mounts: vec![],
        };

        let json = serde_json::to_string(&definition).unwrap();
        let deserialized: PartitionDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(definition, deserialized);
    }

    #[test]
    fn usage_is_orthogonal_to_type() {
        let definition = PartitionDefinition {
            offset: None,
            size: None,
            partition_type: PartitionType::microsoft_basic_data(),
            usage: PartitionUsage::Installation.into(),
            file_system: FileSystemType::Ntfs,
            label: "Windows".to_string(),
            mounts: vec!["C:".to_string()],
        };

        assert!(definition.is_installation_target());
        assert!(!definition.usage.contains(PartitionUsage::System));
    }
}
