// SPDX-License-Identifier: GPL-3.0-only

//! Volume data model

use serde::{Deserialize, Serialize};

/// Filesystem recognized on a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FileSystemType {
    #[default]
    Unknown,
    Ntfs,
    Fat,
    Fat32,
    ExFat,
    Refs,
    Udf,
}

impl FileSystemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Ntfs => "NTFS",
            Self::Fat => "FAT",
            Self::Fat32 => "FAT32",
            Self::ExFat => "exFAT",
            Self::Refs => "ReFS",
            Self::Udf => "UDF",
        }
    }
}

impl std::fmt::Display for FileSystemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One volume as observed by a backend.
///
/// In this toolkit's primary-partition model a volume correlates 1:1
/// with a partition; the pairing is exposed by the disk handle as
/// `volume_partitions` so callers never re-join the two collections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VolumeInfo {
    /// Backend volume name (device-style identifier)
    pub name: String,

    /// User-assigned label, empty if none
    pub label: String,

    /// Recognized filesystem
    pub file_system: FileSystemType,

    /// Size in bytes
    pub size: u64,

    /// Assigned mount paths (drive letters or directory mounts), 0..n
    pub mounts: Vec<String>,
}

/// Explicit volume-to-partition pairing.
///
/// Providers resolve this association with its own backend round trip;
/// it is not derived by joining the other two collections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VolumePartition {
    pub volume: VolumeInfo,
    pub partition: crate::partition::PartitionInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_info_serialization_round_trips() {
        let volume = VolumeInfo {
            name: r"\\?\Volume{3f0f6b25-2c1e-4c92-9d3b-6f2a8f1b7a10}".to_string(),
            label: "Windows".to_string(),
            file_system: FileSystemType::Ntfs,
            size: 128 * 1024 * 1024 * 1024,
            mounts: vec!["C:".to_string()],
        };

        let json = serde_json::to_string(&volume).unwrap();
        let deserialized: VolumeInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(volume, deserialized);
    }
}
