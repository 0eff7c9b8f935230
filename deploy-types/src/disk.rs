// SPDX-License-Identifier: GPL-3.0-only

//! Physical disk data model
//!
//! A [`DiskInfo`] is constructed read-only by a native provider at
//! enumeration time. Mutations happen only through advanced disk
//! operations against the underlying native disk; their effects are
//! observed by re-enumerating, never by mutating an existing record.

use enumflags2::{BitFlags, bitflags};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Connection bus of a physical disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BusType {
    #[default]
    Unknown,
    Scsi,
    Atapi,
    Ata,
    Sata,
    Sas,
    Nvme,
    Usb,
    Raid,
    Iscsi,
    Sd,
    Mmc,
    Virtual,
    FileBackedVirtual,
}

impl BusType {
    /// Stable name used by the selection expression language.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Scsi => "Scsi",
            Self::Atapi => "Atapi",
            Self::Ata => "Ata",
            Self::Sata => "Sata",
            Self::Sas => "Sas",
            Self::Nvme => "Nvme",
            Self::Usb => "Usb",
            Self::Raid => "Raid",
            Self::Iscsi => "Iscsi",
            Self::Sd => "Sd",
            Self::Mmc => "Mmc",
            Self::Virtual => "Virtual",
            Self::FileBackedVirtual => "FileBackedVirtual",
        }
    }
}

impl std::fmt::Display for BusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Partition table format of a disk.
///
/// `Raw` covers both uninitialised disks and formats the backend does
/// not report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PartitionStyle {
    #[default]
    Raw,
    Mbr,
    Gpt,
}

impl PartitionStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "Raw",
            Self::Mbr => "Mbr",
            Self::Gpt => "Gpt",
        }
    }
}

impl std::fmt::Display for PartitionStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health/availability flags reported for a disk.
#[bitflags]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiskFlag {
    ReadOnly = 1 << 0,
    Offline = 1 << 1,
    Uninitialised = 1 << 2,
}

/// Complete disk record (single source of truth)
///
/// Invariant: the partition style is consistent across all partitions
/// of one disk; providers materialize partitions with the disk's own
/// style.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiskInfo {
    // === Identity ===
    /// Backend-assigned unique identifier
    pub id: Uuid,

    /// Human-readable name (model string or backend friendly name)
    pub friendly_name: String,

    // === Physical properties ===
    /// Connection bus type
    pub bus_type: BusType,

    /// Total size in bytes
    pub size: u64,

    /// Logical sector size in bytes
    pub sector_size: u32,

    // === State ===
    /// Partition table format
    pub partition_style: PartitionStyle,

    /// Availability flags
    pub flags: BitFlags<DiskFlag>,
}

impl DiskInfo {
    pub fn is_read_only(&self) -> bool {
        self.flags.contains(DiskFlag::ReadOnly)
    }

    pub fn is_offline(&self) -> bool {
        self.flags.contains(DiskFlag::Offline)
    }

    pub fn is_uninitialised(&self) -> bool {
        self.flags.contains(DiskFlag::Uninitialised)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_disk() -> DiskInfo {
        DiskInfo {
            id: Uuid::new_v4(),
            friendly_name: "Samsung SSD 970 EVO".to_string(),
            bus_type: BusType::Nvme,
            size: 256 * 1024 * 1024 * 1024,
            sector_size: 512,
            partition_style: PartitionStyle::Gpt,
            flags: BitFlags::empty(),
        }
    }

    #[test]
    fn disk_info_serialization_round_trips() {
        let disk = sample_disk();
        let json = serde_json::to_string(&disk).unwrap();
        let deserialized: DiskInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(disk, deserialized);
    }

    #[test]
    fn flag_accessors_reflect_flag_bits() {
        let mut disk = sample_disk();
        assert!(!disk.is_read_only());

        disk.flags = DiskFlag::ReadOnly | DiskFlag::Uninitialised;
        assert!(disk.is_read_only());
        assert!(disk.is_uninitialised());
        assert!(!disk.is_offline());
    }

    #[test]
    fn bus_type_names_are_stable() {
        assert_eq!(BusType::Nvme.as_str(), "Nvme");
        assert_eq!(BusType::Usb.to_string(), "Usb");
    }
}
