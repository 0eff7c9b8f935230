// SPDX-License-Identifier: GPL-3.0-only

//! Numeric property code tables
//!
//! The management backend encodes bus type, partition style and
//! operational status as numeric codes. The offline/uninitialised
//! codes in particular are observed backend behavior rather than
//! documented surface; they are kept in one place as best-effort
//! lookup tables.

use enumflags2::BitFlags;

use deploy_types::{BusType, DiskFlag, PartitionStyle};

pub fn bus_type_from_code(code: u32) -> BusType {
    match code {
        1 => BusType::Scsi,
        2 => BusType::Atapi,
        3 => BusType::Ata,
        7 => BusType::Usb,
        8 => BusType::Raid,
        9 => BusType::Iscsi,
        10 => BusType::Sas,
        11 => BusType::Sata,
        12 => BusType::Sd,
        13 => BusType::Mmc,
        14 => BusType::Virtual,
        15 => BusType::FileBackedVirtual,
        17 => BusType::Nvme,
        _ => BusType::Unknown,
    }
}

pub fn partition_style_from_code(code: u32) -> PartitionStyle {
    match code {
        1 => PartitionStyle::Mbr,
        2 => PartitionStyle::Gpt,
        _ => PartitionStyle::Raw,
    }
}

/// Operational status codes observed to mean "not usable as a
/// deployment target".
const OFFLINE_STATUS_CODES: &[u32] = &[
    0xD010, // offline
    0xD011, // failed media
    0xD012, // missing
];

/// Health status code observed on disks without a partition table.
const UNINITIALISED_STATUS_CODES: &[u32] = &[0xD013];

pub fn classify_disk_flags(
    operational_status: u32,
    style: PartitionStyle,
    read_only: bool,
    offline: bool,
) -> BitFlags<DiskFlag> {
    let mut flags = BitFlags::empty();

    if read_only {
        flags |= DiskFlag::ReadOnly;
    }
    if offline || OFFLINE_STATUS_CODES.contains(&operational_status) {
        flags |= DiskFlag::Offline;
    }
    if UNINITIALISED_STATUS_CODES.contains(&operational_status) || style == PartitionStyle::Raw {
        flags |= DiskFlag::Uninitialised;
    }

    flags
}

pub fn file_system_from_name(name: &str) -> deploy_types::FileSystemType {
    use deploy_types::FileSystemType;
    match name.to_ascii_uppercase().as_str() {
        "NTFS" => FileSystemType::Ntfs,
        "FAT" | "FAT16" => FileSystemType::Fat,
        "FAT32" => FileSystemType::Fat32,
        "EXFAT" => FileSystemType::ExFat,
        "REFS" => FileSystemType::Refs,
        "UDF" => FileSystemType::Udf,
        _ => FileSystemType::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_bus_codes_map_and_unknown_falls_back() {
        assert_eq!(bus_type_from_code(17), BusType::Nvme);
        assert_eq!(bus_type_from_code(7), BusType::Usb);
        assert_eq!(bus_type_from_code(11), BusType::Sata);
        assert_eq!(bus_type_from_code(999), BusType::Unknown);
    }

    #[test]
    fn partition_style_codes_default_to_raw() {
        assert_eq!(partition_style_from_code(1), PartitionStyle::Mbr);
        assert_eq!(partition_style_from_code(2), PartitionStyle::Gpt);
        assert_eq!(partition_style_from_code(0), PartitionStyle::Raw);
        assert_eq!(partition_style_from_code(57), PartitionStyle::Raw);
    }

    #[test]
    fn observed_offline_codes_classify_as_offline() {
        let flags = classify_disk_flags(0xD010, PartitionStyle::Gpt, false, false);
        assert_eq!(flags, BitFlags::from(DiskFlag::Offline));
    }

    #[test]
    fn explicit_offline_bool_wins_even_with_healthy_status() {
        let flags = classify_disk_flags(0, PartitionStyle::Gpt, false, true);
        assert!(flags.contains(DiskFlag::Offline));
    }

    #[test]
    fn raw_style_is_uninitialised() {
        let flags = classify_disk_flags(0, PartitionStyle::Raw, true, false);
        assert!(flags.contains(DiskFlag::Uninitialised));
        assert!(flags.contains(DiskFlag::ReadOnly));
    }
}
