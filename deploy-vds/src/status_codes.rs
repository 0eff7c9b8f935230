// SPDX-License-Identifier: GPL-3.0-only

//! Disk status classification
//!
//! Status codes observed from the native backends are magic numbers,
//! not documented API surface. They live here as one lookup table so
//! no call site re-states them, and classification stays a
//! best-effort heuristic.

use enumflags2::BitFlags;
use serde::{Deserialize, Serialize};

use deploy_types::{DiskFlag, PartitionStyle};

/// Disk status as delivered by a backend.
///
/// Some backends report the field as a scalar, others as a
/// single-element array; both shapes are accepted and normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawStatus {
    Scalar(u32),
    Array(Vec<u32>),
}

impl RawStatus {
    /// Collapse to the scalar the rest of the engine works with.
    pub fn normalize(&self) -> u32 {
        match self {
            Self::Scalar(value) => *value,
            Self::Array(values) => values.first().copied().unwrap_or(0),
        }
    }
}

impl Default for RawStatus {
    fn default() -> Self {
        Self::Scalar(0)
    }
}

/// Status codes observed to mean the disk is not usable as a target.
const OFFLINE_STATUS_CODES: &[u32] = &[
    4, // offline
    5, // failed
    6, // missing
];

/// Status codes observed on disks with no partition table yet.
const UNINITIALISED_STATUS_CODES: &[u32] = &[
    7, // not initialized
];

/// Classify a raw status plus the reported partition style into disk
/// flags. A raw partition style implies `Uninitialised` even when the
/// status code alone does not say so.
pub fn classify_disk_flags(
    status: &RawStatus,
    style: PartitionStyle,
    read_only: bool,
) -> BitFlags<DiskFlag> {
    let code = status.normalize();
    let mut flags = BitFlags::empty();

    if read_only {
        flags |= DiskFlag::ReadOnly;
    }
    if OFFLINE_STATUS_CODES.contains(&code) {
        flags |= DiskFlag::Offline;
    }
    if UNINITIALISED_STATUS_CODES.contains(&code) || style == PartitionStyle::Raw {
        flags |= DiskFlag::Uninitialised;
    }

    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_and_single_element_array_normalize_alike() {
        assert_eq!(RawStatus::Scalar(4).normalize(), 4);
        assert_eq!(RawStatus::Array(vec![4]).normalize(), 4);
        assert_eq!(RawStatus::Array(vec![]).normalize(), 0);
    }

    #[test]
    fn raw_status_deserializes_from_both_shapes() {
        let scalar: RawStatus = serde_json::from_str("4").unwrap();
        let array: RawStatus = serde_json::from_str("[4]").unwrap();
        assert_eq!(scalar.normalize(), array.normalize());
    }

    #[test]
    fn offline_codes_classify_as_offline() {
        for code in [4u32, 5, 6] {
            let flags =
                classify_disk_flags(&RawStatus::Scalar(code), PartitionStyle::Gpt, false);
            assert!(flags.contains(DiskFlag::Offline), "code {code}");
            assert!(!flags.contains(DiskFlag::Uninitialised));
        }
    }

    #[test]
    fn raw_style_implies_uninitialised() {
        let flags = classify_disk_flags(&RawStatus::Scalar(1), PartitionStyle::Raw, false);
        assert_eq!(flags, BitFlags::from(DiskFlag::Uninitialised));
    }

    #[test]
    fn online_read_write_disk_has_no_flags() {
        let flags = classify_disk_flags(&RawStatus::Scalar(1), PartitionStyle::Gpt, false);
        assert!(flags.is_empty());
    }

    #[test]
    fn read_only_is_independent_of_status() {
        let flags = classify_disk_flags(&RawStatus::Scalar(1), PartitionStyle::Gpt, true);
        assert_eq!(flags, BitFlags::from(DiskFlag::ReadOnly));
    }
}
