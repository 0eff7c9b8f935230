// SPDX-License-Identifier: GPL-3.0-only

//! Partition data model

use enumflags2::{BitFlags, bitflags};
use serde::{Deserialize, Serialize};

use crate::disk::PartitionStyle;
use crate::partition_types::PartitionType;

/// Boot-related flags of a partition.
#[bitflags]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartitionFlag {
    /// MBR active flag
    Active = 1 << 0,
    Boot = 1 << 1,
    System = 1 << 2,
}

/// One partition as observed on a disk.
///
/// `offset`/`size` of sibling partitions never overlap; that is a
/// backend contract produced by the hardware, not enforced here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartitionInfo {
    /// 1-based partition index. May shift across re-enumeration;
    /// operations key on `offset` instead.
    pub index: u32,

    /// Start offset in bytes from the beginning of the disk
    pub offset: u64,

    /// Size in bytes
    pub size: u64,

    /// Partition table style, inherited from the owning disk
    pub style: PartitionStyle,

    /// Partition type (GUID for GPT, id byte for MBR)
    pub partition_type: PartitionType,

    /// Boot-related flags
    pub flags: BitFlags<PartitionFlag>,

    /// Partition name (GPT only)
    pub name: Option<String>,
}

impl PartitionInfo {
    /// Exclusive end offset in bytes.
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.size)
    }

    pub fn is_active(&self) -> bool {
        self.flags.contains(PartitionFlag::Active)
    }
}
