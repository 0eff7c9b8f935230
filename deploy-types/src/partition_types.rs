// SPDX-License-Identifier: GPL-3.0-only

//! Partition type catalog and normalization
//!
//! GPT identifies partition types by GUID, MBR by a single id byte.
//! [`PartitionType`] carries whichever representation the backend
//! reported and normalizes both into a comparable [`PartitionKind`]
//! via a catalog loaded from `resources/partition_types.toml`.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Semantic category of a partition type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PartitionKind {
    EfiSystem,
    MicrosoftReserved,
    MicrosoftBasicData,
    WindowsRecovery,
    BiosBoot,
    LinuxFilesystem,
    LinuxSwap,
    LinuxLvm,
    Extended,
    #[default]
    Unknown,
}

impl PartitionKind {
    /// Covers the "all Microsoft data" selection category.
    pub fn is_microsoft(&self) -> bool {
        matches!(
            self,
            Self::MicrosoftReserved | Self::MicrosoftBasicData | Self::WindowsRecovery
        )
    }

    /// Covers the "all Linux" selection category.
    pub fn is_linux(&self) -> bool {
        matches!(self, Self::LinuxFilesystem | Self::LinuxSwap | Self::LinuxLvm)
    }
}

/// Partition type as reported by a backend: a GUID for GPT disks, an
/// id byte for MBR disks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartitionType {
    Gpt(Uuid),
    Mbr(u8),
}

impl PartitionType {
    pub fn efi_system() -> Self {
        Self::Gpt(Uuid::from_u128(0xc12a7328_f81f_11d2_ba4b_00a0c93ec93b))
    }

    pub fn microsoft_reserved() -> Self {
        Self::Gpt(Uuid::from_u128(0xe3c9e316_0b5c_4db8_817d_f92df00215ae))
    }

    pub fn microsoft_basic_data() -> Self {
        Self::Gpt(Uuid::from_u128(0xebd0a0a2_b9e5_4433_87c0_68b6b72699c7))
    }

    pub fn windows_recovery() -> Self {
        Self::Gpt(Uuid::from_u128(0xde94bba4_06d1_4d40_a16a_bfd50179d6ac))
    }

    /// Normalize to the semantic category. Types absent from the
    /// catalog map to [`PartitionKind::Unknown`].
    pub fn kind(&self) -> PartitionKind {
        match self {
            Self::Gpt(guid) => GPT_KINDS.get(guid).copied().unwrap_or_default(),
            Self::Mbr(id) => MBR_KINDS.get(id).copied().unwrap_or_default(),
        }
    }

    /// Catalog display name, if the type is known.
    pub fn name(&self) -> Option<&'static str> {
        PARTITION_TYPE_CATALOG
            .iter()
            .find(|e| match self {
                Self::Gpt(guid) => e.parsed_guid() == Some(*guid),
                Self::Mbr(id) => e.parsed_mbr_id() == Some(*id),
            })
            .map(|e| e.name.as_str())
    }

    pub fn is_microsoft(&self) -> bool {
        self.kind().is_microsoft()
    }

    pub fn is_linux(&self) -> bool {
        self.kind().is_linux()
    }
}

/// One catalog row from `resources/partition_types.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PartitionTypeEntry {
    /// Partition table type, `gpt` or `mbr`
    pub table_type: String,
    /// GUID (gpt) or hex id byte (mbr)
    pub id: String,
    /// Display name
    pub name: String,
    /// Semantic category
    pub kind: PartitionKind,
}

impl PartitionTypeEntry {
    fn parsed_guid(&self) -> Option<Uuid> {
        (self.table_type == "gpt")
            .then(|| Uuid::parse_str(&self.id).ok())
            .flatten()
    }

    fn parsed_mbr_id(&self) -> Option<u8> {
        (self.table_type == "mbr")
            .then(|| {
                self.id
                    .strip_prefix("0x")
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok())
            })
            .flatten()
    }
}

const CATALOG_TOML: &str = include_str!("../resources/partition_types.toml");

#[derive(Deserialize)]
struct Catalog {
    types: Vec<PartitionTypeEntry>,
}

/// Known partition types, loaded once from the embedded catalog.
pub static PARTITION_TYPE_CATALOG: LazyLock<Vec<PartitionTypeEntry>> = LazyLock::new(|| {
    toml::from_str::<Catalog>(CATALOG_TOML)
        .expect("embedded partition type catalog must parse")
        .types
});

static GPT_KINDS: LazyLock<HashMap<Uuid, PartitionKind>> = LazyLock::new(|| {
    PARTITION_TYPE_CATALOG
        .iter()
        .filter_map(|e| e.parsed_guid().map(|g| (g, e.kind)))
        .collect()
});

static MBR_KINDS: LazyLock<HashMap<u8, PartitionKind>> = LazyLock::new(|| {
    PARTITION_TYPE_CATALOG
        .iter()
        .filter_map(|e| e.parsed_mbr_id().map(|id| (id, e.kind)))
        .collect()
});
