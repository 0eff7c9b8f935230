// SPDX-License-Identifier: GPL-3.0-only

//! Native service object surface
//!
//! These traits model the service/provider/pack/disk object hierarchy
//! of the virtual disk service. Implementations own the underlying
//! native handles exclusively and release them when dropped; no raw
//! handle is ever shared across two owners.

use std::sync::Arc;

use enumflags2::{BitFlags, bitflags, make_bitflags};
use uuid::Uuid;

use deploy_contracts::{CleanFlag, FormatRequest, GptPartitionParams, MbrPartitionParams};
use deploy_types::{
    BusType, PartitionInfo, PartitionStyle, VolumeInfo, VolumePartition,
};

use crate::cursor::NativeCursor;
use crate::error::VdsError;
use crate::status_codes::RawStatus;

/// Loads the native service object.
///
/// The indirection keeps the provider construction testable and leaves
/// room for out-of-process loaders.
pub trait ServiceLoader: Send + Sync {
    fn load_service(&self) -> Result<Arc<dyn VdsService>, VdsError>;
}

/// Kind of a registered provider object.
#[bitflags]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Software = 1 << 0,
    Hardware = 1 << 1,
    VirtualDisk = 1 << 2,
}

/// Provider kinds the disk enumeration walks.
pub const ENUMERATED_PROVIDER_KINDS: BitFlags<ProviderKind> =
    make_bitflags!(ProviderKind::{Software | VirtualDisk});

/// The loaded service object.
pub trait VdsService: Send + Sync {
    /// Block until the service signals readiness; returns the native
    /// status code, 0 meaning ready. Any other value is fatal to the
    /// provider.
    fn wait_for_ready(&self) -> i32;

    /// Open a cursor over registered providers of the given kinds.
    fn query_providers(
        &self,
        kinds: BitFlags<ProviderKind>,
    ) -> Result<Box<dyn NativeCursor<Item = Arc<dyn VdsProviderHandle>>>, VdsError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VdsProviderProperties {
    pub name: String,
    pub kind: ProviderKind,
}

pub trait VdsProviderHandle: Send + Sync {
    fn properties(&self) -> VdsProviderProperties;

    fn query_packs(&self) -> Result<Box<dyn NativeCursor<Item = Arc<dyn VdsPackHandle>>>, VdsError>;
}

pub trait VdsPackHandle: Send + Sync {
    fn query_disks(&self) -> Result<Box<dyn NativeCursor<Item = Arc<dyn VdsDiskHandle>>>, VdsError>;
}

/// Raw disk properties as the native service reports them.
///
/// `status` keeps the backend's undecoded shape; classification into
/// disk flags happens in [`crate::status_codes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VdsDiskProperties {
    pub id: Uuid,
    pub friendly_name: String,
    pub bus_type: BusType,
    pub size: u64,
    pub sector_size: u32,
    pub partition_style: PartitionStyle,
    pub status: RawStatus,
    pub read_only: bool,
}

/// Partition-table-specific create-partition parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreatePartitionSpec {
    Mbr(MbrPartitionParams),
    Gpt(GptPartitionParams),
}

/// One disk object inside a pack.
///
/// Query methods are blocking native calls; the provider offloads
/// them to the blocking pool. Mutating methods return an async
/// operation object completed by a native callback.
pub trait VdsDiskHandle: Send + Sync {
    fn properties(&self) -> Result<VdsDiskProperties, VdsError>;

    fn partitions(&self) -> Result<Vec<PartitionInfo>, VdsError>;

    fn volumes(&self) -> Result<Vec<VolumeInfo>, VdsError>;

    fn volume_partitions(&self) -> Result<Vec<VolumePartition>, VdsError>;

    fn clean(&self, flags: BitFlags<CleanFlag>) -> Result<Arc<dyn VdsAsyncOperation>, VdsError>;

    fn create_partition(
        &self,
        offset: u64,
        size: u64,
        spec: CreatePartitionSpec,
    ) -> Result<Arc<dyn VdsAsyncOperation>, VdsError>;

    fn format_partition(
        &self,
        offset: u64,
        request: FormatRequest,
    ) -> Result<Arc<dyn VdsAsyncOperation>, VdsError>;

    fn assign_drive_letter(&self, offset: u64, letter: char) -> Result<(), VdsError>;

    fn delete_drive_letter(&self, offset: u64, letter: char) -> Result<(), VdsError>;

    fn drive_letter(&self, offset: u64) -> Result<Option<char>, VdsError>;
}

/// Native async operation handle.
///
/// The native side invokes the registered callback exactly once with
/// the final status code and optional extended error.
pub trait VdsAsyncOperation: Send + Sync {
    fn on_complete(&self, callback: Box<dyn FnOnce(i32, Option<String>) + Send>);
}
