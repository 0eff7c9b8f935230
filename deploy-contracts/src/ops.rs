// SPDX-License-Identifier: GPL-3.0-only

//! Mutating disk operation contracts
//!
//! All long-running operations are async, cancellable, and report a
//! structured [`OperationOutcome`] instead of throwing on partial
//! failure. Contract violations (wrong partition-style overload,
//! unknown disk) are errors, not outcomes. Drive-letter accessors are
//! synchronous and keyed by partition offset because offsets are
//! stable across re-enumeration while indexes may shift.

use async_trait::async_trait;
use enumflags2::{BitFlags, bitflags};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use deploy_types::FileSystemType;

use crate::error::DeployError;
use crate::outcome::OperationOutcome;

/// Flags of the destructive clean operation.
///
/// `IgnoreErrors` affects only the calling task's error policy; the
/// operation itself still reports its real outcome.
#[bitflags]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CleanFlag {
    Force = 1 << 0,
    ForceOem = 1 << 1,
    FullClean = 1 << 2,
    IgnoreErrors = 1 << 3,
}

/// Flags of the format operation.
#[bitflags]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormatFlag {
    Force = 1 << 0,
    Quick = 1 << 1,
    EnableCompression = 1 << 2,
}

/// Parameters of the MBR create-partition overload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MbrPartitionParams {
    /// MBR partition id byte
    pub partition_type: u8,

    /// Mark the partition active in the MBR
    pub active: bool,
}

/// Parameters of the GPT create-partition overload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GptPartitionParams {
    /// GPT partition type GUID
    pub partition_type: Uuid,

    /// GPT partition name
    pub name: Option<String>,
}

/// Everything the format operation needs besides the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatRequest {
    pub file_system: FileSystemType,
    pub label: String,

    /// Cluster size in bytes; None picks the filesystem default
    pub allocation_unit_size: Option<u32>,

    pub flags: BitFlags<FormatFlag>,
}

/// Backend-specific mutating operations on one disk.
///
/// Callers must pick the create-partition overload matching the
/// disk's actual partition style; a mismatch is an `InvalidInput`
/// error. None of these methods retry — retry policy lives with the
/// caller (`VdsOptions`).
#[async_trait]
pub trait AdvancedDiskOperations: Send + Sync {
    /// Remove all partition information from the disk. Destructive.
    async fn clean(
        &self,
        disk_id: Uuid,
        flags: BitFlags<CleanFlag>,
        cancel: &CancellationToken,
    ) -> Result<OperationOutcome, DeployError>;

    async fn create_partition_mbr(
        &self,
        disk_id: Uuid,
        offset: u64,
        size: u64,
        params: MbrPartitionParams,
        cancel: &CancellationToken,
    ) -> Result<OperationOutcome, DeployError>;

    async fn create_partition_gpt(
        &self,
        disk_id: Uuid,
        offset: u64,
        size: u64,
        params: GptPartitionParams,
        cancel: &CancellationToken,
    ) -> Result<OperationOutcome, DeployError>;

    async fn format_partition(
        &self,
        disk_id: Uuid,
        offset: u64,
        request: FormatRequest,
        cancel: &CancellationToken,
    ) -> Result<OperationOutcome, DeployError>;

    fn assign_drive_letter(
        &self,
        disk_id: Uuid,
        offset: u64,
        letter: char,
    ) -> Result<(), DeployError>;

    fn delete_drive_letter(
        &self,
        disk_id: Uuid,
        offset: u64,
        letter: char,
    ) -> Result<(), DeployError>;

    fn get_drive_letter(&self, disk_id: Uuid, offset: u64) -> Result<Option<char>, DeployError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_flags_pack_into_distinct_bits() {
        let flags = CleanFlag::Force | CleanFlag::FullClean;
        assert!(flags.contains(CleanFlag::Force));
        assert!(!flags.contains(CleanFlag::ForceOem));
        assert_eq!(flags.bits(), 0b0101);
    }

    #[test]
    fn format_request_round_trips() {
        let request = FormatRequest {
            file_system: FileSystemType::Ntfs,
            label: "Windows".to_string(),
            allocation_unit_size: Some(4096),
            flags: FormatFlag::Quick | FormatFlag::Force,
        };
        let json = serde_json::to_string(&request).unwrap();
        let parsed: FormatRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, request);
    }
}
