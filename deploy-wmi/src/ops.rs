// SPDX-License-Identifier: GPL-3.0-only

//! Advanced disk operations via method invocation
//!
//! Mutations go through method calls on the disk or partition object.
//! The native return code and extended status map directly onto the
//! structured outcome; nothing here retries.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use enumflags2::BitFlags;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use deploy_contracts::{
    AdvancedDiskOperations, CleanFlag, DeployError, FormatFlag, FormatRequest,
    GptPartitionParams, MbrPartitionParams, OperationOutcome,
};
use deploy_types::PartitionStyle;

use crate::codes;
use crate::disk::parse_guid;
use crate::object::{ManagementObject, ObjectPath, PropertyValue};
use crate::provider::WmiDiskProvider;
use crate::query::{MethodResult, QueryExecutor, classes};

/// Mutating operation adapter of Provider B.
pub struct WmiDiskOperations {
    executor: Arc<dyn QueryExecutor>,
}

fn find_disk_object(
    executor: &Arc<dyn QueryExecutor>,
    disk_id: Uuid,
) -> Result<ManagementObject, DeployError> {
    executor
        .query(classes::DISK)
        .map_err(DeployError::from)?
        .into_iter()
        .find(|object| {
            object
                .string("Guid")
                .ok()
                .and_then(|raw| parse_guid(&raw))
                .is_some_and(|guid| guid == disk_id)
        })
        .ok_or_else(|| DeployError::not_found(format!("no disk with id {disk_id}")))
}

fn find_partition_by_offset(
    executor: &Arc<dyn QueryExecutor>,
    disk_path: &ObjectPath,
    offset: u64,
) -> Result<ManagementObject, DeployError> {
    executor
        .associators_of(disk_path, classes::DISK_TO_PARTITION, classes::PARTITION)
        .map_err(DeployError::from)?
        .into_iter()
        .find(|object| object.u64("Offset").ok() == Some(offset))
        .ok_or_else(|| {
            DeployError::not_found(format!("no partition at offset {offset} on {disk_path}"))
        })
}

fn outcome_from(result: MethodResult) -> OperationOutcome {
    OperationOutcome {
        status: result.return_value as i32,
        extended_error: result.extended_status,
    }
}

impl WmiDiskOperations {
    pub fn new(provider: &WmiDiskProvider) -> Self {
        Self {
            executor: provider.executor(),
        }
    }

    fn disk_style(object: &ManagementObject) -> Result<PartitionStyle, DeployError> {
        Ok(codes::partition_style_from_code(
            object
                .u32_defensive("PartitionStyle")
                .map_err(DeployError::from)?,
        ))
    }

    /// Invoke a method off-thread, checking cancellation on both
    /// sides of the native call.
    async fn invoke(
        &self,
        path: ObjectPath,
        method: &'static str,
        args: HashMap<String, PropertyValue>,
        cancel: &CancellationToken,
    ) -> Result<OperationOutcome, DeployError> {
        if cancel.is_cancelled() {
            return Err(DeployError::cancelled("disk operation cancelled before start"));
        }

        let executor = self.executor.clone();
        let result = tokio::task::spawn_blocking(move || {
            executor.invoke_method(&path, method, args)
        })
        .await
        .map_err(|e| DeployError::internal(format!("operation task failed: {e}")))?
        .map_err(DeployError::from)?;

        if cancel.is_cancelled() {
            // The native call already ran; disk state is
            // provider-defined and the caller must re-enumerate.
            return Err(DeployError::cancelled("disk operation cancelled; disk state unknown"));
        }

        Ok(outcome_from(result))
    }

    async fn create_partition(
        &self,
        disk_id: Uuid,
        expected_style: PartitionStyle,
        offset: u64,
        size: u64,
        mut args: HashMap<String, PropertyValue>,
        cancel: &CancellationToken,
    ) -> Result<OperationOutcome, DeployError> {
        let executor = self.executor.clone();
        let disk = tokio::task::spawn_blocking(move || find_disk_object(&executor, disk_id))
            .await
            .map_err(|e| DeployError::internal(format!("disk lookup task failed: {e}")))??;

        let style = Self::disk_style(&disk)?;
        if style != expected_style {
            return Err(DeployError::invalid_input(format!(
                "disk {disk_id} is {style} but the {expected_style} overload was called"
            )));
        }

        args.insert("Offset".to_string(), PropertyValue::U64(offset));
        args.insert("Size".to_string(), PropertyValue::U64(size));

        tracing::info!(%disk_id, offset, size, %style, "creating partition");
        self.invoke(disk.path.clone(), "CreatePartition", args, cancel)
            .await
    }

    fn sync_partition_for(
        &self,
        disk_id: Uuid,
        offset: u64,
    ) -> Result<ManagementObject, DeployError> {
        let disk = find_disk_object(&self.executor, disk_id)?;
        find_partition_by_offset(&self.executor, &disk.path, offset)
    }
}

#[async_trait]
impl AdvancedDiskOperations for WmiDiskOperations {
    async fn clean(
        &self,
        disk_id: Uuid,
        flags: BitFlags<CleanFlag>,
        cancel: &CancellationToken,
    ) -> Result<OperationOutcome, DeployError> {
        let executor = self.executor.clone();
        let disk = tokio::task::spawn_blocking(move || find_disk_object(&executor, disk_id))
            .await
            .map_err(|e| DeployError::internal(format!("disk lookup task failed: {e}")))??;

        // IgnoreErrors is caller policy, never forwarded natively.
        let mut args = HashMap::new();
        args.insert(
            "Force".to_string(),
            PropertyValue::Bool(flags.contains(CleanFlag::Force)),
        );
        args.insert(
            "ForceOEM".to_string(),
            PropertyValue::Bool(flags.contains(CleanFlag::ForceOem)),
        );
        args.insert(
            "ZeroOutEntireDisk".to_string(),
            PropertyValue::Bool(flags.contains(CleanFlag::FullClean)),
        );

        tracing::info!(%disk_id, ?flags, "cleaning disk");
        self.invoke(disk.path.clone(), "Clear", args, cancel).await
    }

    async fn create_partition_mbr(
        &self,
        disk_id: Uuid,
        offset: u64,
        size: u64,
        params: MbrPartitionParams,
        cancel: &CancellationToken,
    ) -> Result<OperationOutcome, DeployError> {
        let mut args = HashMap::new();
        args.insert(
            "MbrType".to_string(),
            PropertyValue::U32(u32::from(params.partition_type)),
        );
        args.insert("IsActive".to_string(), PropertyValue::Bool(params.active));

        self.create_partition(disk_id, PartitionStyle::Mbr, offset, size, args, cancel)
            .await
    }

    async fn create_partition_gpt(
        &self,
        disk_id: Uuid,
        offset: u64,
        size: u64,
        params: GptPartitionParams,
        cancel: &CancellationToken,
    ) -> Result<OperationOutcome, DeployError> {
        let mut args = HashMap::new();
        args.insert(
            "GptType".to_string(),
            PropertyValue::Str(format!("{{{}}}", params.partition_type)),
        );
        if let Some(name) = params.name {
            args.insert("Name".to_string(), PropertyValue::Str(name));
        }

        self.create_partition(disk_id, PartitionStyle::Gpt, offset, size, args, cancel)
            .await
    }

    async fn format_partition(
        &self,
        disk_id: Uuid,
        offset: u64,
        request: FormatRequest,
        cancel: &CancellationToken,
    ) -> Result<OperationOutcome, DeployError> {
        let executor = self.executor.clone();
        let partition = tokio::task::spawn_blocking(move || {
            let disk = find_disk_object(&executor, disk_id)?;
            find_partition_by_offset(&executor, &disk.path, offset)
        })
        .await
        .map_err(|e| DeployError::internal(format!("partition lookup task failed: {e}")))??;

        let mut args = HashMap::new();
        args.insert(
            "FileSystem".to_string(),
            PropertyValue::Str(request.file_system.as_str().to_string()),
        );
        args.insert(
            "FileSystemLabel".to_string(),
            PropertyValue::Str(request.label.clone()),
        );
        if let Some(unit) = request.allocation_unit_size {
            args.insert("AllocationUnitSize".to_string(), PropertyValue::U32(unit));
        }
        args.insert(
            "Force".to_string(),
            PropertyValue::Bool(request.flags.contains(FormatFlag::Force)),
        );
        args.insert(
            "Full".to_string(),
            PropertyValue::Bool(!request.flags.contains(FormatFlag::Quick)),
        );
        args.insert(
            "Compress".to_string(),
            PropertyValue::Bool(request.flags.contains(FormatFlag::EnableCompression)),
        );

        tracing::info!(%disk_id, offset, file_system = %request.file_system, "formatting partition");
        self.invoke(partition.path.clone(), "Format", args, cancel)
            .await
    }

    fn assign_drive_letter(
        &self,
        disk_id: Uuid,
        offset: u64,
        letter: char,
    ) -> Result<(), DeployError> {
        let partition = self.sync_partition_for(disk_id, offset)?;
        let mut args = HashMap::new();
        args.insert(
            "AccessPath".to_string(),
            PropertyValue::Str(format!("{letter}:")),
        );

        let result = self
            .executor
            .invoke_method(&partition.path, "AddAccessPath", args)
            .map_err(DeployError::from)?;
        if result.return_value != 0 {
            return Err(DeployError::backend(format!(
                "AddAccessPath returned {}",
                result.return_value
            )));
        }
        Ok(())
    }

    fn delete_drive_letter(
        &self,
        disk_id: Uuid,
        offset: u64,
        letter: char,
    ) -> Result<(), DeployError> {
        let partition = self.sync_partition_for(disk_id, offset)?;
        let mut args = HashMap::new();
        args.insert(
            "AccessPath".to_string(),
            PropertyValue::Str(format!("{letter}:")),
        );

        let result = self
            .executor
            .invoke_method(&partition.path, "RemoveAccessPath", args)
            .map_err(DeployError::from)?;
        if result.return_value != 0 {
            return Err(DeployError::backend(format!(
                "RemoveAccessPath returned {}",
                result.return_value
            )));
        }
        Ok(())
    }

    fn get_drive_letter(&self, disk_id: Uuid, offset: u64) -> Result<Option<char>, DeployError> {
        let partition = self.sync_partition_for(disk_id, offset)?;

        if let Some(letter) = partition
            .opt_string("DriveLetter")
            .and_then(|raw| raw.chars().next())
        {
            return Ok(Some(letter));
        }

        // Fall back to scanning access paths of the shape "X:".
        Ok(partition
            .string_array("AccessPaths")
            .iter()
            .find_map(|path| {
                let mut chars = path.chars();
                match (chars.next(), chars.next(), chars.next()) {
                    (Some(letter), Some(':'), None) if letter.is_ascii_alphabetic() => {
                        Some(letter)
                    }
                    _ => None,
                }
            }))
    }
}
