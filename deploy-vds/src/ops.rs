// SPDX-License-Identifier: GPL-3.0-only

//! Advanced disk operations over the virtual disk service
//!
//! Native operations complete through a callback on an async
//! operation object; this adapter converts that callback into
//! awaitable completion. No retrying happens here — a failed outcome
//! is reported to the caller, whose options govern retries.

use std::sync::Arc;

use async_trait::async_trait;
use enumflags2::BitFlags;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use deploy_contracts::{
    AdvancedDiskOperations, CleanFlag, DeployError, FormatRequest, GptPartitionParams,
    MbrPartitionParams, OperationOutcome,
};
use deploy_types::PartitionStyle;

use crate::error::VdsError;
use crate::provider::VdsDiskProvider;
use crate::service::{CreatePartitionSpec, VdsAsyncOperation, VdsDiskHandle, VdsService};

/// Mutating operation adapter of Provider A.
pub struct VdsDiskOperations {
    service: Arc<dyn VdsService>,
}

impl VdsDiskOperations {
    pub fn new(provider: &VdsDiskProvider) -> Self {
        Self {
            service: provider.service(),
        }
    }

    async fn handle_for(
        &self,
        disk_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<Arc<dyn VdsDiskHandle>, DeployError> {
        VdsDiskProvider::find_handle(&self.service, disk_id, cancel)
            .await
            .map_err(DeployError::from)?
            .ok_or_else(|| DeployError::not_found(format!("no disk with id {disk_id}")))
    }

    /// Require the disk's actual partition style to match the chosen
    /// create-partition overload; a mismatch is a contract violation.
    async fn require_style(
        &self,
        handle: &Arc<dyn VdsDiskHandle>,
        expected: PartitionStyle,
    ) -> Result<(), DeployError> {
        let probe = handle.clone();
        let properties = tokio::task::spawn_blocking(move || probe.properties())
            .await
            .map_err(|e| DeployError::internal(format!("property read task failed: {e}")))?
            .map_err(DeployError::from)?;

        if properties.partition_style != expected {
            return Err(DeployError::invalid_input(format!(
                "disk {} is {} but the {} overload was called",
                properties.id, properties.partition_style, expected
            )));
        }
        Ok(())
    }

    /// Await a native async operation, translating its completion
    /// callback into the structured outcome.
    async fn await_operation(
        operation: Arc<dyn VdsAsyncOperation>,
        cancel: &CancellationToken,
    ) -> Result<OperationOutcome, DeployError> {
        let (tx, rx) = oneshot::channel();
        operation.on_complete(Box::new(move |status, extended_error| {
            let _ = tx.send((status, extended_error));
        }));

        tokio::select! {
            _ = cancel.cancelled() => {
                // The native operation is not assumed to be safely
                // abortable mid-write; the disk state is
                // provider-defined and the caller must re-enumerate.
                tracing::warn!("cancelled while a disk operation was in flight");
                Err(DeployError::cancelled("disk operation cancelled; disk state unknown"))
            }
            completion = rx => {
                let (status, extended_error) = completion.map_err(|_| {
                    DeployError::backend("operation dropped without completing")
                })?;
                Ok(OperationOutcome { status, extended_error })
            }
        }
    }

    async fn run<F>(
        &self,
        disk_id: Uuid,
        cancel: &CancellationToken,
        start: F,
    ) -> Result<OperationOutcome, DeployError>
    where
        F: FnOnce(Arc<dyn VdsDiskHandle>) -> Result<Arc<dyn VdsAsyncOperation>, VdsError>
            + Send
            + 'static,
    {
        let handle = self.handle_for(disk_id, cancel).await?;

        if cancel.is_cancelled() {
            return Err(DeployError::cancelled("disk operation cancelled before start"));
        }

        let operation = tokio::task::spawn_blocking(move || start(handle))
            .await
            .map_err(|e| DeployError::internal(format!("operation start task failed: {e}")))?
            .map_err(DeployError::from)?;

        Self::await_operation(operation, cancel).await
    }

    fn sync_handle_for(&self, disk_id: Uuid) -> Result<Arc<dyn VdsDiskHandle>, DeployError> {
        // Drive-letter accessors are synchronous by contract; the
        // lookup stays on the caller's thread.
        VdsDiskProvider::find_handle_blocking(&self.service, disk_id)
            .map_err(DeployError::from)?
            .ok_or_else(|| DeployError::not_found(format!("no disk with id {disk_id}")))
    }
}

#[async_trait]
impl AdvancedDiskOperations for VdsDiskOperations {
    async fn clean(
        &self,
        disk_id: Uuid,
        flags: BitFlags<CleanFlag>,
        cancel: &CancellationToken,
    ) -> Result<OperationOutcome, DeployError> {
        tracing::info!(%disk_id, ?flags, "cleaning disk");
        self.run(disk_id, cancel, move |handle| handle.clean(flags))
            .await
    }

    async fn create_partition_mbr(
        &self,
        disk_id: Uuid,
        offset: u64,
        size: u64,
        params: MbrPartitionParams,
        cancel: &CancellationToken,
    ) -> Result<OperationOutcome, DeployError> {
        let handle = self.handle_for(disk_id, cancel).await?;
        self.require_style(&handle, PartitionStyle::Mbr).await?;

        tracing::info!(%disk_id, offset, size, "creating MBR partition");
        let operation = tokio::task::spawn_blocking(move || {
            handle.create_partition(offset, size, CreatePartitionSpec::Mbr(params))
        })
        .await
        .map_err(|e| DeployError::internal(format!("operation start task failed: {e}")))?
        .map_err(DeployError::from)?;

        Self::await_operation(operation, cancel).await
    }

    async fn create_partition_gpt(
        &self,
        disk_id: Uuid,
        offset: u64,
        size: u64,
        params: GptPartitionParams,
        cancel: &CancellationToken,
    ) -> Result<OperationOutcome, DeployError> {
        let handle = self.handle_for(disk_id, cancel).await?;
        self.require_style(&handle, PartitionStyle::Gpt).await?;

        tracing::info!(%disk_id, offset, size, "creating GPT partition");
        let operation = tokio::task::spawn_blocking(move || {
            handle.create_partition(offset, size, CreatePartitionSpec::Gpt(params))
        })
        .await
        .map_err(|e| DeployError::internal(format!("operation start task failed: {e}")))?
        .map_err(DeployError::from)?;

        Self::await_operation(operation, cancel).await
    }

    async fn format_partition(
        &self,
        disk_id: Uuid,
        offset: u64,
        request: FormatRequest,
        cancel: &CancellationToken,
    ) -> Result<OperationOutcome, DeployError> {
        tracing::info!(%disk_id, offset, file_system = %request.file_system, "formatting partition");
        self.run(disk_id, cancel, move |handle| {
            handle.format_partition(offset, request)
        })
        .await
    }

    fn assign_drive_letter(
        &self,
        disk_id: Uuid,
        offset: u64,
        letter: char,
    ) -> Result<(), DeployError> {
        let handle = self.sync_handle_for(disk_id)?;
        handle
            .assign_drive_letter(offset, letter)
            .map_err(DeployError::from)
    }

    fn delete_drive_letter(
        &self,
        disk_id: Uuid,
        offset: u64,
        letter: char,
    ) -> Result<(), DeployError> {
        let handle = self.sync_handle_for(disk_id)?;
        handle
            .delete_drive_letter(offset, letter)
            .map_err(DeployError::from)
    }

    fn get_drive_letter(&self, disk_id: Uuid, offset: u64) -> Result<Option<char>, DeployError> {
        let handle = self.sync_handle_for(disk_id)?;
        handle.drive_letter(offset).map_err(DeployError::from)
    }
}
