// SPDX-License-Identifier: GPL-3.0-only

//! Disk enumeration over the service object hierarchy

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use deploy_contracts::{DeployError, Disk, DiskProvider, VolumeSource};
use deploy_types::{DiskInfo, PartitionInfo, VolumeInfo, VolumePartition};

use crate::cursor::{DEFAULT_BATCH_SIZE, drain_cursor, drain_cursor_blocking};
use crate::error::VdsError;
use crate::service::{
    ENUMERATED_PROVIDER_KINDS, ServiceLoader, VdsDiskHandle, VdsService,
};
use crate::status_codes::classify_disk_flags;

/// Provider A: enumerates disks through the virtual disk service.
pub struct VdsDiskProvider {
    service: Arc<dyn VdsService>,
}

impl VdsDiskProvider {
    /// Load the service and wait for readiness.
    ///
    /// A non-zero readiness status is fatal: logged, surfaced as
    /// `Unavailable`, and never silently replaced by another backend.
    pub async fn connect(loader: Arc<dyn ServiceLoader>) -> Result<Self, DeployError> {
        let service = loader.load_service().map_err(|e| {
            tracing::error!("virtual disk service load failed: {e}");
            DeployError::from(e)
        })?;

        let ready_service = service.clone();
        let status = tokio::task::spawn_blocking(move || ready_service.wait_for_ready())
            .await
            .map_err(|e| DeployError::internal(format!("readiness wait panicked: {e}")))?;

        if status != 0 {
            tracing::error!(status, "virtual disk service is not ready");
            return Err(VdsError::ServiceNotReady { status }.into());
        }

        Ok(Self { service })
    }

    /// Walk service → providers → packs and collect the disk handles.
    async fn disk_handles(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<Arc<dyn VdsDiskHandle>>, VdsError> {
        let providers_cursor = self.service.query_providers(ENUMERATED_PROVIDER_KINDS)?;
        let providers = drain_cursor(providers_cursor, DEFAULT_BATCH_SIZE, cancel).await?;

        let mut handles = Vec::new();
        for provider in providers {
            if cancel.is_cancelled() {
                return Err(VdsError::Cancelled);
            }

            let packs_cursor = {
                let provider = provider.clone();
                tokio::task::spawn_blocking(move || provider.query_packs())
                    .await
                    .map_err(|e| VdsError::Native(format!("pack query task failed: {e}")))??
            };
            let packs = drain_cursor(packs_cursor, DEFAULT_BATCH_SIZE, cancel).await?;

            for pack in packs {
                if cancel.is_cancelled() {
                    return Err(VdsError::Cancelled);
                }

                let disks_cursor = {
                    let pack = pack.clone();
                    tokio::task::spawn_blocking(move || pack.query_disks())
                        .await
                        .map_err(|e| VdsError::Native(format!("disk query task failed: {e}")))??
                };
                handles.extend(drain_cursor(disks_cursor, DEFAULT_BATCH_SIZE, cancel).await?);
            }
        }

        Ok(handles)
    }

    /// Find the native handle for one disk id. Used by the operations
    /// adapter, which mutates through the handle rather than the
    /// materialized model.
    pub(crate) async fn find_handle(
        service: &Arc<dyn VdsService>,
        id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<Option<Arc<dyn VdsDiskHandle>>, VdsError> {
        let provider = Self {
            service: service.clone(),
        };
        for handle in provider.disk_handles(cancel).await? {
            let probe = handle.clone();
            let properties = tokio::task::spawn_blocking(move || probe.properties())
                .await
                .map_err(|e| VdsError::Native(format!("property read task failed: {e}")))??;
            if properties.id == id {
                return Ok(Some(handle));
            }
        }
        Ok(None)
    }

    /// Blocking variant of [`Self::find_handle`] for the synchronous
    /// pieces of the operations contract.
    pub(crate) fn find_handle_blocking(
        service: &Arc<dyn VdsService>,
        id: Uuid,
    ) -> Result<Option<Arc<dyn VdsDiskHandle>>, VdsError> {
        let mut providers_cursor = service.query_providers(ENUMERATED_PROVIDER_KINDS)?;
        for provider in drain_cursor_blocking(providers_cursor.as_mut(), DEFAULT_BATCH_SIZE)? {
            let mut packs_cursor = provider.query_packs()?;
            for pack in drain_cursor_blocking(packs_cursor.as_mut(), DEFAULT_BATCH_SIZE)? {
                let mut disks_cursor = pack.query_disks()?;
                for handle in drain_cursor_blocking(disks_cursor.as_mut(), DEFAULT_BATCH_SIZE)? {
                    if handle.properties()?.id == id {
                        return Ok(Some(handle));
                    }
                }
            }
        }
        Ok(None)
    }

    pub(crate) fn service(&self) -> Arc<dyn VdsService> {
        self.service.clone()
    }
}

#[async_trait]
impl DiskProvider for VdsDiskProvider {
    fn backend_name(&self) -> &'static str {
        "vds"
    }

    async fn disks(&self, cancel: &CancellationToken) -> Result<Vec<Disk>, DeployError> {
        let handles = self.disk_handles(cancel).await?;

        let mut disks = Vec::with_capacity(handles.len());
        for handle in handles {
            if cancel.is_cancelled() {
                return Err(DeployError::cancelled("disk enumeration cancelled"));
            }

            let probe = handle.clone();
            let properties = tokio::task::spawn_blocking(move || probe.properties())
                .await
                .map_err(|e| DeployError::internal(format!("property read task failed: {e}")))?
                .map_err(DeployError::from)?;

            let info = DiskInfo {
                id: properties.id,
                friendly_name: properties.friendly_name.clone(),
                bus_type: properties.bus_type,
                size: properties.size,
                sector_size: properties.sector_size,
                partition_style: properties.partition_style,
                flags: classify_disk_flags(
                    &properties.status,
                    properties.partition_style,
                    properties.read_only,
                ),
            };

            disks.push(Disk::new(info, Arc::new(VdsVolumeSource { handle })));
        }

        tracing::debug!(count = disks.len(), "enumerated disks via virtual disk service");
        Ok(disks)
    }
}

/// Lazy resolution surface backed by one disk handle.
struct VdsVolumeSource {
    handle: Arc<dyn VdsDiskHandle>,
}

impl VdsVolumeSource {
    async fn fetch<T, F>(&self, cancel: &CancellationToken, fetch: F) -> Result<T, DeployError>
    where
        T: Send + 'static,
        F: FnOnce(Arc<dyn VdsDiskHandle>) -> Result<T, VdsError> + Send + 'static,
    {
        if cancel.is_cancelled() {
            return Err(DeployError::cancelled("disk query cancelled"));
        }

        let handle = self.handle.clone();
        tokio::task::spawn_blocking(move || fetch(handle))
            .await
            .map_err(|e| DeployError::internal(format!("disk query task failed: {e}")))?
            .map_err(DeployError::from)
    }
}

#[async_trait]
impl VolumeSource for VdsVolumeSource {
    async fn partitions(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<PartitionInfo>, DeployError> {
        self.fetch(cancel, |handle| handle.partitions()).await
    }

    async fn volumes(&self, cancel: &CancellationToken) -> Result<Vec<VolumeInfo>, DeployError> {
        self.fetch(cancel, |handle| handle.volumes()).await
    }

    async fn volume_partitions(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<VolumePartition>, DeployError> {
        self.fetch(cancel, |handle| handle.volume_partitions()).await
    }
}
