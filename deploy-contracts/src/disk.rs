// SPDX-License-Identifier: GPL-3.0-only

//! The provider-agnostic disk handle
//!
//! A [`Disk`] pairs the read-only [`DiskInfo`] snapshot taken at
//! enumeration time with three compute-once cache cells for the
//! expensive derived collections. Each cell resolves through the
//! backend's [`VolumeSource`] at most once, on first access; disposal
//! of the handle (dropping the last clone) is the only invalidation.
//! Advanced operations mutate the native disk, so their effects are
//! observed by re-enumerating, never through an existing handle.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use deploy_types::{DiskInfo, PartitionInfo, VolumeInfo, VolumePartition};

use crate::error::DeployError;
use crate::provider::VolumeSource;

struct DiskShared {
    info: DiskInfo,
    source: Arc<dyn VolumeSource>,
    partitions: OnceCell<Vec<PartitionInfo>>,
    volumes: OnceCell<Vec<VolumeInfo>>,
    volume_partitions: OnceCell<Vec<VolumePartition>>,
}

/// Cheap-clone handle to one enumerated disk.
#[derive(Clone)]
pub struct Disk {
    inner: Arc<DiskShared>,
}

impl Disk {
    pub fn new(info: DiskInfo, source: Arc<dyn VolumeSource>) -> Self {
        Self {
            inner: Arc::new(DiskShared {
                info,
                source,
                partitions: OnceCell::new(),
                volumes: OnceCell::new(),
                volume_partitions: OnceCell::new(),
            }),
        }
    }

    pub fn info(&self) -> &DiskInfo {
        &self.inner.info
    }

    pub fn id(&self) -> Uuid {
        self.inner.info.id
    }

    /// Partitions of this disk, resolved through the backend on first
    /// access and memoized for the lifetime of the handle.
    pub async fn partitions(
        &self,
        cancel: &CancellationToken,
    ) -> Result<&[PartitionInfo], DeployError> {
        self.inner
            .partitions
            .get_or_try_init(|| self.inner.source.partitions(cancel))
            .await
            .map(Vec::as_slice)
    }

    /// Volumes of this disk; memoized independently of `partitions`.
    pub async fn volumes(&self, cancel: &CancellationToken) -> Result<&[VolumeInfo], DeployError> {
        self.inner
            .volumes
            .get_or_try_init(|| self.inner.source.volumes(cancel))
            .await
            .map(Vec::as_slice)
    }

    /// Volume-to-partition pairings; a third independent round trip,
    /// not a join over the other two collections.
    pub async fn volume_partitions(
        &self,
        cancel: &CancellationToken,
    ) -> Result<&[VolumePartition], DeployError> {
        self.inner
            .volume_partitions
            .get_or_try_init(|| self.inner.source.volume_partitions(cancel))
            .await
            .map(Vec::as_slice)
    }
}

impl std::fmt::Debug for Disk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Disk")
            .field("info", &self.inner.info)
            .field("partitions_resolved", &self.inner.partitions.initialized())
            .field("volumes_resolved", &self.inner.volumes.initialized())
            .finish()
    }
}
