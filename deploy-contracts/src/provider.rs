// SPDX-License-Identifier: GPL-3.0-only

//! Read-side provider contracts

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use deploy_types::{PartitionInfo, VolumeInfo, VolumePartition};

use crate::disk::Disk;
use crate::error::DeployError;

/// Per-disk lazy resolution surface a backend hands to a [`Disk`].
///
/// Each method is one expensive backend round trip; the disk handle
/// memoizes every collection independently so callers that never touch
/// volumes never pay for them.
#[async_trait]
pub trait VolumeSource: Send + Sync {
    async fn partitions(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<PartitionInfo>, DeployError>;

    async fn volumes(&self, cancel: &CancellationToken) -> Result<Vec<VolumeInfo>, DeployError>;

    async fn volume_partitions(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<VolumePartition>, DeployError>;
}

/// Disk enumeration contract implemented by each native backend.
#[async_trait]
pub trait DiskProvider: Send + Sync {
    /// Backend name for logs and diagnostics
    fn backend_name(&self) -> &'static str;

    /// Enumerate all disks the backend can see. Cancellable between
    /// native rounds; enumeration order is backend-defined and only
    /// stable within one call.
    async fn disks(&self, cancel: &CancellationToken) -> Result<Vec<Disk>, DeployError>;

    /// Look up one disk by id. The default walks the full enumeration;
    /// backends with a cheaper direct path override it.
    async fn disk(
        &self,
        id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<Option<Disk>, DeployError> {
        Ok(self
            .disks(cancel)
            .await?
            .into_iter()
            .find(|disk| disk.id() == id))
    }
}
