// SPDX-License-Identifier: GPL-3.0-only

//! Disk enumeration via direct class query

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use deploy_contracts::{DeployError, Disk, DiskProvider};

use crate::disk::{WmiDisk, WmiVolumeSource};
use crate::query::{QueryExecutor, classes};

/// Provider B: enumerates disks with one direct query, resolving
/// partitions and volumes lazily through associative queries.
pub struct WmiDiskProvider {
    executor: Arc<dyn QueryExecutor>,
}

impl WmiDiskProvider {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self { executor }
    }

    pub(crate) fn executor(&self) -> Arc<dyn QueryExecutor> {
        self.executor.clone()
    }
}

#[async_trait]
impl DiskProvider for WmiDiskProvider {
    fn backend_name(&self) -> &'static str {
        "wmi"
    }

    async fn disks(&self, cancel: &CancellationToken) -> Result<Vec<Disk>, DeployError> {
        if cancel.is_cancelled() {
            return Err(DeployError::cancelled("disk enumeration cancelled"));
        }

        let executor = self.executor.clone();
        let objects = tokio::task::spawn_blocking(move || executor.query(classes::DISK))
            .await
            .map_err(|e| DeployError::internal(format!("disk query task failed: {e}")))?
            .map_err(DeployError::from)?;

        let mut disks = Vec::with_capacity(objects.len());
        for object in objects {
            if cancel.is_cancelled() {
                return Err(DeployError::cancelled("disk enumeration cancelled"));
            }

            let wrapped = WmiDisk::new(self.executor.clone(), object);
            let info = wrapped.info().map_err(DeployError::from)?;
            disks.push(Disk::new(
                info,
                Arc::new(WmiVolumeSource {
                    disk: Arc::new(wrapped),
                }),
            ));
        }

        tracing::debug!(count = disks.len(), "enumerated disks via management query");
        Ok(disks)
    }
}
