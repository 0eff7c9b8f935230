// SPDX-License-Identifier: GPL-3.0-only

//! Provider-agnostic disk management facade

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use deploy_contracts::{AdvancedDiskOperations, DeployError, Disk, DiskProvider};

/// Entry point for disk enumeration and mutation.
///
/// Wraps one active provider and its matching operations adapter.
/// Which backend sits behind it is invisible to callers; a provider
/// that failed to initialize never reaches this type (construction of
/// the provider is where backend-unavailable is fatal).
#[derive(Clone)]
pub struct DiskManager {
    provider: Arc<dyn DiskProvider>,
    ops: Arc<dyn AdvancedDiskOperations>,
}

impl DiskManager {
    pub fn new(provider: Arc<dyn DiskProvider>, ops: Arc<dyn AdvancedDiskOperations>) -> Self {
        tracing::info!(backend = provider.backend_name(), "disk manager ready");
        Self { provider, ops }
    }

    pub fn backend_name(&self) -> &'static str {
        self.provider.backend_name()
    }

    /// Enumerate all disks. Cancellable mid-enumeration; enumeration
    /// order is backend-defined and only stable within one call.
    pub async fn get_disks(&self, cancel: &CancellationToken) -> Result<Vec<Disk>, DeployError> {
        self.provider.disks(cancel).await
    }

    /// Look up one disk by id.
    pub async fn get_disk(
        &self,
        id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<Option<Disk>, DeployError> {
        self.provider.disk(id, cancel).await
    }

    /// The mutating operation surface of the active backend.
    pub fn operations(&self) -> Arc<dyn AdvancedDiskOperations> {
        self.ops.clone()
    }
}
