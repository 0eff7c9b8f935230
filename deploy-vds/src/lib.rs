// SPDX-License-Identifier: GPL-3.0-only

//! Virtual-disk-service backend (Provider A)
//!
//! Enumerates disks by walking the native service object hierarchy:
//! service → providers (filtered to software and virtual-disk
//! provider kinds) → packs → disks. The native service is reached
//! through a [`ServiceLoader`] indirection so out-of-process and
//! fixture loaders plug in without touching the provider.
//!
//! Every blocking native call runs on the blocking pool and honors
//! the caller's cancellation token between rounds.

pub mod cursor;
pub mod error;
pub mod ops;
pub mod provider;
pub mod service;
pub mod status_codes;

pub use cursor::{DEFAULT_BATCH_SIZE, NativeCursor, VecCursor, drain_cursor, drain_cursor_blocking};
pub use error::VdsError;
pub use ops::VdsDiskOperations;
pub use provider::VdsDiskProvider;
pub use service::{
    CreatePartitionSpec, ENUMERATED_PROVIDER_KINDS, ProviderKind, ServiceLoader,
    VdsAsyncOperation, VdsDiskHandle, VdsDiskProperties, VdsPackHandle, VdsProviderHandle,
    VdsProviderProperties, VdsService,
};
pub use status_codes::{RawStatus, classify_disk_flags};
