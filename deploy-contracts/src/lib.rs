// SPDX-License-Identifier: GPL-3.0-only

//! Contracts between the disk facade and its native backends
//!
//! - [`DiskProvider`] / [`VolumeSource`]: read-side enumeration surface
//! - [`AdvancedDiskOperations`]: mutating, cancellable operation surface
//! - [`Disk`]: the provider-agnostic handle callers work with
//! - [`DeployError`] / [`OperationOutcome`]: failure taxonomy and the
//!   structured async-operation result

pub mod disk;
pub mod error;
pub mod ops;
pub mod outcome;
pub mod provider;

pub use disk::Disk;
pub use error::{DeployError, DeployErrorKind};
pub use ops::{
    AdvancedDiskOperations, CleanFlag, FormatFlag, FormatRequest, GptPartitionParams,
    MbrPartitionParams,
};
pub use outcome::OperationOutcome;
pub use provider::{DiskProvider, VolumeSource};
