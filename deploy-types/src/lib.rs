// SPDX-License-Identifier: GPL-3.0-only

//! Canonical domain models for the deploykit disk engine
//!
//! This crate defines the single source of truth for all disk domain types.
//! These models are used throughout the stack:
//!
//! - **deploy-vds** / **deploy-wmi**: materialize these types from their
//!   native backends
//! - **deploy-disks**: filters them through the selection engine
//! - **deploy-agent**: serializes/deserializes them for task-sequence JSON
//!
//! Everything here is observed or declared state; nothing in this crate
//! talks to hardware.

pub mod common;
pub mod definition;
pub mod disk;
pub mod options;
pub mod partition;
pub mod partition_types;
pub mod selection;
pub mod volume;

pub use common::{MIB, bytes_to_pretty};
pub use definition::{PartitionDefinition, PartitionUsage};
pub use disk::{BusType, DiskFlag, DiskInfo, PartitionStyle};
pub use options::{PartitioningOptions, VdsOptions};
pub use partition::{PartitionFlag, PartitionInfo};
pub use partition_types::{PartitionKind, PartitionType, PartitionTypeEntry, PARTITION_TYPE_CATALOG};
pub use selection::{BuiltInCondition, DiskSelectionStep, SelectionAction};
pub use volume::{FileSystemType, VolumeInfo, VolumePartition};
