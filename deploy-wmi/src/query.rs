// SPDX-License-Identifier: GPL-3.0-only

//! Query executor contract
//!
//! The native management layer answers three kinds of requests: class
//! enumeration, associative queries between object classes, and
//! method invocation on one object. Every call is a blocking native
//! round trip; the provider offloads them to the blocking pool.

use std::collections::HashMap;

use crate::error::WmiError;
use crate::object::{ManagementObject, ObjectPath, PropertyValue};

/// Class and association names used by the disk walk.
pub mod classes {
    pub const DISK: &str = "VirtualDisk";
    pub const PARTITION: &str = "DiskPartition";
    pub const VOLUME: &str = "LogicalVolume";

    /// Disk → partition association
    pub const DISK_TO_PARTITION: &str = "DiskToPartition";

    /// Partition → volume association
    pub const PARTITION_TO_VOLUME: &str = "PartitionToVolume";
}

/// Result of a method invocation on a management object.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodResult {
    /// Native return code; 0 is success
    pub return_value: u32,

    /// Extended error text, if the backend supplied one
    pub extended_status: Option<String>,

    /// Named output parameters
    pub out_params: HashMap<String, PropertyValue>,
}

impl MethodResult {
    pub fn success() -> Self {
        Self {
            return_value: 0,
            extended_status: None,
            out_params: HashMap::new(),
        }
    }
}

/// Native query surface.
///
/// Implementations own the session to the management backend; objects
/// they return are realized native handles that must be released via
/// [`QueryExecutor::release`] exactly by their single owner.
pub trait QueryExecutor: Send + Sync {
    /// Enumerate all instances of a class.
    fn query(&self, class: &str) -> Result<Vec<ManagementObject>, WmiError>;

    /// Query objects of `result_class` associated with the object at
    /// `path` through `assoc_class`. A separate round trip per call.
    fn associators_of(
        &self,
        path: &ObjectPath,
        assoc_class: &str,
        result_class: &str,
    ) -> Result<Vec<ManagementObject>, WmiError>;

    /// Invoke a method on the object at `path`.
    fn invoke_method(
        &self,
        path: &ObjectPath,
        method: &str,
        args: HashMap<String, PropertyValue>,
    ) -> Result<MethodResult, WmiError>;

    /// Release the native handle behind `path`. Idempotent.
    fn release(&self, path: &ObjectPath);
}
