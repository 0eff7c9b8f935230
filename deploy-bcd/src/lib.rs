// SPDX-License-Identifier: GPL-3.0-only

//! Boot Configuration Data store model
//!
//! A BCD store is a registry-hive-shaped tree: one subkey per boot
//! object, each with a `Description` subkey carrying the bit-packed
//! object type and an `Elements` subkey carrying one child per typed
//! element. Reconstruction is a pure, validating parse — an object
//! either parses completely or the store is rejected with the
//! offending key path.
//!
//! Offline stores are reached by loading the hive file into a live
//! registry location; [`MountedHive`] guarantees the unload on every
//! exit path.

pub mod element;
pub mod error;
pub mod hive;
pub mod memory;
pub mod mounted;
pub mod names;
pub mod object;
pub mod types;

pub use element::{BcdElement, BcdValue};
pub use error::BcdError;
pub use hive::{HiveKey, HiveValue};
pub use memory::{MemoryHive, MemoryKey};
pub use mounted::{HiveMounter, MountedHive};
pub use names::{BcdTypeName, element_name, element_type_names, object_name, object_type_names};
pub use object::{BcdObject, BcdStore};
pub use types::{BcdElementType, BcdObjectType, ElementClass, ElementFormat, ObjectKind};
