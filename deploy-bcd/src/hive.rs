// SPDX-License-Identifier: GPL-3.0-only

//! Registry-hive-shaped store surface
//!
//! The BCD parser reads through this trait so live registry keys,
//! mounted offline hives and in-memory fixtures all look alike.

use serde::{Deserialize, Serialize};

/// One registry-shaped value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HiveValue {
    String(String),
    MultiString(Vec<String>),
    Dword(u32),
    Qword(u64),
    Binary(Vec<u8>),
}

impl HiveValue {
    pub fn as_dword(&self) -> Option<u32> {
        match self {
            Self::Dword(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }
}

/// Read surface of one hive key.
pub trait HiveKey {
    /// Leaf name of this key
    fn name(&self) -> &str;

    /// Full path from the hive root, for diagnostics
    fn path(&self) -> String;

    /// Open a direct child key
    fn subkey(&self, name: &str) -> Option<Box<dyn HiveKey + '_>>;

    /// Names of all direct child keys
    fn subkey_names(&self) -> Vec<String>;

    /// Read a value of this key
    fn value(&self, name: &str) -> Option<HiveValue>;
}
