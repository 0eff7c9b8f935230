// SPDX-License-Identifier: GPL-3.0-only

//! In-memory hive
//!
//! Used for offline-store fixtures and tests; the parser cannot tell
//! it apart from a live registry key.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::hive::{HiveKey, HiveValue};

/// One key of an in-memory hive tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryKey {
    #[serde(default)]
    values: BTreeMap<String, HiveValue>,
    #[serde(default)]
    subkeys: BTreeMap<String, MemoryKey>,
}

impl MemoryKey {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, name: impl Into<String>, value: HiveValue) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn with_subkey(mut self, name: impl Into<String>, key: MemoryKey) -> Self {
        self.subkeys.insert(name.into(), key);
        self
    }
}

/// An in-memory hive with a named root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryHive {
    root_name: String,
    root: MemoryKey,
}

impl MemoryHive {
    pub fn new(root_name: impl Into<String>, root: MemoryKey) -> Self {
        Self {
            root_name: root_name.into(),
            root,
        }
    }

    pub fn root(&self) -> impl HiveKey + '_ {
        MemoryKeyCursor {
            key: &self.root,
            name: self.root_name.clone(),
            path: self.root_name.clone(),
        }
    }
}

struct MemoryKeyCursor<'a> {
    key: &'a MemoryKey,
    name: String,
    path: String,
}

impl HiveKey for MemoryKeyCursor<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> String {
        self.path.clone()
    }

    fn subkey(&self, name: &str) -> Option<Box<dyn HiveKey + '_>> {
        self.key.subkeys.get(name).map(|child| {
            Box::new(MemoryKeyCursor {
                key: child,
                name: name.to_string(),
                path: format!(r"{}\{}", self.path, name),
            }) as Box<dyn HiveKey + '_>
        })
    }

    fn subkey_names(&self) -> Vec<String> {
        self.key.subkeys.keys().cloned().collect()
    }

    fn value(&self, name: &str) -> Option<HiveValue> {
        self.key.values.get(name).cloned()
    }
}
