// SPDX-License-Identifier: GPL-3.0-only

//! Management object property bags
//!
//! Backends deliver objects as loosely-typed property bags. Accessors
//! here decode defensively: numeric status-like fields may arrive as
//! a scalar or as a single-element array depending on the backend
//! revision, and both shapes are accepted.

use std::collections::HashMap;

use crate::error::WmiError;

/// Opaque native object path; the key for associative queries,
/// method invocation and release.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectPath(pub String);

impl ObjectPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One property value as the backend delivered it.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Str(String),
    Bool(bool),
    U32(u32),
    U64(u64),
    StrArray(Vec<String>),
    U32Array(Vec<u32>),
}

/// One management object instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ManagementObject {
    /// Class name, for diagnostics
    pub class: String,

    /// Native object path
    pub path: ObjectPath,

    /// Property bag
    pub properties: HashMap<String, PropertyValue>,
}

impl ManagementObject {
    pub fn new(class: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            path: ObjectPath(path.into()),
            properties: HashMap::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    fn missing(&self, property: &str) -> WmiError {
        WmiError::InvalidProperty {
            class: self.class.clone(),
            property: property.to_string(),
        }
    }

    pub fn string(&self, property: &str) -> Result<String, WmiError> {
        match self.properties.get(property) {
            Some(PropertyValue::Str(value)) => Ok(value.clone()),
            _ => Err(self.missing(property)),
        }
    }

    pub fn opt_string(&self, property: &str) -> Option<String> {
        match self.properties.get(property) {
            Some(PropertyValue::Str(value)) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn opt_bool(&self, property: &str) -> Option<bool> {
        match self.properties.get(property) {
            Some(PropertyValue::Bool(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn bool(&self, property: &str) -> Result<bool, WmiError> {
        match self.properties.get(property) {
            Some(PropertyValue::Bool(value)) => Ok(*value),
            _ => Err(self.missing(property)),
        }
    }

    pub fn u64(&self, property: &str) -> Result<u64, WmiError> {
        match self.properties.get(property) {
            Some(PropertyValue::U64(value)) => Ok(*value),
            Some(PropertyValue::U32(value)) => Ok(u64::from(*value)),
            _ => Err(self.missing(property)),
        }
    }

    /// Scalar u32, also accepting a single-element array and a wider
    /// integer that fits. Status-like fields change shape between
    /// backend revisions.
    pub fn u32_defensive(&self, property: &str) -> Result<u32, WmiError> {
        match self.properties.get(property) {
            Some(PropertyValue::U32(value)) => Ok(*value),
            Some(PropertyValue::U32Array(values)) => Ok(values.first().copied().unwrap_or(0)),
            Some(PropertyValue::U64(value)) => {
                u32::try_from(*value).map_err(|_| self.missing(property))
            }
            _ => Err(self.missing(property)),
        }
    }

    pub fn string_array(&self, property: &str) -> Vec<String> {
        match self.properties.get(property) {
            Some(PropertyValue::StrArray(values)) => values.clone(),
            Some(PropertyValue::Str(value)) => vec![value.clone()],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object() -> ManagementObject {
        ManagementObject::new("VirtualDisk", "//./root/disk=0")
            .with_property("Size", PropertyValue::U64(1024))
            .with_property("OperationalStatus", PropertyValue::U32Array(vec![4]))
            .with_property("IsReadOnly", PropertyValue::Bool(false))
            .with_property("Paths", PropertyValue::Str("C:".to_string()))
    }

    #[test]
    fn u32_defensive_accepts_scalar_and_array() {
        let scalar = object().with_property("OperationalStatus", PropertyValue::U32(4));
        assert_eq!(scalar.u32_defensive("OperationalStatus").unwrap(), 4);
        assert_eq!(object().u32_defensive("OperationalStatus").unwrap(), 4);
    }

    #[test]
    fn missing_property_names_class_and_property() {
        let err = object().u64("Offset").unwrap_err();
        assert_eq!(
            err,
            WmiError::InvalidProperty {
                class: "VirtualDisk".to_string(),
                property: "Offset".to_string(),
            }
        );
    }

    #[test]
    fn string_array_promotes_a_lone_scalar() {
        assert_eq!(object().string_array("Paths"), vec!["C:".to_string()]);
        assert!(object().string_array("Nothing").is_empty());
    }
}
