// SPDX-License-Identifier: GPL-3.0-only

//! Friendly-name table for BCD type tags
//!
//! The mapping from raw tag values to editor-facing names is data,
//! not behavior: it lives in `resources/bcd_type_names.toml` and is
//! parsed once. Name resolution returns the first declared name and
//! deliberately ignores the captured minimum-version gate — names are
//! display-only here and never safety-critical.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::Deserialize;

use crate::types::{BcdElementType, BcdObjectType};

/// One annotation row of the name table.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BcdTypeName {
    /// Raw 32-bit type tag
    pub value: u32,

    /// Friendly names, first-declared wins
    pub names: Vec<String>,

    /// First OS version (major, minor) the name applies to
    pub min_version: (u32, u32),

    /// Observed in stores but never documented
    #[serde(default)]
    pub undocumented: bool,
}

#[derive(Deserialize)]
struct NameTable {
    elements: Vec<BcdTypeName>,
    objects: Vec<BcdTypeName>,
}

const NAMES_TOML: &str = include_str!("../resources/bcd_type_names.toml");

static NAME_TABLE: LazyLock<NameTable> = LazyLock::new(|| {
    toml::from_str(NAMES_TOML).expect("embedded BCD name table must parse")
});

static ELEMENT_NAMES: LazyLock<HashMap<u32, &'static BcdTypeName>> = LazyLock::new(|| {
    NAME_TABLE
        .elements
        .iter()
        .map(|entry| (entry.value, entry))
        .collect()
});

static OBJECT_NAMES: LazyLock<HashMap<u32, &'static BcdTypeName>> = LazyLock::new(|| {
    NAME_TABLE
        .objects
        .iter()
        .map(|entry| (entry.value, entry))
        .collect()
});

/// Full annotation for an element type, if one is declared.
pub fn element_type_names(ty: BcdElementType) -> Option<&'static BcdTypeName> {
    ELEMENT_NAMES.get(&ty.0).copied()
}

/// Full annotation for an object type, if one is declared.
pub fn object_type_names(ty: BcdObjectType) -> Option<&'static BcdTypeName> {
    OBJECT_NAMES.get(&ty.0).copied()
}

/// First declared friendly name of an element type, regardless of the
/// running OS version.
pub fn element_name(ty: BcdElementType) -> Option<&'static str> {
    element_type_names(ty).and_then(|entry| entry.names.first().map(String::as_str))
}

/// First declared friendly name of an object type, regardless of the
/// running OS version.
pub fn object_name(ty: BcdObjectType) -> Option<&'static str> {
    object_type_names(ty).and_then(|entry| entry.names.first().map(String::as_str))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ElementFormat;

    #[test]
    fn table_parses_and_is_non_trivial() {
        assert!(NAME_TABLE.elements.len() >= 20);
        assert!(NAME_TABLE.objects.len() >= 5);
    }

    #[test]
    fn every_element_entry_has_a_recognized_format() {
        // The format nibble of every cataloged tag must decode; an
        // Unknown format in the table means a mistyped value.
        for entry in &NAME_TABLE.elements {
            let ty = BcdElementType(entry.value);
            assert_ne!(
                ty.format(),
                ElementFormat::Unknown,
                "element {:#010x} has an unrecognized format nibble",
                entry.value
            );
        }
    }

    #[test]
    fn format_always_equals_type_and_mask() {
        for entry in &NAME_TABLE.elements {
            let ty = BcdElementType(entry.value);
            let remasked = BcdElementType(entry.value & !BcdElementType::ID_MASK);
            assert_eq!(ty.format(), remasked.format(), "{:#010x}", entry.value);
        }
    }

    #[test]
    fn first_declared_name_wins_ignoring_version() {
        assert_eq!(
            element_name(BcdElementType::DEFAULT_OBJECT),
            Some("resumeobject")
        );
        assert_eq!(element_name(BcdElementType::DESCRIPTION), Some("description"));
        assert_eq!(object_name(BcdObjectType::OS_LOADER), Some("osloader"));
    }

    #[test]
    fn undeclared_types_have_no_name() {
        assert_eq!(element_name(BcdElementType(0x1fff_ffff)), None);
        assert_eq!(object_name(BcdObjectType(0x7fff_ffff)), None);
    }

    #[test]
    fn undocumented_marker_survives_the_load() {
        let entry = element_type_names(BcdElementType(0x1700_0077)).unwrap();
        assert!(entry.undocumented);
        assert_eq!(entry.min_version, (6, 2));
    }
}
