// SPDX-License-Identifier: GPL-3.0-only

//! Typed element reconstruction
//!
//! One element is one child key under `Elements`: the key name is the
//! hexadecimal type tag, the `Element` value the raw payload. The
//! payload is reinterpreted solely by the format nibble of the tag;
//! formats without a conversion pass the raw value through untouched.

use uuid::Uuid;

use crate::error::BcdError;
use crate::hive::{HiveKey, HiveValue};
use crate::names;
use crate::types::{BcdElementType, ElementFormat};

/// Decoded element value.
///
/// Only the formats with a defined conversion are materialized;
/// everything else (strings, plain integers, device paths,
/// unrecognized formats) stays raw.
#[derive(Debug, Clone, PartialEq)]
pub enum BcdValue {
    Boolean(bool),
    Guid(Uuid),
    GuidList(Vec<Uuid>),
    IntegerList(Vec<i32>),
    Raw(HiveValue),
}

/// One typed element of a BCD object.
#[derive(Debug, Clone, PartialEq)]
pub struct BcdElement {
    element_type: BcdElementType,
    value: BcdValue,
}

fn parse_braced_guid(raw: &str, path: &str) -> Result<Uuid, BcdError> {
    Uuid::parse_str(raw.trim_start_matches('{').trim_end_matches('}'))
        .map_err(|e| BcdError::malformed_value(path, format!("bad GUID {raw:?}: {e}")))
}

impl BcdElement {
    /// Reconstruct one element from its key. Fully validating: a
    /// missing `Element` value or a payload that contradicts the
    /// declared format rejects the element.
    pub fn read_from(key: &dyn HiveKey) -> Result<Self, BcdError> {
        let path = key.path();

        let element_type = u32::from_str_radix(key.name(), 16)
            .map(BcdElementType)
            .map_err(|_| {
                BcdError::invalid_store(
                    path.clone(),
                    format!("element key name {:?} is not hex", key.name()),
                )
            })?;

        let raw = key
            .value("Element")
            .ok_or_else(|| BcdError::invalid_store(path.clone(), "missing Element value"))?;

        let value = Self::decode(element_type, raw, &path)?;
        Ok(Self {
            element_type,
            value,
        })
    }

    fn decode(
        element_type: BcdElementType,
        raw: HiveValue,
        path: &str,
    ) -> Result<BcdValue, BcdError> {
        match element_type.format() {
            ElementFormat::Boolean => match &raw {
                HiveValue::Binary(bytes) => {
                    let byte = bytes.first().ok_or_else(|| {
                        BcdError::malformed_value(path, "boolean element with empty payload")
                    })?;
                    Ok(BcdValue::Boolean(*byte != 0))
                }
                _ => Err(BcdError::malformed_value(path, "boolean element is not binary")),
            },
            ElementFormat::Guid => match &raw {
                HiveValue::String(text) => {
                    Ok(BcdValue::Guid(parse_braced_guid(text, path)?))
                }
                _ => Err(BcdError::malformed_value(path, "guid element is not a string")),
            },
            ElementFormat::GuidList => match &raw {
                HiveValue::MultiString(texts) => {
                    let guids = texts
                        .iter()
                        .map(|text| parse_braced_guid(text, path))
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(BcdValue::GuidList(guids))
                }
                _ => Err(BcdError::malformed_value(
                    path,
                    "guid-list element is not a multi-string",
                )),
            },
            ElementFormat::IntegerList => match &raw {
                HiveValue::Binary(bytes) => {
                    if bytes.len() % 4 != 0 {
                        return Err(BcdError::malformed_value(
                            path,
                            format!("integer-list payload of {} bytes is not a multiple of 4", bytes.len()),
                        ));
                    }
                    let integers = bytes
                        .chunks_exact(4)
                        .map(|chunk| i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                        .collect();
                    Ok(BcdValue::IntegerList(integers))
                }
                _ => Err(BcdError::malformed_value(
                    path,
                    "integer-list element is not binary",
                )),
            },
            // String, Integer, DevicePath and unrecognized formats
            // pass through unconverted.
            _ => Ok(BcdValue::Raw(raw)),
        }
    }

    pub fn element_type(&self) -> BcdElementType {
        self.element_type
    }

    /// Format of this element, always derived from the type tag.
    pub fn format(&self) -> ElementFormat {
        self.element_type.format()
    }

    pub fn value(&self) -> &BcdValue {
        &self.value
    }

    /// Editor-facing name of the element type, if one is declared.
    pub fn name(&self) -> Option<&'static str> {
        names::element_name(self.element_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryHive, MemoryKey};

    fn element_key(name: &str, value: HiveValue) -> MemoryHive {
        MemoryHive::new(
            name.to_string(),
            MemoryKey::new().with_value("Element", value),
        )
    }

    #[test]
    fn boolean_byte_one_is_true_and_zero_is_false() {
        let hive = element_key("16000048", HiveValue::Binary(vec![1]));
        let element = BcdElement::read_from(&hive.root()).unwrap();
        assert_eq!(element.value(), &BcdValue::Boolean(true));
        assert_eq!(element.format(), ElementFormat::Boolean);

        let hive = element_key("16000048", HiveValue::Binary(vec![0]));
        let element = BcdElement::read_from(&hive.root()).unwrap();
        assert_eq!(element.value(), &BcdValue::Boolean(false));
    }

    #[test]
    fn integer_list_splits_into_le_i32_chunks() {
        let hive = element_key(
            "1700000a",
            HiveValue::Binary(vec![0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00]),
        );
        let element = BcdElement::read_from(&hive.root()).unwrap();
        assert_eq!(element.value(), &BcdValue::IntegerList(vec![1, 2]));
    }

    #[test]
    fn integer_list_length_violation_is_a_parse_error() {
        let hive = element_key("1700000a", HiveValue::Binary(vec![1, 2, 3]));
        let err = BcdElement::read_from(&hive.root()).unwrap_err();
        assert!(matches!(err, BcdError::MalformedValue { .. }));
        assert!(err.to_string().contains("multiple of 4"));
    }

    #[test]
    fn guid_and_guid_list_parse_braced_strings() {
        let hive = element_key(
            "23000003",
            HiveValue::String("{9dea862c-5cdd-4e70-acc1-f32b344d4795}".to_string()),
        );
        let element = BcdElement::read_from(&hive.root()).unwrap();
        assert!(matches!(element.value(), BcdValue::Guid(_)));

        let hive = element_key(
            "24000001",
            HiveValue::MultiString(vec![
                "{9dea862c-5cdd-4e70-acc1-f32b344d4795}".to_string(),
                "{b2721d73-1db4-4c62-bf78-c548a880142d}".to_string(),
            ]),
        );
        let element = BcdElement::read_from(&hive.root()).unwrap();
        match element.value() {
            BcdValue::GuidList(guids) => assert_eq!(guids.len(), 2),
            other => panic!("expected a guid list, got {other:?}"),
        }
    }

    #[test]
    fn string_and_integer_formats_pass_through_raw() {
        let hive = element_key("12000004", HiveValue::String("Windows 11".to_string()));
        let element = BcdElement::read_from(&hive.root()).unwrap();
        assert_eq!(
            element.value(),
            &BcdValue::Raw(HiveValue::String("Windows 11".to_string()))
        );
        assert_eq!(element.name(), Some("description"));

        let hive = element_key("25000004", HiveValue::Binary(vec![30, 0, 0, 0, 0, 0, 0, 0]));
        let element = BcdElement::read_from(&hive.root()).unwrap();
        assert!(matches!(element.value(), BcdValue::Raw(_)));
    }

    #[test]
    fn missing_element_value_rejects_with_the_key_path() {
        let hive = MemoryHive::new("12000004", MemoryKey::new());
        let err = BcdElement::read_from(&hive.root()).unwrap_err();
        assert!(matches!(err, BcdError::InvalidStore { .. }));
        assert!(err.to_string().contains("12000004"));
    }

    #[test]
    fn non_hex_key_name_rejects() {
        let hive = element_key("notahexname", HiveValue::Binary(vec![1]));
        let err = BcdElement::read_from(&hive.root()).unwrap_err();
        assert!(err.to_string().contains("not hex"));
    }
}
