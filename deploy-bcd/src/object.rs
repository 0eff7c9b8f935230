// SPDX-License-Identifier: GPL-3.0-only

//! Object and store reconstruction
//!
//! A [`BcdObject`] is rebuilt entirely in its constructor: the
//! `Description` subkey must carry the type tag, the `Elements`
//! subkey must exist, and every child of it must parse as an element.
//! There is no partially constructed object — the first violation
//! rejects the whole parse with the offending key path.

use uuid::Uuid;

use crate::element::BcdElement;
use crate::error::BcdError;
use crate::hive::HiveKey;
use crate::names;
use crate::types::{BcdElementType, BcdObjectType};

/// One boot object of a store.
#[derive(Debug, Clone, PartialEq)]
pub struct BcdObject {
    id: Uuid,
    object_type: BcdObjectType,
    elements: Vec<BcdElement>,
}

impl BcdObject {
    /// Reconstruct one object from its guid-named key.
    pub fn read_from(key: &dyn HiveKey) -> Result<Self, BcdError> {
        let path = key.path();

        let id = Uuid::parse_str(key.name().trim_start_matches('{').trim_end_matches('}'))
            .map_err(|_| {
                BcdError::invalid_store(
                    path.clone(),
                    format!("object key name {:?} is not a GUID", key.name()),
                )
            })?;

        let description = key
            .subkey("Description")
            .ok_or_else(|| BcdError::invalid_store(path.clone(), "missing Description subkey"))?;
        let object_type = description
            .value("Type")
            .and_then(|value| value.as_dword())
            .map(BcdObjectType)
            .ok_or_else(|| {
                BcdError::invalid_store(description.path(), "missing or non-dword Type value")
            })?;

        let elements_key = key
            .subkey("Elements")
            .ok_or_else(|| BcdError::invalid_store(path.clone(), "missing Elements subkey"))?;

        let mut elements = Vec::new();
        for name in elements_key.subkey_names() {
            let element_key = elements_key.subkey(&name).ok_or_else(|| {
                BcdError::invalid_store(elements_key.path(), format!("element {name} vanished"))
            })?;
            elements.push(BcdElement::read_from(element_key.as_ref())?);
        }

        Ok(Self {
            id,
            object_type,
            elements,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn object_type(&self) -> BcdObjectType {
        self.object_type
    }

    pub fn elements(&self) -> &[BcdElement] {
        &self.elements
    }

    pub fn element(&self, element_type: BcdElementType) -> Option<&BcdElement> {
        self.elements
            .iter()
            .find(|element| element.element_type() == element_type)
    }

    /// Editor-facing name of the object type, if one is declared.
    pub fn name(&self) -> Option<&'static str> {
        names::object_name(self.object_type)
    }
}

/// A whole store: every object under the `Objects` key.
#[derive(Debug, Clone, PartialEq)]
pub struct BcdStore {
    objects: Vec<BcdObject>,
}

impl BcdStore {
    /// Parse a store from its root key. Validating and eager, like
    /// the object parse it is built from.
    pub fn open(root: &dyn HiveKey) -> Result<Self, BcdError> {
        let objects_key = root
            .subkey("Objects")
            .ok_or_else(|| BcdError::invalid_store(root.path(), "missing Objects subkey"))?;

        let mut objects = Vec::new();
        for name in objects_key.subkey_names() {
            let object_key = objects_key.subkey(&name).ok_or_else(|| {
                BcdError::invalid_store(objects_key.path(), format!("object {name} vanished"))
            })?;
            objects.push(BcdObject::read_from(object_key.as_ref())?);
        }

        tracing::debug!(count = objects.len(), "parsed BCD store");
        Ok(Self { objects })
    }

    pub fn objects(&self) -> &[BcdObject] {
        &self.objects
    }

    pub fn object(&self, id: Uuid) -> Option<&BcdObject> {
        self.objects.iter().find(|object| object.id() == id)
    }

    /// All objects of one type, e.g. every OS loader entry.
    pub fn objects_of_type(&self, object_type: BcdObjectType) -> impl Iterator<Item = &BcdObject> {
        self.objects
            .iter()
            .filter(move |object| object.object_type() == object_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hive::HiveValue;
    use crate::memory::{MemoryHive, MemoryKey};

    const LOADER_GUID: &str = "{9dea862c-5cdd-4e70-acc1-f32b344d4795}";

    fn loader_object_key() -> MemoryKey {
        MemoryKey::new()
            .with_subkey(
                "Description",
                MemoryKey::new().with_value("Type", HiveValue::Dword(0x1020_0003)),
            )
            .with_subkey(
                "Elements",
                MemoryKey::new()
                    .with_subkey(
                        "12000004",
                        MemoryKey::new()
                            .with_value("Element", HiveValue::String("Windows 11".to_string())),
                    )
                    .with_subkey(
                        "16000048",
                        MemoryKey::new().with_value("Element", HiveValue::Binary(vec![1])),
                    ),
            )
    }

    fn store_hive() -> MemoryHive {
        MemoryHive::new(
            "BCD00000000",
            MemoryKey::new().with_subkey(
                "Objects",
                MemoryKey::new().with_subkey(LOADER_GUID, loader_object_key()),
            ),
        )
    }

    #[test]
    fn object_parses_type_elements_and_name() {
        let store = BcdStore::open(&store_hive().root()).unwrap();
        assert_eq!(store.objects().len(), 1);

        let object = &store.objects()[0];
        assert_eq!(object.object_type(), BcdObjectType::OS_LOADER);
        assert_eq!(object.name(), Some("osloader"));
        assert_eq!(object.elements().len(), 2);
        assert!(object.element(BcdElementType::DESCRIPTION).is_some());
    }

    #[test]
    fn lookup_by_id_round_trips_the_guid_key() {
        let store = BcdStore::open(&store_hive().root()).unwrap();
        let id = Uuid::parse_str("9dea862c-5cdd-4e70-acc1-f32b344d4795").unwrap();
        assert!(store.object(id).is_some());
        assert!(store.object(Uuid::nil()).is_none());
    }

    #[test]
    fn missing_description_rejects_with_path() {
        let hive = MemoryHive::new(
            "BCD00000000",
            MemoryKey::new().with_subkey(
                "Objects",
                MemoryKey::new().with_subkey(
                    LOADER_GUID,
                    MemoryKey::new().with_subkey("Elements", MemoryKey::new()),
                ),
            ),
        );
        let err = BcdStore::open(&hive.root()).unwrap_err();
        assert!(err.to_string().contains("missing Description"));
        assert!(err.to_string().contains(LOADER_GUID));
    }

    #[test]
    fn missing_elements_subkey_rejects() {
        let hive = MemoryHive::new(
            "BCD00000000",
            MemoryKey::new().with_subkey(
                "Objects",
                MemoryKey::new().with_subkey(
                    LOADER_GUID,
                    MemoryKey::new().with_subkey(
                        "Description",
                        MemoryKey::new().with_value("Type", HiveValue::Dword(0x1020_0003)),
                    ),
                ),
            ),
        );
        let err = BcdStore::open(&hive.root()).unwrap_err();
        assert!(err.to_string().contains("missing Elements"));
    }

    #[test]
    fn missing_type_value_rejects_at_the_description_key() {
        let hive = MemoryHive::new(
            "BCD00000000",
            MemoryKey::new().with_subkey(
                "Objects",
                MemoryKey::new().with_subkey(
                    LOADER_GUID,
                    MemoryKey::new()
                        .with_subkey("Description", MemoryKey::new())
                        .with_subkey("Elements", MemoryKey::new()),
                ),
            ),
        );
        let err = BcdStore::open(&hive.root()).unwrap_err();
        assert!(err.to_string().contains("Type"));
        assert!(err.to_string().contains("Description"));
    }

    #[test]
    fn one_bad_element_rejects_the_whole_object() {
        let mut object = loader_object_key();
        object = object.with_subkey(
            "Elements",
            MemoryKey::new().with_subkey(
                "1700000a",
                MemoryKey::new().with_value("Element", HiveValue::Binary(vec![1, 2, 3])),
            ),
        );
        let hive = MemoryHive::new(
            "BCD00000000",
            MemoryKey::new().with_subkey(
                "Objects",
                MemoryKey::new().with_subkey(LOADER_GUID, object),
            ),
        );
        assert!(BcdStore::open(&hive.root()).is_err());
    }
}
