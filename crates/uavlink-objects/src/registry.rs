//! In-memory registry of data objects, keyed by object id.
//!
//! The registry owns the data objects; their metadata objects are reached
//! through them. Looking up an odd id resolves to the metadata of the data
//! object with the even id below it.

use std::collections::BTreeMap;

use tracing::debug;

use crate::data_object::DataObject;
use crate::definition::ObjectDefinition;
use crate::error::ObjectError;
use crate::object::{is_metadata_id, parent_id, UavObject};

/// Data objects indexed by id, iterated in id order.
///
/// # Examples
///
/// ```
/// use uavlink_objects::{DataObject, ObjectDefinition, ObjectRegistry, UavObject};
///
/// let mut registry = ObjectRegistry::new();
/// let status = DataObject::new(ObjectDefinition::new(0x2A6E_0F2C, "FlightStatus")).unwrap();
/// registry.register(status).unwrap();
///
/// let metadata = registry.find(0x2A6E_0F2D).unwrap();
/// assert!(metadata.is_metadata());
/// assert_eq!(metadata.name(), "FlightStatusMetaData");
/// ```
#[derive(Debug, Default)]
pub struct ObjectRegistry {
    objects: BTreeMap<u32, DataObject>,
}

impl ObjectRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build objects from `definitions` and register them all.
    pub fn from_definitions<I>(definitions: I) -> Result<Self, ObjectError>
    where
        I: IntoIterator<Item = ObjectDefinition>,
    {
        let mut registry = Self::new();
        for definition in definitions {
            registry.register(DataObject::new(definition)?)?;
        }
        Ok(registry)
    }

    /// Register a data object. Fails when its id is already taken.
    pub fn register(&mut self, object: DataObject) -> Result<(), ObjectError> {
        let id = object.object_id();
        if let Some(existing) = self.objects.get(&id) {
            return Err(ObjectError::DuplicateObject {
                id,
                existing: existing.name().into_owned(),
            });
        }
        debug!(object = %object.name(), id, "registered object");
        self.objects.insert(id, object);
        Ok(())
    }

    /// Remove and return the data object with `id`.
    pub fn unregister(&mut self, id: u32) -> Option<DataObject> {
        self.objects.remove(&id)
    }

    /// The object with `id`; odd ids resolve to the parent's metadata.
    pub fn find(&self, id: u32) -> Option<&dyn UavObject> {
        if is_metadata_id(id) {
            let parent = self.objects.get(&parent_id(id))?;
            Some(parent.metadata())
        } else {
            self.objects.get(&id).map(|object| object as &dyn UavObject)
        }
    }

    /// The object called `name`, or the metadata of `<Name>MetaData`.
    pub fn find_by_name(&self, name: &str) -> Option<&dyn UavObject> {
        if let Some(object) = self.objects.values().find(|o| o.definition().name == name) {
            return Some(object);
        }
        let parent = name.strip_suffix("MetaData")?;
        self.objects
            .values()
            .find(|o| o.definition().name == parent)
            .map(|o| o.metadata() as &dyn UavObject)
    }

    /// The data object with the even id `id`.
    pub fn get(&self, id: u32) -> Option<&DataObject> {
        self.objects.get(&id)
    }

    /// Mutable access to the data object with the even id `id`.
    pub fn get_mut(&mut self, id: u32) -> Option<&mut DataObject> {
        self.objects.get_mut(&id)
    }

    /// Like [`get`](Self::get), failing with [`ObjectError::UnknownObject`].
    pub fn require(&self, id: u32) -> Result<&DataObject, ObjectError> {
        self.get(id)
            .ok_or_else(|| ObjectError::UnknownObject(format!("{id:#010x}")))
    }

    /// Data objects in id order.
    pub fn iter(&self) -> impl Iterator<Item = &DataObject> {
        self.objects.values()
    }

    /// Number of registered data objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldDescription, FieldType};

    fn definitions() -> Vec<ObjectDefinition> {
        vec![
            ObjectDefinition::new(0x5000, "GpsPosition")
                .with_field(FieldDescription::new("Latitude", FieldType::Int32)),
            ObjectDefinition::new(0x1000, "FlightStatus")
                .with_field(
                    FieldDescription::new("Armed", FieldType::Enum).with_options(["No", "Yes"]),
                ),
            ObjectDefinition::new(0x3000, "SystemSettings").setting(true),
        ]
    }

    #[test]
    fn register_and_iterate_in_id_order() {
        let registry = ObjectRegistry::from_definitions(definitions()).unwrap();
        assert_eq!(registry.len(), 3);
        let ids: Vec<u32> = registry.iter().map(UavObject::object_id).collect();
        assert_eq!(ids, vec![0x1000, 0x3000, 0x5000]);
    }

    #[test]
    fn duplicate_id_rejected() {
        let mut registry = ObjectRegistry::from_definitions(definitions()).unwrap();
        let clash = DataObject::new(ObjectDefinition::new(0x1000, "Other")).unwrap();
        let err = registry.register(clash).unwrap_err();
        assert_eq!(err.to_string(), "object id 0x00001000 already registered by FlightStatus");
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn invalid_definition_fails_construction() {
        let mut defs = definitions();
        defs.push(ObjectDefinition::new(0x7001, "Odd"));
        assert!(matches!(
            ObjectRegistry::from_definitions(defs),
            Err(ObjectError::InvalidDefinition { .. })
        ));
    }

    #[test]
    fn odd_id_resolves_to_metadata() {
        let registry = ObjectRegistry::from_definitions(definitions()).unwrap();
        let data = registry.find(0x1000).unwrap();
        assert!(!data.is_metadata());
        let meta = registry.find(0x1001).unwrap();
        assert!(meta.is_metadata());
        assert_eq!(meta.object_id(), 0x1001);
        assert_eq!(meta.name(), "FlightStatusMetaData");
        assert!(registry.find(0x2000).is_none());
        assert!(registry.find(0x2001).is_none());
    }

    #[test]
    fn find_by_name_covers_metadata() {
        let registry = ObjectRegistry::from_definitions(definitions()).unwrap();
        assert_eq!(registry.find_by_name("GpsPosition").unwrap().object_id(), 0x5000);
        assert_eq!(registry.find_by_name("GpsPositionMetaData").unwrap().object_id(), 0x5001);
        assert!(registry.find_by_name("Missing").is_none());
        assert!(registry.find_by_name("MissingMetaData").is_none());
    }

    #[test]
    fn mutable_access_and_removal() {
        let mut registry = ObjectRegistry::from_definitions(definitions()).unwrap();
        registry
            .get_mut(0x5000)
            .unwrap()
            .set_field_by_name("Latitude", 0, crate::FieldValue::Int32(-33_865_143))
            .unwrap();
        assert_eq!(
            registry.get(0x5000).unwrap().field(0, 0).unwrap(),
            crate::FieldValue::Int32(-33_865_143)
        );

        assert!(registry.unregister(0x3000).is_some());
        assert!(matches!(registry.require(0x3000), Err(ObjectError::UnknownObject(_))));
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
    }
}
