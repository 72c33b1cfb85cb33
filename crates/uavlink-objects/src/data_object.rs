//! Schema-driven data objects.
//!
//! A [`DataObject`] holds one value per field element, in the field order
//! of its [`ObjectDefinition`]. Its metadata is created the first time it is
//! asked for and initialised from the definition's default policy.

use std::borrow::Cow;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use once_cell::sync::OnceCell;
use tracing::{debug, trace};

use crate::clock::now_ms;
use crate::definition::ObjectDefinition;
use crate::error::ObjectError;
use crate::field::{FieldDescription, FieldValue};
use crate::listener::ChangeListeners;
use crate::metadata::Metadata;
use crate::object::{Timestamps, UavObject};

/// A telemetry or settings object built from a definition.
///
/// # Examples
///
/// ```
/// use uavlink_objects::{
///     DataObject, FieldDescription, FieldType, FieldValue, ObjectDefinition, UavObject,
/// };
///
/// let def = ObjectDefinition::new(0x2A6E_0F2C, "FlightStatus")
///     .with_field(
///         FieldDescription::new("Armed", FieldType::Enum).with_options(["Disarmed", "Armed"]),
///     )
///     .with_field(FieldDescription::new("FlightTime", FieldType::UInt16));
/// let mut status = DataObject::new(def).unwrap();
///
/// status.set_field(1, 0, FieldValue::UInt16(600)).unwrap();
/// assert_eq!(&status.serialize()[..], &[0x00, 0x58, 0x02]);
/// assert_eq!(status.metadata().object_id(), 0x2A6E_0F2D);
/// ```
#[derive(Debug)]
pub struct DataObject {
    definition: Arc<ObjectDefinition>,
    values: Vec<Vec<FieldValue>>,
    metadata: OnceCell<Metadata>,
    listeners: ChangeListeners,
}

impl DataObject {
    /// Validate `definition` and build an object with every field zeroed.
    pub fn new(definition: ObjectDefinition) -> Result<Self, ObjectError> {
        Self::from_shared(Arc::new(definition))
    }

    /// Like [`new`](Self::new), for a definition shared with other objects.
    pub fn from_shared(definition: Arc<ObjectDefinition>) -> Result<Self, ObjectError> {
        definition.validate()?;
        let values = definition
            .fields
            .iter()
            .map(|field| vec![field.field_type.zero(); field.elements])
            .collect();
        Ok(Self {
            definition,
            values,
            metadata: OnceCell::new(),
            listeners: ChangeListeners::new(),
        })
    }

    /// The definition this object was built from.
    pub fn definition(&self) -> &ObjectDefinition {
        &self.definition
    }

    /// The attached metadata, created on first access.
    ///
    /// Every call returns the same instance.
    pub fn metadata(&self) -> &Metadata {
        self.metadata.get_or_init(|| {
            let mut metadata = Metadata::new(Arc::clone(&self.definition));
            self.set_generated_metadata(&mut metadata);
            debug!(object = %self.definition.name, id = self.definition.id, "created metadata");
            metadata
        })
    }

    /// Mutable access to the attached metadata, creating it if needed.
    pub fn metadata_mut(&mut self) -> &mut Metadata {
        self.metadata();
        match self.metadata.get_mut() {
            Some(metadata) => metadata,
            None => unreachable!("metadata initialised above"),
        }
    }

    /// Apply the definition's default policy to `metadata`.
    ///
    /// This is the hook generated objects use to seed their metadata; it
    /// runs once, when the metadata is created, and writing the same policy
    /// again leaves the metadata unchanged.
    pub fn set_generated_metadata(&self, metadata: &mut Metadata) {
        metadata.set_policy(self.definition.metadata);
    }

    /// Read a field element by field name.
    pub fn field_by_name(&self, name: &str, index: usize) -> Result<FieldValue, ObjectError> {
        let field_id = self.lookup(name)?;
        self.field(field_id, index)
    }

    /// Write a field element by field name.
    pub fn set_field_by_name(
        &mut self,
        name: &str,
        index: usize,
        value: FieldValue,
    ) -> Result<(), ObjectError> {
        let field_id = self.lookup(name)?;
        self.set_field(field_id, index, value)
    }

    fn lookup(&self, name: &str) -> Result<usize, ObjectError> {
        self.field_id(name).ok_or_else(|| ObjectError::NoSuchField {
            object: self.definition.name.clone(),
            name: name.to_string(),
        })
    }

    fn check_field(&self, field_id: usize, index: usize) -> Result<&FieldDescription, ObjectError> {
        let field = self
            .definition
            .fields
            .get(field_id)
            .ok_or_else(|| ObjectError::UnknownField {
                object: self.definition.name.clone(),
                field_id,
                count: self.definition.fields.len(),
            })?;
        if index >= field.elements {
            return Err(ObjectError::IndexOutOfRange {
                object: self.definition.name.clone(),
                field: field.name.clone(),
                index,
                elements: field.elements,
            });
        }
        Ok(field)
    }
}

impl UavObject for DataObject {
    fn object_id(&self) -> u32 {
        self.definition.id
    }

    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.definition.name)
    }

    fn description(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.definition.description)
    }

    fn is_setting(&self) -> bool {
        self.definition.is_setting
    }

    fn is_metadata(&self) -> bool {
        false
    }

    fn field_descriptions(&self) -> &[FieldDescription] {
        &self.definition.fields
    }

    fn field(&self, field_id: usize, index: usize) -> Result<FieldValue, ObjectError> {
        self.check_field(field_id, index)?;
        Ok(self.values[field_id][index])
    }

    fn set_field(
        &mut self,
        field_id: usize,
        index: usize,
        value: FieldValue,
    ) -> Result<(), ObjectError> {
        let field = self.check_field(field_id, index)?;
        if value.field_type() != field.field_type {
            return Err(ObjectError::TypeMismatch {
                object: self.definition.name.clone(),
                field: field.name.clone(),
                expected: field.field_type,
                actual: value.field_type(),
            });
        }
        self.values[field_id][index] = value;
        self.notify_change_listeners()
    }

    fn serialize(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.definition.data_length());
        for value in self.values.iter().flatten() {
            value.encode(&mut buf);
        }
        self.timestamps().set_last_serialize_ms(now_ms());
        trace!(object = %self.definition.name, len = buf.len(), "serialized object");
        buf.freeze()
    }

    fn deserialize(&mut self, data: &[u8], offset: usize) -> Result<(), ObjectError> {
        let expected = self.definition.data_length();
        let Some(mut input) = data.get(offset..).filter(|rest| rest.len() >= expected) else {
            return Err(ObjectError::Decode {
                object: self.definition.name.clone(),
                expected,
                offset,
                available: data.len(),
            });
        };
        let decoded: Vec<Vec<FieldValue>> = self
            .definition
            .fields
            .iter()
            .map(|field| {
                (0..field.elements)
                    .map(|_| FieldValue::decode(field.field_type, &mut input))
                    .collect()
            })
            .collect();
        self.values = decoded;
        self.timestamps().set_last_deserialize_ms(now_ms());
        trace!(object = %self.definition.name, offset, "deserialized object");
        self.notify_change_listeners()
    }

    fn data_length(&self) -> usize {
        self.definition.data_length()
    }

    fn attached_metadata(&self) -> Option<&Metadata> {
        Some(self.metadata())
    }

    fn timestamps(&self) -> &Timestamps {
        self.metadata().data_timestamps()
    }

    fn change_listeners(&self) -> &ChangeListeners {
        &self.listeners
    }

    fn notify_change_listeners(&self) -> Result<(), ObjectError> {
        self.listeners.notify(self)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
