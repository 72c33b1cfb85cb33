//! Object definitions: the schema record of a telemetry object.
//!
//! An [`ObjectDefinition`] is what the external schema generator knows
//! about an object: identity, fields in encoding order and the default
//! metadata policy applied when the object's metadata is first created.
//! Definitions deserialize from JSON, with the object id given either as a
//! number or as a `0x` hexadecimal string.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ObjectError;
use crate::field::{FieldDescription, FieldType};
use crate::metadata::MetadataPolicy;
use crate::object::is_metadata_id;

/// Schema record of a data object.
///
/// # Examples
///
/// ```
/// use uavlink_objects::{ObjectDefinition, UpdateMode};
///
/// let def = ObjectDefinition::from_json(r#"{
///     "id": "0x2A6E0F2C",
///     "name": "FlightStatus",
///     "fields": [
///         { "name": "Armed", "type": "enum", "options": ["Disarmed", "Arming", "Armed"] },
///         { "name": "FlightTime", "type": "uint32", "units": "ms" }
///     ],
///     "metadata": {
///         "flight": { "telemetry_update_mode": "Periodic", "telemetry_update_period_ms": 1000 }
///     }
/// }"#).unwrap();
///
/// assert_eq!(def.id, 0x2A6E_0F2C);
/// assert_eq!(def.data_length(), 5);
/// assert_eq!(def.metadata.flight.telemetry_update_mode, UpdateMode::Periodic);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ObjectDefinition {
    /// Object id; must be even.
    #[serde(deserialize_with = "deserialize_object_id")]
    pub id: u32,
    /// Object name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Whether the object is a setting rather than telemetry.
    #[serde(default)]
    pub is_setting: bool,
    /// Fields in encoding order.
    #[serde(default)]
    pub fields: Vec<FieldDescription>,
    /// Default metadata policy.
    #[serde(default)]
    pub metadata: MetadataPolicy,
}

impl ObjectDefinition {
    /// A definition with no fields and the default metadata policy.
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            is_setting: false,
            fields: Vec::new(),
            metadata: MetadataPolicy::default(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Mark the object as a setting.
    pub fn setting(mut self, is_setting: bool) -> Self {
        self.is_setting = is_setting;
        self
    }

    /// Append a field.
    pub fn with_field(mut self, field: FieldDescription) -> Self {
        self.fields.push(field);
        self
    }

    /// Set the default metadata policy.
    pub fn with_metadata(mut self, metadata: MetadataPolicy) -> Self {
        self.metadata = metadata;
        self
    }

    /// Parse and validate a JSON definition.
    pub fn from_json(json: &str) -> Result<Self, ObjectError> {
        let definition: Self = serde_json::from_str(json)?;
        definition.validate()?;
        Ok(definition)
    }

    /// Encoded data length of the object in bytes.
    pub fn data_length(&self) -> usize {
        self.fields.iter().map(FieldDescription::byte_len).sum()
    }

    /// Check the schema rules for data objects.
    pub fn validate(&self) -> Result<(), ObjectError> {
        let invalid = |reason: String| ObjectError::InvalidDefinition {
            object: self.name.clone(),
            reason,
        };

        if self.name.is_empty() {
            return Err(invalid("name must not be empty".into()));
        }
        if is_metadata_id(self.id) {
            return Err(invalid(format!(
                "object id {:#010x} is odd; odd ids are reserved for metadata",
                self.id
            )));
        }

        let mut names = HashSet::new();
        for field in &self.fields {
            if field.name.is_empty() {
                return Err(invalid("field names must not be empty".into()));
            }
            if !names.insert(field.name.as_str()) {
                return Err(invalid(format!("duplicate field {}", field.name)));
            }
            if field.elements == 0 {
                return Err(invalid(format!("field {} has no elements", field.name)));
            }
            if !field.element_names.is_empty() && field.element_names.len() != field.elements {
                return Err(invalid(format!(
                    "field {} names {} elements but declares {}",
                    field.name,
                    field.element_names.len(),
                    field.elements
                )));
            }
            if field.field_type == FieldType::Enum {
                if field.options.is_empty() {
                    return Err(invalid(format!("enum field {} has no options", field.name)));
                }
                if field.options.len() > usize::from(u8::MAX) + 1 {
                    return Err(invalid(format!(
                        "enum field {} has more than 256 options",
                        field.name
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawObjectId {
    Number(u32),
    Text(String),
}

fn deserialize_object_id<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    match RawObjectId::deserialize(deserializer)? {
        RawObjectId::Number(id) => Ok(id),
        RawObjectId::Text(text) => {
            let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
                Some(hex) => u32::from_str_radix(hex, 16),
                None => text.parse(),
            };
            parsed.map_err(|e| {
                serde::de::Error::custom(format!("invalid object id \"{text}\": {e}"))
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
