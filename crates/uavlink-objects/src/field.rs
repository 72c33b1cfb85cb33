//! Field model: element types, field descriptions and typed values.
//!
//! Every field is encoded in a fixed-width little-endian representation,
//! with array elements concatenated in index order and no length prefixes.
//!
//! | Type | Width |
//! |------|-------|
//! | `int8`, `uint8`, `enum`, `bitfield` | 1 |
//! | `int16`, `uint16` | 2 |
//! | `int32`, `uint32`, `float32` | 4 |

use std::fmt;

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

use crate::error::ObjectError;

// ---------------------------------------------------------------------------
// FieldType
// ---------------------------------------------------------------------------

/// Element type of a field.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash,
    strum::Display, strum::EnumString, strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FieldType {
    /// Signed 8-bit integer.
    Int8,
    /// Signed 16-bit integer.
    Int16,
    /// Signed 32-bit integer.
    Int32,
    /// Unsigned 8-bit integer.
    UInt8,
    /// Unsigned 16-bit integer.
    UInt16,
    /// Unsigned 32-bit integer.
    UInt32,
    /// IEEE-754 single precision float.
    Float32,
    /// Index into the field's option list, one byte.
    Enum,
    /// Eight independent flags packed into one byte.
    Bitfield,
}

impl FieldType {
    /// Encoded width of one element in bytes.
    pub fn width(self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 | Self::Enum | Self::Bitfield => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
        }
    }

    /// The zero value of this type.
    pub fn zero(self) -> FieldValue {
        match self {
            Self::Int8 => FieldValue::Int8(0),
            Self::Int16 => FieldValue::Int16(0),
            Self::Int32 => FieldValue::Int32(0),
            Self::UInt8 => FieldValue::UInt8(0),
            Self::UInt16 => FieldValue::UInt16(0),
            Self::UInt32 => FieldValue::UInt32(0),
            Self::Float32 => FieldValue::Float32(0.0),
            Self::Enum => FieldValue::Enum(0),
            Self::Bitfield => FieldValue::Bitfield(0),
        }
    }

    /// Parse a textual number as a value of this type.
    ///
    /// Unsigned types accept a `0x` hexadecimal prefix.
    pub fn parse_value(self, text: &str) -> Result<FieldValue, ObjectError> {
        let text = text.trim();
        let invalid = |reason: String| ObjectError::InvalidValue {
            field_type: self,
            value: text.to_string(),
            reason,
        };
        let value = match self {
            Self::Int8 => FieldValue::Int8(text.parse().map_err(|e| invalid(format!("{e}")))?),
            Self::Int16 => FieldValue::Int16(text.parse().map_err(|e| invalid(format!("{e}")))?),
            Self::Int32 => FieldValue::Int32(text.parse().map_err(|e| invalid(format!("{e}")))?),
            Self::UInt8 => FieldValue::UInt8(parse_unsigned(text).map_err(invalid)?),
            Self::UInt16 => FieldValue::UInt16(parse_unsigned(text).map_err(invalid)?),
            Self::UInt32 => FieldValue::UInt32(parse_unsigned(text).map_err(invalid)?),
            Self::Float32 => {
                FieldValue::Float32(text.parse().map_err(|e| invalid(format!("{e}")))?)
            }
            Self::Enum => FieldValue::Enum(parse_unsigned(text).map_err(invalid)?),
            Self::Bitfield => FieldValue::Bitfield(parse_unsigned(text).map_err(invalid)?),
        };
        Ok(value)
    }
}

fn parse_unsigned<T>(text: &str) -> Result<T, String>
where
    T: TryFrom<u64>,
{
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse::<u64>(),
    }
    .map_err(|e| e.to_string())?;
    T::try_from(parsed).map_err(|_| "number too large for type".to_string())
}

// ---------------------------------------------------------------------------
// FieldValue
// ---------------------------------------------------------------------------

/// A single typed field element.
///
/// # Examples
///
/// ```
/// use bytes::BytesMut;
/// use uavlink_objects::{FieldType, FieldValue};
///
/// let mut buf = BytesMut::new();
/// FieldValue::UInt16(0x1234).encode(&mut buf);
/// assert_eq!(&buf[..], &[0x34, 0x12]);
///
/// let mut input = &buf[..];
/// assert_eq!(FieldValue::decode(FieldType::UInt16, &mut input), FieldValue::UInt16(0x1234));
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum FieldValue {
    /// An `int8` element.
    Int8(i8),
    /// An `int16` element.
    Int16(i16),
    /// An `int32` element.
    Int32(i32),
    /// A `uint8` element.
    UInt8(u8),
    /// A `uint16` element.
    UInt16(u16),
    /// A `uint32` element.
    UInt32(u32),
    /// A `float32` element.
    Float32(f32),
    /// An `enum` element (raw option index).
    Enum(u8),
    /// A `bitfield` element.
    Bitfield(u8),
}

impl FieldValue {
    /// The type this value belongs to.
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Int8(_) => FieldType::Int8,
            Self::Int16(_) => FieldType::Int16,
            Self::Int32(_) => FieldType::Int32,
            Self::UInt8(_) => FieldType::UInt8,
            Self::UInt16(_) => FieldType::UInt16,
            Self::UInt32(_) => FieldType::UInt32,
            Self::Float32(_) => FieldType::Float32,
            Self::Enum(_) => FieldType::Enum,
            Self::Bitfield(_) => FieldType::Bitfield,
        }
    }

    /// Append the little-endian encoding of this value.
    pub fn encode(&self, buf: &mut impl BufMut) {
        match *self {
            Self::Int8(v) => buf.put_i8(v),
            Self::Int16(v) => buf.put_i16_le(v),
            Self::Int32(v) => buf.put_i32_le(v),
            Self::UInt8(v) | Self::Enum(v) | Self::Bitfield(v) => buf.put_u8(v),
            Self::UInt16(v) => buf.put_u16_le(v),
            Self::UInt32(v) => buf.put_u32_le(v),
            Self::Float32(v) => buf.put_f32_le(v),
        }
    }

    /// Read one element of `field_type` from the front of `buf`.
    ///
    /// The caller checks that at least [`FieldType::width`] bytes remain.
    pub fn decode(field_type: FieldType, buf: &mut impl Buf) -> Self {
        match field_type {
            FieldType::Int8 => Self::Int8(buf.get_i8()),
            FieldType::Int16 => Self::Int16(buf.get_i16_le()),
            FieldType::Int32 => Self::Int32(buf.get_i32_le()),
            FieldType::UInt8 => Self::UInt8(buf.get_u8()),
            FieldType::UInt16 => Self::UInt16(buf.get_u16_le()),
            FieldType::UInt32 => Self::UInt32(buf.get_u32_le()),
            FieldType::Float32 => Self::Float32(buf.get_f32_le()),
            FieldType::Enum => Self::Enum(buf.get_u8()),
            FieldType::Bitfield => Self::Bitfield(buf.get_u8()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int8(v) => write!(f, "{v}"),
            Self::Int16(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::UInt8(v) | Self::Enum(v) => write!(f, "{v}"),
            Self::UInt16(v) => write!(f, "{v}"),
            Self::UInt32(v) => write!(f, "{v}"),
            Self::Float32(v) => write!(f, "{v}"),
            Self::Bitfield(v) => write!(f, "{v:#010b}"),
        }
    }
}

// ---------------------------------------------------------------------------
// FieldDescription
// ---------------------------------------------------------------------------

fn one() -> usize {
    1
}

fn is_one(n: &usize) -> bool {
    *n == 1
}

/// Schema description of one field of an object.
///
/// Deserialises from the JSON form used by object definition files:
///
/// ```
/// use uavlink_objects::{FieldDescription, FieldType};
///
/// let field: FieldDescription = serde_json::from_str(
///     r#"{ "name": "Channel", "type": "int16", "elements": 8, "units": "us" }"#,
/// ).unwrap();
/// assert_eq!(field.field_type, FieldType::Int16);
/// assert_eq!(field.byte_len(), 16);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldDescription {
    /// Field name, unique within the object.
    pub name: String,
    /// Element type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Array arity; `1` for scalar fields.
    #[serde(default = "one", skip_serializing_if = "is_one")]
    pub elements: usize,
    /// Optional names of the array elements (e.g. `Roll`, `Pitch`, `Yaw`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub element_names: Vec<String>,
    /// Display units.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub units: String,
    /// Option labels of an `enum` field, indexed by raw value.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl FieldDescription {
    /// A scalar field of the given type.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            elements: 1,
            element_names: Vec::new(),
            units: String::new(),
            options: Vec::new(),
        }
    }

    /// Set the array arity.
    pub fn with_elements(mut self, elements: usize) -> Self {
        self.elements = elements;
        self
    }

    /// Name the array elements; the arity follows the number of names.
    pub fn with_element_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.element_names = names.into_iter().map(Into::into).collect();
        self.elements = self.element_names.len();
        self
    }

    /// Set the display units.
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    /// Set the option labels of an `enum` field.
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Encoded size of the whole field in bytes.
    pub fn byte_len(&self) -> usize {
        self.field_type.width() * self.elements
    }

    /// Display name of element `index`: its declared name, or the index.
    pub fn element_label(&self, index: usize) -> String {
        self.element_names
            .get(index)
            .cloned()
            .unwrap_or_else(|| index.to_string())
    }

    /// Index of the element called `name`.
    pub fn element_index(&self, name: &str) -> Option<usize> {
        self.element_names.iter().position(|n| n == name)
    }

    /// Parse text as an element of this field.
    ///
    /// `enum` fields accept an option label (case-insensitive) as well as
    /// the raw number.
    pub fn parse_value(&self, text: &str) -> Result<FieldValue, ObjectError> {
        if self.field_type == FieldType::Enum {
            let wanted = text.trim();
            if let Some(raw) = self
                .options
                .iter()
                .position(|opt| opt.eq_ignore_ascii_case(wanted))
            {
                // Options are indexed by a single byte; validate() caps the list.
                return Ok(FieldValue::Enum(u8::try_from(raw).unwrap_or(u8::MAX)));
            }
        }
        self.field_type.parse_value(text)
    }

    /// Render a value for diagnostics, using the option label of `enum`
    /// values when one exists.
    pub fn format_value(&self, value: &FieldValue) -> String {
        match value {
            FieldValue::Enum(raw) => self
                .options
                .get(usize::from(*raw))
                .cloned()
                .unwrap_or_else(|| format!("unknown ({raw})")),
            other => format!("{other}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
