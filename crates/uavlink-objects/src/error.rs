//! Error types for the `uavlink-objects` crate.
//!
//! Every fallible operation on an object, a definition or the registry
//! returns a variant of [`ObjectError`].

use crate::field::FieldType;

/// Error reported by a change listener.
///
/// Listeners are arbitrary embedder code, so any error type is accepted.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced by telemetry objects and their metadata.
#[derive(Debug, thiserror::Error)]
pub enum ObjectError {
    /// The buffer handed to `deserialize` is shorter than the object's data
    /// length. The object is left untouched.
    #[error(
        "{object}: cannot decode {expected} bytes at offset {offset}, buffer holds {available}"
    )]
    Decode {
        /// Name of the object being decoded.
        object: String,
        /// Bytes the object needs.
        expected: usize,
        /// Offset the decode started at.
        offset: usize,
        /// Total length of the buffer.
        available: usize,
    },

    /// A field id does not index a field of the object.
    #[error("{object}: no field with id {field_id} ({count} fields)")]
    UnknownField {
        /// Name of the object.
        object: String,
        /// The rejected field id.
        field_id: usize,
        /// Number of fields the object declares.
        count: usize,
    },

    /// No field of the object has the requested name.
    #[error("{object}: no field named {name}")]
    NoSuchField {
        /// Name of the object.
        object: String,
        /// The requested field name.
        name: String,
    },

    /// An array index lies outside a field's declared arity.
    #[error("{object}.{field}: index {index} out of range ({elements} elements)")]
    IndexOutOfRange {
        /// Name of the object.
        object: String,
        /// Name of the field.
        field: String,
        /// The rejected element index.
        index: usize,
        /// Declared arity of the field.
        elements: usize,
    },

    /// A value of the wrong type was written to a field.
    #[error("{object}.{field}: expected {expected} value, got {actual}")]
    TypeMismatch {
        /// Name of the object.
        object: String,
        /// Name of the field.
        field: String,
        /// Declared type of the field.
        expected: FieldType,
        /// Type of the value that was supplied.
        actual: FieldType,
    },

    /// A textual value could not be parsed for a field.
    #[error("invalid {field_type} value \"{value}\": {reason}")]
    InvalidValue {
        /// Type the text was parsed as.
        field_type: FieldType,
        /// The offending text.
        value: String,
        /// Human-readable explanation.
        reason: String,
    },

    /// A change listener failed during notification.
    #[error("{object}: change listener failed: {source}")]
    Listener {
        /// Name of the object whose listeners were notified.
        object: String,
        /// The first error reported by a listener.
        #[source]
        source: ListenerError,
    },

    /// An object definition violates a schema rule.
    #[error("invalid definition for {object}: {reason}")]
    InvalidDefinition {
        /// Name of the defined object.
        object: String,
        /// Human-readable explanation.
        reason: String,
    },

    /// Two objects with the same id were registered.
    #[error("object id {id:#010x} already registered by {existing}")]
    DuplicateObject {
        /// The conflicting id.
        id: u32,
        /// Name of the object already holding the id.
        existing: String,
    },

    /// No registered object matches the requested id or name.
    #[error("unknown object {0}")]
    UnknownObject(String),

    /// An object definition could not be parsed.
    #[error("definition parse error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_decode() {
        let err = ObjectError::Decode {
            object: "GPSPosition".into(),
            expected: 12,
            offset: 4,
            available: 10,
        };
        assert_eq!(
            err.to_string(),
            "GPSPosition: cannot decode 12 bytes at offset 4, buffer holds 10"
        );
    }

    #[test]
    fn error_display_index_out_of_range() {
        let err = ObjectError::IndexOutOfRange {
            object: "ActuatorCommand".into(),
            field: "Channel".into(),
            index: 8,
            elements: 8,
        };
        assert_eq!(
            err.to_string(),
            "ActuatorCommand.Channel: index 8 out of range (8 elements)"
        );
    }

    #[test]
    fn error_display_type_mismatch() {
        let err = ObjectError::TypeMismatch {
            object: "FlightStatus".into(),
            field: "Armed".into(),
            expected: FieldType::Enum,
            actual: FieldType::Float32,
        };
        assert_eq!(
            err.to_string(),
            "FlightStatus.Armed: expected enum value, got float32"
        );
    }

    #[test]
    fn error_display_duplicate_object() {
        let err = ObjectError::DuplicateObject {
            id: 0x1234_5678,
            existing: "FlightStatus".into(),
        };
        assert_eq!(
            err.to_string(),
            "object id 0x12345678 already registered by FlightStatus"
        );
    }

    #[test]
    fn listener_error_keeps_source() {
        use std::error::Error as _;
        let err = ObjectError::Listener {
            object: "FlightStatusMetaData".into(),
            source: "scheduler offline".into(),
        };
        assert_eq!(
            err.to_string(),
            "FlightStatusMetaData: change listener failed: scheduler offline"
        );
        assert_eq!(err.source().unwrap().to_string(), "scheduler offline");
    }
}
