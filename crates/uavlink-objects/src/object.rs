//! The telemetry object abstraction.
//!
//! [`UavObject`] is the capability set shared by every object on the link:
//! identify, describe, read and write fields, serialize and deserialize.
//! It has exactly two implementations, [`DataObject`](crate::DataObject)
//! and [`Metadata`](crate::Metadata).
//!
//! Object ids share one 32-bit space in which bit 0 tells a metadata
//! object (`1`) from a data object (`0`).

use std::borrow::Cow;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;

use crate::error::ObjectError;
use crate::field::{FieldDescription, FieldValue};
use crate::listener::{ChangeListener, ChangeListeners};
use crate::metadata::Metadata;

// ---------------------------------------------------------------------------
// Identity helpers
// ---------------------------------------------------------------------------

/// Bit of an object id that marks a metadata object.
pub const METADATA_ID_BIT: u32 = 1;

/// Id of the metadata object attached to the object `id`.
///
/// ```
/// assert_eq!(uavlink_objects::metadata_id(0x2A6E_0F2C), 0x2A6E_0F2D);
/// ```
pub fn metadata_id(id: u32) -> u32 {
    id | METADATA_ID_BIT
}

/// Id of the data object a metadata id belongs to.
pub fn parent_id(id: u32) -> u32 {
    id & !METADATA_ID_BIT
}

/// Whether `id` names a metadata object.
pub fn is_metadata_id(id: u32) -> bool {
    id & METADATA_ID_BIT != 0
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Process-local bookkeeping of an object.
///
/// A data object's record is held by its metadata; a metadata object keeps
/// a separate record for its own encoding.
///
/// None of these values are serialized. They are atomics so that
/// `serialize(&self)` can record its side effect without exclusive access.
#[derive(Debug, Default)]
pub struct Timestamps {
    last_serialize_ms: AtomicU64,
    last_deserialize_ms: AtomicU64,
    last_log_ms: AtomicU64,
    last_gcs_update_ms: AtomicU64,
    last_flight_update_ms: AtomicU64,
    last_send_ms: AtomicU64,
    ack_pending: AtomicBool,
}

impl Timestamps {
    /// Time of the last `serialize` call, in ms since the epoch.
    pub fn last_serialize_ms(&self) -> u64 {
        self.last_serialize_ms.load(Ordering::Relaxed)
    }

    /// Record a `serialize` call.
    pub fn set_last_serialize_ms(&self, ms: u64) {
        self.last_serialize_ms.store(ms, Ordering::Relaxed);
    }

    /// Time of the last successful `deserialize` call.
    pub fn last_deserialize_ms(&self) -> u64 {
        self.last_deserialize_ms.load(Ordering::Relaxed)
    }

    /// Record a successful `deserialize` call.
    pub fn set_last_deserialize_ms(&self, ms: u64) {
        self.last_deserialize_ms.store(ms, Ordering::Relaxed);
    }

    /// Time the object was last written to a log.
    pub fn last_log_ms(&self) -> u64 {
        self.last_log_ms.load(Ordering::Relaxed)
    }

    /// Record a log write.
    pub fn set_last_log_ms(&self, ms: u64) {
        self.last_log_ms.store(ms, Ordering::Relaxed);
    }

    /// Time of the last update received from the ground side.
    pub fn last_gcs_update_ms(&self) -> u64 {
        self.last_gcs_update_ms.load(Ordering::Relaxed)
    }

    /// Record an update from the ground side.
    pub fn set_last_gcs_update_ms(&self, ms: u64) {
        self.last_gcs_update_ms.store(ms, Ordering::Relaxed);
    }

    /// Time of the last update received from the flight side.
    pub fn last_flight_update_ms(&self) -> u64 {
        self.last_flight_update_ms.load(Ordering::Relaxed)
    }

    /// Record an update from the flight side.
    pub fn set_last_flight_update_ms(&self, ms: u64) {
        self.last_flight_update_ms.store(ms, Ordering::Relaxed);
    }

    /// Time the object was last handed to the transport.
    pub fn last_send_ms(&self) -> u64 {
        self.last_send_ms.load(Ordering::Relaxed)
    }

    /// Record a send.
    pub fn set_last_send_ms(&self, ms: u64) {
        self.last_send_ms.store(ms, Ordering::Relaxed);
    }

    /// Whether an acknowledged send is still waiting for its ack.
    pub fn ack_pending(&self) -> bool {
        self.ack_pending.load(Ordering::Relaxed)
    }

    /// Mark an ack as pending or received.
    pub fn set_ack_pending(&self, pending: bool) {
        self.ack_pending.store(pending, Ordering::Relaxed);
    }
}

// ---------------------------------------------------------------------------
// UavObject
// ---------------------------------------------------------------------------

/// A self-describing telemetry object.
///
/// The trait is object safe; registries and listeners handle objects as
/// `&dyn UavObject`.
pub trait UavObject {
    /// Schema-derived object id. Even for data objects, odd for metadata.
    fn object_id(&self) -> u32;

    /// Object name.
    fn name(&self) -> Cow<'_, str>;

    /// Human-readable description.
    fn description(&self) -> Cow<'_, str>;

    /// Whether this is a configuration object rather than telemetry.
    fn is_setting(&self) -> bool;

    /// Whether this is a metadata object.
    fn is_metadata(&self) -> bool;

    /// The object's fields in encoding order.
    fn field_descriptions(&self) -> &[FieldDescription];

    /// Read element `index` of field `field_id`.
    fn field(&self, field_id: usize, index: usize) -> Result<FieldValue, ObjectError>;

    /// Write element `index` of field `field_id`.
    ///
    /// Fails on an unknown field, an out-of-range index or a value of the
    /// wrong type. Listener failures triggered by the write are returned
    /// after the value has been stored.
    fn set_field(&mut self, field_id: usize, index: usize, value: FieldValue)
        -> Result<(), ObjectError>;

    /// Encode the object and record the serialize time.
    fn serialize(&self) -> Bytes;

    /// Apply `data[offset..]` to the object.
    ///
    /// All or nothing: a buffer holding fewer than
    /// [`data_length`](Self::data_length) bytes from `offset` returns
    /// [`ObjectError::Decode`] and leaves the object untouched.
    fn deserialize(&mut self, data: &[u8], offset: usize) -> Result<(), ObjectError>;

    /// Encoded length in bytes; always `serialize().len()`.
    fn data_length(&self) -> usize;

    /// The metadata attached to this object, created on first access.
    ///
    /// Metadata objects have no metadata of their own and return `None`.
    fn attached_metadata(&self) -> Option<&Metadata>;

    /// Process-local timestamps of the object.
    fn timestamps(&self) -> &Timestamps;

    /// Listeners registered on this object.
    fn change_listeners(&self) -> &ChangeListeners;

    /// Invoke every registered listener with this object.
    fn notify_change_listeners(&self) -> Result<(), ObjectError>;

    /// Register a listener. The object keeps only a weak reference; the
    /// caller owns the listener's lifetime.
    fn add_change_listener(&self, listener: &Arc<dyn ChangeListener>) {
        self.change_listeners().add(listener);
    }

    /// Index of the field called `name`.
    fn field_id(&self, name: &str) -> Option<usize> {
        self.field_descriptions().iter().position(|f| f.name == name)
    }
}

/// One-line summary of an object, e.g.
/// `FlightStatus (ID: 0x2a6e0f2c, NumBytes: 3, Setting: false)`.
pub fn summary(object: &dyn UavObject) -> String {
    format!(
        "{} (ID: {:#010x}, NumBytes: {}, Setting: {})",
        object.name(),
        object.object_id(),
        object.data_length(),
        object.is_setting()
    )
}

/// Multi-line dump of every field value of an object.
pub fn data_dump(object: &dyn UavObject) -> String {
    let mut out = String::from("Data:\n");
    for (field_id, field) in object.field_descriptions().iter().enumerate() {
        let values: Vec<String> = (0..field.elements)
            .map(|index| match object.field(field_id, index) {
                Ok(value) => field.format_value(&value),
                Err(e) => format!("<{e}>"),
            })
            .collect();
        let _ = write!(out, "\t{}: {}", field.name, values.join(", "));
        if !field.units.is_empty() {
            let _ = write!(out, " {}", field.units);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_ids_are_odd() {
        assert_eq!(metadata_id(0x1000), 0x1001);
        assert_eq!(metadata_id(0x1001), 0x1001);
        assert!(is_metadata_id(metadata_id(0xABCD_EF00)));
        assert!(!is_metadata_id(0xABCD_EF00));
    }

    #[test]
    fn parent_id_clears_metadata_bit() {
        assert_eq!(parent_id(0x1001), 0x1000);
        assert_eq!(parent_id(0x1000), 0x1000);
        assert_eq!(parent_id(metadata_id(u32::MAX - 1)), u32::MAX - 1);
    }

    #[test]
    fn timestamps_start_at_zero() {
        let ts = Timestamps::default();
        assert_eq!(ts.last_serialize_ms(), 0);
        assert_eq!(ts.last_deserialize_ms(), 0);
        assert!(!ts.ack_pending());
    }

    #[test]
    fn timestamps_store_through_shared_ref() {
        let ts = Timestamps::default();
        ts.set_last_log_ms(10);
        ts.set_last_gcs_update_ms(20);
        ts.set_last_flight_update_ms(30);
        ts.set_last_send_ms(40);
        ts.set_ack_pending(true);
        assert_eq!(ts.last_log_ms(), 10);
        assert_eq!(ts.last_gcs_update_ms(), 20);
        assert_eq!(ts.last_flight_update_ms(), 30);
        assert_eq!(ts.last_send_ms(), 40);
        assert!(ts.ack_pending());
    }
}
