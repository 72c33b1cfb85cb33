//! Object metadata: access, acknowledgement, telemetry and logging policy.
//!
//! Every data object owns exactly one [`Metadata`] object, created the
//! first time it is asked for. Its identity is derived from the parent
//! definition: the id is `parent | 1` and the name is the parent name with
//! `MetaData` appended.
//!
//! ## Wire layout
//!
//! ```text
//! offset  size  field
//!      0     1  flight access              raw AccessMode
//!      1     1  gcs access                 raw AccessMode
//!      2     1  flight telemetry acked     0 / 1
//!      3     1  flight telemetry mode      raw UpdateMode
//!      4     4  flight telemetry period    u32 LE, ms
//!      8     1  gcs telemetry acked        0 / 1
//!      9     1  gcs telemetry mode         raw UpdateMode
//!     10     4  gcs telemetry period       u32 LE, ms
//!     14     1  logging mode               raw UpdateMode
//!     15     4  logging period             u32 LE, ms
//! ```
//!
//! Only the two telemetry-period setters notify the metadata's listeners;
//! that is how a transport scheduler learns it has to reschedule. Every
//! other policy write is silent.

use std::borrow::Cow;
use std::sync::Arc;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::clock::now_ms;
use crate::definition::ObjectDefinition;
use crate::error::ObjectError;
use crate::field::{FieldDescription, FieldType, FieldValue};
use crate::listener::ChangeListeners;
use crate::modes::{AccessMode, UpdateMode};
use crate::object::{metadata_id, Timestamps, UavObject};

/// Encoded length of a metadata record.
pub const METADATA_LENGTH: usize = 19;

// ---------------------------------------------------------------------------
// Policy records
// ---------------------------------------------------------------------------

/// Policy of one side of the link (flight or ground).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ChannelPolicy {
    /// What this side may do with the object.
    pub access: AccessMode,
    /// Whether updates sent by this side must be acknowledged.
    pub telemetry_acked: bool,
    /// When this side sends updates.
    pub telemetry_update_mode: UpdateMode,
    /// Period of periodic updates in ms; `0` with on-change means immediate.
    pub telemetry_update_period_ms: u32,
}

/// Logging policy of an object.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingPolicy {
    /// When the object is logged.
    pub update_mode: UpdateMode,
    /// Period of periodic logging in ms.
    pub update_period_ms: u32,
}

impl Default for LoggingPolicy {
    fn default() -> Self {
        Self {
            update_mode: UpdateMode::Never,
            update_period_ms: 0,
        }
    }
}

/// The complete policy carried by a metadata object.
///
/// The default is what a schema without explicit metadata generates: both
/// sides read/write, unacked, on change with period 0, and no logging.
///
/// # Examples
///
/// ```
/// use uavlink_objects::{AccessMode, MetadataPolicy, UpdateMode};
///
/// let mut policy = MetadataPolicy::default();
/// policy.gcs.access = AccessMode::ReadOnly;
/// policy.flight.telemetry_update_mode = UpdateMode::Periodic;
/// policy.flight.telemetry_update_period_ms = 250;
///
/// let bytes = policy.to_bytes();
/// assert_eq!(bytes.len(), 19);
/// assert_eq!(MetadataPolicy::from_bytes(&bytes).unwrap(), policy);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(default)]
pub struct MetadataPolicy {
    /// Flight-side channel policy.
    pub flight: ChannelPolicy,
    /// Ground-side channel policy.
    pub gcs: ChannelPolicy,
    /// Logging policy.
    pub logging: LoggingPolicy,
}

impl MetadataPolicy {
    /// Append the 19-byte wire encoding.
    pub fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.flight.access.raw());
        buf.put_u8(self.gcs.access.raw());
        buf.put_u8(u8::from(self.flight.telemetry_acked));
        buf.put_u8(self.flight.telemetry_update_mode.raw());
        buf.put_u32_le(self.flight.telemetry_update_period_ms);
        buf.put_u8(u8::from(self.gcs.telemetry_acked));
        buf.put_u8(self.gcs.telemetry_update_mode.raw());
        buf.put_u32_le(self.gcs.telemetry_update_period_ms);
        buf.put_u8(self.logging.update_mode.raw());
        buf.put_u32_le(self.logging.update_period_ms);
    }

    /// Read a policy from the front of `buf`.
    ///
    /// The caller checks that at least [`METADATA_LENGTH`] bytes remain.
    /// Unknown mode bytes are kept as `Unknown`; any non-zero acked byte
    /// reads as `true`.
    pub fn decode(buf: &mut impl Buf) -> Self {
        let flight_access = AccessMode::from(buf.get_u8());
        let gcs_access = AccessMode::from(buf.get_u8());
        let flight = ChannelPolicy {
            access: flight_access,
            telemetry_acked: buf.get_u8() != 0,
            telemetry_update_mode: UpdateMode::from(buf.get_u8()),
            telemetry_update_period_ms: buf.get_u32_le(),
        };
        let gcs = ChannelPolicy {
            access: gcs_access,
            telemetry_acked: buf.get_u8() != 0,
            telemetry_update_mode: UpdateMode::from(buf.get_u8()),
            telemetry_update_period_ms: buf.get_u32_le(),
        };
        let logging = LoggingPolicy {
            update_mode: UpdateMode::from(buf.get_u8()),
            update_period_ms: buf.get_u32_le(),
        };
        Self { flight, gcs, logging }
    }

    /// The 19-byte wire encoding.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(METADATA_LENGTH);
        self.encode(&mut buf);
        buf.freeze()
    }

    /// Decode a policy from the start of `data`.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ObjectError> {
        if data.len() < METADATA_LENGTH {
            return Err(ObjectError::Decode {
                object: "metadata".into(),
                expected: METADATA_LENGTH,
                offset: 0,
                available: data.len(),
            });
        }
        let mut input = data;
        Ok(Self::decode(&mut input))
    }
}

// ---------------------------------------------------------------------------
// Field table
// ---------------------------------------------------------------------------

const FLIGHT_ACCESS: usize = 0;
const GCS_ACCESS: usize = 1;
const FLIGHT_TELEMETRY_ACKED: usize = 2;
const FLIGHT_TELEMETRY_UPDATE_MODE: usize = 3;
const FLIGHT_TELEMETRY_UPDATE_PERIOD: usize = 4;
const GCS_TELEMETRY_ACKED: usize = 5;
const GCS_TELEMETRY_UPDATE_MODE: usize = 6;
const GCS_TELEMETRY_UPDATE_PERIOD: usize = 7;
const LOGGING_UPDATE_MODE: usize = 8;
const LOGGING_UPDATE_PERIOD: usize = 9;

static METADATA_FIELDS: Lazy<Vec<FieldDescription>> = Lazy::new(|| {
    let access = || AccessMode::ALL.iter().map(ToString::to_string).collect::<Vec<_>>();
    let modes = || UpdateMode::ALL.iter().map(ToString::to_string).collect::<Vec<_>>();
    let acked = || vec!["False".to_string(), "True".to_string()];
    vec![
        FieldDescription::new("FlightAccess", FieldType::Enum).with_options(access()),
        FieldDescription::new("GcsAccess", FieldType::Enum).with_options(access()),
        FieldDescription::new("FlightTelemetryAcked", FieldType::Enum).with_options(acked()),
        FieldDescription::new("FlightTelemetryUpdateMode", FieldType::Enum).with_options(modes()),
        FieldDescription::new("FlightTelemetryUpdatePeriod", FieldType::UInt32).with_units("ms"),
        FieldDescription::new("GcsTelemetryAcked", FieldType::Enum).with_options(acked()),
        FieldDescription::new("GcsTelemetryUpdateMode", FieldType::Enum).with_options(modes()),
        FieldDescription::new("GcsTelemetryUpdatePeriod", FieldType::UInt32).with_units("ms"),
        FieldDescription::new("LoggingUpdateMode", FieldType::Enum).with_options(modes()),
        FieldDescription::new("LoggingUpdatePeriod", FieldType::UInt32).with_units("ms"),
    ]
});

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// The metadata object attached to a data object.
///
/// Obtained through [`DataObject::metadata`](crate::DataObject::metadata);
/// its identity always follows the parent definition.
///
/// Two timestamp records are kept: the parent's bookkeeping, reached through
/// [`data_timestamps`](Self::data_timestamps), and the metadata record's own,
/// stamped by its `serialize` and `deserialize`.
#[derive(Debug)]
pub struct Metadata {
    parent: Arc<ObjectDefinition>,
    policy: MetadataPolicy,
    data_timestamps: Timestamps,
    timestamps: Timestamps,
    listeners: ChangeListeners,
}

impl Metadata {
    pub(crate) fn new(parent: Arc<ObjectDefinition>) -> Self {
        Self {
            parent,
            policy: MetadataPolicy::default(),
            data_timestamps: Timestamps::default(),
            timestamps: Timestamps::default(),
            listeners: ChangeListeners::new(),
        }
    }

    /// Id of the data object this metadata belongs to.
    pub fn parent_id(&self) -> u32 {
        self.parent.id
    }

    /// Name of the data object this metadata belongs to.
    pub fn parent_name(&self) -> &str {
        &self.parent.name
    }

    /// Bookkeeping of the parent data object.
    ///
    /// Encoding or decoding the metadata record never touches these values.
    pub fn data_timestamps(&self) -> &Timestamps {
        &self.data_timestamps
    }

    /// The complete policy.
    pub fn policy(&self) -> &MetadataPolicy {
        &self.policy
    }

    /// Replace the complete policy without notifying listeners.
    pub fn set_policy(&mut self, policy: MetadataPolicy) {
        self.policy = policy;
    }

    /// Flight-side access mode.
    pub fn flight_access(&self) -> AccessMode {
        self.policy.flight.access
    }

    /// Set the flight-side access mode.
    pub fn set_flight_access(&mut self, access: AccessMode) {
        self.policy.flight.access = access;
    }

    /// Ground-side access mode.
    pub fn gcs_access(&self) -> AccessMode {
        self.policy.gcs.access
    }

    /// Set the ground-side access mode.
    pub fn set_gcs_access(&mut self, access: AccessMode) {
        self.policy.gcs.access = access;
    }

    /// Whether flight-side updates are acknowledged.
    pub fn is_flight_telemetry_acked(&self) -> bool {
        self.policy.flight.telemetry_acked
    }

    /// Set whether flight-side updates are acknowledged.
    pub fn set_flight_telemetry_acked(&mut self, acked: bool) {
        self.policy.flight.telemetry_acked = acked;
    }

    /// Whether ground-side updates are acknowledged.
    pub fn is_gcs_telemetry_acked(&self) -> bool {
        self.policy.gcs.telemetry_acked
    }

    /// Set whether ground-side updates are acknowledged.
    pub fn set_gcs_telemetry_acked(&mut self, acked: bool) {
        self.policy.gcs.telemetry_acked = acked;
    }

    /// Flight-side telemetry update mode.
    pub fn flight_telemetry_update_mode(&self) -> UpdateMode {
        self.policy.flight.telemetry_update_mode
    }

    /// Set the flight-side telemetry update mode.
    pub fn set_flight_telemetry_update_mode(&mut self, mode: UpdateMode) {
        self.policy.flight.telemetry_update_mode = mode;
    }

    /// Ground-side telemetry update mode.
    pub fn gcs_telemetry_update_mode(&self) -> UpdateMode {
        self.policy.gcs.telemetry_update_mode
    }

    /// Set the ground-side telemetry update mode.
    pub fn set_gcs_telemetry_update_mode(&mut self, mode: UpdateMode) {
        self.policy.gcs.telemetry_update_mode = mode;
    }

    /// Flight-side telemetry update period in ms.
    pub fn flight_telemetry_update_period(&self) -> u32 {
        self.policy.flight.telemetry_update_period_ms
    }

    /// Set the flight-side telemetry update period and notify listeners.
    ///
    /// The value is stored even when a listener fails.
    pub fn set_flight_telemetry_update_period(
        &mut self,
        period_ms: u32,
    ) -> Result<(), ObjectError> {
        self.policy.flight.telemetry_update_period_ms = period_ms;
        self.notify_change_listeners()
    }

    /// Ground-side telemetry update period in ms.
    pub fn gcs_telemetry_update_period(&self) -> u32 {
        self.policy.gcs.telemetry_update_period_ms
    }

    /// Set the ground-side telemetry update period and notify listeners.
    ///
    /// The value is stored even when a listener fails.
    pub fn set_gcs_telemetry_update_period(&mut self, period_ms: u32) -> Result<(), ObjectError> {
        self.policy.gcs.telemetry_update_period_ms = period_ms;
        self.notify_change_listeners()
    }

    /// Logging update mode.
    pub fn logging_update_mode(&self) -> UpdateMode {
        self.policy.logging.update_mode
    }

    /// Set the logging update mode.
    pub fn set_logging_update_mode(&mut self, mode: UpdateMode) {
        self.policy.logging.update_mode = mode;
    }

    /// Logging update period in ms.
    pub fn logging_update_period(&self) -> u32 {
        self.policy.logging.update_period_ms
    }

    /// Set the logging update period.
    pub fn set_logging_update_period(&mut self, period_ms: u32) {
        self.policy.logging.update_period_ms = period_ms;
    }

    fn check_field(
        &self,
        field_id: usize,
        index: usize,
    ) -> Result<&'static FieldDescription, ObjectError> {
        let field = METADATA_FIELDS.get(field_id).ok_or_else(|| ObjectError::UnknownField {
            object: self.name().into_owned(),
            field_id,
            count: METADATA_FIELDS.len(),
        })?;
        if index >= field.elements {
            return Err(ObjectError::IndexOutOfRange {
                object: self.name().into_owned(),
                field: field.name.clone(),
                index,
                elements: field.elements,
            });
        }
        Ok(field)
    }
}

fn acked_flag(raw: u8) -> Result<bool, ObjectError> {
    match raw {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(ObjectError::InvalidValue {
            field_type: FieldType::Enum,
            value: other.to_string(),
            reason: "acked flags are 0 (False) or 1 (True)".into(),
        }),
    }
}

impl UavObject for Metadata {
    fn object_id(&self) -> u32 {
        metadata_id(self.parent.id)
    }

    fn name(&self) -> Cow<'_, str> {
        Cow::Owned(format!("{}MetaData", self.parent.name))
    }

    fn description(&self) -> Cow<'_, str> {
        Cow::Owned(format!("MetaData for {}", self.parent.name))
    }

    fn is_setting(&self) -> bool {
        false
    }

    fn is_metadata(&self) -> bool {
        true
    }

    fn field_descriptions(&self) -> &[FieldDescription] {
        &METADATA_FIELDS
    }

    fn field(&self, field_id: usize, index: usize) -> Result<FieldValue, ObjectError> {
        self.check_field(field_id, index)?;
        let p = &self.policy;
        let value = match field_id {
            FLIGHT_ACCESS => FieldValue::Enum(p.flight.access.raw()),
            GCS_ACCESS => FieldValue::Enum(p.gcs.access.raw()),
            FLIGHT_TELEMETRY_ACKED => FieldValue::Enum(u8::from(p.flight.telemetry_acked)),
            FLIGHT_TELEMETRY_UPDATE_MODE => {
                FieldValue::Enum(p.flight.telemetry_update_mode.raw())
            }
            FLIGHT_TELEMETRY_UPDATE_PERIOD => {
                FieldValue::UInt32(p.flight.telemetry_update_period_ms)
            }
            GCS_TELEMETRY_ACKED => FieldValue::Enum(u8::from(p.gcs.telemetry_acked)),
            GCS_TELEMETRY_UPDATE_MODE => FieldValue::Enum(p.gcs.telemetry_update_mode.raw()),
            GCS_TELEMETRY_UPDATE_PERIOD => FieldValue::UInt32(p.gcs.telemetry_update_period_ms),
            LOGGING_UPDATE_MODE => FieldValue::Enum(p.logging.update_mode.raw()),
            _ => FieldValue::UInt32(p.logging.update_period_ms),
        };
        Ok(value)
    }

    /// Acked fields only take the raw values `0` and `1`; anything else
    /// fails with [`ObjectError::InvalidValue`].
    fn set_field(
        &mut self,
        field_id: usize,
        index: usize,
        value: FieldValue,
    ) -> Result<(), ObjectError> {
        let field = self.check_field(field_id, index)?;
        match (field_id, value) {
            (FLIGHT_ACCESS, FieldValue::Enum(raw)) => {
                self.set_flight_access(AccessMode::from(raw));
            }
            (GCS_ACCESS, FieldValue::Enum(raw)) => self.set_gcs_access(AccessMode::from(raw)),
            (FLIGHT_TELEMETRY_ACKED, FieldValue::Enum(raw)) => {
                self.set_flight_telemetry_acked(acked_flag(raw)?);
            }
            (FLIGHT_TELEMETRY_UPDATE_MODE, FieldValue::Enum(raw)) => {
                self.set_flight_telemetry_update_mode(UpdateMode::from(raw));
            }
            (FLIGHT_TELEMETRY_UPDATE_PERIOD, FieldValue::UInt32(ms)) => {
                return self.set_flight_telemetry_update_period(ms);
            }
            (GCS_TELEMETRY_ACKED, FieldValue::Enum(raw)) => {
                self.set_gcs_telemetry_acked(acked_flag(raw)?);
            }
            (GCS_TELEMETRY_UPDATE_MODE, FieldValue::Enum(raw)) => {
                self.set_gcs_telemetry_update_mode(UpdateMode::from(raw));
            }
            (GCS_TELEMETRY_UPDATE_PERIOD, FieldValue::UInt32(ms)) => {
                return self.set_gcs_telemetry_update_period(ms);
            }
            (LOGGING_UPDATE_MODE, FieldValue::Enum(raw)) => {
                self.set_logging_update_mode(UpdateMode::from(raw));
            }
            (LOGGING_UPDATE_PERIOD, FieldValue::UInt32(ms)) => self.set_logging_update_period(ms),
            _ => {
                return Err(ObjectError::TypeMismatch {
                    object: self.name().into_owned(),
                    field: field.name.clone(),
                    expected: field.field_type,
                    actual: value.field_type(),
                });
            }
        }
        Ok(())
    }

    fn serialize(&self) -> Bytes {
        self.timestamps.set_last_serialize_ms(now_ms());
        let bytes = self.policy.to_bytes();
        trace!(object = %self.name(), len = bytes.len(), "serialized metadata");
        bytes
    }

    fn deserialize(&mut self, data: &[u8], offset: usize) -> Result<(), ObjectError> {
        let Some(mut input) = data.get(offset..).filter(|rest| rest.len() >= METADATA_LENGTH) else {
            return Err(ObjectError::Decode {
                object: self.name().into_owned(),
                expected: METADATA_LENGTH,
                offset,
                available: data.len(),
            });
        };
        self.policy = MetadataPolicy::decode(&mut input);
        self.timestamps.set_last_deserialize_ms(now_ms());
        trace!(object = %self.name(), offset, "deserialized metadata");
        Ok(())
    }

    fn data_length(&self) -> usize {
        METADATA_LENGTH
    }

    fn attached_metadata(&self) -> Option<&Metadata> {
        None
    }

    fn timestamps(&self) -> &Timestamps {
        &self.timestamps
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::listener::{listener_from_fn, ChangeListener};

    fn flight_status() -> Metadata {
        Metadata::new(Arc::new(ObjectDefinition::new(0x2A6E_0F2C, "FlightStatus")))
    }

    fn counting(hits: &Arc<AtomicUsize>) -> Arc<dyn ChangeListener> {
        let hits = Arc::clone(hits);
        listener_from_fn(move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn scenario_policy() -> MetadataPolicy {
        MetadataPolicy {
            flight: ChannelPolicy {
                access: AccessMode::ReadWrite,
                telemetry_acked: true,
                telemetry_update_mode: UpdateMode::Periodic,
                telemetry_update_period_ms: 250,
            },
            gcs: ChannelPolicy {
                access: AccessMode::ReadOnly,
                telemetry_acked: false,
                telemetry_update_mode: UpdateMode::OnChange,
                telemetry_update_period_ms: 0,
            },
            logging: LoggingPolicy {
                update_mode: UpdateMode::Never,
                update_period_ms: 0,
            },
        }
    }

    #[test]
    fn identity_follows_parent() {
        let md = flight_status();
        assert_eq!(md.object_id(), 0x2A6E_0F2D);
        assert_eq!(md.object_id() % 2, 1);
        assert_eq!(md.parent_id(), 0x2A6E_0F2C);
        assert_eq!(md.name(), "FlightStatusMetaData");
        assert_eq!(md.description(), "MetaData for FlightStatus");
        assert!(md.is_metadata());
        assert!(!md.is_setting());
        assert!(md.attached_metadata().is_none());
    }

    #[test]
    fn serializes_reference_vector() {
        let mut md = flight_status();
        md.set_policy(scenario_policy());
        let bytes = md.serialize();
        assert_eq!(
            &bytes[..],
            &[
                0x00, 0x01, 0x01, 0x00, 0xFA, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00,
                0x00, 0x03, 0x00, 0x00, 0x00, 0x00
            ]
        );
        assert_eq!(bytes.len(), md.data_length());
    }

    #[test]
    fn serialize_records_timestamp_on_itself() {
        let md = flight_status();
        assert_eq!(md.timestamps().last_serialize_ms(), 0);
        md.serialize();
        assert!(md.timestamps().last_serialize_ms() > 0);
    }

    #[test]
    fn roundtrip_reproduces_policy() {
        let mut source = flight_status();
        source.set_policy(MetadataPolicy {
            logging: LoggingPolicy {
                update_mode: UpdateMode::Periodic,
                update_period_ms: 0xDEAD_BEEF,
            },
            ..scenario_policy()
        });
        let mut target = flight_status();
        target.deserialize(&source.serialize(), 0).unwrap();
        assert_eq!(target.policy(), source.policy());
        assert!(target.timestamps().last_deserialize_ms() > 0);
    }

    #[test]
    fn deserialize_at_offset() {
        let mut framed = vec![0xAA, 0xBB, 0xCC];
        framed.extend_from_slice(&scenario_policy().to_bytes());
        let mut md = flight_status();
        md.deserialize(&framed, 3).unwrap();
        assert_eq!(*md.policy(), scenario_policy());
    }

    #[test]
    fn short_buffer_is_rejected_without_side_effects() {
        let mut md = flight_status();
        md.set_policy(scenario_policy());
        let err = md.deserialize(&[0u8; 18], 0).unwrap_err();
        assert!(matches!(
            err,
            ObjectError::Decode { expected: 19, available: 18, .. }
        ));
        assert_eq!(*md.policy(), scenario_policy());
        assert_eq!(md.timestamps().last_deserialize_ms(), 0);

        let full = scenario_policy().to_bytes();
        assert!(md.deserialize(&full, 1).is_err());
        assert!(md.deserialize(&full, 40).is_err());
    }

    #[test]
    fn unknown_modes_survive_roundtrip() {
        let mut raw = scenario_policy().to_bytes().to_vec();
        raw[0] = 7; // flight access
        raw[9] = 42; // gcs telemetry mode
        let policy = MetadataPolicy::from_bytes(&raw).unwrap();
        assert_eq!(policy.flight.access, AccessMode::Unknown(7));
        assert_eq!(policy.gcs.telemetry_update_mode, UpdateMode::Unknown(42));
        assert_eq!(policy.to_bytes().to_vec(), raw);
    }

    #[test]
    fn from_bytes_rejects_short_input() {
        assert!(matches!(
            MetadataPolicy::from_bytes(&[0; 5]),
            Err(ObjectError::Decode { expected: 19, available: 5, .. })
        ));
    }

    #[test]
    fn period_setters_notify_exactly_once() {
        let mut md = flight_status();
        let hits = Arc::new(AtomicUsize::new(0));
        let listener = counting(&hits);
        md.add_change_listener(&listener);

        md.set_flight_telemetry_update_period(500).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        md.set_gcs_telemetry_update_period(500).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        // Same value again still notifies.
        md.set_gcs_telemetry_update_period(500).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert_eq!(md.flight_telemetry_update_period(), 500);
        assert_eq!(md.gcs_telemetry_update_period(), 500);
    }

    #[test]
    fn other_setters_are_silent() {
        let mut md = flight_status();
        let hits = Arc::new(AtomicUsize::new(0));
        let listener = counting(&hits);
        md.add_change_listener(&listener);

        md.set_flight_access(AccessMode::ReadOnly);
        md.set_gcs_access(AccessMode::WriteOnly);
        md.set_flight_telemetry_acked(true);
        md.set_gcs_telemetry_acked(true);
        md.set_flight_telemetry_update_mode(UpdateMode::Manual);
        md.set_gcs_telemetry_update_mode(UpdateMode::Periodic);
        md.set_logging_update_mode(UpdateMode::Periodic);
        md.set_logging_update_period(1000);
        md.set_policy(scenario_policy());
        md.deserialize(&scenario_policy().to_bytes(), 0).unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn period_setter_stores_value_when_listener_fails() {
        let mut md = flight_status();
        let broken = listener_from_fn(|_| Err("scheduler offline".into()));
        md.add_change_listener(&broken);

        let err = md.set_flight_telemetry_update_period(100).unwrap_err();
        assert!(matches!(
            err,
            ObjectError::Listener { ref object, .. } if object == "FlightStatusMetaData"
        ));
        assert_eq!(md.flight_telemetry_update_period(), 100);
    }

    #[test]
    fn field_table_matches_layout() {
        let md = flight_status();
        let fields = md.field_descriptions();
        assert_eq!(fields.len(), 10);
        let total: usize = fields.iter().map(FieldDescription::byte_len).sum();
        assert_eq!(total, METADATA_LENGTH);
        assert_eq!(md.field_id("GcsTelemetryUpdatePeriod"), Some(7));
        assert_eq!(fields[0].options, vec!["Read/Write", "Read only", "Write only"]);
        assert_eq!(fields[3].options, vec!["periodic", "on change", "manual", "never"]);
    }

    #[test]
    fn generic_field_access() {
        let mut md = flight_status();
        md.set_policy(scenario_policy());
        assert_eq!(md.field(GCS_ACCESS, 0).unwrap(), FieldValue::Enum(1));
        assert_eq!(md.field(FLIGHT_TELEMETRY_ACKED, 0).unwrap(), FieldValue::Enum(1));
        assert_eq!(md.field(FLIGHT_TELEMETRY_UPDATE_PERIOD, 0).unwrap(), FieldValue::UInt32(250));
        assert_eq!(md.field(LOGGING_UPDATE_MODE, 0).unwrap(), FieldValue::Enum(3));

        md.set_field(LOGGING_UPDATE_PERIOD, 0, FieldValue::UInt32(60_000)).unwrap();
        assert_eq!(md.logging_update_period(), 60_000);
        md.set_field(FLIGHT_ACCESS, 0, FieldValue::Enum(2)).unwrap();
        assert_eq!(md.flight_access(), AccessMode::WriteOnly);
    }

    #[test]
    fn generic_period_write_notifies() {
        let mut md = flight_status();
        let hits = Arc::new(AtomicUsize::new(0));
        let listener = counting(&hits);
        md.add_change_listener(&listener);

        md.set_field(GCS_TELEMETRY_UPDATE_PERIOD, 0, FieldValue::UInt32(10)).unwrap();
        md.set_field(GCS_TELEMETRY_UPDATE_MODE, 0, FieldValue::Enum(0)).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn generic_field_errors() {
        let mut md = flight_status();
        assert!(matches!(
            md.field(10, 0),
            Err(ObjectError::UnknownField { field_id: 10, count: 10, .. })
        ));
        assert!(matches!(
            md.field(0, 1),
            Err(ObjectError::IndexOutOfRange { index: 1, elements: 1, .. })
        ));
        assert!(matches!(
            md.set_field(FLIGHT_TELEMETRY_UPDATE_PERIOD, 0, FieldValue::UInt16(5)),
            Err(ObjectError::TypeMismatch {
                expected: FieldType::UInt32,
                actual: FieldType::UInt16,
                ..
            })
        ));
    }

    #[test]
    fn acked_fields_only_take_boolean_raw_values() {
        let mut md = flight_status();
        md.set_field(FLIGHT_TELEMETRY_ACKED, 0, FieldValue::Enum(1)).unwrap();
        assert_eq!(md.field(FLIGHT_TELEMETRY_ACKED, 0).unwrap(), FieldValue::Enum(1));

        let err = md
            .set_field(GCS_TELEMETRY_ACKED, 0, FieldValue::Enum(5))
            .unwrap_err();
        assert!(matches!(
            err,
            ObjectError::InvalidValue { field_type: FieldType::Enum, ref value, .. } if value == "5"
        ));
        assert!(!md.is_gcs_telemetry_acked());
        assert!(md.set_field(FLIGHT_TELEMETRY_ACKED, 0, FieldValue::Enum(2)).is_err());
        assert!(md.is_flight_telemetry_acked());
    }

    #[test]
    fn policy_json_defaults() {
        let policy: MetadataPolicy =
            serde_json::from_str(r#"{ "flight": { "telemetry_acked": true } }"#).unwrap();
        assert!(policy.flight.telemetry_acked);
        assert_eq!(policy.flight.access, AccessMode::ReadWrite);
        assert_eq!(policy.gcs, ChannelPolicy::default());
        assert_eq!(policy.logging, LoggingPolicy::default());
    }
}
