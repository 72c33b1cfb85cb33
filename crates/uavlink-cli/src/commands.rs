//! Implementations of the CLI subcommands.
//!
//! Every command renders into a `String` so the binary only has to print
//! it; text is the default and `--json` switches to `serde_json` output.

use std::fmt::Write as _;

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use uavlink_objects::{
    data_dump, is_metadata_id, parent_id, summary, AccessMode, DataObject, FieldDescription,
    MetadataPolicy, ObjectDefinition, ObjectRegistry, UavObject, UpdateMode, METADATA_LENGTH,
};

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Human-readable text.
    Text,
    /// Pretty-printed JSON.
    Json,
}

// ---------------------------------------------------------------------------
// Input helpers
// ---------------------------------------------------------------------------

/// Parse a hex byte string. Whitespace, `:` and `-` separators and a
/// leading `0x` are accepted.
pub fn parse_hex(text: &str) -> Result<Vec<u8>> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: String = body
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':' && *c != '-')
        .collect();
    hex::decode(&digits).with_context(|| format!("invalid hex input \"{text}\""))
}

/// Parse an object id given in decimal or `0x` hexadecimal.
pub fn parse_object_id(text: &str) -> Option<u32> {
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

/// Resolve an object reference (name or id) to its data-object definition
/// and whether the metadata object was meant.
fn resolve<'a>(registry: &'a ObjectRegistry, object: &str) -> Result<(&'a ObjectDefinition, bool)> {
    let id = match parse_object_id(object) {
        Some(id) => id,
        None => registry
            .find_by_name(object)
            .map(|found| found.object_id())
            .ok_or_else(|| anyhow!("unknown object {object}"))?,
    };
    let parent = registry
        .get(parent_id(id))
        .ok_or_else(|| anyhow!("unknown object {id:#010x}"))?;
    Ok((parent.definition(), is_metadata_id(id)))
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ListEntry<'a> {
    id: u32,
    name: &'a str,
    num_bytes: usize,
    is_setting: bool,
}

/// One line per registered object, in id order.
pub fn list(registry: &ObjectRegistry, format: Format) -> Result<String> {
    match format {
        Format::Text => {
            let mut out = String::new();
            for object in registry.iter() {
                writeln!(out, "{}", summary(object))?;
            }
            Ok(out)
        }
        Format::Json => {
            let entries: Vec<ListEntry<'_>> = registry
                .iter()
                .map(|object| ListEntry {
                    id: object.object_id(),
                    name: &object.definition().name,
                    num_bytes: object.data_length(),
                    is_setting: object.is_setting(),
                })
                .collect();
            Ok(serde_json::to_string_pretty(&entries)?)
        }
    }
}

// ---------------------------------------------------------------------------
// describe
// ---------------------------------------------------------------------------

fn describe_field(field: &FieldDescription) -> String {
    let mut line = format!("{} {}", field.name, field.field_type);
    if field.elements > 1 {
        let _ = write!(line, "[{}]", field.elements);
    }
    if !field.element_names.is_empty() {
        let _ = write!(line, " ({})", field.element_names.join(", "));
    }
    if !field.units.is_empty() {
        let _ = write!(line, " {}", field.units);
    }
    if !field.options.is_empty() {
        let _ = write!(line, " {{{}}}", field.options.join(", "));
    }
    line
}

/// Fields and default metadata of one object.
pub fn describe(registry: &ObjectRegistry, object: &str, format: Format) -> Result<String> {
    let (definition, metadata) = resolve(registry, object)?;
    let data = DataObject::new(definition.clone())?;
    let target: &dyn UavObject = if metadata { data.metadata() } else { &data };

    if format == Format::Json {
        return Ok(if metadata {
            serde_json::to_string_pretty(data.metadata().policy())?
        } else {
            serde_json::to_string_pretty(definition)?
        });
    }

    let mut out = String::new();
    writeln!(out, "{}", summary(target))?;
    if !target.description().is_empty() {
        writeln!(out, "{}", target.description())?;
    }
    writeln!(out, "Fields:")?;
    for field in target.field_descriptions() {
        writeln!(out, "\t{}", describe_field(field))?;
    }
    if !metadata {
        writeln!(out, "Metadata ({:#010x}):", data.metadata().object_id())?;
        out.push_str(&render_policy(data.metadata().policy()));
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// decode
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct DecodedField {
    name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    units: String,
    values: Vec<String>,
}

#[derive(Serialize)]
struct DecodedObject {
    id: u32,
    name: String,
    fields: Vec<DecodedField>,
}

fn decoded(object: &dyn UavObject) -> Result<DecodedObject> {
    let mut fields = Vec::new();
    for (field_id, field) in object.field_descriptions().iter().enumerate() {
        let mut values = Vec::with_capacity(field.elements);
        for index in 0..field.elements {
            values.push(field.format_value(&object.field(field_id, index)?));
        }
        fields.push(DecodedField {
            name: field.name.clone(),
            units: field.units.clone(),
            values,
        });
    }
    Ok(DecodedObject {
        id: object.object_id(),
        name: object.name().into_owned(),
        fields,
    })
}

/// Decode `hex` as the wire form of `object`.
pub fn decode(
    registry: &ObjectRegistry,
    object: &str,
    hex: &str,
    format: Format,
) -> Result<String> {
    let (definition, metadata) = resolve(registry, object)?;
    let bytes = parse_hex(hex)?;
    let mut data = DataObject::new(definition.clone())?;

    let target: &dyn UavObject = if metadata {
        data.metadata_mut().deserialize(&bytes, 0)?;
        data.metadata()
    } else {
        data.deserialize(&bytes, 0)?;
        &data
    };

    if bytes.len() > target.data_length() {
        tracing::warn!(
            object = %target.name(),
            extra = bytes.len() - target.data_length(),
            "ignoring trailing bytes"
        );
    }

    match format {
        Format::Text => Ok(format!("{}\n{}", summary(target), data_dump(target))),
        Format::Json => Ok(serde_json::to_string_pretty(&decoded(target)?)?),
    }
}

// ---------------------------------------------------------------------------
// metadata
// ---------------------------------------------------------------------------

/// Text rendering of a metadata policy, one line per setting.
pub fn render_policy(policy: &MetadataPolicy) -> String {
    let channel = |acked: bool, mode: UpdateMode, period: u32| {
        format!(
            "{mode}, period {period} ms, {}",
            if acked { "acked" } else { "unacked" }
        )
    };
    format!(
        concat!(
            "\tFlight Access: {}\n",
            "\tGCS Access: {}\n",
            "\tFlight Telemetry: {}\n",
            "\tGCS Telemetry: {}\n",
            "\tLogging: {}, period {} ms\n",
        ),
        policy.flight.access,
        policy.gcs.access,
        channel(
            policy.flight.telemetry_acked,
            policy.flight.telemetry_update_mode,
            policy.flight.telemetry_update_period_ms
        ),
        channel(
            policy.gcs.telemetry_acked,
            policy.gcs.telemetry_update_mode,
            policy.gcs.telemetry_update_period_ms
        ),
        policy.logging.update_mode,
        policy.logging.update_period_ms,
    )
}

/// Decode a standalone 19-byte metadata record.
pub fn metadata_decode(hex: &str, format: Format) -> Result<String> {
    let bytes = parse_hex(hex)?;
    if bytes.len() != METADATA_LENGTH {
        bail!(
            "metadata records are {METADATA_LENGTH} bytes, got {}",
            bytes.len()
        );
    }
    let policy = MetadataPolicy::from_bytes(&bytes)?;
    match format {
        Format::Text => Ok(render_policy(&policy)),
        Format::Json => Ok(serde_json::to_string_pretty(&policy)?),
    }
}

/// Values for `metadata encode`; unset values keep the default policy.
#[derive(Debug, Default, Clone)]
pub struct EncodeRequest {
    /// Flight-side access mode.
    pub flight_access: Option<AccessMode>,
    /// Ground-side access mode.
    pub gcs_access: Option<AccessMode>,
    /// Acknowledge flight-side updates.
    pub flight_acked: bool,
    /// Acknowledge ground-side updates.
    pub gcs_acked: bool,
    /// Flight-side telemetry update mode.
    pub flight_mode: Option<UpdateMode>,
    /// Ground-side telemetry update mode.
    pub gcs_mode: Option<UpdateMode>,
    /// Flight-side telemetry period in ms.
    pub flight_period: Option<u32>,
    /// Ground-side telemetry period in ms.
    pub gcs_period: Option<u32>,
    /// Logging update mode.
    pub logging_mode: Option<UpdateMode>,
    /// Logging period in ms.
    pub logging_period: Option<u32>,
}

impl EncodeRequest {
    /// The policy described by this request.
    pub fn policy(&self) -> MetadataPolicy {
        let mut policy = MetadataPolicy::default();
        let flight = &mut policy.flight;
        flight.access = self.flight_access.unwrap_or(flight.access);
        flight.telemetry_acked = self.flight_acked;
        flight.telemetry_update_mode = self.flight_mode.unwrap_or(flight.telemetry_update_mode);
        flight.telemetry_update_period_ms =
            self.flight_period.unwrap_or(flight.telemetry_update_period_ms);
        let gcs = &mut policy.gcs;
        gcs.access = self.gcs_access.unwrap_or(gcs.access);
        gcs.telemetry_acked = self.gcs_acked;
        gcs.telemetry_update_mode = self.gcs_mode.unwrap_or(gcs.telemetry_update_mode);
        gcs.telemetry_update_period_ms = self.gcs_period.unwrap_or(gcs.telemetry_update_period_ms);
        let logging = &mut policy.logging;
        logging.update_mode = self.logging_mode.unwrap_or(logging.update_mode);
        logging.update_period_ms = self.logging_period.unwrap_or(logging.update_period_ms);
        policy
    }
}

#[derive(Serialize)]
struct EncodedPolicy {
    hex: String,
    policy: MetadataPolicy,
}

/// Encode a metadata record as hex.
pub fn metadata_encode(request: &EncodeRequest, format: Format) -> Result<String> {
    let policy = request.policy();
    let hex = hex::encode(policy.to_bytes());
    match format {
        Format::Text => Ok(hex),
        Format::Json => Ok(serde_json::to_string_pretty(&EncodedPolicy { hex, policy })?),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
