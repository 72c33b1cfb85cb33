//! Access and update-mode enumerations used by object metadata.
//!
//! Both enumerations travel on the wire as a single raw byte. Peers may run
//! a newer schema with values this side does not know, so decoding never
//! fails: unknown bytes are kept in an `Unknown` variant and encode back to
//! the same byte.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// AccessMode
// ---------------------------------------------------------------------------

/// Permission class of one side of the link for an object.
///
/// # Examples
///
/// ```
/// use uavlink_objects::AccessMode;
///
/// assert_eq!(AccessMode::from(1), AccessMode::ReadOnly);
/// assert_eq!(AccessMode::ReadOnly.to_string(), "Read only");
/// assert_eq!(AccessMode::from(9).to_string(), "unknown access mode");
/// assert_eq!(AccessMode::from(9).raw(), 9);
///
/// let parsed: AccessMode = "readwrite".parse().unwrap();
/// assert_eq!(parsed, AccessMode::ReadWrite);
/// ```
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, strum::EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum AccessMode {
    /// Reads and writes are allowed (raw `0`).
    #[default]
    #[strum(to_string = "Read/Write", serialize = "readwrite", serialize = "rw")]
    ReadWrite,
    /// Only reads are allowed (raw `1`).
    #[strum(to_string = "Read only", serialize = "readonly", serialize = "ro")]
    ReadOnly,
    /// Only writes are allowed (raw `2`).
    #[strum(to_string = "Write only", serialize = "writeonly", serialize = "wo")]
    WriteOnly,
    /// A raw value this side does not know.
    #[strum(disabled)]
    Unknown(u8),
}

impl AccessMode {
    /// The known access modes in raw-value order.
    pub const ALL: [AccessMode; 3] = [Self::ReadWrite, Self::ReadOnly, Self::WriteOnly];

    /// Raw wire value.
    pub fn raw(self) -> u8 {
        match self {
            Self::ReadWrite => 0,
            Self::ReadOnly => 1,
            Self::WriteOnly => 2,
            Self::Unknown(raw) => raw,
        }
    }

    /// Display label; every unknown raw value shares one label.
    pub fn label(self) -> &'static str {
        match self {
            Self::ReadWrite => "Read/Write",
            Self::ReadOnly => "Read only",
            Self::WriteOnly => "Write only",
            Self::Unknown(_) => "unknown access mode",
        }
    }

    /// Whether the mode is one of the known variants.
    pub fn is_known(self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    /// Whether this side may read the object.
    pub fn can_read(self) -> bool {
        matches!(self, Self::ReadWrite | Self::ReadOnly)
    }

    /// Whether this side may write the object.
    pub fn can_write(self) -> bool {
        matches!(self, Self::ReadWrite | Self::WriteOnly)
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<u8> for AccessMode {
    fn from(raw: u8) -> Self {
        match raw {
            0 => Self::ReadWrite,
            1 => Self::ReadOnly,
            2 => Self::WriteOnly,
            other => Self::Unknown(other),
        }
    }
}

impl From<AccessMode> for u8 {
    fn from(mode: AccessMode) -> Self {
        mode.raw()
    }
}

// ---------------------------------------------------------------------------
// UpdateMode
// ---------------------------------------------------------------------------

/// Cadence policy for transmitting or logging an object.
///
/// # Examples
///
/// ```
/// use uavlink_objects::UpdateMode;
///
/// assert_eq!(UpdateMode::from(3), UpdateMode::Never);
/// assert_eq!(UpdateMode::OnChange.to_string(), "on change");
/// assert_eq!(UpdateMode::from(200).to_string(), "unknown");
/// assert_eq!("periodic".parse::<UpdateMode>().unwrap(), UpdateMode::Periodic);
/// ```
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, strum::EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum UpdateMode {
    /// Sent at a fixed period (raw `0`).
    #[strum(to_string = "periodic")]
    Periodic,
    /// Sent whenever the object changes (raw `1`).
    #[default]
    #[strum(to_string = "on change", serialize = "onchange", serialize = "on-change")]
    OnChange,
    /// Sent only when explicitly requested (raw `2`).
    #[strum(to_string = "manual")]
    Manual,
    /// Never sent (raw `3`).
    #[strum(to_string = "never")]
    Never,
    /// A raw value this side does not know.
    #[strum(disabled)]
    Unknown(u8),
}

impl UpdateMode {
    /// The known update modes in raw-value order.
    pub const ALL: [UpdateMode; 4] = [Self::Periodic, Self::OnChange, Self::Manual, Self::Never];

    /// Raw wire value.
    pub fn raw(self) -> u8 {
        match self {
            Self::Periodic => 0,
            Self::OnChange => 1,
            Self::Manual => 2,
            Self::Never => 3,
            Self::Unknown(raw) => raw,
        }
    }

    /// Display label; every unknown raw value shares one label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Periodic => "periodic",
            Self::OnChange => "on change",
            Self::Manual => "manual",
            Self::Never => "never",
            Self::Unknown(_) => "unknown",
        }
    }

    /// Whether the mode is one of the known variants.
    pub fn is_known(self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<u8> for UpdateMode {
    fn from(raw: u8) -> Self {
        match raw {
            0 => Self::Periodic,
            1 => Self::OnChange,
            2 => Self::Manual,
            3 => Self::Never,
            other => Self::Unknown(other),
        }
    }
}

impl From<UpdateMode> for u8 {
    fn from(mode: UpdateMode) -> Self {
        mode.raw()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn access_mode_raw_values() {
        assert_eq!(AccessMode::ReadWrite.raw(), 0);
        assert_eq!(AccessMode::ReadOnly.raw(), 1);
        assert_eq!(AccessMode::WriteOnly.raw(), 2);
        for mode in AccessMode::ALL {
            assert_eq!(AccessMode::from(mode.raw()), mode);
        }
    }

    #[test]
    fn access_mode_labels() {
        assert_eq!(AccessMode::ReadWrite.to_string(), "Read/Write");
        assert_eq!(AccessMode::ReadOnly.to_string(), "Read only");
        assert_eq!(AccessMode::WriteOnly.to_string(), "Write only");
        assert_eq!(AccessMode::Unknown(7).to_string(), "unknown access mode");
    }

    #[test]
    fn unknown_raw_values_share_one_label() {
        for raw in [3u8, 0x80, 0xFF] {
            assert_eq!(AccessMode::from(raw).label(), "unknown access mode");
            assert_eq!(format!("{}", AccessMode::from(raw)), "unknown access mode");
        }
        for raw in [4u8, 0x42, 0xFF] {
            assert_eq!(UpdateMode::from(raw).label(), "unknown");
            assert_eq!(format!("{}", UpdateMode::from(raw)), "unknown");
        }
    }

    #[test]
    fn access_mode_unknown_keeps_raw() {
        let mode = AccessMode::from(0xAB);
        assert_eq!(mode, AccessMode::Unknown(0xAB));
        assert!(!mode.is_known());
        assert_eq!(u8::from(mode), 0xAB);
    }

    #[test]
    fn access_mode_permissions() {
        assert!(AccessMode::ReadWrite.can_read() && AccessMode::ReadWrite.can_write());
        assert!(AccessMode::ReadOnly.can_read() && !AccessMode::ReadOnly.can_write());
        assert!(!AccessMode::WriteOnly.can_read() && AccessMode::WriteOnly.can_write());
        assert!(!AccessMode::Unknown(3).can_read() && !AccessMode::Unknown(3).can_write());
    }

    #[test]
    fn access_mode_from_str() {
        assert_eq!(AccessMode::from_str("Read/Write").unwrap(), AccessMode::ReadWrite);
        assert_eq!(AccessMode::from_str("read only").unwrap(), AccessMode::ReadOnly);
        assert_eq!(AccessMode::from_str("WO").unwrap(), AccessMode::WriteOnly);
        assert!(AccessMode::from_str("unknown access mode").is_err());
        assert!(AccessMode::from_str("sometimes").is_err());
    }

    #[test]
    fn update_mode_raw_values() {
        assert_eq!(UpdateMode::Periodic.raw(), 0);
        assert_eq!(UpdateMode::OnChange.raw(), 1);
        assert_eq!(UpdateMode::Manual.raw(), 2);
        assert_eq!(UpdateMode::Never.raw(), 3);
        for mode in UpdateMode::ALL {
            assert_eq!(UpdateMode::from(mode.raw()), mode);
        }
    }

    #[test]
    fn update_mode_labels() {
        assert_eq!(UpdateMode::Periodic.to_string(), "periodic");
        assert_eq!(UpdateMode::OnChange.to_string(), "on change");
        assert_eq!(UpdateMode::Manual.to_string(), "manual");
        assert_eq!(UpdateMode::Never.to_string(), "never");
        assert_eq!(UpdateMode::from(4).to_string(), "unknown");
    }

    #[test]
    fn update_mode_from_str_aliases() {
        assert_eq!(UpdateMode::from_str("on change").unwrap(), UpdateMode::OnChange);
        assert_eq!(UpdateMode::from_str("onchange").unwrap(), UpdateMode::OnChange);
        assert_eq!(UpdateMode::from_str("On-Change").unwrap(), UpdateMode::OnChange);
        assert_eq!(UpdateMode::from_str("NEVER").unwrap(), UpdateMode::Never);
        assert!(UpdateMode::from_str("unknown").is_err());
    }

    #[test]
    fn defaults_match_generated_metadata() {
        assert_eq!(AccessMode::default(), AccessMode::ReadWrite);
        assert_eq!(UpdateMode::default(), UpdateMode::OnChange);
    }

    #[test]
    fn modes_serde_roundtrip() {
        let modes = vec![UpdateMode::Periodic, UpdateMode::Unknown(9)];
        let json = serde_json::to_string(&modes).unwrap();
        let back: Vec<UpdateMode> = serde_json::from_str(&json).unwrap();
        assert_eq!(modes, back);
    }
}
