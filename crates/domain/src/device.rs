//! Device: what discovery learned about a controllable device and how to
//! reach it.
//!
//! Devices are identified by their human name, compared case-insensitively
//! (see [`device_key`]). The protocol-level `id` is only used to open a
//! connection.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

/// Protocol version assumed when a scan does not report one.
pub const DEFAULT_PROTOCOL_VERSION: &str = "3.3";

/// Normalise a device name into its registry key.
#[must_use]
pub fn device_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Everything needed to open a connection to a device.
///
/// Two records that share `address`, `auth_key` and `protocol_version` can
/// reuse the same live connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    pub device_id: String,
    pub address: String,
    pub auth_key: String,
    pub protocol_version: String,
}

impl ConnectionParams {
    /// Whether a connection opened with `self` is still valid for `other`.
    #[must_use]
    pub fn same_endpoint(&self, other: &Self) -> bool {
        self.address == other.address
            && self.auth_key == other.auth_key
            && self.protocol_version == other.protocol_version
    }
}

/// A known device, as stored in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Display name as reported by the device.
    pub name: String,
    pub connection: ConnectionParams,
    /// When discovery last reported this device.
    pub last_seen: Timestamp,
}

impl DeviceRecord {
    /// Registry key for this record.
    #[must_use]
    pub fn key(&self) -> String {
        device_key(&self.name)
    }
}

/// Raw device description returned by a protocol scan.
///
/// Scans can return partial information; [`into_record`](Self::into_record)
/// decides whether the descriptor is usable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub name: String,
    pub id: String,
    pub address: Option<String>,
    pub key: Option<String>,
    pub version: Option<String>,
}

impl DeviceDescriptor {
    /// Turn a scan result into a registry record.
    ///
    /// # Errors
    ///
    /// Returns [`IncompleteDescriptor`] when the name, address or key is
    /// missing or blank. A missing version falls back to
    /// [`DEFAULT_PROTOCOL_VERSION`].
    pub fn into_record(self, seen_at: Timestamp) -> Result<DeviceRecord, IncompleteDescriptor> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(IncompleteDescriptor {
                name,
                missing: MissingField::Name,
            });
        }
        let Some(address) = non_blank(self.address) else {
            return Err(IncompleteDescriptor {
                name,
                missing: MissingField::Address,
            });
        };
        let Some(auth_key) = non_blank(self.key) else {
            return Err(IncompleteDescriptor {
                name,
                missing: MissingField::Key,
            });
        };
        let protocol_version =
            non_blank(self.version).unwrap_or_else(|| DEFAULT_PROTOCOL_VERSION.to_string());

        Ok(DeviceRecord {
            name,
            connection: ConnectionParams {
                device_id: self.id,
                address,
                auth_key,
                protocol_version,
            },
            last_seen: seen_at,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A scan result that cannot be inserted into the registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("descriptor {name:?} is missing its {missing}")]
pub struct IncompleteDescriptor {
    pub name: String,
    pub missing: MissingField,
}

/// The field that made a descriptor incomplete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    Name,
    Address,
    Key,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => f.write_str("name"),
            Self::Address => f.write_str("address"),
            Self::Key => f.write_str("key"),
        }
    }
}

/// Power state reported by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    On,
    Off,
    #[default]
    Unknown,
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::now;

    fn descriptor() -> DeviceDescriptor {
        DeviceDescriptor {
            name: "Kitchen Outlet".to_string(),
            id: "bf1234".to_string(),
            address: Some("192.168.1.20".to_string()),
            key: Some("secret".to_string()),
            version: Some("3.4".to_string()),
        }
    }

    #[test]
    fn should_normalise_key_to_trimmed_lowercase() {
        assert_eq!(device_key("  Kitchen Outlet "), "kitchen outlet");
    }

    #[test]
    fn should_build_record_when_descriptor_is_complete() {
        let record = descriptor().into_record(now()).unwrap();
        assert_eq!(record.name, "Kitchen Outlet");
        assert_eq!(record.key(), "kitchen outlet");
        assert_eq!(record.connection.device_id, "bf1234");
        assert_eq!(record.connection.address, "192.168.1.20");
        assert_eq!(record.connection.protocol_version, "3.4");
    }

    #[test]
    fn should_default_protocol_version_when_missing() {
        let mut d = descriptor();
        d.version = None;
        let record = d.into_record(now()).unwrap();
        assert_eq!(record.connection.protocol_version, DEFAULT_PROTOCOL_VERSION);
    }

    #[test]
    fn should_reject_descriptor_when_address_is_missing() {
        let mut d = descriptor();
        d.address = None;
        let err = d.into_record(now()).unwrap_err();
        assert_eq!(err.missing, MissingField::Address);
        assert_eq!(err.name, "Kitchen Outlet");
    }

    #[test]
    fn should_reject_descriptor_when_key_is_blank() {
        let mut d = descriptor();
        d.key = Some("   ".to_string());
        let err = d.into_record(now()).unwrap_err();
        assert_eq!(err.missing, MissingField::Key);
    }

    #[test]
    fn should_reject_descriptor_when_name_is_empty() {
        let mut d = descriptor();
        d.name = String::new();
        let err = d.into_record(now()).unwrap_err();
        assert_eq!(err.missing, MissingField::Name);
    }

    #[test]
    fn should_share_endpoint_when_only_device_id_differs() {
        let a = descriptor().into_record(now()).unwrap().connection;
        let mut b = a.clone();
        b.device_id = "other".to_string();
        assert!(a.same_endpoint(&b));

        b.address = "192.168.1.21".to_string();
        assert!(!a.same_endpoint(&b));
    }

    #[test]
    fn should_display_power_state_lowercase() {
        assert_eq!(PowerState::On.to_string(), "on");
        assert_eq!(PowerState::default().to_string(), "unknown");
    }
}
