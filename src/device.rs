//! Remote device and connection descriptions
//!
//! Lightweight records reported by the transport provider. Discovery and
//! pairing mechanics live behind the transport; these types carry only what
//! the session core and its observers need.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Connection status of a remote device as reported by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceStatus {
    /// Device is part of an established group
    Connected,
    /// Device has been invited and the invite has not resolved yet
    Invited,
    /// The last connection attempt to this device failed
    Failed,
    /// Device is discoverable and available for connection
    Available,
    /// Device is out of range or no longer discoverable
    Unavailable,
}

impl DeviceStatus {
    /// Check whether a connection attempt to this device is pending (an
    /// invite that has not formed a group)
    pub fn is_pending(&self) -> bool {
        matches!(self, DeviceStatus::Available | DeviceStatus::Invited)
    }
}

/// Address/name/status record for a discoverable or connected remote device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Transport-level device address (MAC-style, opaque to this crate)
    pub address: String,
    /// Human-readable device name
    pub name: String,
    /// Connection status as last reported by the transport
    pub status: DeviceStatus,
}

impl DeviceDescriptor {
    /// Create a descriptor with a known name and status
    pub fn new(
        address: impl Into<String>,
        name: impl Into<String>,
        status: DeviceStatus,
    ) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
            status,
        }
    }

    /// Create a placeholder for an address that has not appeared in any
    /// peer list yet
    pub fn unknown(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: String::new(),
            status: DeviceStatus::Available,
        }
    }
}

/// Endpoint and group-role data for an established connection
///
/// Produced only after a connection-state-changed event reports an active
/// network and the info has been fetched from the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// Whether a group has actually formed
    pub group_formed: bool,
    /// Whether the local node owns the group
    pub is_group_owner: bool,
    /// Address of the group owner, when known
    pub group_owner_address: Option<IpAddr>,
    /// When the connection was observed as established
    pub established_at: DateTime<Utc>,
}
