//! Session and connect configuration

use serde::{Deserialize, Serialize};

use super::recovery::RetryConfig;
use crate::device::DeviceDescriptor;

/// Pairing mode negotiated during the connection handshake
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PairingMode {
    /// Push-button pairing; the default for ad-hoc connections
    #[default]
    PushButton,
    /// The local node displays a PIN the remote must enter
    Display,
    /// The local node enters a PIN displayed by the remote
    Keypad,
    /// A PIN printed on a label
    Label,
}

/// Canonical configuration for a connect request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectConfig {
    /// Address of the device to connect to
    pub address: String,
    /// Pairing mode for the connection handshake
    pub pairing: PairingMode,
    /// Inclination to become the group owner (0 = least, 15 = most), when
    /// the caller wants to override the transport default
    pub group_owner_intent: Option<u8>,
}

impl ConnectConfig {
    /// Create a config for an address with default pairing
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            pairing: PairingMode::default(),
            group_owner_intent: None,
        }
    }

    /// Set the pairing mode
    pub fn with_pairing(mut self, pairing: PairingMode) -> Self {
        self.pairing = pairing;
        self
    }

    /// Set the group-owner intent
    pub fn with_group_owner_intent(mut self, intent: u8) -> Self {
        self.group_owner_intent = Some(intent);
        self
    }
}

/// Accepted forms of a connect target
///
/// `SessionManager::connect` canonicalizes any of these into a
/// `ConnectConfig`, applying the session defaults when the target does not
/// carry its own.
#[derive(Debug, Clone)]
pub enum ConnectTarget {
    /// Raw device address
    Address(String),
    /// A descriptor taken from the peer set
    Device(DeviceDescriptor),
    /// A fully specified configuration, used as-is
    Config(ConnectConfig),
}

impl From<&str> for ConnectTarget {
    fn from(address: &str) -> Self {
        ConnectTarget::Address(address.to_string())
    }
}

impl From<String> for ConnectTarget {
    fn from(address: String) -> Self {
        ConnectTarget::Address(address)
    }
}

impl From<DeviceDescriptor> for ConnectTarget {
    fn from(device: DeviceDescriptor) -> Self {
        ConnectTarget::Device(device)
    }
}

impl From<&DeviceDescriptor> for ConnectTarget {
    fn from(device: &DeviceDescriptor) -> Self {
        ConnectTarget::Device(device.clone())
    }
}

impl From<ConnectConfig> for ConnectTarget {
    fn from(config: ConnectConfig) -> Self {
        ConnectTarget::Config(config)
    }
}

/// Configuration for a session manager
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Default pairing mode applied when a connect target carries none
    pub pairing: PairingMode,
    /// Default group-owner intent applied to canonical configs
    pub group_owner_intent: Option<u8>,
    /// Retry policy for re-acquiring a lost channel; `None` leaves the
    /// session unregistered until the caller registers again
    pub channel_recovery: Option<RetryConfig>,
}

impl SessionConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default pairing mode
    pub fn with_pairing(mut self, pairing: PairingMode) -> Self {
        self.pairing = pairing;
        self
    }

    /// Set the default group-owner intent
    pub fn with_group_owner_intent(mut self, intent: u8) -> Self {
        self.group_owner_intent = Some(intent);
        self
    }

    /// Enable channel recovery with the given retry policy
    pub fn with_channel_recovery(mut self, policy: RetryConfig) -> Self {
        self.channel_recovery = Some(policy);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceStatus;

    #[test]
    fn targets_canonicalize_from_every_form() {
        let from_address: ConnectTarget = "aa:bb:cc:00:11:22".into();
        assert!(matches!(from_address, ConnectTarget::Address(a) if a == "aa:bb:cc:00:11:22"));

        let device = DeviceDescriptor::new("aa:bb:cc:00:11:22", "printer", DeviceStatus::Available);
        let from_device: ConnectTarget = (&device).into();
        assert!(matches!(from_device, ConnectTarget::Device(d) if d.name == "printer"));

        let config = ConnectConfig::new("aa:bb:cc:00:11:22").with_pairing(PairingMode::Keypad);
        let from_config: ConnectTarget = config.into();
        assert!(matches!(
            from_config,
            ConnectTarget::Config(c) if c.pairing == PairingMode::Keypad
        ));
    }
}
