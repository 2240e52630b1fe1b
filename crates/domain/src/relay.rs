//! Relay target — where a node sends its traffic once paired.
//!
//! On the wire this is the string `"hub"` (the sentinel for a direct
//! connection to the central hub) or the MAC address of a paired
//! coordinator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::Mac;

/// Sentinel string for a direct connection to the hub.
pub const HUB_SENTINEL: &str = "hub";

/// The relay a paired node connects through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RelayTarget {
    /// Direct connection to the central hub.
    Hub,
    /// Relayed through the coordinator with this address.
    Coordinator(Mac),
}

impl RelayTarget {
    /// Whether this is the hub sentinel.
    #[must_use]
    pub fn is_hub(&self) -> bool {
        matches!(self, Self::Hub)
    }
}

impl fmt::Display for RelayTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hub => f.write_str(HUB_SENTINEL),
            Self::Coordinator(mac) => mac.fmt(f),
        }
    }
}

impl FromStr for RelayTarget {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == HUB_SENTINEL {
            return Ok(Self::Hub);
        }
        s.parse().map(Self::Coordinator)
    }
}

impl TryFrom<String> for RelayTarget {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RelayTarget> for String {
    fn from(relay: RelayTarget) -> Self {
        relay.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_hub_sentinel() {
        let relay: RelayTarget = "hub".parse().unwrap();
        assert_eq!(relay, RelayTarget::Hub);
        assert!(relay.is_hub());
    }

    #[test]
    fn should_parse_coordinator_mac() {
        let relay: RelayTarget = "BB:BB:CC:DD:EE:10".parse().unwrap();
        let mac: Mac = "BB:BB:CC:DD:EE:10".parse().unwrap();
        assert_eq!(relay, RelayTarget::Coordinator(mac));
        assert!(!relay.is_hub());
    }

    #[test]
    fn should_reject_arbitrary_string() {
        assert!("gateway".parse::<RelayTarget>().is_err());
    }

    #[test]
    fn should_serialize_hub_as_sentinel_string() {
        let json = serde_json::to_string(&RelayTarget::Hub).unwrap();
        assert_eq!(json, "\"hub\"");
    }

    #[test]
    fn should_roundtrip_coordinator_through_serde_json() {
        let relay: RelayTarget = "BB:BB:CC:DD:EE:10".parse().unwrap();
        let json = serde_json::to_string(&relay).unwrap();
        assert_eq!(json, "\"BB:BB:CC:DD:EE:10\"");
        let parsed: RelayTarget = serde_json::from_str(&json).unwrap();
        assert_eq!(relay, parsed);
    }
}
