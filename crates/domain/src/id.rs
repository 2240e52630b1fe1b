//! Node identity — a validated, normalised MAC address.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// MAC address identifying a node.
///
/// The MAC is the unique key across the union of all three registry
/// partitions. Stored normalised to uppercase so that equality and hashing
/// are case-insensitive with respect to the input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Mac(String);

impl Mac {
    /// View the address as a string slice (`AA:BB:CC:DD:EE:01` form).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Mac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Mac {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ValidationError::MalformedMac {
            value: s.to_string(),
        };
        let octets: Vec<&str> = s.split(':').collect();
        if octets.len() != 6 {
            return Err(malformed());
        }
        for octet in &octets {
            if octet.len() != 2 || !octet.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(malformed());
            }
        }
        Ok(Self(s.to_ascii_uppercase()))
    }
}

impl TryFrom<String> for Mac {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Mac> for String {
    fn from(mac: Mac) -> Self {
        mac.0
    }
}
