//! Node types for the three-tier network.
//!
//! Serde renames match the hub's JSON contract, so these types double as
//! wire representations for the read endpoints.

use serde::{Deserialize, Serialize};

use crate::id::Mac;
use crate::relay::RelayTarget;

/// What a discovered node is capable of becoming once paired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Leaf node reporting temperature and humidity.
    Sensor,
    /// Relay node that sensors can connect through.
    Coordinator,
}

/// A discovered, unpaired node of either kind.
///
/// Created by a scan; consumed exactly once by a successful pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableNode {
    pub mac: Mac,
    #[serde(rename = "type")]
    pub kind: NodeKind,
}

/// A paired relay node. Always connects directly to the hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorNode {
    pub mac: Mac,
}

/// A temperature/humidity measurement reported by a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Temperature in degrees Celsius.
    #[serde(rename = "temp")]
    pub temperature: i32,
    /// Relative humidity in percent.
    pub humidity: i32,
}

/// A paired leaf node with its relay assignment and latest reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorNode {
    pub mac: Mac,
    /// The hub sentinel or the MAC of a paired coordinator.
    #[serde(rename = "coordinator")]
    pub relay: RelayTarget,
    #[serde(flatten)]
    pub reading: SensorReading,
}
