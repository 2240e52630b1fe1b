//! The three node partitions and all topology invariant enforcement.
//!
//! Invariants:
//! - a MAC appears in at most one of {available, coordinators, sensors}
//! - a sensor's relay is the hub or a MAC present in the coordinator
//!   partition at pairing time
//! - a coordinator's only relay target is the hub

use crate::error::{MeshError, TopologyError, ValidationError};
use crate::id::Mac;
use crate::node::{AvailableNode, CoordinatorNode, NodeKind, SensorNode, SensorReading};
use crate::relay::RelayTarget;

/// The session's view of the network: available, coordinator, and sensor
/// partitions.
///
/// Every mutating operation either applies completely or leaves the
/// registry untouched.
#[derive(Debug, Default, Clone)]
pub struct NodeRegistry {
    available: Vec<AvailableNode>,
    coordinators: Vec<CoordinatorNode>,
    sensors: Vec<SensorNode>,
}

impl NodeRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The discovered, unpaired nodes.
    #[must_use]
    pub fn available(&self) -> &[AvailableNode] {
        &self.available
    }

    /// The paired relay nodes.
    #[must_use]
    pub fn coordinators(&self) -> &[CoordinatorNode] {
        &self.coordinators
    }

    /// The paired leaf nodes.
    #[must_use]
    pub fn sensors(&self) -> &[SensorNode] {
        &self.sensors
    }

    /// Whether `mac` is present in any of the three partitions.
    #[must_use]
    pub fn contains(&self, mac: &Mac) -> bool {
        self.in_available(mac) || self.in_coordinators(mac) || self.in_sensors(mac)
    }

    fn in_available(&self, mac: &Mac) -> bool {
        self.available.iter().any(|n| &n.mac == mac)
    }

    fn in_coordinators(&self, mac: &Mac) -> bool {
        self.coordinators.iter().any(|n| &n.mac == mac)
    }

    fn in_sensors(&self, mac: &Mac) -> bool {
        self.sensors.iter().any(|n| &n.mac == mac)
    }

    /// Append newly discovered nodes, skipping any MAC already known to
    /// any partition. Returns the number of nodes actually added.
    pub fn add_available(&mut self, nodes: impl IntoIterator<Item = AvailableNode>) -> usize {
        let mut added = 0;
        for node in nodes {
            if !self.contains(&node.mac) {
                self.available.push(node);
                added += 1;
            }
        }
        added
    }

    /// Replace the available partition with a fresh snapshot.
    ///
    /// Entries whose MAC is already paired (coordinator or sensor) are
    /// dropped, as are duplicates within the snapshot itself, so identity
    /// uniqueness holds regardless of what the backend returned.
    pub fn replace_available(&mut self, nodes: Vec<AvailableNode>) {
        self.available.clear();
        for node in nodes {
            if !self.contains(&node.mac) {
                self.available.push(node);
            }
        }
    }

    /// Replace the coordinator partition with a fresh snapshot, dropping
    /// entries that collide with the other two partitions.
    pub fn replace_coordinators(&mut self, nodes: Vec<CoordinatorNode>) {
        self.coordinators.clear();
        for node in nodes {
            if !self.contains(&node.mac) {
                self.coordinators.push(node);
            }
        }
    }

    /// Replace the sensor partition with a fresh snapshot, dropping
    /// entries that collide with the other two partitions.
    pub fn replace_sensors(&mut self, nodes: Vec<SensorNode>) {
        self.sensors.clear();
        for node in nodes {
            if !self.contains(&node.mac) {
                self.sensors.push(node);
            }
        }
    }

    /// Whether `relay` is a valid destination for a node of `kind` given
    /// the current coordinator partition.
    #[must_use]
    pub fn relay_is_valid(&self, kind: NodeKind, relay: &RelayTarget) -> bool {
        match (kind, relay) {
            (NodeKind::Coordinator, target) => target.is_hub(),
            (NodeKind::Sensor, RelayTarget::Hub) => true,
            (NodeKind::Sensor, RelayTarget::Coordinator(mac)) => self.in_coordinators(mac),
        }
    }

    /// Atomically move a node from the available partition into the
    /// coordinator or sensor partition.
    ///
    /// All checks run before any mutation: on error the registry is
    /// unchanged.
    ///
    /// # Errors
    ///
    /// - [`TopologyError::NotAvailable`] when `mac` is not currently in
    ///   the available partition
    /// - [`TopologyError::KindMismatch`] when `kind` does not match the
    ///   discovered node's kind
    /// - [`TopologyError::CoordinatorRelay`] when a coordinator is given a
    ///   non-hub relay
    /// - [`TopologyError::UnknownRelay`] when a sensor's relay coordinator
    ///   is not paired
    /// - [`ValidationError::MissingReading`] when a sensor is committed
    ///   without a reading
    pub fn move_paired(
        &mut self,
        mac: &Mac,
        kind: NodeKind,
        relay: RelayTarget,
        reading: Option<SensorReading>,
    ) -> Result<(), MeshError> {
        let index = self
            .available
            .iter()
            .position(|n| &n.mac == mac)
            .ok_or_else(|| TopologyError::NotAvailable { mac: mac.clone() })?;
        if self.available[index].kind != kind {
            return Err(TopologyError::KindMismatch { mac: mac.clone() }.into());
        }

        match kind {
            NodeKind::Coordinator => {
                if !relay.is_hub() {
                    return Err(TopologyError::CoordinatorRelay { mac: mac.clone() }.into());
                }
                let node = self.available.remove(index);
                self.coordinators.push(CoordinatorNode { mac: node.mac });
            }
            NodeKind::Sensor => {
                if let RelayTarget::Coordinator(relay_mac) = &relay {
                    if !self.in_coordinators(relay_mac) {
                        return Err(TopologyError::UnknownRelay {
                            relay: relay_mac.clone(),
                        }
                        .into());
                    }
                }
                let reading = reading.ok_or(ValidationError::MissingReading)?;
                let node = self.available.remove(index);
                self.sensors.push(SensorNode {
                    mac: node.mac,
                    relay,
                    reading,
                });
            }
        }
        Ok(())
    }
}
