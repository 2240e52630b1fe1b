//! # meshpair-adapter-simulated
//!
//! Simulated backend providing canned network snapshots for demos and
//! tests, and acting as the fallback data for the remote adapter.
//!
//! ## Behaviour
//!
//! | Operation | Result |
//! |-----------|--------|
//! | reads | fixed seeded snapshots (2 available, 2 coordinators, 3 sensors) |
//! | `scan` | after a fixed delay, the seeded available list plus two discovered nodes |
//! | `pair` | after a fixed delay, an authoritative ack with a synthesized reading for sensors |
//!
//! ## Dependency rule
//!
//! Depends on `meshpair-app` (port traits) and `meshpair-domain` only.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use meshpair_app::ports::{DataSource, PairAck, Snapshot};
use meshpair_domain::error::MeshError;
use meshpair_domain::id::Mac;
use meshpair_domain::node::{
    AvailableNode, CoordinatorNode, NodeKind, SensorNode, SensorReading,
};
use meshpair_domain::relay::RelayTarget;

/// Artificial delay before a simulated scan resolves.
pub const SCAN_DELAY: Duration = Duration::from_secs(3);
/// Artificial delay before a simulated pair resolves.
pub const PAIR_DELAY: Duration = Duration::from_secs(2);

/// Synthesize a plausible sensor reading: 20..=29 °C, 50..=69 %.
#[must_use]
pub fn synthesize_reading() -> SensorReading {
    let mut rng = rand::rng();
    SensorReading {
        temperature: rng.random_range(20..=29),
        humidity: rng.random_range(50..=69),
    }
}

fn mac(s: &str) -> Mac {
    s.parse().expect("seeded MAC literal is well-formed")
}

/// Backend with canned data and synthetic scan/pair behaviour.
#[derive(Debug, Clone)]
pub struct SimulatedDataSource {
    scan_delay: Duration,
    pair_delay: Duration,
}

impl Default for SimulatedDataSource {
    fn default() -> Self {
        Self::with_delays(SCAN_DELAY, PAIR_DELAY)
    }
}

impl SimulatedDataSource {
    /// Create a simulated backend with custom delays (e.g. zero in tests).
    #[must_use]
    pub fn with_delays(scan_delay: Duration, pair_delay: Duration) -> Self {
        Self {
            scan_delay,
            pair_delay,
        }
    }

    fn seeded_available() -> Vec<AvailableNode> {
        vec![
            AvailableNode {
                mac: mac("AA:BB:CC:DD:EE:01"),
                kind: NodeKind::Sensor,
            },
            AvailableNode {
                mac: mac("AA:BB:CC:DD:EE:02"),
                kind: NodeKind::Coordinator,
            },
        ]
    }

    fn discovered() -> Vec<AvailableNode> {
        vec![
            AvailableNode {
                mac: mac("AA:BB:CC:DD:EE:05"),
                kind: NodeKind::Sensor,
            },
            AvailableNode {
                mac: mac("AA:BB:CC:DD:EE:06"),
                kind: NodeKind::Coordinator,
            },
        ]
    }

    fn seeded_coordinators() -> Vec<CoordinatorNode> {
        vec![
            CoordinatorNode {
                mac: mac("BB:BB:CC:DD:EE:10"),
            },
            CoordinatorNode {
                mac: mac("BB:BB:CC:DD:EE:11"),
            },
        ]
    }

    fn seeded_sensors() -> Vec<SensorNode> {
        vec![
            SensorNode {
                mac: mac("CC:CC:DD:EE:FF:20"),
                relay: RelayTarget::Coordinator(mac("BB:BB:CC:DD:EE:10")),
                reading: SensorReading {
                    temperature: 22,
                    humidity: 65,
                },
            },
            SensorNode {
                mac: mac("CC:CC:DD:EE:FF:21"),
                relay: RelayTarget::Coordinator(mac("BB:BB:CC:DD:EE:10")),
                reading: SensorReading {
                    temperature: 24,
                    humidity: 62,
                },
            },
            SensorNode {
                mac: mac("CC:CC:DD:EE:FF:22"),
                relay: RelayTarget::Coordinator(mac("BB:BB:CC:DD:EE:11")),
                reading: SensorReading {
                    temperature: 23,
                    humidity: 68,
                },
            },
        ]
    }
}

impl DataSource for SimulatedDataSource {
    fn fetch_available(&self) -> impl Future<Output = Snapshot<Vec<AvailableNode>>> + Send {
        async { Snapshot::backend(Self::seeded_available()) }
    }

    fn fetch_coordinators(&self) -> impl Future<Output = Snapshot<Vec<CoordinatorNode>>> + Send {
        async { Snapshot::backend(Self::seeded_coordinators()) }
    }

    fn fetch_sensors(&self) -> impl Future<Output = Snapshot<Vec<SensorNode>>> + Send {
        async { Snapshot::backend(Self::seeded_sensors()) }
    }

    fn scan(
        &self,
    ) -> impl Future<Output = Result<Snapshot<Vec<AvailableNode>>, MeshError>> + Send {
        let delay = self.scan_delay;
        async move {
            tokio::time::sleep(delay).await;
            let mut nodes = Self::seeded_available();
            nodes.extend(Self::discovered());
            Ok(Snapshot::backend(nodes))
        }
    }

    fn pair(
        &self,
        node: &AvailableNode,
        _relay: &RelayTarget,
    ) -> impl Future<Output = Result<PairAck, MeshError>> + Send {
        let kind = node.kind;
        let delay = self.pair_delay;
        async move {
            tokio::time::sleep(delay).await;
            Ok(PairAck {
                reading: matches!(kind, NodeKind::Sensor).then(synthesize_reading),
                authoritative: true,
            })
        }
    }
}
