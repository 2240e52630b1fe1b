//! Data source port — the backend the session reads from and commands.
//!
//! Two adapters implement this: a simulated backend with canned data, and
//! a remote client for the hub's management API. Read operations never
//! fail: a remote adapter that cannot reach the hub returns its fallback
//! snapshot tagged [`SnapshotSource::DemoFallback`] so the session can
//! surface the degradation as a status line instead of an error.

use std::future::Future;

use meshpair_domain::error::MeshError;
use meshpair_domain::node::{AvailableNode, CoordinatorNode, SensorNode, SensorReading};
use meshpair_domain::relay::RelayTarget;

/// Where a snapshot's data actually came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
    /// The configured backend answered.
    Backend,
    /// The backend failed; this is substituted demo data.
    DemoFallback,
}

/// A read result together with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot<T> {
    pub data: T,
    pub source: SnapshotSource,
}

impl<T> Snapshot<T> {
    /// A snapshot answered by the backend itself.
    pub fn backend(data: T) -> Self {
        Self {
            data,
            source: SnapshotSource::Backend,
        }
    }

    /// A substituted demo snapshot after a backend failure.
    pub fn demo_fallback(data: T) -> Self {
        Self {
            data,
            source: SnapshotSource::DemoFallback,
        }
    }

    /// Whether this snapshot is substituted demo data.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.source == SnapshotSource::DemoFallback
    }
}

/// Backend acknowledgement of a pair command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairAck {
    /// Reading for the freshly paired sensor (`None` for coordinator
    /// pairings).
    pub reading: Option<SensorReading>,
    /// When `false` the backend holds the truth and the session must
    /// re-fetch all three partitions after applying the local move.
    pub authoritative: bool,
}

/// Abstraction over the simulated and remote backends.
///
/// Reads return [`Snapshot`]s and never fail; commands (`scan`, `pair`)
/// return errors which the session translates into failure statuses with
/// no registry change.
pub trait DataSource: Send + Sync {
    /// Fetch the discovered, unpaired nodes.
    fn fetch_available(&self) -> impl Future<Output = Snapshot<Vec<AvailableNode>>> + Send;

    /// Fetch the paired relay nodes.
    fn fetch_coordinators(&self) -> impl Future<Output = Snapshot<Vec<CoordinatorNode>>> + Send;

    /// Fetch the paired leaf nodes.
    fn fetch_sensors(&self) -> impl Future<Output = Snapshot<Vec<SensorNode>>> + Send;

    /// Run a discovery scan and resolve with the refreshed available list.
    ///
    /// The remote backend issues a fire-and-forget scan command, waits a
    /// fixed delay, then re-fetches the available list; the simulated
    /// backend resolves after its artificial delay.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::Transport`] when the scan command itself could
    /// not be delivered. Command failures do not fall back.
    fn scan(&self) -> impl Future<Output = Result<Snapshot<Vec<AvailableNode>>, MeshError>> + Send;

    /// Commit the pairing of `node` to `relay`.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::Transport`] when the command was rejected or
    /// could not be delivered. Command failures do not fall back.
    fn pair(
        &self,
        node: &AvailableNode,
        relay: &RelayTarget,
    ) -> impl Future<Output = Result<PairAck, MeshError>> + Send;
}
