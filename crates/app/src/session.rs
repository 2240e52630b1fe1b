//! The operator session — registry, selection, status, and the scan/pair
//! workflows.
//!
//! A single logical operator drives all state. Operations are async (they
//! suspend at backend round-trips and artificial delays) but UI-visible
//! transitions are serialised: the scanning and pairing flags guard against
//! a second trigger while one is in flight, and the internal locks are
//! never held across an `.await`.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use meshpair_domain::id::Mac;
use meshpair_domain::node::{AvailableNode, CoordinatorNode, NodeKind, SensorNode};
use meshpair_domain::registry::NodeRegistry;
use meshpair_domain::relay::RelayTarget;

use crate::ports::DataSource;
use crate::selection::SelectionState;
use crate::status::StatusNotifier;

/// Status line shown while a scan is in flight.
pub const STATUS_SCANNING: &str = "Scanning for new nodes...";
/// Status line shown while a pair is in flight.
pub const STATUS_PAIRING: &str = "Pairing node...";
/// Status line shown after a successful pair.
pub const STATUS_PAIRED: &str = "Node paired successfully";
/// Status line shown when the scan command could not be delivered.
pub const STATUS_SCAN_FAILED: &str = "Failed to start scan";
/// Status line shown when the pair command failed.
pub const STATUS_PAIR_FAILED: &str = "Failed to pair node";
/// Status line shown when a read fell back to demo data.
pub const STATUS_DEMO_DATA: &str = "Error connecting to API - Using demo data";

/// Result of a scan trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The scan ran; `new_nodes` counts nodes not previously available.
    Completed { new_nodes: usize },
    /// The scan command could not be delivered.
    Failed,
    /// A scan was already in flight; this trigger was ignored.
    InFlight,
}

/// Result of a pair trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairOutcome {
    /// The candidate moved into its partition and the selection cleared.
    Paired,
    /// A local precondition refused the trigger; nothing happened.
    Refused(Refusal),
    /// The backend rejected the command; registry and selection unchanged.
    Failed,
    /// A pair was already in flight; this trigger was ignored.
    InFlight,
}

/// Why a pair trigger was refused before anything ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    /// No candidate node is selected.
    NoCandidate,
    /// The destination violates the topology rules for the candidate's
    /// kind (coordinators pair to the hub only; a sensor's relay must be
    /// the hub or a paired coordinator).
    InvalidDestination,
}

/// The session context: one per operator, owning all mutable state.
pub struct Session<D> {
    source: D,
    registry: Mutex<NodeRegistry>,
    selection: Mutex<SelectionState>,
    status: StatusNotifier,
    scanning: AtomicBool,
    pairing: AtomicBool,
}

impl<D: DataSource> Session<D> {
    /// Create a session over the given backend with empty partitions.
    pub fn new(source: D) -> Self {
        Self::with_status(source, StatusNotifier::new())
    }

    /// Create a session with a custom status notifier (e.g. a shorter TTL).
    pub fn with_status(source: D, status: StatusNotifier) -> Self {
        Self {
            source,
            registry: Mutex::new(NodeRegistry::new()),
            selection: Mutex::new(SelectionState::default()),
            status,
            scanning: AtomicBool::new(false),
            pairing: AtomicBool::new(false),
        }
    }

    fn lock_registry(&self) -> MutexGuard<'_, NodeRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_selection(&self) -> MutexGuard<'_, SelectionState> {
        self.selection.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the available partition.
    #[must_use]
    pub fn available(&self) -> Vec<AvailableNode> {
        self.lock_registry().available().to_vec()
    }

    /// Snapshot of the coordinator partition.
    #[must_use]
    pub fn coordinators(&self) -> Vec<CoordinatorNode> {
        self.lock_registry().coordinators().to_vec()
    }

    /// Snapshot of the sensor partition.
    #[must_use]
    pub fn sensors(&self) -> Vec<SensorNode> {
        self.lock_registry().sensors().to_vec()
    }

    /// The currently visible status line, if any.
    #[must_use]
    pub fn status_message(&self) -> Option<String> {
        self.status.message()
    }

    /// Whether a scan is in flight (the trigger should be disabled).
    #[must_use]
    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::Acquire)
    }

    /// Whether a pair is in flight (the trigger should be disabled).
    #[must_use]
    pub fn is_pairing(&self) -> bool {
        self.pairing.load(Ordering::Acquire)
    }

    /// The selected candidate node, if any.
    #[must_use]
    pub fn selected(&self) -> Option<AvailableNode> {
        self.lock_selection().candidate().cloned()
    }

    /// The chosen destination for the candidate.
    #[must_use]
    pub fn destination(&self) -> RelayTarget {
        self.lock_selection().destination().clone()
    }

    /// Select an available node as the pairing candidate.
    ///
    /// Returns `false` (leaving the selection untouched) when `mac` is not
    /// currently available. Selecting resets the destination to the hub.
    pub fn select(&self, mac: &Mac) -> bool {
        let node = {
            let registry = self.lock_registry();
            registry.available().iter().find(|n| &n.mac == mac).cloned()
        };
        match node {
            Some(node) => {
                self.lock_selection().select(node);
                true
            }
            None => false,
        }
    }

    /// Change the destination for the current candidate.
    pub fn set_destination(&self, relay: RelayTarget) {
        self.lock_selection().set_destination(relay);
    }

    /// Drop the current selection.
    pub fn cancel_selection(&self) {
        self.lock_selection().clear();
    }

    /// Fetch all three partitions from the backend, in the fixed order
    /// available → coordinators → sensors.
    ///
    /// The refresh is sequential and not transactional: a reader can
    /// observe a transiently inconsistent view between the three
    /// completions. Each read that fell back to demo data sets the
    /// fallback status line.
    #[tracing::instrument(skip(self))]
    pub async fn refresh_all(&self) {
        let available = self.source.fetch_available().await;
        self.note_fallback(available.is_fallback());
        self.lock_registry().replace_available(available.data);

        let coordinators = self.source.fetch_coordinators().await;
        self.note_fallback(coordinators.is_fallback());
        self.lock_registry().replace_coordinators(coordinators.data);

        let sensors = self.source.fetch_sensors().await;
        self.note_fallback(sensors.is_fallback());
        self.lock_registry().replace_sensors(sensors.data);
    }

    fn note_fallback(&self, fell_back: bool) {
        if fell_back {
            tracing::warn!("backend read failed, substituting demo data");
            self.status.set(STATUS_DEMO_DATA);
        }
    }

    /// Trigger a discovery scan.
    ///
    /// A trigger while a scan is already in flight is a no-op
    /// ([`ScanOutcome::InFlight`]): no status change, no backend call.
    #[tracing::instrument(skip(self))]
    pub async fn scan(&self) -> ScanOutcome {
        let Some(_guard) = InFlightGuard::try_acquire(&self.scanning) else {
            return ScanOutcome::InFlight;
        };

        self.status.set(STATUS_SCANNING);
        match self.source.scan().await {
            Ok(snapshot) => {
                self.note_fallback(snapshot.is_fallback());
                let new_nodes = {
                    let mut registry = self.lock_registry();
                    let before: HashSet<Mac> = registry
                        .available()
                        .iter()
                        .map(|n| n.mac.clone())
                        .collect();
                    registry.replace_available(snapshot.data);
                    registry
                        .available()
                        .iter()
                        .filter(|n| !before.contains(&n.mac))
                        .count()
                };
                self.status
                    .set(format!("Scan completed - Found {new_nodes} new nodes"));
                ScanOutcome::Completed { new_nodes }
            }
            Err(err) => {
                tracing::warn!(error = %err, "scan command failed");
                self.status.set(STATUS_SCAN_FAILED);
                ScanOutcome::Failed
            }
        }
    }

    /// Trigger pairing of the selected candidate to the chosen destination.
    ///
    /// Preconditions (a candidate is selected; the destination is valid
    /// for its kind) are checked first — refusal changes nothing, not even
    /// the status line. On success the candidate moves into its partition,
    /// the selection clears, and — when the backend's ack is not
    /// authoritative — all three partitions are re-fetched. On failure the
    /// registry and selection are left untouched so the operator can retry.
    #[tracing::instrument(skip(self))]
    pub async fn pair(&self) -> PairOutcome {
        let Some(_guard) = InFlightGuard::try_acquire(&self.pairing) else {
            return PairOutcome::InFlight;
        };

        let (candidate, relay) = {
            let selection = self.lock_selection();
            match selection.candidate() {
                Some(candidate) => (candidate.clone(), selection.destination().clone()),
                None => return PairOutcome::Refused(Refusal::NoCandidate),
            }
        };
        if !self.lock_registry().relay_is_valid(candidate.kind, &relay) {
            return PairOutcome::Refused(Refusal::InvalidDestination);
        }

        self.status.set(STATUS_PAIRING);
        match self.source.pair(&candidate, &relay).await {
            Ok(ack) => {
                let reading = match candidate.kind {
                    NodeKind::Sensor => ack.reading,
                    NodeKind::Coordinator => None,
                };
                let moved = self.lock_registry().move_paired(
                    &candidate.mac,
                    candidate.kind,
                    relay,
                    reading,
                );
                if let Err(err) = moved {
                    // The candidate left the available partition while the
                    // command was in flight (e.g. a concurrent scan refresh).
                    tracing::warn!(error = %err, mac = %candidate.mac, "pair commit rejected");
                    self.status.set(STATUS_PAIR_FAILED);
                    return PairOutcome::Failed;
                }
                self.lock_selection().clear();
                self.status.set(STATUS_PAIRED);
                if !ack.authoritative {
                    self.refresh_all().await;
                }
                PairOutcome::Paired
            }
            Err(err) => {
                tracing::warn!(error = %err, mac = %candidate.mac, "pair command failed");
                self.status.set(STATUS_PAIR_FAILED);
                PairOutcome::Failed
            }
        }
    }
}

/// RAII guard for the single-in-flight flags. Acquisition is a
/// compare-exchange so concurrent triggers resolve to exactly one winner;
/// the flag resets when the guard drops, on every exit path.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
            .then_some(Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use meshpair_domain::error::MeshError;
    use meshpair_domain::node::SensorReading;

    use crate::ports::{PairAck, Snapshot};

    fn mac(s: &str) -> Mac {
        s.parse().unwrap()
    }

    fn node(s: &str, kind: NodeKind) -> AvailableNode {
        AvailableNode { mac: mac(s), kind }
    }

    fn transport_error() -> MeshError {
        MeshError::Transport(Box::new(std::io::Error::other("unreachable")))
    }

    /// Configurable in-memory backend for driving the session.
    struct FakeSource {
        available: Vec<AvailableNode>,
        coordinators: Vec<CoordinatorNode>,
        sensors: Vec<SensorNode>,
        scan_result: Vec<AvailableNode>,
        delay: Duration,
        fail_scan: bool,
        fail_pair: bool,
        fallback_reads: bool,
        authoritative: bool,
        scan_calls: AtomicUsize,
        pair_calls: AtomicUsize,
    }

    impl Default for FakeSource {
        fn default() -> Self {
            Self {
                available: vec![
                    node("AA:BB:CC:DD:EE:01", NodeKind::Sensor),
                    node("AA:BB:CC:DD:EE:02", NodeKind::Coordinator),
                ],
                coordinators: vec![CoordinatorNode {
                    mac: mac("BB:BB:CC:DD:EE:10"),
                }],
                sensors: Vec::new(),
                scan_result: vec![
                    node("AA:BB:CC:DD:EE:01", NodeKind::Sensor),
                    node("AA:BB:CC:DD:EE:02", NodeKind::Coordinator),
                    node("AA:BB:CC:DD:EE:05", NodeKind::Sensor),
                ],
                delay: Duration::ZERO,
                fail_scan: false,
                fail_pair: false,
                fallback_reads: false,
                authoritative: true,
                scan_calls: AtomicUsize::new(0),
                pair_calls: AtomicUsize::new(0),
            }
        }
    }

    impl FakeSource {
        fn snapshot<T>(&self, data: T) -> Snapshot<T> {
            if self.fallback_reads {
                Snapshot::demo_fallback(data)
            } else {
                Snapshot::backend(data)
            }
        }
    }

    impl DataSource for FakeSource {
        fn fetch_available(&self) -> impl Future<Output = Snapshot<Vec<AvailableNode>>> + Send {
            let snapshot = self.snapshot(self.available.clone());
            async { snapshot }
        }

        fn fetch_coordinators(
            &self,
        ) -> impl Future<Output = Snapshot<Vec<CoordinatorNode>>> + Send {
            let snapshot = self.snapshot(self.coordinators.clone());
            async { snapshot }
        }

        fn fetch_sensors(&self) -> impl Future<Output = Snapshot<Vec<SensorNode>>> + Send {
            let snapshot = self.snapshot(self.sensors.clone());
            async { snapshot }
        }

        fn scan(
            &self,
        ) -> impl Future<Output = Result<Snapshot<Vec<AvailableNode>>, MeshError>> + Send {
            self.scan_calls.fetch_add(1, Ordering::SeqCst);
            let result = if self.fail_scan {
                Err(transport_error())
            } else {
                Ok(self.snapshot(self.scan_result.clone()))
            };
            let delay = self.delay;
            async move {
                tokio::time::sleep(delay).await;
                result
            }
        }

        fn pair(
            &self,
            node: &AvailableNode,
            _relay: &RelayTarget,
        ) -> impl Future<Output = Result<PairAck, MeshError>> + Send {
            self.pair_calls.fetch_add(1, Ordering::SeqCst);
            let result = if self.fail_pair {
                Err(transport_error())
            } else {
                Ok(PairAck {
                    reading: matches!(node.kind, NodeKind::Sensor).then_some(SensorReading {
                        temperature: 24,
                        humidity: 55,
                    }),
                    authoritative: self.authoritative,
                })
            };
            let delay = self.delay;
            async move {
                tokio::time::sleep(delay).await;
                result
            }
        }
    }

    async fn loaded_session(source: FakeSource) -> Session<FakeSource> {
        let session = Session::new(source);
        session.refresh_all().await;
        session
    }

    #[tokio::test(start_paused = true)]
    async fn should_load_all_partitions_on_refresh() {
        let session = loaded_session(FakeSource::default()).await;

        assert_eq!(session.available().len(), 2);
        assert_eq!(session.coordinators().len(), 1);
        assert!(session.sensors().is_empty());
        assert_eq!(session.status_message(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn should_set_demo_status_when_reads_fall_back() {
        let source = FakeSource {
            fallback_reads: true,
            ..FakeSource::default()
        };
        let session = loaded_session(source).await;

        assert_eq!(session.available().len(), 2);
        assert_eq!(session.status_message().as_deref(), Some(STATUS_DEMO_DATA));
    }

    #[tokio::test(start_paused = true)]
    async fn should_extend_available_and_report_count_when_scan_completes() {
        let session = loaded_session(FakeSource::default()).await;

        let outcome = session.scan().await;

        assert_eq!(outcome, ScanOutcome::Completed { new_nodes: 1 });
        assert_eq!(session.available().len(), 3);
        assert_eq!(
            session.status_message().as_deref(),
            Some("Scan completed - Found 1 new nodes")
        );
        assert!(!session.is_scanning());
    }

    #[tokio::test(start_paused = true)]
    async fn should_report_failure_status_when_scan_command_fails() {
        let source = FakeSource {
            fail_scan: true,
            ..FakeSource::default()
        };
        let session = loaded_session(source).await;

        let outcome = session.scan().await;

        assert_eq!(outcome, ScanOutcome::Failed);
        assert_eq!(session.available().len(), 2);
        assert_eq!(session.status_message().as_deref(), Some(STATUS_SCAN_FAILED));
    }

    #[tokio::test(start_paused = true)]
    async fn should_ignore_scan_trigger_while_scanning() {
        let source = FakeSource {
            delay: Duration::from_secs(3),
            ..FakeSource::default()
        };
        let session = Arc::new(loaded_session(source).await);

        let first = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.scan().await }
        });
        tokio::task::yield_now().await;

        assert!(session.is_scanning());
        assert_eq!(session.scan().await, ScanOutcome::InFlight);

        let outcome = first.await.unwrap();
        assert_eq!(outcome, ScanOutcome::Completed { new_nodes: 1 });
        assert_eq!(session.source.scan_calls.load(Ordering::SeqCst), 1);
        assert!(!session.is_scanning());
    }

    #[tokio::test(start_paused = true)]
    async fn should_pair_selected_sensor_to_hub() {
        let session = loaded_session(FakeSource::default()).await;
        assert!(session.select(&mac("AA:BB:CC:DD:EE:01")));

        let outcome = session.pair().await;

        assert_eq!(outcome, PairOutcome::Paired);
        assert_eq!(session.available().len(), 1);
        assert_eq!(session.sensors().len(), 1);
        assert!(session.sensors()[0].relay.is_hub());
        assert!(session.selected().is_none());
        assert_eq!(session.status_message().as_deref(), Some(STATUS_PAIRED));
    }

    #[tokio::test(start_paused = true)]
    async fn should_pair_selected_sensor_to_coordinator() {
        let session = loaded_session(FakeSource::default()).await;
        session.select(&mac("AA:BB:CC:DD:EE:01"));
        session.set_destination(RelayTarget::Coordinator(mac("BB:BB:CC:DD:EE:10")));

        assert_eq!(session.pair().await, PairOutcome::Paired);
        assert_eq!(
            session.sensors()[0].relay,
            RelayTarget::Coordinator(mac("BB:BB:CC:DD:EE:10"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn should_refuse_pair_without_candidate() {
        let session = loaded_session(FakeSource::default()).await;

        let outcome = session.pair().await;

        assert_eq!(outcome, PairOutcome::Refused(Refusal::NoCandidate));
        assert_eq!(session.status_message(), None);
        assert_eq!(session.source.pair_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn should_refuse_coordinator_pair_to_non_hub_destination() {
        let session = loaded_session(FakeSource::default()).await;
        session.select(&mac("AA:BB:CC:DD:EE:02"));
        session.set_destination(RelayTarget::Coordinator(mac("BB:BB:CC:DD:EE:10")));

        let outcome = session.pair().await;

        assert_eq!(outcome, PairOutcome::Refused(Refusal::InvalidDestination));
        assert_eq!(session.available().len(), 2);
        assert_eq!(session.coordinators().len(), 1);
        // The selection survives a refusal.
        assert!(session.selected().is_some());
        assert_eq!(session.source.pair_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn should_refuse_sensor_pair_to_unknown_coordinator() {
        let session = loaded_session(FakeSource::default()).await;
        session.select(&mac("AA:BB:CC:DD:EE:01"));
        session.set_destination(RelayTarget::Coordinator(mac("DD:DD:DD:DD:DD:99")));

        let outcome = session.pair().await;

        assert_eq!(outcome, PairOutcome::Refused(Refusal::InvalidDestination));
        assert!(session.sensors().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn should_keep_state_unchanged_when_pair_command_fails() {
        let source = FakeSource {
            fail_pair: true,
            ..FakeSource::default()
        };
        let session = loaded_session(source).await;
        session.select(&mac("AA:BB:CC:DD:EE:01"));

        let outcome = session.pair().await;

        assert_eq!(outcome, PairOutcome::Failed);
        assert_eq!(session.available().len(), 2);
        assert!(session.sensors().is_empty());
        assert!(session.selected().is_some());
        assert_eq!(session.status_message().as_deref(), Some(STATUS_PAIR_FAILED));
        assert!(!session.is_pairing());
    }

    #[tokio::test(start_paused = true)]
    async fn should_ignore_pair_trigger_while_pairing() {
        let source = FakeSource {
            delay: Duration::from_secs(2),
            ..FakeSource::default()
        };
        let session = Arc::new(loaded_session(source).await);
        session.select(&mac("AA:BB:CC:DD:EE:01"));

        let first = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.pair().await }
        });
        tokio::task::yield_now().await;

        assert!(session.is_pairing());
        assert_eq!(session.pair().await, PairOutcome::InFlight);

        assert_eq!(first.await.unwrap(), PairOutcome::Paired);
        assert_eq!(session.source.pair_calls.load(Ordering::SeqCst), 1);
        assert_eq!(session.sensors().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn should_refetch_partitions_after_non_authoritative_pair() {
        let source = FakeSource {
            authoritative: false,
            // What the backend reports after committing the pair.
            available: vec![node("AA:BB:CC:DD:EE:02", NodeKind::Coordinator)],
            sensors: vec![SensorNode {
                mac: mac("AA:BB:CC:DD:EE:01"),
                relay: RelayTarget::Hub,
                reading: SensorReading {
                    temperature: 26,
                    humidity: 58,
                },
            }],
            ..FakeSource::default()
        };
        let session = Session::new(source);
        {
            let mut registry = session.lock_registry();
            registry.replace_available(vec![
                node("AA:BB:CC:DD:EE:01", NodeKind::Sensor),
                node("AA:BB:CC:DD:EE:02", NodeKind::Coordinator),
            ]);
        }
        session.select(&mac("AA:BB:CC:DD:EE:01"));

        assert_eq!(session.pair().await, PairOutcome::Paired);

        // The registry reflects the re-fetched backend truth.
        assert_eq!(session.available().len(), 1);
        assert_eq!(session.sensors().len(), 1);
        assert_eq!(session.sensors()[0].reading.temperature, 26);
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_select_node_that_is_not_available() {
        let session = loaded_session(FakeSource::default()).await;

        assert!(!session.select(&mac("DD:DD:DD:DD:DD:99")));
        assert!(session.selected().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn should_clear_selection_on_cancel() {
        let session = loaded_session(FakeSource::default()).await;
        session.select(&mac("AA:BB:CC:DD:EE:01"));
        session.cancel_selection();

        assert!(session.selected().is_none());
        assert!(session.destination().is_hub());
    }
}
