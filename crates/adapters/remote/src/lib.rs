//! # meshpair-adapter-remote
//!
//! Client for the hub's network management API.
//!
//! ## Endpoints
//!
//! | Call | Method & path |
//! |------|---------------|
//! | list available | `GET /api/nodes/available` |
//! | list coordinators | `GET /api/nodes/coordinators` |
//! | list sensors | `GET /api/nodes/sensors` |
//! | scan | `POST /api/commands/scan` |
//! | pair | `POST /api/commands/pair` |
//!
//! ## Degradation
//!
//! Reads never fail: any transport error or non-success status substitutes
//! the simulated snapshot, tagged as demo fallback so the session can show
//! the degradation. Commands are not substituted — a failed command is an
//! error with no state change.
//!
//! The scan command is fire-and-forget: the acknowledgement carries no
//! result payload, so the adapter waits a fixed delay and then re-fetches
//! the available list.

mod dto;
mod error;

pub use error::RemoteError;

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;

use meshpair_adapter_simulated::{SimulatedDataSource, synthesize_reading};
use meshpair_app::ports::{DataSource, PairAck, Snapshot};
use meshpair_domain::error::MeshError;
use meshpair_domain::id::Mac;
use meshpair_domain::node::{AvailableNode, CoordinatorNode, NodeKind, SensorNode};
use meshpair_domain::relay::RelayTarget;

use dto::PairRequest;

/// How long to wait after a scan acknowledgement before re-fetching the
/// available list.
pub const REFETCH_DELAY: Duration = Duration::from_secs(5);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const AVAILABLE_PATH: &str = "/api/nodes/available";
const COORDINATORS_PATH: &str = "/api/nodes/coordinators";
const SENSORS_PATH: &str = "/api/nodes/sensors";
const SCAN_PATH: &str = "/api/commands/scan";
const PAIR_PATH: &str = "/api/commands/pair";

/// Remote backend over the hub's HTTP API, with simulated fallback for
/// failed reads.
#[derive(Debug, Clone)]
pub struct RemoteDataSource {
    client: reqwest::Client,
    base_url: String,
    fallback: SimulatedDataSource,
    refetch_delay: Duration,
}

impl RemoteDataSource {
    /// Create a client for the hub at `base_url` (e.g.
    /// `http://localhost:3001`).
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Http`] when the underlying HTTP client
    /// cannot be constructed.
    pub fn new(base_url: impl Into<String>) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(RemoteError::Http)?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self {
            client,
            base_url,
            fallback: SimulatedDataSource::default(),
            refetch_delay: REFETCH_DELAY,
        })
    }

    /// Override the post-scan re-fetch delay (e.g. zero in tests).
    #[must_use]
    pub fn with_refetch_delay(mut self, delay: Duration) -> Self {
        self.refetch_delay = delay;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RemoteError> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(RemoteError::Http)?;
        if !response.status().is_success() {
            return Err(RemoteError::Status(response.status()));
        }
        response.json().await.map_err(RemoteError::Decode)
    }

    async fn post_scan(&self) -> Result<(), RemoteError> {
        let response = self
            .client
            .post(self.url(SCAN_PATH))
            .send()
            .await
            .map_err(RemoteError::Http)?;
        if !response.status().is_success() {
            return Err(RemoteError::Status(response.status()));
        }
        Ok(())
    }

    async fn post_pair(&self, request: &PairRequest<'_>) -> Result<(), RemoteError> {
        let response = self
            .client
            .post(self.url(PAIR_PATH))
            .json(request)
            .send()
            .await
            .map_err(RemoteError::Http)?;
        if !response.status().is_success() {
            return Err(RemoteError::Status(response.status()));
        }
        Ok(())
    }
}

impl DataSource for RemoteDataSource {
    fn fetch_available(&self) -> impl Future<Output = Snapshot<Vec<AvailableNode>>> + Send {
        async {
            match self.get_json::<Vec<AvailableNode>>(AVAILABLE_PATH).await {
                Ok(nodes) => Snapshot::backend(nodes),
                Err(err) => {
                    tracing::warn!(error = %err, path = AVAILABLE_PATH, "read failed, using demo data");
                    Snapshot::demo_fallback(self.fallback.fetch_available().await.data)
                }
            }
        }
    }

    fn fetch_coordinators(&self) -> impl Future<Output = Snapshot<Vec<CoordinatorNode>>> + Send {
        async {
            match self.get_json::<Vec<Mac>>(COORDINATORS_PATH).await {
                Ok(macs) => Snapshot::backend(
                    macs.into_iter().map(|mac| CoordinatorNode { mac }).collect(),
                ),
                Err(err) => {
                    tracing::warn!(error = %err, path = COORDINATORS_PATH, "read failed, using demo data");
                    Snapshot::demo_fallback(self.fallback.fetch_coordinators().await.data)
                }
            }
        }
    }

    fn fetch_sensors(&self) -> impl Future<Output = Snapshot<Vec<SensorNode>>> + Send {
        async {
            match self.get_json::<Vec<SensorNode>>(SENSORS_PATH).await {
                Ok(nodes) => Snapshot::backend(nodes),
                Err(err) => {
                    tracing::warn!(error = %err, path = SENSORS_PATH, "read failed, using demo data");
                    Snapshot::demo_fallback(self.fallback.fetch_sensors().await.data)
                }
            }
        }
    }

    fn scan(
        &self,
    ) -> impl Future<Output = Result<Snapshot<Vec<AvailableNode>>, MeshError>> + Send {
        async {
            self.post_scan().await.map_err(RemoteError::into_domain)?;
            // Fire-and-forget: the ack carries no results. Wait, then pick
            // them up with a normal read (which may itself fall back).
            tokio::time::sleep(self.refetch_delay).await;
            Ok(self.fetch_available().await)
        }
    }

    fn pair(
        &self,
        node: &AvailableNode,
        relay: &RelayTarget,
    ) -> impl Future<Output = Result<PairAck, MeshError>> + Send {
        async move {
            let request = PairRequest {
                node_to_pair: node,
                destination: relay,
            };
            self.post_pair(&request)
                .await
                .map_err(RemoteError::into_domain)?;
            // The ack carries no reading; a provisional one fills the local
            // optimistic move until the mandatory re-fetch overwrites it.
            Ok(PairAck {
                reading: matches!(node.kind, NodeKind::Sensor).then(synthesize_reading),
                authoritative: false,
            })
        }
    }
}
