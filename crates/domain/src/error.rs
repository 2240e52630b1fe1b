//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`MeshError`]
//! via `#[from]` (or `into_domain()` for adapter-local error types).

use crate::id::Mac;

/// Top-level domain error.
#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    /// A value failed structural validation.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A pairing request violated a topology rule.
    #[error("topology error")]
    Topology(#[from] TopologyError),

    /// The remote hub could not be reached or rejected the request.
    ///
    /// Adapters box their own error type into this variant at the port
    /// boundary.
    #[error("transport error")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Structural validation failures.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The string is not a well-formed MAC address.
    #[error("malformed MAC address: {value}")]
    MalformedMac {
        /// The rejected input.
        value: String,
    },

    /// A sensor pairing was committed without a reading.
    #[error("sensor pairing requires a reading")]
    MissingReading,
}

/// Violations of the network topology rules.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TopologyError {
    /// The identity is not in the available partition.
    #[error("node {mac} is not available for pairing")]
    NotAvailable { mac: Mac },

    /// The caller's claimed node kind does not match the discovered one.
    #[error("node {mac} is not of the requested kind")]
    KindMismatch { mac: Mac },

    /// A coordinator may only relay through the hub.
    #[error("coordinator {mac} can only pair to the hub")]
    CoordinatorRelay { mac: Mac },

    /// A sensor's relay target is not a known coordinator.
    #[error("relay coordinator {relay} is not paired")]
    UnknownRelay { relay: Mac },
}
