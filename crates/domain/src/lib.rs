//! # meshpair-domain
//!
//! Pure domain model for the meshpair sensor-network pairing system.
//!
//! ## Responsibilities
//! - Foundational types: MAC identities, error conventions
//! - Define **nodes** (available, coordinator, sensor) and their readings
//! - Define **relay targets** — the hub sentinel or a coordinator
//! - Define the **registry**: the three node partitions and all topology
//!   invariants (identity uniqueness, relay validity, coordinators relay
//!   through the hub only)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod node;
pub mod registry;
pub mod relay;
