//! # meshpair-app
//!
//! Application layer — the operator session and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define the [`DataSource`](ports::DataSource) port that backend
//!   adapters implement (driven/outbound port)
//! - Provide the [`Session`](session::Session): the single operator
//!   session context owning the node registry, the current selection,
//!   and the transient status line
//! - Drive the asynchronous scan and pair workflows, including the
//!   single-in-flight guards and the fallback status side-effects
//!
//! ## Dependency rule
//! Depends on `meshpair-domain` only (plus `tokio` for timers and task
//! spawning). Never imports adapter crates. Adapters depend on *this*
//! crate, not the reverse.

pub mod ports;
pub mod selection;
pub mod session;
pub mod status;
