//! services/cli/src/lib.rs
//!
//! Library surface of the `cli` service: configuration, errors, the concrete
//! port adapters, and the stub session manager. The `kivo` binary wires these
//! together around the core's state store and orchestrator.

pub mod adapters;
pub mod auth;
pub mod config;
pub mod error;
