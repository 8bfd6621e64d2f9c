//! crates/kivo_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like the vision API
//! or the on-disk store.

use async_trait::async_trait;

use crate::domain::AnalysisReport;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., remote API, disk).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Analysis service error: {0}")]
    Service(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The opaque image-analysis call: image bytes in, structured findings out.
///
/// Implementations own their own timeout policy; the core never retries and
/// treats any failure as a single terminal outcome.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Analyzes an encoded image of a physical space for accessibility findings.
    async fn analyze(&self, image: &[u8]) -> PortResult<AnalysisReport>;
}

/// Durable key-value storage for the serialized user profile and project
/// collection. Loaded once at startup; written on every collection mutation.
#[async_trait]
pub trait PersistentStore: Send + Sync {
    /// Loads the serialized value stored under `key`, if any.
    async fn load(&self, key: &str) -> PortResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn save(&self, key: &str, value: &str) -> PortResult<()>;

    /// Removes the value stored under `key`. Removing an absent key succeeds.
    async fn remove(&self, key: &str) -> PortResult<()>;
}

/// The severity of a transient user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
    Loading,
}

/// Fire-and-forget sink for transient user-facing messages. No backpressure;
/// implementations must not block the caller.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, message: &str, kind: NotificationKind);
}
