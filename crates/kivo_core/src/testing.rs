//! crates/kivo_core/src/testing.rs
//!
//! In-memory test doubles for the three ports, shared by the store and
//! orchestrator test modules.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::{Mutex as AsyncMutex, Notify, Semaphore};

use crate::domain::AnalysisReport;
use crate::ports::{
    AnalysisService, NotificationKind, NotificationSink, PersistentStore, PortError, PortResult,
};

/// A `PersistentStore` backed by a HashMap, optionally failing every save.
#[derive(Default)]
pub struct MemoryStore {
    values: AsyncMutex<HashMap<String, String>>,
    fail_saves: bool,
}

impl MemoryStore {
    /// A store whose `save` always fails, as if the storage quota were exceeded.
    pub fn failing() -> Self {
        Self {
            values: AsyncMutex::new(HashMap::new()),
            fail_saves: true,
        }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.values.lock().await.get(key).cloned()
    }

    pub async fn put(&self, key: &str, value: &str) {
        self.values.lock().await.insert(key.to_string(), value.to_string());
    }
}

#[async_trait]
impl PersistentStore for MemoryStore {
    async fn load(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> PortResult<()> {
        if self.fail_saves {
            return Err(PortError::Storage("simulated quota exceeded".to_string()));
        }
        self.values.lock().await.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        self.values.lock().await.remove(key);
        Ok(())
    }
}

/// A `NotificationSink` that records every message it receives.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(String, NotificationKind)>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(String, NotificationKind)> {
        self.messages.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify(&self, message: &str, kind: NotificationKind) {
        self.messages.lock().unwrap().push((message.to_string(), kind));
    }
}

enum StubOutcome {
    Succeed(AnalysisReport),
    Fail(String),
}

/// An `AnalysisService` stub with an optional gate so tests can hold a
/// request open at the suspension point while they mutate the store.
pub struct StubAnalysis {
    outcome: StubOutcome,
    gated: bool,
    gate: Semaphore,
    called: Notify,
    calls: AtomicUsize,
}

impl StubAnalysis {
    pub fn succeeding(report: AnalysisReport) -> Self {
        Self::new(StubOutcome::Succeed(report), false)
    }

    pub fn failing(message: &str) -> Self {
        Self::new(StubOutcome::Fail(message.to_string()), false)
    }

    /// A succeeding stub that suspends inside `analyze` until released.
    pub fn gated(report: AnalysisReport) -> Self {
        Self::new(StubOutcome::Succeed(report), true)
    }

    fn new(outcome: StubOutcome, gated: bool) -> Self {
        Self {
            outcome,
            gated,
            gate: Semaphore::new(0),
            called: Notify::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Waits until `analyze` has been entered at least once.
    pub async fn wait_until_called(&self) {
        self.called.notified().await;
    }

    /// Lets one gated `analyze` call proceed to its outcome.
    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisService for StubAnalysis {
    async fn analyze(&self, _image: &[u8]) -> PortResult<AnalysisReport> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.called.notify_one();
        if self.gated {
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
            permit.forget();
        }
        match &self.outcome {
            StubOutcome::Succeed(report) => Ok(report.clone()),
            StubOutcome::Fail(message) => Err(PortError::Service(message.clone())),
        }
    }
}
