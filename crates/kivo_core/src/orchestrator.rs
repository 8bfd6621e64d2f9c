//! crates/kivo_core/src/orchestrator.rs
//!
//! Drives a single image analysis from request to settlement and writes the
//! outcome back into the project store by id, no matter what the user is
//! looking at by the time the service answers.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::{AnalysisItem, AnalysisPatch, AnalysisResult};
use crate::ports::{AnalysisService, NotificationKind, NotificationSink};
use crate::store::ProjectStore;

/// User-facing message recorded on an item whose analysis failed.
const ANALYSIS_FAILED_MESSAGE: &str = "Failed to analyze the image. Please try again.";

/// Orchestrates analysis requests against the [`AnalysisService`] and
/// reconciles their outcomes into the [`ProjectStore`].
///
/// Each orchestration is keyed by `(project_id, analysis_id)` and carries no
/// cached copy of its target: on settlement it looks the item up fresh in the
/// current store snapshot, so updates land correctly even after the user has
/// navigated elsewhere, and land nowhere at all (silently) if the project or
/// item was deleted mid-flight.
pub struct AnalysisOrchestrator {
    service: Arc<dyn AnalysisService>,
    store: Arc<ProjectStore>,
    notifier: Arc<dyn NotificationSink>,
    /// Analysis ids currently in flight. A second request for an id already
    /// here is rejected rather than raced against the first.
    in_flight: Mutex<HashSet<Uuid>>,
}

impl AnalysisOrchestrator {
    pub fn new(
        service: Arc<dyn AnalysisService>,
        store: Arc<ProjectStore>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            service,
            store,
            notifier,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Optimistically appends a pending item for `image_source` to the named
    /// project. Returns the item, or `None` if the project does not exist.
    ///
    /// The caller is expected to follow up with exactly one
    /// [`run_analysis`](Self::run_analysis) (or
    /// [`spawn_analysis`](Self::spawn_analysis)) for the returned item id.
    pub async fn begin_analysis(
        &self,
        project_id: Uuid,
        image_source: String,
    ) -> Option<AnalysisItem> {
        let item = AnalysisItem::pending(image_source);
        if self.store.append_analysis(project_id, item.clone()).await {
            Some(item)
        } else {
            warn!(%project_id, "Cannot start analysis: project does not exist.");
            None
        }
    }

    /// Runs one analysis to completion and reconciles the outcome.
    ///
    /// The adapter call is the single suspension point; everything before and
    /// after runs to completion without interleaving with store mutations.
    /// Failures are swallowed here: they are recorded on the item and
    /// reported through the notification sink, never propagated.
    pub async fn run_analysis(&self, project_id: Uuid, analysis_id: Uuid, image: Vec<u8>) {
        if !self.mark_in_flight(analysis_id) {
            warn!(%analysis_id, "Ignoring duplicate analysis request for an id already in flight.");
            return;
        }

        self.notifier.notify("Starting image analysis...", NotificationKind::Loading);

        let outcome = self.service.analyze(&image).await;
        match outcome {
            Ok(report) => {
                let result = AnalysisResult::from_report(report, Utc::now());
                let patch = AnalysisPatch::completed(result);
                if self.store.update_analysis(project_id, analysis_id, &patch).await {
                    info!(%project_id, %analysis_id, "Analysis completed.");
                    self.notifier
                        .notify("Analysis completed successfully.", NotificationKind::Success);
                } else {
                    // The project or item was deleted mid-flight; the result
                    // has nowhere to go and is dropped.
                    debug!(%project_id, %analysis_id, "Analysis settled after its target was deleted.");
                }
            }
            Err(e) => {
                error!(%project_id, %analysis_id, "Analysis failed: {e}");
                let patch = AnalysisPatch::failed(ANALYSIS_FAILED_MESSAGE);
                if self.store.update_analysis(project_id, analysis_id, &patch).await {
                    self.notifier.notify("Analysis failed.", NotificationKind::Error);
                } else {
                    debug!(%project_id, %analysis_id, "Failed analysis had no surviving target.");
                }
            }
        }

        self.clear_in_flight(analysis_id);
    }

    /// Runs the analysis as a detached task, so settlement is independent of
    /// whatever the caller does next.
    pub fn spawn_analysis(
        self: &Arc<Self>,
        project_id: Uuid,
        analysis_id: Uuid,
        image: Vec<u8>,
    ) -> JoinHandle<()> {
        let orchestrator = self.clone();
        tokio::spawn(async move {
            orchestrator.run_analysis(project_id, analysis_id, image).await;
        })
    }

    /// Registers an id as in flight; false if it already was.
    fn mark_in_flight(&self, analysis_id: Uuid) -> bool {
        match self.in_flight.lock() {
            Ok(mut guard) => guard.insert(analysis_id),
            Err(poisoned) => poisoned.into_inner().insert(analysis_id),
        }
    }

    fn clear_in_flight(&self, analysis_id: Uuid) {
        match self.in_flight.lock() {
            Ok(mut guard) => {
                guard.remove(&analysis_id);
            }
            Err(poisoned) => {
                poisoned.into_inner().remove(&analysis_id);
            }
        }
    }
}
