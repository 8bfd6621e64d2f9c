//! crates/kivo_core/src/store.rs
//!
//! The authoritative in-memory project collection and its mutation operations.
//!
//! Every change to the collection goes through the pure functions in [`ops`],
//! which never modify the previous snapshot; a concurrently-running analysis
//! holding a stale snapshot can therefore always re-locate its target by id
//! against the current one. The [`ProjectStore`] container funnels all
//! mutation through those functions and mirrors each effective change into
//! the persistent store.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{AnalysisItem, AnalysisPatch, Project};
use crate::ports::{NotificationKind, NotificationSink, PersistentStore, PortResult};

/// Storage key for the serialized project collection.
pub const PROJECTS_KEY: &str = "kivo_projects";
/// Storage key for the serialized user profile.
pub const USER_KEY: &str = "kivo_user";

//=========================================================================================
// Pure Collection Operations
//=========================================================================================

/// Structurally-immutable operations over a project collection snapshot.
///
/// Each function takes the current snapshot and returns the next one, or
/// `None` when the operation is a no-op (target id not found), leaving the
/// collection untouched.
pub mod ops {
    use super::*;

    /// Inserts a new project at the front of the collection (newest first).
    pub fn create_project(projects: &[Project], project: Project) -> Vec<Project> {
        let mut next = Vec::with_capacity(projects.len() + 1);
        next.push(project);
        next.extend_from_slice(projects);
        next
    }

    /// Replaces the title and description of the matching project.
    pub fn rename_project(
        projects: &[Project],
        id: Uuid,
        title: &str,
        description: &str,
    ) -> Option<Vec<Project>> {
        if !projects.iter().any(|p| p.id == id) {
            return None;
        }
        Some(
            projects
                .iter()
                .map(|p| {
                    if p.id == id {
                        let mut renamed = p.clone();
                        renamed.title = title.to_string();
                        renamed.description = description.to_string();
                        renamed
                    } else {
                        p.clone()
                    }
                })
                .collect(),
        )
    }

    /// Removes the matching project and everything it owns.
    pub fn delete_project(projects: &[Project], id: Uuid) -> Option<Vec<Project>> {
        if !projects.iter().any(|p| p.id == id) {
            return None;
        }
        Some(projects.iter().filter(|p| p.id != id).cloned().collect())
    }

    /// Appends `item` to the named project's analysis sequence.
    ///
    /// A missing project is tolerated: the item is silently dropped, since a
    /// project deleted while an analysis was in flight leaves nothing to
    /// attach the item to.
    pub fn append_analysis(
        projects: &[Project],
        project_id: Uuid,
        item: AnalysisItem,
    ) -> Option<Vec<Project>> {
        if !projects.iter().any(|p| p.id == project_id) {
            return None;
        }
        Some(
            projects
                .iter()
                .map(|p| {
                    if p.id == project_id {
                        let mut updated = p.clone();
                        updated.analyses.push(item.clone());
                        updated
                    } else {
                        p.clone()
                    }
                })
                .collect(),
        )
    }

    /// Applies `patch` to the analysis item identified by
    /// `(project_id, analysis_id)`. A failed lookup on either id is a no-op.
    pub fn update_analysis(
        projects: &[Project],
        project_id: Uuid,
        analysis_id: Uuid,
        patch: &AnalysisPatch,
    ) -> Option<Vec<Project>> {
        let target = projects.iter().find(|p| p.id == project_id)?;
        if !target.analyses.iter().any(|a| a.id == analysis_id) {
            return None;
        }
        Some(
            projects
                .iter()
                .map(|p| {
                    if p.id == project_id {
                        let mut updated = p.clone();
                        updated.analyses = updated
                            .analyses
                            .iter()
                            .map(|a| if a.id == analysis_id { patch.apply(a) } else { a.clone() })
                            .collect();
                        updated
                    } else {
                        p.clone()
                    }
                })
                .collect(),
        )
    }
}

//=========================================================================================
// ProjectStore (Single-Writer State Container)
//=========================================================================================

/// The single owner of the live project collection.
///
/// All mutation is funneled through the named operations below; each applied
/// mutation triggers a best-effort write of the whole serialized collection
/// to the persistent store. The persistent store is read exactly once, in
/// [`ProjectStore::load`], and is write-only afterwards.
pub struct ProjectStore {
    projects: RwLock<Vec<Project>>,
    storage: Arc<dyn PersistentStore>,
    notifier: Arc<dyn NotificationSink>,
}

impl ProjectStore {
    /// Creates an empty store backed by the given persistence and
    /// notification collaborators.
    pub fn new(storage: Arc<dyn PersistentStore>, notifier: Arc<dyn NotificationSink>) -> Self {
        Self {
            projects: RwLock::new(Vec::new()),
            storage,
            notifier,
        }
    }

    /// Seeds the in-memory collection from the persistent store. Called once
    /// at startup; an absent key leaves the collection empty.
    pub async fn load(&self) -> PortResult<()> {
        if let Some(serialized) = self.storage.load(PROJECTS_KEY).await? {
            match serde_json::from_str::<Vec<Project>>(&serialized) {
                Ok(projects) => {
                    debug!(count = projects.len(), "Loaded project collection from storage.");
                    *self.projects.write().await = projects;
                }
                Err(e) => {
                    // A corrupt mirror must not take the session down; start fresh.
                    warn!("Stored project collection is unreadable, starting empty: {e}");
                }
            }
        }
        Ok(())
    }

    /// Returns a clone of the current collection snapshot.
    pub async fn snapshot(&self) -> Vec<Project> {
        self.projects.read().await.clone()
    }

    /// Returns a clone of the project with the given id, if present.
    pub async fn find_project(&self, id: Uuid) -> Option<Project> {
        self.projects.read().await.iter().find(|p| p.id == id).cloned()
    }

    /// Creates a project and inserts it at the front of the collection.
    /// Always succeeds; returns the created project.
    pub async fn create_project(&self, title: String, description: String) -> Project {
        let project = Project::new(title, description);
        let next = {
            let mut guard = self.projects.write().await;
            let next = ops::create_project(&guard, project.clone());
            *guard = next.clone();
            next
        };
        self.persist(&next).await;
        project
    }

    /// Replaces the title/description of the matching project. Returns false
    /// (and leaves the collection untouched) if no project matches.
    pub async fn rename_project(&self, id: Uuid, title: &str, description: &str) -> bool {
        let next = {
            let mut guard = self.projects.write().await;
            match ops::rename_project(&guard, id, title, description) {
                Some(next) => {
                    *guard = next.clone();
                    next
                }
                None => return false,
            }
        };
        self.persist(&next).await;
        true
    }

    /// Removes the matching project. Returns whether a project was removed so
    /// the caller can navigate away from a view of the deleted project; the
    /// store itself does not enforce that contract.
    pub async fn delete_project(&self, id: Uuid) -> bool {
        let next = {
            let mut guard = self.projects.write().await;
            match ops::delete_project(&guard, id) {
                Some(next) => {
                    *guard = next.clone();
                    next
                }
                None => return false,
            }
        };
        self.persist(&next).await;
        true
    }

    /// Appends a (typically pending) analysis item to the named project.
    /// Returns false if the project no longer exists.
    pub async fn append_analysis(&self, project_id: Uuid, item: AnalysisItem) -> bool {
        let next = {
            let mut guard = self.projects.write().await;
            match ops::append_analysis(&guard, project_id, item) {
                Some(next) => {
                    *guard = next.clone();
                    next
                }
                None => return false,
            }
        };
        self.persist(&next).await;
        true
    }

    /// Applies a patch to an analysis item, located fresh by id in the
    /// current snapshot. Returns false if the project or item is gone.
    pub async fn update_analysis(
        &self,
        project_id: Uuid,
        analysis_id: Uuid,
        patch: &AnalysisPatch,
    ) -> bool {
        let next = {
            let mut guard = self.projects.write().await;
            match ops::update_analysis(&guard, project_id, analysis_id, patch) {
                Some(next) => {
                    *guard = next.clone();
                    next
                }
                None => return false,
            }
        };
        self.persist(&next).await;
        true
    }

    /// Mirrors the given snapshot into the persistent store.
    ///
    /// Durability is best-effort: a failed write is reported through the
    /// notification sink and never rolls back the in-memory state.
    async fn persist(&self, snapshot: &[Project]) {
        let serialized = match serde_json::to_string(snapshot) {
            Ok(serialized) => serialized,
            Err(e) => {
                warn!("Failed to serialize project collection: {e}");
                self.notifier
                    .notify("Could not save your projects.", NotificationKind::Error);
                return;
            }
        };
        if let Err(e) = self.storage.save(PROJECTS_KEY, &serialized).await {
            warn!("Failed to persist project collection: {e}");
            self.notifier
                .notify("Could not save your projects.", NotificationKind::Error);
        }
    }
}
