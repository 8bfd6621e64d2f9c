//! crates/kivo_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any storage backend or remote API format;
//! the serde derives exist only because the persistent store mirrors them as JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents the logged-in user. Created at login, replaced wholesale at
/// re-login, removed at logout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// The verdict status of a single findings category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryStatus {
    Positive,
    Warning,
    Negative,
}

/// One category of accessibility findings (e.g. mobility, signage).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub title: String,
    pub status: CategoryStatus,
    pub details: Vec<String>,
}

/// The raw structured output of the analysis service, before the core stamps
/// it with a timestamp. Field names follow the service's JSON response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub verdict: String,
    pub summary: String,
    #[serde(default)]
    pub categories: Vec<CategoryResult>,
    pub full_report_markdown: String,
}

/// A settled, recorded analysis outcome. `timestamp` is the moment the result
/// was recorded, not when the request was issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub verdict: String,
    pub summary: String,
    pub categories: Vec<CategoryResult>,
    pub full_report_markdown: String,
    pub timestamp: DateTime<Utc>,
}

impl AnalysisResult {
    /// Stamps a service report with the time it was recorded.
    pub fn from_report(report: AnalysisReport, timestamp: DateTime<Utc>) -> Self {
        Self {
            verdict: report.verdict,
            summary: report.summary,
            categories: report.categories,
            full_report_markdown: report.full_report_markdown,
            timestamp,
        }
    }
}

/// One image-plus-result record belonging to a project.
///
/// Created in the pending state (`loading = true`, no result, no error) and
/// appended to its project before the remote call settles. Once `loading`
/// turns false, exactly one of `result` / `error` is present, and the item
/// never returns to the pending state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisItem {
    pub id: Uuid,
    /// Self-contained encoded image reference (a base64 data URL).
    pub image_source: String,
    pub result: Option<AnalysisResult>,
    pub loading: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisItem {
    /// Creates a fresh pending item for an image that is about to be analyzed.
    pub fn pending(image_source: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            image_source,
            result: None,
            loading: true,
            error: None,
        }
    }

    /// True once the item has a terminal outcome.
    pub fn is_settled(&self) -> bool {
        !self.loading
    }
}

/// A user project grouping the analyses of one physical space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub analyses: Vec<AnalysisItem>,
}

impl Project {
    /// Creates an empty project with a fresh unique id.
    pub fn new(title: String, description: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            created_at: Utc::now(),
            analyses: Vec::new(),
        }
    }
}

/// A merge-patch for a single analysis item. Only `Some` fields are applied.
///
/// The orchestrator resolves a settled request by applying one of the two
/// terminal patches; each clears the opposite terminal field so a settled
/// item carries exactly one of result / error.
#[derive(Debug, Clone, Default)]
pub struct AnalysisPatch {
    pub loading: Option<bool>,
    pub result: Option<AnalysisResult>,
    pub error: Option<String>,
}

impl AnalysisPatch {
    /// Terminal patch for a successful analysis.
    pub fn completed(result: AnalysisResult) -> Self {
        Self {
            loading: Some(false),
            result: Some(result),
            error: None,
        }
    }

    /// Terminal patch for a failed analysis, carrying a user-facing message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            loading: Some(false),
            result: None,
            error: Some(message.into()),
        }
    }

    /// Applies the patch to an item, producing the patched copy.
    ///
    /// The pending-to-settled transition is one-way: a patch can never flip a
    /// settled item back to `loading = true`.
    pub fn apply(&self, item: &AnalysisItem) -> AnalysisItem {
        let mut next = item.clone();
        if let Some(loading) = self.loading {
            if !(loading && item.is_settled()) {
                next.loading = loading;
            }
        }
        if let Some(result) = &self.result {
            next.result = Some(result.clone());
            next.error = None;
        }
        if let Some(error) = &self.error {
            next.error = Some(error.clone());
            next.result = None;
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> AnalysisResult {
        AnalysisResult::from_report(
            AnalysisReport {
                verdict: "Accesible".to_string(),
                summary: "ok".to_string(),
                categories: vec![],
                full_report_markdown: "# ok".to_string(),
            },
            Utc::now(),
        )
    }

    #[test]
    fn completed_patch_settles_item_and_clears_error() {
        let mut item = AnalysisItem::pending("data:image/jpeg;base64,".to_string());
        item.error = Some("stale".to_string());

        let patched = AnalysisPatch::completed(sample_result()).apply(&item);

        assert!(!patched.loading);
        assert!(patched.error.is_none());
        assert_eq!(patched.result.as_ref().map(|r| r.verdict.as_str()), Some("Accesible"));
    }

    #[test]
    fn failed_patch_settles_item_and_clears_result() {
        let mut item = AnalysisItem::pending("data:image/jpeg;base64,".to_string());
        item.result = Some(sample_result());

        let patched = AnalysisPatch::failed("service unavailable").apply(&item);

        assert!(!patched.loading);
        assert!(patched.result.is_none());
        assert_eq!(patched.error.as_deref(), Some("service unavailable"));
    }

    #[test]
    fn settled_item_never_returns_to_loading() {
        let item = AnalysisItem::pending("data:image/jpeg;base64,".to_string());
        let settled = AnalysisPatch::failed("boom").apply(&item);

        let patch = AnalysisPatch {
            loading: Some(true),
            ..Default::default()
        };
        let repatched = patch.apply(&settled);

        assert!(!repatched.loading);
    }

    #[test]
    fn report_deserializes_from_service_json() {
        let json = r##"{
            "verdict": "No Accesible",
            "summary": "Steps at the entrance.",
            "categories": [
                {"title": "Mobility", "status": "negative", "details": ["No ramp"]}
            ],
            "fullReportMarkdown": "# Report"
        }"##;

        let report: AnalysisReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.categories[0].status, CategoryStatus::Negative);
        assert_eq!(report.full_report_markdown, "# Report");
    }
}
