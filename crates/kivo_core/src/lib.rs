pub mod domain;
pub mod orchestrator;
pub mod ports;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use domain::{
    AnalysisItem, AnalysisPatch, AnalysisReport, AnalysisResult, CategoryResult, CategoryStatus,
    Project, User,
};
pub use orchestrator::AnalysisOrchestrator;
pub use ports::{
    AnalysisService, NotificationKind, NotificationSink, PersistentStore, PortError, PortResult,
};
pub use store::{ProjectStore, PROJECTS_KEY, USER_KEY};
