//! Collaborator interfaces for finished reports.
//!
//! Persistence and notification delivery live outside this crate. The
//! pipeline hands each finished [`AnalysisReport`] to every registered sink.

use async_trait::async_trait;

use crate::pipeline::AnalysisReport;

#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn deliver(&self, report: &AnalysisReport) -> anyhow::Result<()>;

    fn name(&self) -> &str {
        "unknown"
    }
}
