//! Analysis pipeline - the core of the library.
//!
//! The pipeline orchestrates:
//! - Stage 1: rank-drop detection and keyword selection (telemetry)
//! - Stage 2: competitor discovery per keyword (browser or search API)
//! - Stage 3: document fetch, structural diff, quality checks and semantic
//!   analysis under a wall-clock budget

pub mod orchestrator;
pub mod report;

pub use orchestrator::PipelineOrchestrator;
pub use report::{
    AnalysisReport, AnalysisRequest, ContentStageOutput, DiscoveryStageOutput, FetchFailure,
    KeywordDiscovery, KeywordSemantic, KeywordStageOutput, ReportSummary, SemanticStatus,
};
