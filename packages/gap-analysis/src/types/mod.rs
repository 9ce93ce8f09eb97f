//! Data types shared across the pipeline.

pub mod config;
pub mod diff;
pub mod document;
pub mod keyword;
pub mod semantic;
pub mod serp;
pub mod telemetry;
