//! Deterministic document comparison.
//!
//! - `structural` - heading, term and length gaps against competitors
//! - `quality` - nine-item content quality checklist
//! - `tokens` - tokenizer and word counter shared with the fetcher

pub mod quality;
pub mod structural;
pub mod tokens;

pub use quality::QualitySignalChecker;
pub use structural::ContentDiffEngine;
