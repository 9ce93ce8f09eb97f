//! Core trait abstractions.
//!
//! Each external failure domain (telemetry API, search engine, origin
//! servers, LLM backends) sits behind one trait so strategies can be swapped
//! by configuration and mocked in tests. `sink` holds the collaborator
//! interfaces the pipeline hands its results to.

pub mod analyzer;
pub mod fetcher;
pub mod searcher;
pub mod sink;
pub mod telemetry;
