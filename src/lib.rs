// src/lib.rs
// =============================================================================
// Library root. main.rs is a thin wrapper around these modules; keeping them
// in a library lets other tools reuse the pipeline with their own PageSource
// or ResultSink.
// =============================================================================

/// Command-line flags and their conversion into option structs
pub mod cli;

/// Error types for fetching, tokenizing and reading input
pub mod error;

/// HTTP client construction and the PageSource trait
pub mod fetch;

/// Rendering results as plain, colored or JSON lines
pub mod output;

/// Queues, workers, pool, dispatcher and collector
pub mod pipeline;

/// tracing-subscriber setup
pub mod telemetry;

/// Incremental HTML tokenizer and <title> extraction
pub mod title;
