// src/error.rs
// =============================================================================
// Error types shared across the pipeline.
//
// Every per-URL failure ends up as text inside a FetchResult, so these types
// mostly exist to keep the failure kinds apart until they get rendered:
// - FetchError: the URL could not become a request, the network call failed,
//   or the body broke off half way
// - InputReadError: reading URLs from stdin failed mid-way
//
// Rust concepts:
// - thiserror: derives std::error::Error and Display from attributes
// =============================================================================

use thiserror::Error;

/// Failure of a single fetch. Scoped to one task, never to the whole run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The URL could not be turned into a request (malformed input)
    #[error("invalid request: {0}")]
    Request(String),

    /// DNS, connection, TLS or timeout failure while reaching the server
    #[error("{0}")]
    Transport(String),

    /// The response started but its body could not be read to the end
    #[error("body read failed: {0}")]
    Body(String),

    /// The shared HTTP client could not be constructed
    #[error("could not build HTTP client: {0}")]
    Client(String),
}

/// Reading the URL list failed. Work already queued still completes.
#[derive(Debug, Error)]
#[error("failed to read input after {lines_read} line(s): {source}")]
pub struct InputReadError {
    pub lines_read: usize,
    #[source]
    pub source: std::io::Error,
}
