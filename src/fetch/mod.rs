// src/fetch/mod.rs
// =============================================================================
// Everything that touches the network.
//
// Submodules:
// - client: builds the shared reqwest client (timeouts, redirects, TLS)
// - request: the PageSource trait and its reqwest-backed PageFetcher
// =============================================================================

mod client;
mod request;

pub use client::{build_client, ClientOptions};
pub use request::{BodyStream, FetchedPage, PageFetcher, PageSource};
