// src/fetch/client.rs
// =============================================================================
// Builds the one HTTP client every worker shares.
//
// Transport policy lives here and nowhere else: the fetcher only calls
// client.get(), so redirects, TLS checks and timeouts are all decided by how
// this client was built.
//
// Defaults are tuned for auditing lots of different hosts once each:
// - no keep-alive pooling (we rarely hit the same host twice)
// - redirects are NOT followed, so a 301/302 is reported as-is
// - certificate errors are ignored, since many audited hosts use self-signed
//   or expired certificates and we still want their titles
// =============================================================================

use crate::error::FetchError;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;

// How many hops to allow when --follow-redirects is on
const MAX_REDIRECTS: usize = 10;

#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Per-request timeout, also used as the connect timeout
    pub timeout: Duration,
    pub follow_redirects: bool,
    pub verify_tls: bool,
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            follow_redirects: false,
            verify_tls: false,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

// Creates a reqwest client from the options
//
// Client is internally reference counted, so the pool clones it freely and
// all workers end up sharing the same connector
pub fn build_client(options: &ClientOptions) -> Result<Client, FetchError> {
    let redirect = if options.follow_redirects {
        Policy::limited(MAX_REDIRECTS)
    } else {
        Policy::none()
    };

    Client::builder()
        .user_agent(options.user_agent.as_str())
        .timeout(options.timeout)
        .connect_timeout(options.timeout)
        .redirect(redirect)
        .danger_accept_invalid_certs(!options.verify_tls)
        .pool_max_idle_per_host(0)
        .pool_idle_timeout(Duration::from_secs(1))
        .tcp_keepalive(Duration::from_secs(1))
        .build()
        .map_err(|e| FetchError::Client(e.to_string()))
}
