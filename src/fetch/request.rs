// src/fetch/request.rs
// =============================================================================
// Issues the single GET request made for each URL.
//
// The workers do not talk to reqwest directly. They go through the
// PageSource trait, which has one method: fetch a URL and hand back the status
// code plus a stream of body chunks. PageFetcher is the real implementation;
// tests plug in their own sources to control timing and failures.
//
// Failures are split in two, because they mean different things to an
// operator reading the report:
// - FetchError::Request: the input line is not a usable URL
// - FetchError::Transport: the URL was fine but the server could not be
//   reached (DNS, refused connection, TLS, timeout)
// =============================================================================

use crate::error::FetchError;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use reqwest::Client;
use std::error::Error as StdError;
use tracing::debug;
use url::Url;

/// Response body as a stream of chunks. Dropping it releases the connection.
pub type BodyStream = BoxStream<'static, Result<Bytes, FetchError>>;

/// A response whose headers have arrived and whose body is still unread.
pub struct FetchedPage {
    pub status: u16,
    pub body: BodyStream,
}

impl std::fmt::Debug for FetchedPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchedPage")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Anything that can turn a URL into a status code and a body.
///
/// Shared by every worker at once, hence Send + Sync.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// PageSource backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource for PageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        // Reject bad input lines before touching the network
        let parsed = parse_request_url(url)?;

        // send() resolves as soon as the status line and headers are in;
        // the body is still on the wire at this point
        let response = self.client.get(parsed).send().await.map_err(|e| {
            // A builder error means reqwest could not even form the request
            if e.is_builder() {
                FetchError::Request(error_chain(&e))
            } else {
                FetchError::Transport(describe_transport_error(&e))
            }
        })?;

        let status = response.status().as_u16();
        debug!(url, status, "response headers received");

        // Hand the body over unread, chunk by chunk. The title scanner decides
        // how much of it is worth downloading
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| FetchError::Body(error_chain(&e))))
            .boxed();

        Ok(FetchedPage { status, body })
    }
}

// Validates the URL before any network activity
//
// Only http and https are accepted; anything else (including a blank line)
// is a request error for this one task
fn parse_request_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url).map_err(|e| FetchError::Request(format!("{}: {:?}", e, url)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(FetchError::Request(format!(
            "unsupported protocol scheme {:?}",
            other
        ))),
    }
}

// Gives a transport failure a short category prefix followed by the full
// cause, e.g. "connection failed: error sending request ...: Connection refused"
fn describe_transport_error(error: &reqwest::Error) -> String {
    let kind = if error.is_timeout() {
        "timed out"
    } else if error.is_redirect() {
        "redirect error"
    } else if error.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };

    format!("{}: {}", kind, error_chain(error))
}

// reqwest's Display only shows the outermost error; the useful part
// ("dns error", "certificate expired", ...) is usually a few sources down
fn error_chain(error: &dyn StdError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();

    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }

    message
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why a trait (PageSource) in front of reqwest?
//    - the pool only needs "URL in, status + body out"
//    - tests implement the trait with fake sources that sleep or fail on
//      purpose, so concurrency can be checked without a network
//    - #[async_trait] boxes the returned future so it can be awaited from
//      any worker task
//
// 2. Why is the body a stream and not a String?
//    - response.text() would download the whole page first
//    - most titles are in the first few kilobytes, so we stop early and
//      dropping the stream closes the connection
//
// 3. Why walk the error source chain?
//    - "error sending request" alone does not tell an operator anything
//    - the real reason (refused, DNS, certificate) sits in source()
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{build_client, ClientOptions};
    use crate::title::extract_title;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> PageFetcher {
        let options = ClientOptions {
            timeout: Duration::from_secs(5),
            ..ClientOptions::default()
        };
        PageFetcher::new(build_client(&options).unwrap())
    }

    #[test]
    fn test_parse_valid_urls() {
        assert!(parse_request_url("http://example.com").is_ok());
        assert!(parse_request_url("https://example.com:8443/login").is_ok());
    }

    #[test]
    fn test_parse_rejects_missing_scheme() {
        let err = parse_request_url("example.com").unwrap_err();
        assert!(matches!(err, FetchError::Request(_)));
    }

    #[test]
    fn test_parse_rejects_blank_line() {
        let err = parse_request_url("").unwrap_err();
        assert!(matches!(err, FetchError::Request(_)));
    }

    #[test]
    fn test_parse_rejects_other_schemes() {
        let err = parse_request_url("ftp://example.com").unwrap_err();
        assert_eq!(
            err,
            FetchError::Request("unsupported protocol scheme \"ftp\"".to_string())
        );
    }

    #[tokio::test]
    async fn test_fetch_returns_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<html><title>Mock Page</title></html>"),
            )
            .mount(&server)
            .await;

        let page = fetcher().fetch(&server.uri()).await.unwrap();
        assert_eq!(page.status, 200);
        assert_eq!(extract_title(page.body).await, "Mock Page");
    }

    #[tokio::test]
    async fn test_redirect_is_not_followed_by_default() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(301)
                    .insert_header("Location", "/new")
                    .set_body_string("<title>Moved Permanently</title>"),
            )
            .mount(&server)
            .await;

        let url = format!("{}/old", server.uri());
        let page = fetcher().fetch(&url).await.unwrap();
        assert_eq!(page.status, 301);
        assert_eq!(extract_title(page.body).await, "Moved Permanently");
    }

    #[tokio::test]
    async fn test_redirect_followed_when_enabled() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/new"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<title>New Home</title>"))
            .mount(&server)
            .await;

        let options = ClientOptions {
            follow_redirects: true,
            ..ClientOptions::default()
        };
        let fetcher = PageFetcher::new(build_client(&options).unwrap());

        let page = fetcher.fetch(&format!("{}/old", server.uri())).await.unwrap();
        assert_eq!(page.status, 200);
        assert_eq!(extract_title(page.body).await, "New Home");
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Port 1 on localhost is essentially never listening
        let err = fetcher().fetch("http://127.0.0.1:1/").await.unwrap_err();
        match err {
            FetchError::Transport(message) => assert!(!message.is_empty()),
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let options = ClientOptions {
            timeout: Duration::from_millis(200),
            ..ClientOptions::default()
        };
        let fetcher = PageFetcher::new(build_client(&options).unwrap());

        let err = fetcher.fetch(&server.uri()).await.unwrap_err();
        match err {
            FetchError::Transport(message) => assert!(message.starts_with("timed out")),
            other => panic!("expected transport error, got {:?}", other),
        }
    }
}
