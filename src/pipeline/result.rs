// src/pipeline/result.rs
// =============================================================================
// The value each worker produces for one URL.
//
// A result is either a page (status + title) or a failure (message), never a
// mix of the two. Successes and failures travel down the same queue, so the
// collector does not need to know which is which until it renders them.
// =============================================================================

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The server answered; `title` may be the "title tag missing" marker or a
    /// markup error description
    Page { status: u16, title: String },
    /// No response was obtained; status is reported as 0
    Failed {
        #[serde(rename = "error")]
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchResult {
    pub url: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl FetchResult {
    pub fn page(url: impl Into<String>, status: u16, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            outcome: Outcome::Page {
                status,
                title: title.into(),
            },
        }
    }

    pub fn failed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            outcome: Outcome::Failed {
                message: message.into(),
            },
        }
    }

    /// HTTP status, or 0 when the request never completed
    pub fn status_code(&self) -> u16 {
        match &self.outcome {
            Outcome::Page { status, .. } => *status,
            Outcome::Failed { .. } => 0,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Page { title, .. } => Some(title),
            Outcome::Failed { .. } => None,
        }
    }

    /// Empty for successful fetches
    pub fn error_message(&self) -> &str {
        match &self.outcome {
            Outcome::Page { .. } => "",
            Outcome::Failed { message } => message,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, Outcome::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_accessors() {
        let result = FetchResult::page("http://a.example", 200, "A");
        assert_eq!(result.status_code(), 200);
        assert_eq!(result.title(), Some("A"));
        assert_eq!(result.error_message(), "");
        assert!(!result.is_failure());
    }

    #[test]
    fn test_failure_accessors() {
        let result = FetchResult::failed("http://a.example", "connection refused");
        assert_eq!(result.status_code(), 0);
        assert_eq!(result.title(), None);
        assert_eq!(result.error_message(), "connection refused");
        assert!(result.is_failure());
    }

    #[test]
    fn test_json_shape() {
        let page = serde_json::to_value(FetchResult::page("http://a.example", 200, "A")).unwrap();
        assert_eq!(
            page,
            serde_json::json!({
                "url": "http://a.example",
                "outcome": "page",
                "status": 200,
                "title": "A"
            })
        );

        let failed = serde_json::to_value(FetchResult::failed("bad", "oops")).unwrap();
        assert_eq!(
            failed,
            serde_json::json!({"url": "bad", "outcome": "failed", "error": "oops"})
        );
    }
}
