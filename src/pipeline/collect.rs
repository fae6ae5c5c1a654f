// src/pipeline/collect.rs
// =============================================================================
// The single consumer of the result queue.
//
// Results are written in the order they arrive, which is NOT the input order:
// a fast host queued last can easily finish first. Nothing is buffered or
// sorted, so output appears while the run is still going.
//
// Rust concepts:
// - #[async_trait]: lets the sink write with .await (tokio's stdout), so the
//   collector task never blocks a runtime thread on a slow pipe
// =============================================================================

use super::queue::QueueReceiver;
use super::result::FetchResult;
use async_trait::async_trait;
use std::io;
use tracing::warn;

/// Where rendered results go.
#[async_trait]
pub trait ResultSink: Send {
    async fn emit(&mut self, result: &FetchResult) -> io::Result<()>;

    async fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectReport {
    pub emitted: usize,
    pub failed: usize,
    pub write_errors: usize,
}

// Drains the queue until it is closed and empty
//
// A failing sink (e.g. stdout piped into `head`) does not stop the drain:
// workers would otherwise block forever on a full result queue
pub async fn collect_results<K>(results: QueueReceiver<FetchResult>, mut sink: K) -> CollectReport
where
    K: ResultSink,
{
    let mut report = CollectReport::default();

    while let Some(result) = results.pop().await {
        if result.is_failure() {
            report.failed += 1;
        }

        match sink.emit(&result).await {
            Ok(()) => report.emitted += 1,
            Err(e) => {
                if report.write_errors == 0 {
                    warn!(error = %e, "writing result failed");
                }
                report.write_errors += 1;
            }
        }
    }

    if let Err(e) = sink.flush().await {
        warn!(error = %e, "flushing output failed");
    }

    report
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::pipeline::queue::queue;
    use std::sync::{Arc, Mutex};

    /// Sink that keeps every result, shared with the test body.
    #[derive(Clone, Default)]
    pub(crate) struct MemorySink {
        pub results: Arc<Mutex<Vec<FetchResult>>>,
    }

    #[async_trait]
    impl ResultSink for MemorySink {
        async fn emit(&mut self, result: &FetchResult) -> io::Result<()> {
            self.results.lock().unwrap().push(result.clone());
            Ok(())
        }
    }

    struct BrokenPipe;

    #[async_trait]
    impl ResultSink for BrokenPipe {
        async fn emit(&mut self, _result: &FetchResult) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"))
        }
    }

    #[tokio::test]
    async fn test_emits_in_arrival_order() {
        let (tx, rx) = queue(4);
        tx.push(FetchResult::page("b", 200, "B")).await.unwrap();
        tx.push(FetchResult::failed("a", "refused")).await.unwrap();
        tx.push(FetchResult::page("c", 404, "Not Found")).await.unwrap();
        tx.close();

        let sink = MemorySink::default();
        let report = collect_results(rx, sink.clone()).await;

        assert_eq!(report.emitted, 3);
        assert_eq!(report.failed, 1);
        let urls: Vec<String> =
            sink.results.lock().unwrap().iter().map(|r| r.url.clone()).collect();
        assert_eq!(urls, vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn test_keeps_draining_after_write_error() {
        let (tx, rx) = queue(4);
        for i in 0..3 {
            tx.push(FetchResult::page(i.to_string(), 200, "t")).await.unwrap();
        }
        tx.close();

        let report = collect_results(rx, BrokenPipe).await;
        assert_eq!(report.emitted, 0);
        assert_eq!(report.write_errors, 3);
    }
}
