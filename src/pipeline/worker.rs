// src/pipeline/worker.rs
// =============================================================================
// One worker: pull a URL, fetch it, extract the title, push the result.
//
// A worker owns nothing but clones of the two queue ends and a handle to the
// shared PageSource. It runs until the URL queue is closed and empty.
//
// Every URL it takes off the queue produces exactly one FetchResult, success
// or failure, on the same output queue.
// =============================================================================

use super::queue::{QueueReceiver, QueueSender};
use super::result::FetchResult;
use crate::fetch::PageSource;
use crate::title::extract_title;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// What a worker does after a URL fails to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Report the failure and move on to the next URL
    #[default]
    Continue,
    /// Report the failure and stop this worker. The remaining workers keep
    /// going; if all of them stop, URLs still queued are never processed.
    StopWorker,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub id: usize,
    pub processed: usize,
    pub failed: usize,
}

pub async fn run_worker<S>(
    id: usize,
    source: Arc<S>,
    tasks: QueueReceiver<String>,
    results: QueueSender<FetchResult>,
    policy: ErrorPolicy,
) -> WorkerReport
where
    S: PageSource + ?Sized,
{
    let mut report = WorkerReport {
        id,
        ..WorkerReport::default()
    };
    trace!(worker = id, "worker started");

    while let Some(url) = tasks.pop().await {
        let result = process(source.as_ref(), url).await;
        let failed = result.is_failure();

        report.processed += 1;
        if failed {
            report.failed += 1;
        }

        if results.push(result).await.is_err() {
            // Only happens if someone closed the output queue early
            warn!(worker = id, "result queue closed, worker exiting");
            break;
        }

        if failed && policy == ErrorPolicy::StopWorker {
            debug!(worker = id, "stopping after failed fetch");
            break;
        }
    }

    trace!(worker = id, processed = report.processed, "worker finished");
    report
}

// Fetches one URL and turns whatever happens into a FetchResult
async fn process<S>(source: &S, url: String) -> FetchResult
where
    S: PageSource + ?Sized,
{
    match source.fetch(&url).await {
        Ok(page) => {
            // The body is moved into extract_title and dropped when it returns,
            // whether or not the title was found
            let title = extract_title(page.body).await;
            debug!(url = %url, status = page.status, title = %title, "fetched");
            FetchResult::page(url, page.status, title)
        }
        Err(e) => {
            debug!(url = %url, error = %e, "fetch failed");
            FetchResult::failed(url, e.to_string())
        }
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. What does `S: PageSource + ?Sized` mean?
//    - by default generic types must have a size known at compile time
//    - ?Sized lifts that, so an Arc<dyn PageSource> works here as well as a
//      concrete PageFetcher
//
// 2. Why `while let Some(url) = tasks.pop().await`?
//    - pop() returns None only when the queue is closed AND empty
//    - so the loop ends by itself once the dispatcher is done and every
//      queued URL has been taken by some worker
// -----------------------------------------------------------------------------
