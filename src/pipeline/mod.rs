// src/pipeline/mod.rs
// =============================================================================
// The concurrent fetch-and-extract pipeline.
//
// Submodules:
// - queue: closable FIFO queue shared by all stages
// - result: FetchResult, the one value type that flows to the output
// - worker: the fetch -> extract -> push loop
// - pool: N workers plus the supervisor that owns the shutdown order
// - dispatch: input lines -> URL queue
// - collect: result queue -> output sink
//
// run_pipeline() wires them together. A run is N + 2 concurrent tasks:
// the workers, the collector, and the dispatcher (which is simply the task
// that called run_pipeline).
// =============================================================================

mod collect;
mod dispatch;
mod pool;
mod queue;
mod result;
mod worker;

pub use collect::{collect_results, CollectReport, ResultSink};
pub use dispatch::{dispatch_lines, DispatchReport};
pub use pool::{PoolSummary, RunningPool, WorkerPool};
pub use queue::{queue, QueueClosed, QueueReceiver, QueueSender};
pub use result::{FetchResult, Outcome};
pub use worker::{ErrorPolicy, WorkerReport};

use crate::error::InputReadError;
use crate::fetch::PageSource;
use std::sync::Arc;
use tokio::io::AsyncBufRead;
use tracing::{error, info};

/// Default number of concurrent workers.
pub const DEFAULT_WORKERS: usize = 20;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub workers: usize,
    pub error_policy: ErrorPolicy,
    /// Capacity of both queues; None means one slot per worker
    pub queue_capacity: Option<usize>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            error_policy: ErrorPolicy::default(),
            queue_capacity: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct RunSummary {
    /// URLs read from the input and queued
    pub dispatched: usize,
    /// Results written by the collector
    pub results: usize,
    /// Results that were failures
    pub failed: usize,
    /// Write errors on the sink
    pub write_errors: usize,
    pub read_error: Option<InputReadError>,
}

// Runs the whole pipeline to completion
//
// Order of events:
// 1. start the pool (workers + supervisor)
// 2. spawn the collector on the result queue
// 3. dispatch input lines on this task, then close the URL queue
// 4. wait for the supervisor (all workers done, result queue closed)
// 5. wait for the collector to drain the last results
pub async fn run_pipeline<S, R, K>(
    source: Arc<S>,
    input: R,
    sink: K,
    options: &PipelineOptions,
) -> RunSummary
where
    S: PageSource + ?Sized + 'static,
    R: AsyncBufRead + Unpin,
    K: ResultSink + 'static,
{
    let mut pool = WorkerPool::new(options.workers, source).with_error_policy(options.error_policy);
    if let Some(capacity) = options.queue_capacity {
        pool = pool.with_queue_capacity(capacity);
    }

    let mut running = pool.start();

    // start() always hands out a receiver on a fresh pool
    let collector = running
        .take_results()
        .map(|results| tokio::spawn(collect_results(results, sink)));

    let dispatch = dispatch_lines(input, running.tasks()).await;
    let pool_summary = running.wait().await;

    let collected = match collector {
        Some(handle) => handle.await.unwrap_or_else(|e| {
            error!(error = %e, "collector task aborted");
            CollectReport::default()
        }),
        None => CollectReport::default(),
    };

    info!(
        dispatched = dispatch.dispatched,
        processed = pool_summary.processed,
        emitted = collected.emitted,
        "run complete"
    );

    RunSummary {
        dispatched: dispatch.dispatched,
        results: collected.emitted,
        failed: collected.failed,
        write_errors: collected.write_errors,
        read_error: dispatch.read_error,
    }
}
