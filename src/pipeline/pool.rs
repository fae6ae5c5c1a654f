// src/pipeline/pool.rs
// =============================================================================
// The worker pool and its shutdown protocol.
//
// WorkerPool owns the URL queue and the result queue. start() spawns N
// workers plus one supervisor task:
//
//   dispatcher --push--> [URL queue] --pop--> worker 1..N --push--> [result queue] --> collector
//
// Shutdown happens in two stages and always in this order:
// 1. The dispatcher closes the URL queue. Each worker finishes the URLs still
//    queued and then returns.
// 2. The supervisor waits until every worker has returned, and only then
//    closes the result queue. The collector drains what is left and stops.
//
// Closing the result queue any earlier would make a slow worker's push fail
// and its result would be lost, so the supervisor is the only code that
// closes it.
// =============================================================================

use super::queue::{queue, QueueReceiver, QueueSender};
use super::result::FetchResult;
use super::worker::{run_worker, ErrorPolicy, WorkerReport};
use crate::fetch::PageSource;
use std::sync::Arc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info};

/// Totals reported by the supervisor once every worker has stopped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolSummary {
    pub workers: usize,
    pub processed: usize,
    pub failed: usize,
    /// Workers that panicked instead of returning a report
    pub panicked: usize,
}

pub struct WorkerPool<S: ?Sized> {
    workers: usize,
    source: Arc<S>,
    error_policy: ErrorPolicy,
    queue_capacity: Option<usize>,
}

impl<S> WorkerPool<S>
where
    S: PageSource + ?Sized + 'static,
{
    /// A pool of `workers` workers sharing one source. Zero is treated as one.
    pub fn new(workers: usize, source: Arc<S>) -> Self {
        Self {
            workers: workers.max(1),
            source,
            error_policy: ErrorPolicy::default(),
            queue_capacity: None,
        }
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Capacity of both queues. Defaults to the number of workers.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    /// Spawns the workers and the supervisor. Must be called inside a tokio runtime.
    pub fn start(self) -> RunningPool {
        // Bounded queues: a fast dispatcher waits for the workers instead of
        // reading the whole input into memory
        let capacity = self.queue_capacity.unwrap_or(self.workers);
        let (task_tx, task_rx) = queue::<String>(capacity);
        let (result_tx, result_rx) = queue::<FetchResult>(capacity);

        // Every worker gets its own clone of both queue ends and of the Arc
        let mut workers = JoinSet::new();
        for id in 0..self.workers {
            workers.spawn(run_worker(
                id,
                Arc::clone(&self.source),
                task_rx.clone(),
                result_tx.clone(),
                self.error_policy,
            ));
        }
        debug!(workers = self.workers, capacity, "worker pool started");

        // The supervisor takes the last result sender with it. Nobody else
        // holds one that could close the queue early
        let supervisor = tokio::spawn(supervise(workers, self.workers, result_tx));

        RunningPool {
            tasks: task_tx,
            results: Some(result_rx),
            supervisor,
        }
    }
}

/// Handle to a started pool.
pub struct RunningPool {
    tasks: QueueSender<String>,
    results: Option<QueueReceiver<FetchResult>>,
    supervisor: JoinHandle<PoolSummary>,
}

impl RunningPool {
    /// Producer end of the URL queue, for the dispatcher.
    pub fn tasks(&self) -> QueueSender<String> {
        self.tasks.clone()
    }

    /// Consumer end of the result queue, for the collector. Only the first
    /// call returns Some.
    pub fn take_results(&mut self) -> Option<QueueReceiver<FetchResult>> {
        self.results.take()
    }

    /// Waits for the supervisor, i.e. for every worker to stop and the
    /// result queue to be closed.
    ///
    /// The URL queue has to be closed first (the dispatcher does that),
    /// otherwise the workers keep waiting for more URLs.
    pub async fn wait(self) -> PoolSummary {
        match self.supervisor.await {
            Ok(summary) => summary,
            Err(e) => {
                // The supervisor itself failed; make sure the collector still stops
                error!(error = %e, "pool supervisor failed");
                PoolSummary::default()
            }
        }
    }
}

// Counts workers down to zero, then closes the result queue exactly once
async fn supervise(
    mut workers: JoinSet<WorkerReport>,
    spawned: usize,
    results: QueueSender<FetchResult>,
) -> PoolSummary {
    let mut summary = PoolSummary {
        workers: spawned,
        ..PoolSummary::default()
    };

    // join_next() yields workers in the order they finish, None once all are done
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(report) => {
                summary.processed += report.processed;
                summary.failed += report.failed;
            }
            // A panicking worker still counts as stopped
            Err(e) => {
                summary.panicked += 1;
                error!(error = %e, "worker task aborted");
            }
        }
    }

    results.close();
    info!(
        processed = summary.processed,
        failed = summary.failed,
        "all workers finished, result queue closed"
    );

    summary
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. What is a JoinSet?
//    - a collection of spawned tasks that can be awaited one by one
//    - join_next() returns whichever task finished first
//    - if a task panics we get an Err instead of the whole program crashing
//
// 2. Why Arc<S> for the source?
//    - every worker needs the same client at the same time
//    - Arc is a thread-safe reference counter, cloning it is cheap
//
// 3. Why can't the last worker simply close the result queue?
//    - "am I the last one?" needs shared counting, which is easy to get wrong
//    - the supervisor sees every worker stop, so it knows for sure
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::fetch::FetchedPage;
    use async_trait::async_trait;
    use bytes::Bytes;
    use futures::stream::{self, StreamExt};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    // Sleeps during every fetch and records the highest number of fetches
    // running at the same moment
    #[derive(Default)]
    struct SlowSource {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl PageSource for SlowSource {
        async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if url.starts_with("fail") {
                return Err(FetchError::Transport("unreachable".to_string()));
            }
            Ok(FetchedPage {
                status: 200,
                body: stream::iter(vec![Ok(Bytes::from_static(b"<title>ok</title>"))]).boxed(),
            })
        }
    }

    // Pushes the URLs, closes the queue, and drains the results
    async fn run_pool(
        pool: WorkerPool<SlowSource>,
        urls: Vec<String>,
    ) -> (PoolSummary, Vec<FetchResult>) {
        let mut running = pool.start();
        let results = running.take_results().unwrap();

        let collector = tokio::spawn(async move {
            let mut collected = Vec::new();
            while let Some(result) = results.pop().await {
                collected.push(result);
            }
            collected
        });

        let tasks = running.tasks();
        for url in urls {
            tasks.push(url).await.unwrap();
        }
        tasks.close();

        let summary = running.wait().await;
        (summary, collector.await.unwrap())
    }

    #[tokio::test]
    async fn test_every_task_yields_one_result() {
        let source = Arc::new(SlowSource::default());
        let urls: Vec<String> = (0..50).map(|i| format!("http://host{}.example", i)).collect();

        let (summary, results) = run_pool(WorkerPool::new(4, source), urls.clone()).await;

        assert_eq!(summary.processed, 50);
        assert_eq!(summary.workers, 4);
        assert_eq!(results.len(), 50);

        let mut got: Vec<String> = results.into_iter().map(|r| r.url).collect();
        let mut want = urls;
        got.sort();
        want.sort();
        assert_eq!(got, want);
    }

    #[tokio::test]
    async fn test_worker_count_bounds_concurrency() {
        let source = Arc::new(SlowSource::default());
        let urls = (0..40).map(|i| format!("http://{}.example", i)).collect();

        let (_, results) = run_pool(WorkerPool::new(3, Arc::clone(&source)), urls).await;

        assert_eq!(results.len(), 40);
        let peak = source.peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak concurrency was {}", peak);
        assert!(peak >= 1);
    }

    #[tokio::test]
    async fn test_failures_do_not_reduce_result_count() {
        let source = Arc::new(SlowSource::default());
        let urls = (0..20)
            .map(|i| {
                if i % 2 == 0 {
                    format!("fail://{}", i)
                } else {
                    format!("http://{}.example", i)
                }
            })
            .collect();

        let (summary, results) = run_pool(WorkerPool::new(2, source), urls).await;

        assert_eq!(results.len(), 20);
        assert_eq!(summary.failed, 10);
        assert_eq!(results.iter().filter(|r| r.is_failure()).count(), 10);
    }

    #[tokio::test]
    async fn test_stop_worker_policy_can_strand_tasks() {
        let source = Arc::new(SlowSource::default());
        // Two workers, each stops at its first failure; the URLs after the
        // first two failures are never picked up
        let urls = vec![
            "fail://1".to_string(),
            "fail://2".to_string(),
            "http://3.example".to_string(),
            "http://4.example".to_string(),
        ];
        let pool = WorkerPool::new(2, source)
            .with_error_policy(ErrorPolicy::StopWorker)
            .with_queue_capacity(4);

        let (summary, results) = run_pool(pool, urls).await;

        assert_eq!(summary.processed, results.len());
        assert!(results.len() < 4);
        assert!(results.iter().all(|r| r.is_failure()));
    }

    #[tokio::test]
    async fn test_zero_workers_means_one() {
        let source = Arc::new(SlowSource::default());
        let (summary, results) =
            run_pool(WorkerPool::new(0, source), vec!["http://a.example".to_string()]).await;
        assert_eq!(summary.workers, 1);
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_take_results_only_once() {
        let mut running = WorkerPool::new(1, Arc::new(SlowSource::default())).start();
        assert!(running.take_results().is_some());
        assert!(running.take_results().is_none());
        running.tasks().close();
        running.wait().await;
    }
}
