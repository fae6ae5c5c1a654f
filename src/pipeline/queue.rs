// src/pipeline/queue.rs
// =============================================================================
// The closable FIFO queue that connects the pipeline stages.
//
// Both the URL queue and the result queue are this type. It is a thin wrapper
// over async-channel so the close semantics are spelled out in one place:
// - push() waits while the queue is full and fails once it is closed
// - close() can be called any number of times, only the first one counts
// - pop() keeps returning queued items after close(), and returns None only
//   when the queue is closed AND empty ("drained")
//
// Many producers and many consumers may hold clones of either end.
// =============================================================================

use std::fmt;

/// Returned by `push` on a closed queue; hands the rejected item back.
#[derive(Debug, PartialEq, Eq)]
pub struct QueueClosed<T>(pub T);

impl<T> fmt::Display for QueueClosed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("queue is closed")
    }
}

impl<T: fmt::Debug> std::error::Error for QueueClosed<T> {}

#[derive(Debug)]
pub struct QueueSender<T> {
    inner: async_channel::Sender<T>,
}

#[derive(Debug)]
pub struct QueueReceiver<T> {
    inner: async_channel::Receiver<T>,
}

// Manual Clone impls so T itself does not need to be Clone
impl<T> Clone for QueueSender<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Clone for QueueReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Creates a bounded queue. A capacity of 0 is bumped to 1.
pub fn queue<T>(capacity: usize) -> (QueueSender<T>, QueueReceiver<T>) {
    let (tx, rx) = async_channel::bounded(capacity.max(1));
    (QueueSender { inner: tx }, QueueReceiver { inner: rx })
}

impl<T> QueueSender<T> {
    pub async fn push(&self, item: T) -> Result<(), QueueClosed<T>> {
        self.inner.send(item).await.map_err(|e| QueueClosed(e.0))
    }

    /// Closes the queue. Returns true only for the call that actually closed it.
    pub fn close(&self) -> bool {
        self.inner.close()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

impl<T> QueueReceiver<T> {
    /// Next item in FIFO order, or None once the queue is closed and drained.
    pub async fn pop(&self) -> Option<T> {
        self.inner.recv().await.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fifo_order() {
        let (tx, rx) = queue(4);
        for i in 0..4 {
            tx.push(i).await.unwrap();
        }
        tx.close();
        let mut seen = Vec::new();
        while let Some(i) = rx.pop().await {
            seen.push(i);
        }
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_close_still_drains_queued_items() {
        let (tx, rx) = queue(2);
        tx.push("a").await.unwrap();
        tx.push("b").await.unwrap();
        assert!(tx.close());

        assert_eq!(rx.pop().await, Some("a"));
        assert_eq!(rx.pop().await, Some("b"));
        assert_eq!(rx.pop().await, None);
    }

    #[tokio::test]
    async fn test_close_only_counts_once() {
        let (tx, _rx) = queue::<u8>(1);
        let other = tx.clone();
        assert!(tx.close());
        assert!(!other.close());
        assert!(other.is_closed());
    }

    #[tokio::test]
    async fn test_push_after_close_returns_item() {
        let (tx, _rx) = queue(1);
        tx.close();
        assert_eq!(tx.push(7).await, Err(QueueClosed(7)));
    }

    #[tokio::test]
    async fn test_push_waits_for_space() {
        let (tx, rx) = queue(1);
        tx.push(1).await.unwrap();

        // Queue is full, so the second push must wait for the pop below
        let blocked = tokio::time::timeout(Duration::from_millis(50), tx.push(2)).await;
        assert!(blocked.is_err());

        assert_eq!(rx.pop().await, Some(1));
        tx.push(2).await.unwrap();
        assert_eq!(rx.pop().await, Some(2));
    }

    #[tokio::test]
    async fn test_each_item_goes_to_one_consumer() {
        let (tx, rx) = queue(8);
        let rx2 = rx.clone();
        for i in 0..8 {
            tx.push(i).await.unwrap();
        }
        tx.close();

        let a = tokio::spawn(async move {
            let mut got = Vec::new();
            while let Some(i) = rx.pop().await {
                got.push(i);
            }
            got
        });
        let b = tokio::spawn(async move {
            let mut got = Vec::new();
            while let Some(i) = rx2.pop().await {
                got.push(i);
            }
            got
        });

        let mut all = a.await.unwrap();
        all.extend(b.await.unwrap());
        all.sort();
        assert_eq!(all, (0..8).collect::<Vec<_>>());
    }
}
