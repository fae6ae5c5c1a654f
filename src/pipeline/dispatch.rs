// src/pipeline/dispatch.rs
// =============================================================================
// Feeds the URL queue from a line-based input (stdin in the real program).
//
// Every line is trimmed and pushed as-is. Blank or malformed lines are NOT
// filtered here: they go through the normal fetch path and come back as a
// request error, so the operator sees one output line per input line.
//
// Lines are read as raw bytes. A line that is not valid UTF-8 is converted
// lossily (bad bytes become U+FFFD) and still dispatched; only a failure of
// the reader itself stops dispatching.
//
// The URL queue is closed exactly once when dispatching stops, whatever the
// reason (end of input, read error, or the queue already being closed).
// =============================================================================

use super::queue::QueueSender;
use crate::error::InputReadError;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, error, warn};

#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Number of URLs successfully pushed onto the queue
    pub dispatched: usize,
    pub read_error: Option<InputReadError>,
}

pub async fn dispatch_lines<R>(reader: R, tasks: QueueSender<String>) -> DispatchReport
where
    R: AsyncBufRead + Unpin,
{
    let mut report = DispatchReport::default();
    // split() yields each line without its '\n'; a '\r' is left to trim()
    let mut lines = reader.split(b'\n');
    let mut lines_read = 0;

    loop {
        match lines.next_segment().await {
            Ok(Some(line)) => {
                lines_read += 1;
                let url = String::from_utf8_lossy(&line).trim().to_string();

                if tasks.push(url).await.is_err() {
                    warn!(lines_read, "URL queue closed, dispatching stopped early");
                    break;
                }
                report.dispatched += 1;
            }
            Ok(None) => break,
            Err(source) => {
                error!(lines_read, error = %source, "reading input failed");
                report.read_error = Some(InputReadError { lines_read, source });
                break;
            }
        }
    }

    tasks.close();
    debug!(dispatched = report.dispatched, "URL queue closed");

    report
}
