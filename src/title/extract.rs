// src/title/extract.rs
// =============================================================================
// Finds the <title> of a page while its body is still streaming in.
//
// TitleScanner follows the token stream of the tokenizer:
//
//   Scanning --(<title> start tag)--> InTitle --(</title> or other token)--> Closed
//   Scanning --(end of stream)---------------------------> "title tag missing"
//
// Once it is Closed we stop reading the body, so a title in the <head> of a
// huge page costs only the first few kilobytes.
//
// The result is always a single line: the title text, "title tag missing",
// or the description of whatever went wrong while reading the markup.
// =============================================================================

use super::tokenizer::{TitleState, TitleTokenizer};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::fmt::Display;
use tokio::sync::mpsc;

/// Result text when the stream ends before any `<title>` start tag.
pub const TITLE_MISSING: &str = "title tag missing";

// Chunks that may wait for the scanner thread before the body read pauses
const CHUNK_BACKLOG: usize = 4;

#[derive(Debug, Default)]
pub struct TitleScanner {
    tokenizer: TitleTokenizer,
}

impl TitleScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk. Returns the finished title as soon as it is known;
    /// later chunks are ignored.
    pub fn feed(&mut self, chunk: &[u8]) -> Option<String> {
        self.tokenizer.feed(chunk);
        match self.tokenizer.sink().state() {
            TitleState::Closed(raw) => Some(normalize_whitespace(&raw)),
            _ => None,
        }
    }

    /// Signals the end of the byte stream and returns the final result.
    pub fn finish(mut self) -> String {
        self.tokenizer.end();
        match self.tokenizer.sink().state() {
            TitleState::Scanning => TITLE_MISSING.to_string(),
            // end() closes an open title, so both of these carry the text
            TitleState::InTitle(raw) | TitleState::Closed(raw) => normalize_whitespace(&raw),
        }
    }

    /// The body stream broke off; its error becomes the result unless the
    /// title was already complete.
    pub fn fail(self, reason: impl Display) -> String {
        match self.tokenizer.sink().state() {
            TitleState::Closed(raw) => normalize_whitespace(&raw),
            _ => normalize_whitespace(&reason.to_string()),
        }
    }
}

/// Collapses every whitespace run (newlines included) into one space and trims.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Reads a body stream until the title is found or the stream ends.
///
/// The scanner runs on a blocking thread (html5ever tokenizers cannot move
/// between threads) and gets the chunks over a small channel. As soon as it
/// has an answer it drops its end of the channel, and the body is not read
/// any further.
///
/// The stream is owned by this function, so it is dropped (and the underlying
/// connection released) on every exit path.
pub async fn extract_title<S, E>(body: S) -> String
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    let (chunks, mut incoming) = mpsc::channel::<Result<Bytes, String>>(CHUNK_BACKLOG);

    let scan = tokio::task::spawn_blocking(move || {
        let mut scanner = TitleScanner::new();
        while let Some(chunk) = incoming.blocking_recv() {
            match chunk {
                Ok(bytes) => {
                    if let Some(title) = scanner.feed(&bytes) {
                        return title;
                    }
                }
                Err(reason) => return scanner.fail(reason),
            }
        }
        scanner.finish()
    });

    let mut body = Box::pin(body);
    loop {
        let chunk = tokio::select! {
            chunk = body.next() => chunk,
            // The scanner is done, no need to wait for a slow server
            _ = chunks.closed() => break,
        };
        let Some(chunk) = chunk else { break };

        let broken = chunk.is_err();
        let sent = chunks.send(chunk.map_err(|e| e.to_string())).await;
        if sent.is_err() || broken {
            break;
        }
    }

    // Release the connection before waiting on the scanner
    drop(body);
    drop(chunks);

    scan.await.unwrap_or_else(|e| format!("title scan failed: {}", e))
}

/// Convenience wrapper for a body that is already in memory.
pub fn extract_title_from_bytes(body: &[u8]) -> String {
    let mut scanner = TitleScanner::new();
    match scanner.feed(body) {
        Some(title) => title,
        None => scanner.finish(),
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why a channel and spawn_blocking instead of a plain loop?
//    - a worker task must be Send so tokio can move it between threads
//    - the html5ever tokenizer is not Send, so it cannot be held across an
//      .await inside the worker
//    - the worker keeps the network side (async), the blocking thread keeps
//      the tokenizer (sync), and the channel connects the two
//
// 2. What does "one result line" mean for the title?
//    - the text of the first <title> with whitespace collapsed
//    - "title tag missing" when there is none
//    - the body read error when the connection broke before the title ended
// -----------------------------------------------------------------------------
