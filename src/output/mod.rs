// src/output/mod.rs
// =============================================================================
// Output side of the tool: renders results and writes them line by line.
//
// LineSink is the ResultSink the collector writes into. It wraps any
// tokio AsyncWrite (tokio::io::stdout() in the real program, a Vec<u8> in
// tests), so writing to a slow or blocked pipe only parks the collector task.
// =============================================================================

mod format;

pub use format::{render, OutputFormat, DEFAULT_URL_WIDTH};

use crate::pipeline::{FetchResult, ResultSink};
use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};

pub struct LineSink<W: AsyncWrite + Unpin + Send> {
    writer: W,
    format: OutputFormat,
    url_width: usize,
}

impl<W: AsyncWrite + Unpin + Send> LineSink<W> {
    pub fn new(writer: W, format: OutputFormat, url_width: usize) -> Self {
        Self {
            writer,
            format,
            url_width,
        }
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> ResultSink for LineSink<W> {
    async fn emit(&mut self, result: &FetchResult) -> io::Result<()> {
        let mut line = render(result, self.format, self.url_width);
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        // Flush per line so results show up as they arrive
        self.writer.flush().await
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.writer.flush().await
    }
}
