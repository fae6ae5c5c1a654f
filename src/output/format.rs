// src/output/format.rs
// =============================================================================
// Turns one FetchResult into one line of text.
//
// Three flavours of the same data:
// - plain:   "<url padded to width> <status> <title or error>"
// - colored: same columns with ANSI colors (blue URL, green title, red error,
//            status colored by class)
// - json:    one JSON object per line, for piping into jq and friends
//
// Failures have no status code, so the status column is left blank for them.
// =============================================================================

use crate::pipeline::FetchResult;
use colored::{ColoredString, Colorize};

/// Width of the URL column unless --url-width says otherwise
pub const DEFAULT_URL_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Plain,
    Colored,
    Json,
}

pub fn render(result: &FetchResult, format: OutputFormat, url_width: usize) -> String {
    match format {
        OutputFormat::Plain => render_plain(result, url_width),
        OutputFormat::Colored => render_colored(result, url_width),
        OutputFormat::Json => render_json(result),
    }
}

fn status_column(result: &FetchResult) -> String {
    match result.status_code() {
        0 => String::new(),
        status => status.to_string(),
    }
}

fn render_plain(result: &FetchResult, url_width: usize) -> String {
    let text = result.title().unwrap_or_else(|| result.error_message());
    format!(
        "{:<width$} {:>3} {}",
        result.url,
        status_column(result),
        text,
        width = url_width
    )
}

fn render_colored(result: &FetchResult, url_width: usize) -> String {
    // Pad before coloring, escape codes would otherwise count towards the width
    let url = format!("{:<width$}", result.url, width = url_width);
    let status = format!("{:>3}", status_column(result));

    let status = match result.status_code() {
        200..=299 => status.green(),
        300..=399 => status.yellow(),
        _ => status.red(),
    };

    let text: ColoredString = match result.title() {
        Some(title) => title.green(),
        None => result.error_message().red(),
    };

    format!("{} {} {}", url.blue().bold(), status, text)
}

fn render_json(result: &FetchResult) -> String {
    // FetchResult only holds strings and integers, serialization cannot fail
    serde_json::to_string(result).unwrap_or_default()
}
