// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// There are no subcommands: URLs come in on stdin, one per line, and the flags
// only tune how they are fetched and printed.
//
//   cat hosts.txt | title-sweep -n 50 -t 5 --color
//
// The Cli struct is converted into the two option structs the rest of the
// program understands: ClientOptions (HTTP behaviour) and PipelineOptions
// (concurrency).
// =============================================================================

use crate::fetch::ClientOptions;
use crate::output::{OutputFormat, DEFAULT_URL_WIDTH};
use crate::pipeline::{ErrorPolicy, PipelineOptions, DEFAULT_WORKERS};
use clap::builder::TypedValueParser;
use clap::Parser;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "title-sweep",
    version,
    about = "Fetch every URL read from stdin and print its status code and <title>",
    long_about = "title-sweep reads one URL per line from standard input, fetches them \
                  concurrently, and prints one line per URL with the HTTP status code and \
                  the page title, or the error that prevented fetching it. Output order \
                  follows completion, not input order."
)]
pub struct Cli {
    /// Number of concurrent workers
    #[arg(short = 'n', long = "workers", default_value_t = DEFAULT_WORKERS,
          value_parser = clap::value_parser!(u32).range(1..).map(|n| n as usize))]
    pub workers: usize,

    /// Follow redirects instead of reporting the 3xx response itself
    #[arg(short = 'f', long)]
    pub follow_redirects: bool,

    /// Request timeout in seconds
    #[arg(short = 't', long = "timeout", default_value_t = 20,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: u64,

    /// Colorize output with ANSI escape codes
    #[arg(short = 'c', long, conflicts_with = "json")]
    pub color: bool,

    /// Print one JSON object per line instead of columns
    #[arg(long)]
    pub json: bool,

    /// Reject invalid or self-signed TLS certificates
    ///
    /// Off by default: audited hosts often have broken certificates and we
    /// still want their titles
    #[arg(long)]
    pub verify_tls: bool,

    /// Stop a worker after its first failed fetch (behaviour of older versions)
    ///
    /// With this flag, URLs still queued when every worker has stopped are
    /// never fetched
    #[arg(long)]
    pub stop_worker_on_error: bool,

    /// Width of the URL column
    #[arg(long, default_value_t = DEFAULT_URL_WIDTH)]
    pub url_width: usize,

    /// User-Agent header sent with every request
    #[arg(long)]
    pub user_agent: Option<String>,
}

impl Cli {
    pub fn client_options(&self) -> ClientOptions {
        let defaults = ClientOptions::default();
        ClientOptions {
            timeout: Duration::from_secs(self.timeout_secs),
            follow_redirects: self.follow_redirects,
            verify_tls: self.verify_tls,
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
        }
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            workers: self.workers,
            error_policy: if self.stop_worker_on_error {
                ErrorPolicy::StopWorker
            } else {
                ErrorPolicy::Continue
            },
            queue_capacity: None,
        }
    }

    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else if self.color {
            OutputFormat::Colored
        } else {
            OutputFormat::Plain
        }
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why value_parser ranges?
//    - "-n 0" would start a pool with nobody to do the work
//    - clap rejects it with a proper error message before anything starts
//
// 2. What does conflicts_with do?
//    - --color and --json describe two different output formats
//    - clap refuses the combination instead of silently picking one
// -----------------------------------------------------------------------------
