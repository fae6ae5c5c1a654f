// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Set up logging (stderr) and parse command-line arguments
// 2. Build the shared HTTP client
// 3. Run the pipeline: stdin -> workers -> stdout
// 4. Exit with a proper code:
//    0 = every input line was processed
//    1 = reading stdin failed part way (URLs read before that were processed)
//    2 = the run could not start at all
// =============================================================================

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use title_sweep::cli::Cli;
use title_sweep::fetch::{build_client, PageFetcher};
use title_sweep::output::{LineSink, OutputFormat};
use title_sweep::{pipeline, telemetry};
use tokio::io::BufReader;

#[tokio::main]
async fn main() {
    telemetry::init_telemetry();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    let format = cli.output_format();
    if format == OutputFormat::Colored {
        // Colors were asked for explicitly, so keep them even when stdout is a pipe
        colored::control::set_override(true);
    }

    let client = build_client(&cli.client_options()).context("failed to start")?;
    let fetcher = Arc::new(PageFetcher::new(client));

    let input = BufReader::new(tokio::io::stdin());
    let sink = LineSink::new(tokio::io::stdout(), format, cli.url_width);

    let summary = pipeline::run_pipeline(fetcher, input, sink, &cli.pipeline_options()).await;

    if summary.write_errors > 0 {
        eprintln!("Warning: {} result line(s) could not be written", summary.write_errors);
    }

    match summary.read_error {
        Some(e) => {
            eprintln!("Error: {}", e);
            Ok(1)
        }
        None => Ok(0),
    }
}
