//! Zhihu Daily CLI - Fetch Zhihu Daily stories
//!
//! Prints stories as JSON, serving repeated requests from a 24-hour cache.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use zhihu_daily::cli::{execute, Cli};

/// Installs the log subscriber, writing to stderr so stdout stays clean JSON
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("zhihu_daily=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    match execute(&cli).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
