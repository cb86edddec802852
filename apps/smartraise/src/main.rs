//! # SmartRaise - Employee Performance Prediction
//!
//! The main binary for the SmartRaise prediction service and ingestion job.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 apps/smartraise (THE BINARY)                │
//! │                                                             │
//! │   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐    │
//! │   │     CLI      │   │   HTTP API   │   │    Config    │    │
//! │   │    (clap)    │   │    (axum)    │   │    (toml)    │    │
//! │   └──────┬───────┘   └──────┬───────┘   └──────┬───────┘    │
//! │          └──────────────────┼──────────────────┘            │
//! │                             ▼                               │
//! │                   ┌──────────────────┐                      │
//! │                   │ smartraise-core  │                      │
//! │                   │   (THE LOGIC)    │                      │
//! │                   └──────────────────┘                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the prediction service
//! smartraise serve --model model.srmd --scaler scaler.srsc
//!
//! # Load the HR spreadsheet
//! smartraise ingest -f Employee_Performance.xlsx
//!
//! # One-off prediction
//! smartraise predict --model model.srmd --scaler scaler.srsc 80 90 60
//! ```

use clap::Parser;
use smartraise::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // SMARTRAISE_LOG_FORMAT=json enables machine-parseable output.
    let log_format =
        std::env::var("SMARTRAISE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "smartraise=info,smartraise_core=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the SmartRaise startup banner.
fn print_banner() {
    println!(
        r#"
  ╔═╗┌┬┐┌─┐┬─┐┌┬┐╦═╗┌─┐┬┌─┐┌─┐
  ╚═╗│││├─┤├┬┘ │ ╠╦╝├─┤│└─┐├┤
  ╚═╝┴ ┴┴ ┴┴└─ ┴ ╩╚═┴ ┴┴└─┘└─┘

  Employee Performance Prediction v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
