//! # legend-qa
//!
//! This is the main entry point for the `legend-qa` command-line interface.
//! The binary is a thin entrypoint; all logic lives in the `legend_qa_cli`
//! library crate.

use anyhow::Result;
use clap::Parser;
use legend_qa_cli::{run, Cli};

// --- Main Application Entry ---

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("[legend-qa error] {e:?}");
        std::process::exit(1);
    }

    Ok(())
}
