//! Terminal gallery view
//!
//! One screen, modelled on the browser viewer:
//! - Title and a "Generate Trees" button (`g`/Enter, disabled while generating)
//! - The received image URLs in arrival order, labelled `tree-N`
//! - A status line with the outcome of the last run
//!
//! The event stream runs on a tokio task and forwards feed events over a
//! channel; the render loop owns the session and applies them.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use treegen_core::{ClientConfig, GalleryClient};

use crate::commands::ClientArgs;

pub mod app;
pub mod event;
pub mod terminal;
pub mod ui;

pub use terminal::run;

/// Arguments for the tui command
#[derive(Parser, Debug)]
pub struct TuiArgs {
    #[command(flatten)]
    pub client: ClientArgs,

    /// Log file (default: <cache dir>/treegen/tui.log)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// Run the TUI on a blocking thread; the feed tasks run on the current runtime
pub async fn run_tui(args: TuiArgs, config: &ClientConfig) -> Result<()> {
    let client = GalleryClient::new(&args.client.apply(config));
    let runtime = tokio::runtime::Handle::current();

    tokio::task::spawn_blocking(move || run(client, runtime))
        .await
        .context("TUI thread panicked")?
}
