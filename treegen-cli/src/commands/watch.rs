//! `treegen watch` - one generate run on the command line
//!
//! Prints each image URL as soon as it arrives (or a JSON array at the end
//! with `--json`) and exits non-zero when the stream failed before the limit.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use treegen_core::{ClientConfig, GalleryClient, SessionUpdate, StopReason};

use super::ClientArgs;
use crate::ui;

/// Arguments for the watch command
#[derive(Parser, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub client: ClientArgs,

    /// Print the collected URLs as a JSON array when the run ends
    #[arg(long)]
    pub json: bool,
}

pub async fn run_watch(args: WatchArgs, config: &ClientConfig) -> Result<()> {
    let config = args.client.apply(config);
    let client = GalleryClient::new(&config);
    let mut session = client.session();
    let limit = session.limit();

    let pb = ui::spinner(format!("Generating trees via {}", client.stream_url()));

    let reason = client
        .generate(&mut session, |update| {
            if let SessionUpdate::Image { index, url } = update {
                if let Some(pb) = &pb {
                    pb.set_message(format!("Received {}/{}", index + 1, limit));
                }
                if !args.json {
                    ui::println(pb.as_ref(), url);
                }
            }
        })
        .await
        .context("A generate run is already active")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(session.images())?);
    }

    match reason {
        StopReason::Completed { images } => {
            ui::finish_success(pb, format!("Collected {} trees", images));
            Ok(())
        }
        StopReason::Failed { reason } => {
            let received = session.images().len();
            ui::finish_error(pb, format!("Stream failed after {}/{} trees", received, limit));
            Err(anyhow!(
                "event stream from {} failed after {} of {} images: {}",
                client.stream_url(),
                received,
                limit,
                reason
            ))
        }
    }
}
