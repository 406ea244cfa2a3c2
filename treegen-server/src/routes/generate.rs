//! Generator relay: runs the generator and pushes each rendered filename as SSE
//!
//! Every output line is logged at debug level. Lines containing the marker
//! become one `data: <filename>` frame; everything else is dropped. The
//! stream ends when the generator's output ends.

use std::convert::Infallible;
use std::io;
use std::sync::Arc;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures::future;
use futures::stream::{Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::generator::rendered_filename;
use crate::server::AppState;

/// GET /run-main - start the generator and stream rendered filenames
async fn run_main(
    State(state): State<Arc<AppState>>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let lines = state.invoker.spawn().await?;

    let marker = state.marker.clone();
    let events = lines.filter_map(move |line| future::ready(frame_for(line, &marker)));

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn frame_for(line: io::Result<String>, marker: &str) -> Option<Result<Event, Infallible>> {
    match line {
        Ok(line) => {
            debug!(line = line.trim_end(), "generator output");
            rendered_filename(&line, marker).map(|filename| {
                info!(filename, "image rendered");
                Ok(Event::default().data(filename))
            })
        }
        Err(e) => {
            warn!("failed to read generator output: {}", e);
            None
        }
    }
}

/// Relay routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/run-main", get(run_main))
}
