//! Terminal management and main run loop

use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use treegen_core::{FeedEvent, GalleryClient};

use super::app::App;
use super::event::{handle_key, poll_event, HandleResult};
use super::ui;

/// A running event stream connection
struct Feed {
    events: UnboundedReceiver<FeedEvent>,
    task: JoinHandle<()>,
}

impl Feed {
    /// Open the stream on the runtime and forward its events
    fn start(client: &GalleryClient, runtime: &Handle) -> Self {
        let (tx, events) = mpsc::unbounded_channel();
        let client = client.clone();

        let task = runtime.spawn(async move {
            let mut feed = client.subscribe().await;
            while let Some(event) = feed.next().await {
                if tx.send(event).is_err() {
                    break;
                }
            }
        });

        Self { events, task }
    }
}

impl Drop for Feed {
    fn drop(&mut self) {
        // Aborting drops the response body, which closes the connection
        self.task.abort();
    }
}

/// Initialize the terminal for TUI mode
fn init_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("Failed to create terminal")?;
    Ok(terminal)
}

/// Restore the terminal to normal mode
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

/// Run the TUI application
pub fn run(client: GalleryClient, runtime: Handle) -> Result<()> {
    // Initialize terminal
    let mut terminal = init_terminal()?;

    // Create app state
    let mut app = App::new(client.session());
    info!(url = client.stream_url(), "tui started");

    // Main event loop
    let result = run_loop(&mut terminal, &mut app, &client, &runtime);

    // Restore terminal (even if loop failed)
    restore_terminal(&mut terminal)?;

    result
}

/// Main event loop
fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    client: &GalleryClient,
    runtime: &Handle,
) -> Result<()> {
    let mut feed: Option<Feed> = None;

    loop {
        // Apply whatever arrived since the last frame
        if let Some(active) = feed.as_mut() {
            if drain_feed(app, active) {
                feed = None;
            }
        }

        // Render UI
        terminal.draw(|frame| ui::render(frame, app))?;

        // Poll for events (with 100ms timeout for responsive UI)
        if let Some(Event::Key(key)) = poll_event(Duration::from_millis(100))? {
            match handle_key(app, key) {
                HandleResult::Quit => app.should_quit = true,
                HandleResult::Continue => {}
                HandleResult::Generate => {
                    if app.trigger() {
                        feed = Some(Feed::start(client, runtime));
                    }
                }
            }
        }

        // Check if we should quit
        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Apply queued feed events. Returns true once the run has stopped.
fn drain_feed(app: &mut App, feed: &mut Feed) -> bool {
    loop {
        let stopped = match feed.events.try_recv() {
            Ok(event) => app.apply(event),
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Disconnected) => app.feed_closed(),
        };

        if let Some(reason) = stopped {
            debug!(?reason, "closing event stream");
            return true;
        }
        if !app.is_busy() {
            return true;
        }
    }
}
