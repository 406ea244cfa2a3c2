//! Core application state

use treegen_core::client::STREAM_CLOSED;
use treegen_core::{FeedEvent, GallerySession, MessageOutcome, StopReason, Trigger};

/// Main application state
#[derive(Debug)]
pub struct App {
    /// Gallery state: image URLs and the busy flag
    pub session: GallerySession,
    /// Status message (shown in status bar)
    pub status_message: Option<String>,
    /// Should quit
    pub should_quit: bool,
}

impl App {
    pub fn new(session: GallerySession) -> Self {
        Self {
            session,
            status_message: Some("Press g to generate trees".to_string()),
            should_quit: false,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.session.is_running()
    }

    pub fn button_label(&self) -> &'static str {
        if self.is_busy() {
            "[ Generating... ]"
        } else {
            "[ Generate Trees ]"
        }
    }

    /// Press the generate button. Returns true when a new run started.
    pub fn trigger(&mut self) -> bool {
        match self.session.start() {
            Trigger::Started => {
                self.set_status("Generating...");
                true
            }
            Trigger::AlreadyRunning => false,
        }
    }

    /// Apply one feed event. Returns the stop reason once the run has ended.
    pub fn apply(&mut self, event: FeedEvent) -> Option<StopReason> {
        match event {
            FeedEvent::Message(filename) => {
                if let MessageOutcome::Appended { .. } = self.session.on_message(&filename) {
                    self.set_status(format!(
                        "Generating... {}/{}",
                        self.session.received(),
                        self.session.limit()
                    ));
                }
            }
            FeedEvent::Failed(reason) => {
                self.session.fail(reason);
            }
        }

        self.finished()
    }

    /// The feed task went away without reporting why
    pub fn feed_closed(&mut self) -> Option<StopReason> {
        self.session.fail(STREAM_CLOSED);
        self.finished()
    }

    fn finished(&mut self) -> Option<StopReason> {
        if self.session.is_running() {
            return None;
        }

        let reason = self.session.last_stop().cloned()?;
        match &reason {
            StopReason::Completed { images } => {
                self.set_status(format!("Done: {} trees", images));
            }
            StopReason::Failed { reason } => {
                self.set_status(format!("Stream error: {}", reason));
            }
        }
        Some(reason)
    }

    /// Set a status message
    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
    }
}
