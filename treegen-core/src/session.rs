//! Gallery session: the busy flag plus the list of image URLs.
//!
//! # State Machine
//!
//! ```text
//! ┌─────────────┐  start()   ┌─────────────┐
//! │    idle     │ ─────────▶ │   running   │  on_message() appends one URL
//! │ (!running)  │ ◀───────── │  (running)  │
//! └─────────────┘  limit hit └─────────────┘
//!                  or fail()
//! ```
//!
//! The session never touches the network. Whoever owns the connection feeds
//! it messages and failures and closes the connection once the session
//! reports that it stopped.

use tracing::{debug, error};

/// Default number of images collected before the stream is closed
pub const DEFAULT_IMAGE_LIMIT: usize = 5;

/// Result of pressing the trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Prior images were cleared and the session is now busy
    Started,
    /// A stream is already active; nothing changed
    AlreadyRunning,
}

/// What happened to a single received message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    /// URL appended, more messages expected
    Appended { index: usize, url: String },
    /// URL appended and the limit was reached; the stream must be closed
    Completed { index: usize, url: String },
    /// Session was not running, message dropped
    Ignored,
}

/// Why the last run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The image limit was reached
    Completed { images: usize },
    /// The stream reported an error before the limit
    Failed { reason: String },
}

impl StopReason {
    pub fn is_completed(&self) -> bool {
        matches!(self, StopReason::Completed { .. })
    }
}

/// One trigger-to-stop run of the gallery
#[derive(Debug, Clone)]
pub struct GallerySession {
    images: Vec<String>,
    running: bool,
    received: usize,
    limit: usize,
    output_base: String,
    last_stop: Option<StopReason>,
}

impl GallerySession {
    /// Create an idle session. A `limit` of zero is clamped to one.
    pub fn new(output_base: impl Into<String>, limit: usize) -> Self {
        Self {
            images: Vec::new(),
            running: false,
            received: 0,
            limit: limit.max(1),
            output_base: output_base.into(),
            last_stop: None,
        }
    }

    /// Clear prior state and mark the session busy.
    pub fn start(&mut self) -> Trigger {
        if self.running {
            debug!("trigger ignored, stream already active");
            return Trigger::AlreadyRunning;
        }

        self.images.clear();
        self.received = 0;
        self.last_stop = None;
        self.running = true;
        debug!(limit = self.limit, "gallery session started");
        Trigger::Started
    }

    /// Treat `filename` as an image reference and append its URL.
    pub fn on_message(&mut self, filename: &str) -> MessageOutcome {
        if !self.running {
            debug!(filename, "message dropped, session not running");
            return MessageOutcome::Ignored;
        }

        let url = self.image_url(filename);
        let index = self.images.len();
        self.images.push(url.clone());
        self.received += 1;

        if self.received >= self.limit {
            self.running = false;
            self.last_stop = Some(StopReason::Completed {
                images: self.images.len(),
            });
            debug!(images = self.images.len(), "image limit reached");
            MessageOutcome::Completed { index, url }
        } else {
            MessageOutcome::Appended { index, url }
        }
    }

    /// Record a stream failure. Returns false when the session was already idle.
    pub fn fail(&mut self, reason: impl Into<String>) -> bool {
        if !self.running {
            return false;
        }

        let reason = reason.into();
        error!(%reason, received = self.received, "event stream failed");
        self.running = false;
        self.last_stop = Some(StopReason::Failed { reason });
        true
    }

    /// Derive the display URL for a filename by plain concatenation.
    pub fn image_url(&self, filename: &str) -> String {
        format!("{}/{}", self.output_base.trim_end_matches('/'), filename)
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn received(&self) -> usize {
        self.received
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn output_base(&self) -> &str {
        &self.output_base
    }

    pub fn last_stop(&self) -> Option<&StopReason> {
        self.last_stop.as_ref()
    }
}
