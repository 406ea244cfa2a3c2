//! treegen-core: gallery session, event stream decoding, and the feed client
//!
//! The session is a plain state machine; everything that touches the network
//! lives in [`client`] behind the default `rt` feature.

#[cfg(feature = "rt")]
pub mod client;
pub mod config;
pub mod error;
pub mod session;
pub mod sse;

#[cfg(feature = "rt")]
pub use client::{drive, feed_events, FeedEvent, GalleryClient, SessionUpdate};
pub use config::{ClientConfig, GalleryConfig, ServerSettings};
pub use error::{GalleryError, Result};
pub use session::{GallerySession, MessageOutcome, StopReason, Trigger, DEFAULT_IMAGE_LIMIT};
pub use sse::{EventDecoder, SseEvent};
