//! Event stream client: connects to the relay, decodes frames, and drives a
//! [`GallerySession`] until it stops.
//!
//! The pieces are split so each can run where it is needed:
//! - [`feed_events`] turns any byte stream into [`FeedEvent`]s
//! - [`drive`] applies feed events to a started session
//! - [`GalleryClient`] opens the HTTP connection and combines both
//!
//! Dropping the feed stream closes the connection. [`drive`] returns as soon
//! as the session stops, so the connection is released after the image limit
//! or the first failure.

use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;

use futures::future;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::{GalleryError, Result};
use crate::session::{GallerySession, MessageOutcome, StopReason, Trigger};
use crate::sse::{EventDecoder, DEFAULT_EVENT_TYPE};

/// Failure text used when the server ends the stream before the limit
pub const STREAM_CLOSED: &str = "event stream closed by server";

/// Something that happened on the feed connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// A `message` event; its data is an image filename
    Message(String),
    /// The connection failed or ended; no further events follow
    Failed(String),
}

/// Progress reported while a session is being driven
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    Image { index: usize, url: String },
    Stopped(StopReason),
}

struct FeedState<S> {
    inner: Pin<Box<S>>,
    decoder: EventDecoder,
    pending: VecDeque<FeedEvent>,
    done: bool,
}

/// Decode a byte stream into feed events.
///
/// Only events of type `message` are surfaced. A transport error or the end
/// of the byte stream yields one final [`FeedEvent::Failed`].
pub fn feed_events<S, B, E>(bytes: S) -> impl Stream<Item = FeedEvent>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    let state = FeedState {
        inner: Box::pin(bytes),
        decoder: EventDecoder::new(),
        pending: VecDeque::new(),
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.pending.pop_front() {
                return Some((event, state));
            }
            if state.done {
                return None;
            }

            match state.inner.next().await {
                Some(Ok(chunk)) => {
                    for event in state.decoder.feed(chunk.as_ref()) {
                        if event.event == DEFAULT_EVENT_TYPE {
                            state.pending.push_back(FeedEvent::Message(event.data));
                        } else {
                            debug!(event = %event.event, "skipping non-message event");
                        }
                    }
                }
                Some(Err(e)) => {
                    state.done = true;
                    state.decoder.finish();
                    state.pending.push_back(FeedEvent::Failed(e.to_string()));
                }
                None => {
                    state.done = true;
                    state.decoder.finish();
                    state.pending.push_back(FeedEvent::Failed(STREAM_CLOSED.to_string()));
                }
            }
        }
    })
}

/// Apply feed events to a started session until it stops.
///
/// Every appended URL is reported as [`SessionUpdate::Image`], followed by a
/// final [`SessionUpdate::Stopped`]. The event stream is dropped on return.
pub async fn drive<S, F>(session: &mut GallerySession, events: S, mut on_update: F) -> StopReason
where
    S: Stream<Item = FeedEvent>,
    F: FnMut(SessionUpdate),
{
    let mut events = std::pin::pin!(events);

    while session.is_running() {
        let Some(event) = events.next().await else {
            session.fail(STREAM_CLOSED);
            break;
        };

        match event {
            FeedEvent::Message(filename) => match session.on_message(&filename) {
                MessageOutcome::Appended { index, url } | MessageOutcome::Completed { index, url } => {
                    on_update(SessionUpdate::Image { index, url });
                }
                MessageOutcome::Ignored => {}
            },
            FeedEvent::Failed(reason) => {
                session.fail(reason);
            }
        }
    }

    let reason = session
        .last_stop()
        .cloned()
        .unwrap_or_else(|| StopReason::Failed {
            reason: "session was not started".to_string(),
        });
    debug!(?reason, "closing event stream");
    on_update(SessionUpdate::Stopped(reason.clone()));
    reason
}

/// HTTP client for the relay's event stream
#[derive(Debug, Clone)]
pub struct GalleryClient {
    http: reqwest::Client,
    stream_url: String,
    output_base: String,
    limit: usize,
}

impl GalleryClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            stream_url: config.stream_url(),
            output_base: config.output_base(),
            limit: config.image_limit,
        }
    }

    pub fn stream_url(&self) -> &str {
        &self.stream_url
    }

    /// A fresh idle session matching this client's output base and limit
    pub fn session(&self) -> GallerySession {
        GallerySession::new(self.output_base.clone(), self.limit)
    }

    /// Send the stream request and check that an event stream came back.
    pub async fn open(&self) -> Result<reqwest::Response> {
        info!(url = %self.stream_url, "opening event stream");

        let response = self
            .http
            .get(&self.stream_url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GalleryError::status(&self.stream_url, status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if !content_type.starts_with("text/event-stream") {
            return Err(GalleryError::content_type(&self.stream_url, content_type));
        }

        Ok(response)
    }

    /// Open the stream as feed events. Connection errors become a single `Failed`.
    pub async fn subscribe(&self) -> BoxStream<'static, FeedEvent> {
        match self.open().await {
            Ok(response) => feed_events(response.bytes_stream()).boxed(),
            Err(e) => stream::once(future::ready(FeedEvent::Failed(e.to_string()))).boxed(),
        }
    }

    /// Trigger one run: start the session, open the stream, drive it to a stop.
    ///
    /// Returns `None` without connecting when the session is already busy.
    pub async fn generate<F>(&self, session: &mut GallerySession, on_update: F) -> Option<StopReason>
    where
        F: FnMut(SessionUpdate),
    {
        if session.start() == Trigger::AlreadyRunning {
            return None;
        }

        let events = self.subscribe().await;
        Some(drive(session, events, on_update).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const BASE: &str = "http://localhost:5000/output";

    type Chunk = std::result::Result<&'static str, String>;

    fn started(limit: usize) -> GallerySession {
        let mut session = GallerySession::new(BASE, limit);
        session.start();
        session
    }

    #[tokio::test]
    async fn feed_surfaces_messages_then_close() {
        let chunks: Vec<Chunk> = vec![
            Ok("data: a.png\n\nevent: progress\ndata: 50\n\n"),
            Ok("data: b.p"),
            Ok("ng\n\n"),
        ];
        let events: Vec<FeedEvent> = feed_events(stream::iter(chunks)).collect().await;

        assert_eq!(
            events,
            vec![
                FeedEvent::Message("a.png".into()),
                FeedEvent::Message("b.png".into()),
                FeedEvent::Failed(STREAM_CLOSED.into()),
            ]
        );
    }

    #[tokio::test]
    async fn feed_stops_after_transport_error() {
        let chunks: Vec<Chunk> = vec![
            Ok("data: a.png\n\n"),
            Err("connection reset".into()),
            Ok("data: never.png\n\n"),
        ];
        let events: Vec<FeedEvent> = feed_events(stream::iter(chunks)).collect().await;

        assert_eq!(
            events,
            vec![
                FeedEvent::Message("a.png".into()),
                FeedEvent::Failed("connection reset".into()),
            ]
        );
    }

    #[tokio::test]
    async fn drive_closes_after_limit() {
        let pulled = Arc::new(AtomicUsize::new(0));
        let counter = pulled.clone();
        let chunks: Vec<Chunk> = vec![
            Ok("data: t0.png\n\n"),
            Ok("data: t1.png\n\n"),
            Ok("data: t2.png\n\n"),
            Ok("data: t3.png\n\n"),
            Ok("data: t4.png\n\n"),
            Ok("data: t5.png\n\n"),
            Ok("data: t6.png\n\n"),
        ];
        let bytes = stream::iter(chunks).inspect(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let mut session = started(5);
        let mut updates = Vec::new();
        let reason = drive(&mut session, feed_events(bytes), |u| updates.push(u)).await;

        assert_eq!(reason, StopReason::Completed { images: 5 });
        assert!(!session.is_running());
        assert_eq!(session.images().len(), 5);
        assert_eq!(session.images()[4], format!("{BASE}/t4.png"));
        // Nothing past the fifth frame was read from the connection
        assert_eq!(pulled.load(Ordering::SeqCst), 5);
        assert_eq!(updates.len(), 6);
        assert_eq!(updates[5], SessionUpdate::Stopped(reason));
    }

    #[tokio::test]
    async fn drive_keeps_arrival_order_before_limit() {
        let events = stream::iter(vec![
            FeedEvent::Message("a.png".into()),
            FeedEvent::Message("b.png".into()),
        ])
        .chain(stream::pending());

        let mut session = started(5);
        let mut seen = Vec::new();
        let drive_fut = drive(&mut session, events, |u| {
            if let SessionUpdate::Image { url, .. } = u {
                seen.push(url);
            }
        });

        // Stream never ends, so the run is still in progress when we stop waiting
        let timed_out = tokio::time::timeout(std::time::Duration::from_millis(50), drive_fut)
            .await
            .is_err();
        assert!(timed_out);
        assert_eq!(
            seen,
            vec![
                "http://localhost:5000/output/a.png".to_string(),
                "http://localhost:5000/output/b.png".to_string()
            ]
        );
        assert!(session.is_running());
    }

    #[tokio::test]
    async fn drive_stops_on_failure() {
        let events = stream::iter(vec![
            FeedEvent::Message("a.png".into()),
            FeedEvent::Failed("boom".into()),
            FeedEvent::Message("b.png".into()),
        ]);

        let mut session = started(5);
        let reason = drive(&mut session, events, |_| {}).await;

        assert_eq!(
            reason,
            StopReason::Failed {
                reason: "boom".into()
            }
        );
        assert_eq!(session.images().len(), 1);
        assert!(!session.is_running());
    }

    #[tokio::test]
    async fn drive_treats_early_end_as_failure() {
        let events = stream::iter(vec![FeedEvent::Message("a.png".into())]);

        let mut session = started(5);
        let reason = drive(&mut session, events, |_| {}).await;

        assert_eq!(
            reason,
            StopReason::Failed {
                reason: STREAM_CLOSED.into()
            }
        );
    }

    #[tokio::test]
    async fn generate_while_busy_does_not_connect() {
        let client = GalleryClient::new(&ClientConfig::default());
        let mut session = client.session();
        session.start();

        let result = client.generate(&mut session, |_| {}).await;
        assert!(result.is_none());
        assert!(session.is_running());
    }

    #[tokio::test]
    async fn unreachable_endpoint_fails_the_session() {
        let config = ClientConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            ..ClientConfig::default()
        };
        let client = GalleryClient::new(&config);
        let mut session = client.session();

        let reason = client.generate(&mut session, |_| {}).await;
        assert!(matches!(reason, Some(StopReason::Failed { .. })));
        assert!(!session.is_running());
        assert!(session.images().is_empty());
    }

    async fn serve(app: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client_at(base_url: String) -> GalleryClient {
        GalleryClient::new(&ClientConfig {
            base_url,
            ..ClientConfig::default()
        })
    }

    #[tokio::test]
    async fn error_status_fails_the_session() {
        use axum::{http::StatusCode, routing::get, Router};

        let app = Router::new().route(
            "/run-main",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "generator crashed") }),
        );
        let client = client_at(serve(app).await);
        let mut session = client.session();

        let reason = client.generate(&mut session, |_| {}).await.unwrap();
        match reason {
            StopReason::Failed { reason } => assert!(reason.contains("returned status 500"), "{reason}"),
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(!session.is_running());
        assert!(session.images().is_empty());
    }

    #[tokio::test]
    async fn non_event_stream_response_fails_the_session() {
        use axum::{response::Html, routing::get, Router};

        let app = Router::new().route(
            "/run-main",
            get(|| async { Html("<p>data: tree_0.png</p>") }),
        );
        let client = client_at(serve(app).await);
        let mut session = client.session();

        let mut updates = Vec::new();
        let reason = client.generate(&mut session, |u| updates.push(u)).await.unwrap();
        match reason {
            StopReason::Failed { reason } => {
                assert!(reason.contains("has content type 'text/html"), "{reason}")
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(session.images().is_empty());
        assert_eq!(updates.len(), 1);
    }
}
