//! Cancellable streaming client with typed event subscriptions
//!
//! One [`StreamChannel`] drives at most one live stream at a time. Starting
//! a new stream displaces the previous session without an abort event; only
//! an explicit cancel emits `abort`, and it emits exactly one. A per-session
//! closed flag gates every emission, so no event can follow the abort.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use futures::StreamExt;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::models::chat::ChatRequest;
use crate::models::event::{EventKind, StreamEvent};
use crate::stream::decoder::StreamDecoder;

/// Error code for transport-level failures reported by the channel itself
pub const NETWORK_ERROR_CODE: &str = "NETWORK_ERROR";

/// Identifier returned by [`StreamChannel::on`], used to unsubscribe
pub type HandlerId = u64;

type Handler = Arc<dyn Fn(&StreamEvent) + Send + Sync>;

/// Lifecycle state of one stream request
#[derive(Clone)]
struct SessionHandle {
    token: CancellationToken,
    closed: Arc<AtomicBool>,
}

impl SessionHandle {
    fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Stop the session without an abort event (displaced by a newer stream)
    fn close_silently(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.token.cancel();
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

struct ChannelInner {
    handlers: Mutex<HashMap<EventKind, Vec<(HandlerId, Handler)>>>,
    next_handler_id: AtomicU64,
    session: Mutex<Option<SessionHandle>>,
}

impl ChannelInner {
    /// Invoke every handler registered for this event's kind, in
    /// registration order. The list is snapshotted first so handlers may
    /// call back into the channel.
    fn dispatch(&self, event: &StreamEvent) {
        let snapshot: Vec<Handler> = {
            let handlers = self.handlers.lock().unwrap();
            handlers
                .get(&event.kind())
                .map(|list| list.iter().map(|(_, handler)| Arc::clone(handler)).collect())
                .unwrap_or_default()
        };
        for handler in snapshot {
            handler(event);
        }
    }

    /// Dispatch unless the session has been closed or displaced
    fn emit(&self, session: &SessionHandle, event: &StreamEvent) {
        if session.is_closed() {
            return;
        }
        self.dispatch(event);
    }
}

/// Cancels the stream it was returned from. A handle for a session that has
/// since been displaced or completed is a no-op. Dropping the handle does
/// not cancel anything.
pub struct CancelHandle {
    session: SessionHandle,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.session.token.cancel();
    }

    pub fn is_active(&self) -> bool {
        !self.session.is_closed()
    }
}

/// Streaming chat client with `on`/`off` subscriptions
#[derive(Clone)]
pub struct StreamChannel {
    client: reqwest::Client,
    inner: Arc<ChannelInner>,
}

impl StreamChannel {
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(300))
    }

    /// `read_timeout` bounds the whole request, headers through last byte
    pub fn with_timeout(read_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(read_timeout)
            .user_agent("chatrelay/0.1.0")
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            inner: Arc::new(ChannelInner {
                handlers: Mutex::new(HashMap::new()),
                next_handler_id: AtomicU64::new(1),
                session: Mutex::new(None),
            }),
        })
    }

    /// Subscribe a handler to one event kind. Handlers for the same kind
    /// run in the order they were registered.
    pub fn on<F>(&self, kind: EventKind, handler: F) -> HandlerId
    where
        F: Fn(&StreamEvent) + Send + Sync + 'static,
    {
        let id = self.inner.next_handler_id.fetch_add(1, Ordering::Relaxed);
        let mut handlers = self.inner.handlers.lock().unwrap();
        handlers.entry(kind).or_default().push((id, Arc::new(handler)));
        id
    }

    /// Remove one handler; returns whether anything was removed
    pub fn off(&self, kind: &EventKind, id: HandlerId) -> bool {
        let mut handlers = self.inner.handlers.lock().unwrap();
        match handlers.get_mut(kind) {
            Some(list) => {
                let before = list.len();
                list.retain(|(handler_id, _)| *handler_id != id);
                before != list.len()
            }
            None => false,
        }
    }

    /// Open a stream request. Any prior active stream is displaced first,
    /// silently. Returns a handle that cancels this session.
    pub fn stream(&self, url: &str, payload: &ChatRequest) -> CancelHandle {
        let session = SessionHandle::new();
        {
            let mut slot = self.inner.session.lock().unwrap();
            if let Some(previous) = slot.replace(session.clone()) {
                debug!("Displacing previous stream session");
                previous.close_silently();
            }
        }

        let inner = Arc::clone(&self.inner);
        let client = self.client.clone();
        let url = url.to_string();
        let payload = payload.clone();
        let task_session = session.clone();
        tokio::spawn(async move {
            drive_stream(&inner, &client, &url, &payload, &task_session).await;
            finish_session(&inner, &task_session);
        });

        CancelHandle { session }
    }

    /// Cancel the active stream, if any. Emits exactly one `abort` event
    /// for it; a channel with no live session does nothing.
    pub fn cancel(&self) {
        let session = self.inner.session.lock().unwrap().clone();
        if let Some(session) = session {
            session.token.cancel();
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.inner
            .session
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|session| !session.is_closed())
    }
}

/// Run one session to any terminal state. Emission of the abort event is
/// left to [`finish_session`] so it happens exactly once no matter which
/// await the cancellation interrupts.
async fn drive_stream(
    inner: &ChannelInner,
    client: &reqwest::Client,
    url: &str,
    payload: &ChatRequest,
    session: &SessionHandle,
) {
    let token = &session.token;

    let sent = tokio::select! {
        _ = token.cancelled() => return,
        sent = client.post(url).json(payload).send() => sent,
    };

    let response = match sent {
        Ok(response) => response,
        Err(e) => {
            if !token.is_cancelled() {
                warn!("Stream request failed: {}", e);
                inner.emit(session, &StreamEvent::error(NETWORK_ERROR_CODE, e.to_string()));
            }
            return;
        }
    };

    let status = response.status();
    if !status.is_success() {
        // one error event, decoded from the body when possible; the
        // decode loop is never entered
        let body = response.text().await.unwrap_or_default();
        let message = parse_error_message(status.as_u16(), &body);
        warn!("Stream endpoint returned {}: {}", status, message);
        inner.emit(
            session,
            &StreamEvent::error(format!("HTTP_{}", status.as_u16()), message),
        );
        return;
    }

    let mut decoder = StreamDecoder::new();
    let mut body = response.bytes_stream();
    loop {
        let next = tokio::select! {
            _ = token.cancelled() => return,
            next = body.next() => next,
        };
        match next {
            Some(Ok(bytes)) => {
                for event in decoder.push_bytes(&bytes) {
                    if session.is_closed() {
                        return;
                    }
                    inner.dispatch(&event);
                }
            }
            Some(Err(e)) => {
                if !token.is_cancelled() {
                    warn!("Stream read failed: {}", e);
                    inner.emit(session, &StreamEvent::error(NETWORK_ERROR_CODE, e.to_string()));
                }
                return;
            }
            None => {
                if let Some(event) = decoder.finish() {
                    inner.emit(session, &event);
                }
                debug!("Stream completed");
                return;
            }
        }
    }
}

/// Close out a session: emit the single abort event if this session was
/// cancelled (not displaced), and free the channel's session slot.
fn finish_session(inner: &ChannelInner, session: &SessionHandle) {
    let was_closed = session.closed.swap(true, Ordering::SeqCst);
    if session.token.is_cancelled() && !was_closed {
        inner.dispatch(&StreamEvent::Abort);
        debug!("Stream aborted");
    }
    let mut slot = inner.session.lock().unwrap();
    let is_current = slot
        .as_ref()
        .is_some_and(|current| Arc::ptr_eq(&current.closed, &session.closed));
    if is_current {
        *slot = None;
    }
}

/// Best-effort extraction of a human-readable message from an error body.
/// Understands `{"error":{"message":...}}` and `{"detail":...}`.
fn parse_error_message(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(message) = value
            .get("error")
            .and_then(|error| error.get("message"))
            .and_then(Value::as_str)
        {
            return message.to_string();
        }
        if let Some(detail) = value.get("detail").and_then(Value::as_str) {
            return detail.to_string();
        }
    }
    format!("HTTP {}", status)
}
