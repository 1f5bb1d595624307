//! Server-Sent Events transport.
//!
//! Opens a long-lived `text/event-stream` request and forwards the data of
//! every unnamed event. Any failure, including the server ending the body,
//! is reported as an error without a close event; the adapter decides
//! whether to reconnect.

mod frame;

pub use frame::{EventTooLarge, SseDecoder, SseEvent, DEFAULT_MAX_EVENT_BYTES};

use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};
use url::Url;

use crate::domain::Payload;
use crate::error::StreamError;
use crate::port::{EventSink, Transport, TransportEvent, TransportKind};

const TRANSPORT: &str = "sse";

/// SSE transport over a shared `reqwest` client.
pub struct SseTransport {
    url: Url,
    client: reqwest::Client,
    task: Option<JoinHandle<()>>,
}

impl SseTransport {
    pub fn new(url: Url, client: reqwest::Client) -> Self {
        Self {
            url,
            client,
            task: None,
        }
    }
}

impl Transport for SseTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Sse
    }

    fn start(&mut self, sink: EventSink) {
        self.stop();
        self.task = Some(tokio::spawn(run(
            self.client.clone(),
            self.url.clone(),
            sink,
        )));
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            debug!(url = %self.url, "Closing SSE stream");
            task.abort();
        }
    }

    fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for SseTransport {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run(client: reqwest::Client, url: Url, sink: EventSink) {
    info!(url = %url, "Connecting to SSE stream");

    let response = match client
        .get(url.clone())
        .header(ACCEPT, "text/event-stream")
        .header(CACHE_CONTROL, "no-cache")
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            sink.emit(TransportEvent::Error(StreamError::TransportConnect {
                transport: TRANSPORT,
                reason: e.to_string(),
            }))
            .await;
            return;
        }
    };

    let status = response.status();
    if !status.is_success() {
        sink.emit(TransportEvent::Error(StreamError::TransportConnect {
            transport: TRANSPORT,
            reason: format!("unexpected status {status}"),
        }))
        .await;
        return;
    }

    info!(status = %status, "SSE connection established");
    if !sink.emit(TransportEvent::Opened).await {
        return;
    }

    let mut body = response.bytes_stream();
    let mut decoder = SseDecoder::new();
    while let Some(chunk) = body.next().await {
        let bytes = match chunk {
            Ok(bytes) => bytes,
            Err(e) => {
                sink.emit(TransportEvent::Error(StreamError::TransportRuntime {
                    transport: TRANSPORT,
                    reason: e.to_string(),
                }))
                .await;
                return;
            }
        };

        let events = match decoder.feed(&bytes) {
            Ok(events) => events,
            Err(e) => {
                sink.emit(TransportEvent::Error(StreamError::TransportRuntime {
                    transport: TRANSPORT,
                    reason: e.to_string(),
                }))
                .await;
                return;
            }
        };

        for event in events {
            if !event.is_message() {
                trace!(event = %event.event, "Ignoring named SSE event");
                continue;
            }
            trace!(id = ?event.id, bytes = event.data.len(), "Received SSE event");
            if !sink
                .emit(TransportEvent::Message(Payload::Text(event.data)))
                .await
            {
                return;
            }
        }
    }

    sink.emit(TransportEvent::Error(StreamError::TransportRuntime {
        transport: TRANSPORT,
        reason: "stream ended".into(),
    }))
    .await;
}
