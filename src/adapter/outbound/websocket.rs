//! WebSocket transport.
//!
//! Receive-only: text and binary frames are forwarded as payloads, pings are
//! answered, and the transport reports `Closed` whenever the socket goes
//! away, whether the server closed it, the stream failed, or the handshake
//! never completed.

use futures_util::{SinkExt, StreamExt};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, trace};
use url::Url;

use crate::domain::Payload;
use crate::error::StreamError;
use crate::port::{EventSink, Transport, TransportEvent, TransportKind};

const TRANSPORT: &str = "websocket";

/// WebSocket transport for a `ws://` or `wss://` endpoint.
pub struct WebSocketTransport {
    url: Url,
    task: Option<JoinHandle<()>>,
}

impl WebSocketTransport {
    #[must_use]
    pub fn new(url: Url) -> Self {
        Self { url, task: None }
    }
}

impl Transport for WebSocketTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::WebSocket
    }

    fn start(&mut self, sink: EventSink) {
        self.stop();
        self.task = Some(tokio::spawn(run(self.url.clone(), sink)));
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            debug!(url = %self.url, "Closing WebSocket");
            task.abort();
        }
    }

    fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run(url: Url, sink: EventSink) {
    info!(url = %url, "Connecting to WebSocket");

    let mut ws = match connect_async(url.as_str()).await {
        Ok((ws, response)) => {
            info!(status = %response.status(), "WebSocket connected");
            ws
        }
        Err(e) => {
            error!(error = %e, "WebSocket connection failed");
            sink.emit(TransportEvent::Error(StreamError::TransportConnect {
                transport: TRANSPORT,
                reason: e.to_string(),
            }))
            .await;
            sink.emit(TransportEvent::Closed).await;
            return;
        }
    };

    if !sink.emit(TransportEvent::Opened).await {
        return;
    }

    while let Some(frame) = ws.next().await {
        let payload = match frame {
            Ok(Message::Text(text)) => {
                trace!(bytes = text.len(), "Received WebSocket text frame");
                Payload::Text(text)
            }
            Ok(Message::Binary(bytes)) => {
                trace!(bytes = bytes.len(), "Received WebSocket binary frame");
                Payload::Binary(bytes)
            }
            Ok(Message::Ping(data)) => {
                trace!("Received WebSocket ping");
                if let Err(e) = ws.send(Message::Pong(data)).await {
                    sink.emit(TransportEvent::Error(StreamError::TransportRuntime {
                        transport: TRANSPORT,
                        reason: format!("failed to send pong: {e}"),
                    }))
                    .await;
                    break;
                }
                continue;
            }
            Ok(Message::Close(frame)) => {
                info!(frame = ?frame, "WebSocket closed by server");
                break;
            }
            Ok(_) => continue,
            Err(e) => {
                error!(error = %e, "WebSocket error");
                sink.emit(TransportEvent::Error(StreamError::TransportRuntime {
                    transport: TRANSPORT,
                    reason: e.to_string(),
                }))
                .await;
                break;
            }
        };

        if !sink.emit(TransportEvent::Message(payload)).await {
            return;
        }
    }

    sink.emit(TransportEvent::Closed).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn reports_websocket_kind() {
        let transport = WebSocketTransport::new(Url::parse("wss://corridors.example/ws").unwrap());
        assert_eq!(transport.kind(), TransportKind::WebSocket);
        assert!(!transport.is_running());
    }

    #[tokio::test]
    async fn failed_handshake_reports_error_then_close() {
        let mut transport = WebSocketTransport::new(Url::parse("ws://127.0.0.1:9/ws").unwrap());
        let (tx, mut rx) = mpsc::channel(8);
        transport.start(EventSink::new(2, tx));

        let first = rx.recv().await.unwrap();
        assert!(matches!(
            first.event,
            TransportEvent::Error(StreamError::TransportConnect { transport: "websocket", .. })
        ));
        assert_eq!(rx.recv().await.unwrap().event, TransportEvent::Closed);
    }

    #[tokio::test]
    async fn stop_twice_is_a_no_op() {
        let mut transport = WebSocketTransport::new(Url::parse("ws://127.0.0.1:9/ws").unwrap());
        transport.stop();
        let (tx, _rx) = mpsc::channel(8);
        transport.start(EventSink::new(1, tx));
        transport.stop();
        transport.stop();
        assert!(!transport.is_running());
    }
}
