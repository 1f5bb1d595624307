//! HTTP polling transport.
//!
//! Requests the endpoint immediately and then once per interval. A failed
//! cycle (network error, non-2xx status, undecodable body) is reported as a
//! [`StreamError::PollingCycle`] and the schedule carries on; polling only
//! stops when the transport is stopped.

use std::time::Duration;

use reqwest::header::HeaderMap;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::domain::Payload;
use crate::error::StreamError;
use crate::port::{EventSink, Transport, TransportEvent, TransportKind};

/// Fixed-interval HTTP polling transport.
pub struct PollingTransport {
    url: Url,
    client: reqwest::Client,
    interval: Duration,
    headers: HeaderMap,
    task: Option<JoinHandle<()>>,
}

impl PollingTransport {
    /// `interval` must be non-zero.
    pub fn new(url: Url, client: reqwest::Client, interval: Duration, headers: HeaderMap) -> Self {
        Self {
            url,
            client,
            interval,
            headers,
            task: None,
        }
    }
}

impl Transport for PollingTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Polling
    }

    fn start(&mut self, sink: EventSink) {
        self.stop();
        let poller = Poller {
            url: self.url.clone(),
            client: self.client.clone(),
            headers: self.headers.clone(),
        };
        self.task = Some(tokio::spawn(poller.run(self.interval, sink)));
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            debug!(url = %self.url, "Stopping polling");
            task.abort();
        }
    }

    fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for PollingTransport {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Poller {
    url: Url,
    client: reqwest::Client,
    headers: HeaderMap,
}

impl Poller {
    async fn run(self, interval: Duration, sink: EventSink) {
        info!(
            url = %self.url,
            interval_ms = interval.as_millis() as u64,
            "Starting polling"
        );

        // The first tick completes immediately.
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let event = match self.poll_once().await {
                Ok(body) => {
                    trace!(url = %self.url, "Poll succeeded");
                    TransportEvent::Message(Payload::Json(body))
                }
                Err(err) => {
                    warn!(url = %self.url, error = %err, "Polling error");
                    TransportEvent::Error(err)
                }
            };
            if !sink.emit(event).await {
                break;
            }
        }
    }

    async fn poll_once(&self) -> Result<Value, StreamError> {
        let response = self
            .client
            .get(self.url.clone())
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(|e| StreamError::PollingCycle(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StreamError::PollingCycle(format!(
                "unexpected status {}",
                status.as_u16()
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| StreamError::PollingCycle(format!("invalid response body: {e}")))
    }
}
