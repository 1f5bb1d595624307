//! End-to-end tests of the network transports against a local HTTP server.

use std::time::Duration;

use freightfeed::error::StreamError;
use freightfeed::port::TransportKind;
use freightfeed::runtime::{ConnectionConfig, StreamAdapter};
use freightfeed::testkit::{config, domain, wait_until};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PATIENCE: Duration = Duration::from_secs(10);

fn install_crypto() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

#[tokio::test]
async fn polling_merges_successive_responses() {
    install_crypto();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(domain::freight(&["A"])))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(domain::cargo("frozen", 800.0, 12.5)),
        )
        .mount(&server)
        .await;

    let adapter = StreamAdapter::new();
    adapter.connect(
        ConnectionConfig::new(format!("{}/feed", server.uri()), TransportKind::Polling)
            .with_poll_interval(Duration::from_millis(1000)),
    );

    assert!(wait_until(PATIENCE, || !adapter.forwarders().is_empty()).await);
    assert!(adapter.cargo_data().is_none());

    assert!(wait_until(PATIENCE, || adapter.cargo_data().is_some()).await);
    let forwarders = adapter.forwarders();
    assert_eq!(forwarders.len(), 1);
    assert_eq!(forwarders[0]["name"], "A");
    assert_eq!(adapter.cargo_data().unwrap().cargo_type, "frozen");
    assert!(adapter.is_connected());
    assert!(adapter.is_data_fresh(5));

    adapter.disconnect();
}

#[tokio::test]
async fn polling_survives_failed_cycles() {
    install_crypto();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/market"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/market"))
        .and(header("x-api-key", "secret"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(domain::market(1.42, "DAR", 0.7)),
        )
        .mount(&server)
        .await;

    let adapter = StreamAdapter::new();
    adapter.connect(
        ConnectionConfig::new(format!("{}/market", server.uri()), TransportKind::Polling)
            .with_poll_interval(Duration::from_millis(100))
            .with_header("x-api-key", "secret"),
    );

    let mut first_failure = None;
    assert!(
        wait_until(PATIENCE, || {
            let state = adapter.connection_state();
            let failed = state.last_error.is_some();
            first_failure = Some(state);
            failed
        })
        .await
    );
    let state = first_failure.unwrap();
    assert_eq!(
        state.last_error,
        Some(StreamError::PollingCycle("unexpected status 503".into()))
    );
    assert!(!state.is_connected);

    assert!(wait_until(PATIENCE, || adapter.market_data().is_some()).await);
    assert!(adapter.is_connected());
    assert!(adapter.error().is_none());
    assert_eq!(adapter.market_data().unwrap().port_congestion["DAR"], 0.7);

    adapter.disconnect();
}

#[tokio::test]
async fn sse_stream_delivers_events_and_reconnects_when_it_ends() {
    install_crypto();
    let server = MockServer::start().await;
    let body = format!(
        ": welcome\n\ndata: {}\n\nevent: ping\ndata: {{}}\n\n",
        domain::freight(&["A", "B"])
    );
    Mock::given(method("GET"))
        .and(path("/stream"))
        .and(header("accept", "text/event-stream"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(body),
        )
        .mount(&server)
        .await;

    let adapter = StreamAdapter::builder()
        .reconnection(config::fast_reconnection(3))
        .build();
    adapter.connect(ConnectionConfig::freight(format!("{}/stream", server.uri())));

    assert!(wait_until(PATIENCE, || adapter.forwarders().len() == 2).await);

    // The body ends after one event, so the adapter keeps reconnecting.
    let mut seen = 0;
    for _ in 0..200 {
        seen = server.received_requests().await.map_or(0, |requests| requests.len());
        if seen >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(seen >= 2, "expected a reconnect, saw {seen} request(s)");
    assert_eq!(adapter.forwarders().len(), 2);

    adapter.disconnect();
}

#[tokio::test]
async fn unreachable_sse_endpoint_reports_connect_error() {
    install_crypto();
    let adapter = StreamAdapter::builder()
        .reconnection(config::fast_reconnection(1))
        .build();
    adapter.connect(ConnectionConfig::new(
        "http://127.0.0.1:9/stream",
        TransportKind::Sse,
    ));

    assert!(
        wait_until(PATIENCE, || matches!(
            adapter.error(),
            Some(StreamError::TransportConnect { transport: "sse", .. })
        ))
        .await
    );
    assert!(!adapter.is_connected());
    adapter.disconnect();
}

#[tokio::test]
async fn websocket_frames_merge_and_server_close_reconnects() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (pong_tx, pong_rx) = oneshot::channel();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.send(Message::Text(domain::freight(&["A", "B"]).to_string()))
            .await
            .unwrap();
        let cargo = domain::cargo("frozen", 800.0, 12.5).to_string();
        ws.send(Message::Binary(cargo.into_bytes())).await.unwrap();
        ws.send(Message::Ping(b"hb".to_vec())).await.unwrap();

        let mut pong = None;
        while let Some(Ok(frame)) = ws.next().await {
            if let Message::Pong(data) = frame {
                pong = Some(data);
                break;
            }
        }
        let _ = pong_tx.send(pong);

        ws.close(None).await.unwrap();
        while let Some(Ok(_)) = ws.next().await {}

        // The adapter dials again after the close.
        let (stream, _) = listener.accept().await.unwrap();
        accept_async(stream).await.is_ok()
    });

    let adapter = StreamAdapter::builder()
        .reconnection(config::fast_reconnection(3))
        .build();
    adapter.connect(ConnectionConfig::corridors(format!("ws://{addr}/ws")));

    assert!(wait_until(PATIENCE, || adapter.cargo_data().is_some()).await);
    assert_eq!(adapter.forwarders().len(), 2);
    assert_eq!(adapter.cargo_data().unwrap().weight, 800.0);

    let pong = tokio::time::timeout(PATIENCE, pong_rx).await.unwrap().unwrap();
    assert_eq!(pong.as_deref(), Some(&b"hb"[..]));

    assert!(tokio::time::timeout(PATIENCE, server).await.unwrap().unwrap());
    assert!(adapter.reconnect_attempts() >= 1);
    // The snapshot outlives the connection that delivered it.
    assert_eq!(adapter.forwarders().len(), 2);

    adapter.disconnect();
}
