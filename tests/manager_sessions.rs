//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Integration tests for full manager sessions over loopback.
//!
//! Each test uses its own base port so the derived port triples never
//! collide across concurrently running tests.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracelink::channel::ChannelConfig;
use tracelink::manager::{
    ChannelManager, ManagerConfig, ManagerError, MessageSink, RequestHandler, ServiceMask,
};

fn fast_config() -> ManagerConfig {
    ManagerConfig {
        channel: ChannelConfig::default()
            .with_connect_retries(40)
            .with_connect_retry_wait(Duration::from_millis(25)),
        ..Default::default()
    }
}

/// Builds a sink that forwards every delivered payload to a channel.
fn collecting_sink() -> (Arc<dyn MessageSink>, mpsc::UnboundedReceiver<Vec<u8>>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let sink: Arc<dyn MessageSink> = Arc::new(move |payload: &[u8]| {
        let _ = tx.send(payload.to_vec());
    });
    (sink, rx)
}

fn reversing_handler() -> Arc<dyn RequestHandler> {
    Arc::new(|request: &[u8]| {
        let mut response = request.to_vec();
        response.reverse();
        response
    })
}

async fn recv_soon(rx: &mut mpsc::UnboundedReceiver<Vec<u8>>) -> Vec<u8> {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("no message within 5s")
        .expect("sink channel closed")
}

#[tokio::test]
async fn full_duplex_session() {
    let base = 46120;
    let (server_sink, mut server_rx) = collecting_sink();
    let (client_sink, mut client_rx) = collecting_sink();

    let mut server = ChannelManager::new(fast_config());
    let mut client = ChannelManager::new(fast_config());
    let (server_result, client_result) = tokio::join!(
        server.accept(
            base,
            ServiceMask::ALL,
            true,
            Some(server_sink),
            Some(reversing_handler()),
        ),
        client.connect("127.0.0.1", base, ServiceMask::ALL, Some(client_sink)),
    );
    server_result.unwrap();
    client_result.unwrap();
    assert!(server.is_active());
    assert!(client.is_active());

    // Client→server data plane.
    client.send_data(b"from client".to_vec()).await.unwrap();
    assert_eq!(recv_soon(&mut server_rx).await, b"from client");

    // Server→client data plane.
    server.send_data(b"from server".to_vec()).await.unwrap();
    assert_eq!(recv_soon(&mut client_rx).await, b"from server");

    // Request/response, client to server only.
    let response = client.send_request(b"abc".to_vec()).await.unwrap();
    assert_eq!(response, b"cba");

    let rejected = server.send_request(b"abc".to_vec()).await;
    assert!(matches!(rejected, Err(ManagerError::NotAllowed { .. })));

    client.disconnect().await;
    server.disconnect().await;
    assert!(!client.is_active());
    assert!(!server.is_active());
}

#[tokio::test]
async fn concurrent_requests_get_their_own_responses() {
    let base = 46130;
    let mut server = ChannelManager::new(fast_config());
    let mut client = ChannelManager::new(fast_config());
    let (server_result, client_result) = tokio::join!(
        server.accept(
            base,
            ServiceMask::REQUEST_RESPONSE,
            true,
            None,
            Some(reversing_handler()),
        ),
        client.connect("127.0.0.1", base, ServiceMask::REQUEST_RESPONSE, None),
    );
    server_result.unwrap();
    client_result.unwrap();

    let client = Arc::new(client);
    let mut callers = Vec::new();
    for i in 0..8u8 {
        let client = Arc::clone(&client);
        callers.push(tokio::spawn(async move {
            let request = vec![i, i + 1, i + 2];
            let response = client.send_request(request).await.unwrap();
            assert_eq!(response, vec![i + 2, i + 1, i]);
        }));
    }
    for caller in callers {
        caller.await.unwrap();
    }

    let mut client = Arc::try_unwrap(client).ok().expect("no other handles");
    client.disconnect().await;
    server.disconnect().await;
}

#[tokio::test]
async fn session_ports_are_reusable_after_disconnect() {
    let base = 46140;
    for round in 0..2u8 {
        let (server_sink, mut server_rx) = collecting_sink();
        let mut server = ChannelManager::new(fast_config());
        let mut client = ChannelManager::new(fast_config());
        let (server_result, client_result) = tokio::join!(
            server.accept(
                base,
                ServiceMask::RECEIVE_ASYNC | ServiceMask::REQUEST_RESPONSE,
                true,
                Some(server_sink),
                Some(reversing_handler()),
            ),
            client.connect(
                "127.0.0.1",
                base,
                ServiceMask::SEND_ASYNC | ServiceMask::REQUEST_RESPONSE,
                None,
            ),
        );
        server_result.unwrap_or_else(|e| panic!("round {round}: accept failed: {e}"));
        client_result.unwrap_or_else(|e| panic!("round {round}: connect failed: {e}"));

        client.send_data(vec![round]).await.unwrap();
        assert_eq!(recv_soon(&mut server_rx).await, vec![round]);

        client.disconnect().await;
        server.disconnect().await;
    }
}

#[tokio::test]
async fn managers_are_reusable_after_disconnect() {
    let base = 46150;
    let mut server = ChannelManager::new(fast_config());
    let mut client = ChannelManager::new(fast_config());

    for _ in 0..2 {
        let (server_result, client_result) = tokio::join!(
            server.accept(
                base,
                ServiceMask::REQUEST_RESPONSE,
                true,
                None,
                Some(reversing_handler()),
            ),
            client.connect("127.0.0.1", base, ServiceMask::REQUEST_RESPONSE, None),
        );
        server_result.unwrap();
        client_result.unwrap();

        let response = client.send_request(b"xyz".to_vec()).await.unwrap();
        assert_eq!(response, b"zyx");

        client.disconnect().await;
        server.disconnect().await;
        assert!(!client.is_active());
        assert!(!server.is_active());
    }
}

#[tokio::test]
async fn startup_failure_rolls_back_every_service() {
    let base = 46160;
    // Occupy the request/response port so the server's bind fails.
    let blocker = std::net::TcpListener::bind(("127.0.0.1", base)).unwrap();

    let mut server = ChannelManager::new(fast_config());
    let result = server
        .accept(
            base,
            ServiceMask::REQUEST_RESPONSE | ServiceMask::SEND_ASYNC,
            true,
            None,
            Some(reversing_handler()),
        )
        .await;
    assert!(matches!(result, Err(ManagerError::Startup { .. })));
    assert!(!server.is_active());
    assert!(server.has_error());
    drop(blocker);

    // The rolled-back session released base+2, so a fresh accept works.
    let mut client = ChannelManager::new(fast_config());
    let (server_result, client_result) = tokio::join!(
        server.accept(
            base,
            ServiceMask::REQUEST_RESPONSE | ServiceMask::SEND_ASYNC,
            true,
            None,
            Some(reversing_handler()),
        ),
        client.connect(
            "127.0.0.1",
            base,
            ServiceMask::REQUEST_RESPONSE | ServiceMask::RECEIVE_ASYNC,
            Some(collecting_sink().0),
        ),
    );
    server_result.unwrap();
    client_result.unwrap();
    client.disconnect().await;
    server.disconnect().await;
}

#[tokio::test]
async fn client_gives_up_when_no_server_listens() {
    let base = 46170;
    let config = ManagerConfig {
        channel: ChannelConfig::default()
            .with_connect_retries(2)
            .with_connect_retry_wait(Duration::from_millis(10)),
        ..Default::default()
    };
    let mut client = ChannelManager::new(config);
    let start = std::time::Instant::now();
    let result = client
        .connect("127.0.0.1", base, ServiceMask::REQUEST_RESPONSE, None)
        .await;
    match result {
        Err(ManagerError::Startup { source, .. }) => assert!(source.is_timeout()),
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(!client.is_active());
    assert!(start.elapsed() < Duration::from_secs(5));
}
