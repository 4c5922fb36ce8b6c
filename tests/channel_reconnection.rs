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

//! Integration tests for channel recovery after connection loss.

use std::time::Duration;
use tracelink::channel::{Channel, ChannelConfig};

fn fast_config() -> ChannelConfig {
    ChannelConfig::default()
        .with_connect_retries(40)
        .with_connect_retry_wait(Duration::from_millis(25))
}

async fn connected_pair() -> (Channel, Channel) {
    let mut server = Channel::acceptor(0, true, fast_config());
    server.bind().unwrap();
    let port = server.local_port().unwrap();
    let mut client = Channel::initiator("127.0.0.1", port, fast_config());
    let (server_result, client_result) = tokio::join!(server.connect(), client.connect());
    server_result.unwrap();
    client_result.unwrap();
    (server, client)
}

/// An acceptor whose peer goes away takes the next peer mid-read and keeps
/// the message stream going.
#[tokio::test]
async fn acceptor_recovers_when_peer_is_replaced() {
    let (mut server, mut client) = connected_pair().await;
    let port = server.local_port().unwrap();

    client
        .write_message(b"one", 2, Duration::from_millis(500))
        .await
        .unwrap();
    let received = server
        .read_message(5, Duration::from_millis(100))
        .await
        .unwrap();
    assert_eq!(received, b"one");

    // First peer vanishes; a replacement dials in while the server is
    // still inside its read budget.
    client.disconnect().await;
    let mut replacement = Channel::initiator("127.0.0.1", port, fast_config());
    let (read_result, write_result) = tokio::join!(
        server.read_message(10, Duration::from_millis(100)),
        async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            replacement.connect().await?;
            replacement
                .write_message(b"two", 2, Duration::from_millis(500))
                .await
        }
    );
    write_result.unwrap();
    assert_eq!(read_result.unwrap(), b"two");
}

/// An initiator whose peer restarts redials and resumes reading.
#[tokio::test]
async fn initiator_redials_after_peer_restart() {
    let (mut server, mut client) = connected_pair().await;

    server
        .write_message(b"before", 2, Duration::from_millis(500))
        .await
        .unwrap();
    let received = client
        .read_message(5, Duration::from_millis(100))
        .await
        .unwrap();
    assert_eq!(received, b"before");

    let (read_result, write_result) = tokio::join!(
        client.read_message(10, Duration::from_millis(200)),
        async {
            // Drop the data connection; the listener stays up, so the
            // client's redial lands on a fresh accept.
            server.disconnect().await;
            server.connect().await?;
            server
                .write_message(b"after", 2, Duration::from_millis(500))
                .await
        }
    );
    write_result.unwrap();
    assert_eq!(read_result.unwrap(), b"after");
}

/// A reconnect that cannot complete surfaces the dial failure rather than
/// spinning forever.
#[tokio::test]
async fn initiator_surfaces_failed_reconnect() {
    let (server, mut client) = connected_pair().await;
    drop(server); // listener gone, reconnects will be refused

    let result = client.read_message(3, Duration::from_millis(50)).await;
    match result {
        Err(error) => assert!(error.is_timeout(), "unexpected error: {error}"),
        Ok(payload) => panic!("unexpected payload: {payload:?}"),
    }
    assert!(!client.is_connected());
}
