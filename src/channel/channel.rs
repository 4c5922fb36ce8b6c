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

//! Core channel implementation.

use super::config::ChannelConfig;
use super::error::ChannelError;
use crate::framing::{self, FrameError};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::time::{self, Instant};
use tracing::debug;

/// Which side of the connection a [`Channel`] plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRole {
    /// Dials out to a listening peer.
    Initiator,
    /// Listens and takes the next peer that connects.
    Acceptor,
}

enum Role {
    Initiator { host: String, port: u16 },
    Acceptor { port: u16, local_only: bool },
}

/// A reliable, message-oriented channel over a single TCP connection.
///
/// Messages are framed with a length prefix (see [`crate::framing`]) and
/// exchanged with [`read_message`](Channel::read_message) and
/// [`write_message`](Channel::write_message). Both take a retry budget of
/// `retries` attempts with a per-attempt `timeout`; a timeout of
/// [`Duration::ZERO`] blocks without a deadline.
///
/// After a network failure mid-read or mid-write, the channel drops the dead
/// connection and re-establishes it in place (dialing again, or accepting
/// the next peer) before counting the attempt against the budget. Partially
/// received frames are held across timeouts, so an interrupted read never
/// desynchronizes the stream.
///
/// # Examples
///
/// ```rust,no_run
/// use std::time::Duration;
/// use tracelink::channel::{Channel, ChannelConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut channel = Channel::initiator("127.0.0.1", 6120, ChannelConfig::default());
/// channel.connect().await?;
/// channel
///     .write_message(b"hello", 2, Duration::from_millis(500))
///     .await?;
/// let reply = channel.read_message(5, Duration::from_millis(100)).await?;
/// println!("peer said: {reply:?}");
/// # Ok(())
/// # }
/// ```
pub struct Channel {
    role: Role,
    config: ChannelConfig,
    listener: Option<TcpListener>,
    stream: Option<TcpStream>,
    inbox: Vec<u8>,
}

impl Channel {
    /// Creates a channel that dials `host:port` when connected.
    pub fn initiator(host: impl Into<String>, port: u16, config: ChannelConfig) -> Self {
        Self {
            role: Role::Initiator {
                host: host.into(),
                port,
            },
            config,
            listener: None,
            stream: None,
            inbox: Vec::new(),
        }
    }

    /// Creates a channel that listens on `port` and accepts one peer.
    ///
    /// With `local_only` the listener binds the loopback interface;
    /// otherwise it binds all interfaces. Port 0 asks the OS for a free
    /// port, available through [`local_port`](Channel::local_port) after
    /// [`bind`](Channel::bind).
    pub fn acceptor(port: u16, local_only: bool, config: ChannelConfig) -> Self {
        Self {
            role: Role::Acceptor { port, local_only },
            config,
            listener: None,
            stream: None,
            inbox: Vec::new(),
        }
    }

    /// Returns the role this channel plays.
    pub fn role(&self) -> ChannelRole {
        match self.role {
            Role::Initiator { .. } => ChannelRole::Initiator,
            Role::Acceptor { .. } => ChannelRole::Acceptor,
        }
    }

    /// Returns the port this channel was configured with.
    pub fn port(&self) -> u16 {
        match self.role {
            Role::Initiator { port, .. } | Role::Acceptor { port, .. } => port,
        }
    }

    /// Returns `true` if a connection is currently established.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Returns the local port actually in use, if any.
    ///
    /// For an acceptor this is the listening port, which differs from the
    /// configured port when binding port 0.
    pub fn local_port(&self) -> Option<u16> {
        if let Some(listener) = &self.listener {
            return listener.local_addr().ok().map(|addr| addr.port());
        }
        self.stream
            .as_ref()
            .and_then(|stream| stream.local_addr().ok())
            .map(|addr| addr.port())
    }

    /// Creates the acceptor's listening socket without waiting for a peer.
    ///
    /// [`connect`](Channel::connect) does this implicitly; calling it
    /// directly is useful when binding port 0 and the assigned port is
    /// needed before the peer dials in. Has no effect on initiators, and
    /// none on an acceptor that is already listening.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::BindFailed`] if the socket cannot be bound.
    pub fn bind(&mut self) -> Result<(), ChannelError> {
        let (port, local_only) = match self.role {
            Role::Acceptor { port, local_only } => (port, local_only),
            Role::Initiator { .. } => return Ok(()),
        };
        if self.listener.is_some() {
            return Ok(());
        }
        let ip = if local_only {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        } else {
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        };
        let addr = SocketAddr::new(ip, port);
        let bind_error = |source| ChannelError::BindFailed { port, source };
        let socket = TcpSocket::new_v4().map_err(bind_error)?;
        socket.set_reuseaddr(true).map_err(bind_error)?;
        socket.bind(addr).map_err(bind_error)?;
        let listener = socket.listen(self.config.backlog).map_err(bind_error)?;
        debug!(port = listener.local_addr().map(|a| a.port()).unwrap_or(port), "listening");
        self.listener = Some(listener);
        Ok(())
    }

    /// Establishes the connection.
    ///
    /// An initiator dials the configured address, retrying refused and
    /// timed-out attempts up to `connect_retries` times with
    /// `connect_retry_wait` between them. An acceptor binds its listener (if
    /// not already bound) and blocks until a peer connects. Idempotent when
    /// already connected.
    ///
    /// # Errors
    ///
    /// An initiator that exhausts its budget returns the last dial error,
    /// which classifies as timeout-class when the peer merely was not
    /// listening yet. Bind and accept failures are network-class.
    pub async fn connect(&mut self) -> Result<(), ChannelError> {
        if self.stream.is_some() {
            return Ok(());
        }
        match self.role {
            Role::Initiator { .. } => {
                let retries = self.config.connect_retries.max(1);
                let mut last = None;
                for attempt in 0..retries {
                    match self.dial().await {
                        Ok(()) => return Ok(()),
                        Err(error) if error.is_timeout() => {
                            if attempt + 1 < retries {
                                time::sleep(self.config.connect_retry_wait).await;
                            }
                            last = Some(error);
                        }
                        Err(error) => return Err(error),
                    }
                }
                Err(last.unwrap_or(ChannelError::NotConnected))
            }
            Role::Acceptor { .. } => {
                self.bind()?;
                self.accept_peer().await
            }
        }
    }

    /// Tears down the connection, if any.
    ///
    /// An acceptor keeps its listener, so a later
    /// [`connect`](Channel::connect) takes the next peer without rebinding.
    /// Idempotent.
    pub async fn disconnect(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
            debug!(port = self.port(), "disconnected");
        }
        self.inbox.clear();
    }

    /// Reads the next message.
    ///
    /// Makes up to `retries` attempts (at least one), each bounded by
    /// `timeout`; a `timeout` of [`Duration::ZERO`] blocks without a
    /// deadline. On a network failure the dead connection is dropped and
    /// re-established in place, and the attempt counts as a timeout.
    ///
    /// # Errors
    ///
    /// - [`ChannelError::Timeout`] when the budget is exhausted with the
    ///   connection still healthy; the call may simply be retried.
    /// - [`ChannelError::MessageTooLarge`] when the peer advertises a
    ///   payload over `max_message_size`; the connection is closed.
    /// - Any connection re-establishment failure, surfaced as-is.
    pub async fn read_message(
        &mut self,
        retries: u32,
        timeout: Duration,
    ) -> Result<Vec<u8>, ChannelError> {
        let mut last = ChannelError::Timeout { duration: timeout };
        for _ in 0..retries.max(1) {
            match self.read_once(timeout).await {
                Ok(payload) => return Ok(payload),
                Err(error) if error.is_timeout() => last = error,
                Err(error @ ChannelError::MessageTooLarge { .. }) => {
                    self.disconnect().await;
                    return Err(error);
                }
                Err(error) => {
                    debug!(error = %error, "read failed, reconnecting");
                    self.disconnect().await;
                    self.connect().await?;
                    last = ChannelError::Timeout { duration: timeout };
                }
            }
        }
        Err(last)
    }

    /// Writes one message.
    ///
    /// Same budget and reconnection policy as
    /// [`read_message`](Channel::read_message).
    ///
    /// # Errors
    ///
    /// - [`ChannelError::MessageTooLarge`] if the payload exceeds
    ///   `max_message_size`; nothing is written.
    /// - [`ChannelError::Timeout`] when the budget is exhausted.
    /// - Any connection re-establishment failure, surfaced as-is.
    pub async fn write_message(
        &mut self,
        payload: &[u8],
        retries: u32,
        timeout: Duration,
    ) -> Result<(), ChannelError> {
        if payload.len() as u64 > self.config.max_message_size {
            return Err(ChannelError::MessageTooLarge {
                size: payload.len() as u64,
                limit: self.config.max_message_size,
            });
        }
        let frame = framing::encode_frame(payload);
        let mut last = ChannelError::Timeout { duration: timeout };
        for _ in 0..retries.max(1) {
            match self.write_once(&frame, timeout).await {
                Ok(()) => return Ok(()),
                Err(error) if error.is_timeout() => last = error,
                Err(error) => {
                    debug!(error = %error, "write failed, reconnecting");
                    self.disconnect().await;
                    self.connect().await?;
                    last = ChannelError::Timeout { duration: timeout };
                }
            }
        }
        Err(last)
    }

    async fn dial(&mut self) -> Result<(), ChannelError> {
        let (host, port) = match &self.role {
            Role::Initiator { host, port } => (host.clone(), *port),
            Role::Acceptor { .. } => return Err(ChannelError::NotConnected),
        };
        let stream = TcpStream::connect((host.as_str(), port))
            .await
            .map_err(|source| ChannelError::ConnectFailed {
                address: format!("{host}:{port}"),
                source,
            })?;
        stream
            .set_nodelay(true)
            .map_err(|source| ChannelError::Network { source })?;
        debug!(%host, port, "connected");
        self.stream = Some(stream);
        self.inbox.clear();
        Ok(())
    }

    async fn accept_peer(&mut self) -> Result<(), ChannelError> {
        let port = self.port();
        let listener = self.listener.as_ref().ok_or(ChannelError::NotConnected)?;
        let (stream, peer) = listener
            .accept()
            .await
            .map_err(|source| ChannelError::AcceptFailed { port, source })?;
        stream
            .set_nodelay(true)
            .map_err(|source| ChannelError::Network { source })?;
        debug!(%peer, port, "accepted connection");
        self.stream = Some(stream);
        self.inbox.clear();
        Ok(())
    }

    /// Reads until a complete frame is buffered or the deadline expires.
    async fn read_once(&mut self, timeout: Duration) -> Result<Vec<u8>, ChannelError> {
        self.connect().await?;
        let deadline = (!timeout.is_zero()).then(|| Instant::now() + timeout);
        loop {
            if let Some(payload) = self.take_frame()? {
                return Ok(payload);
            }
            let stream = self.stream.as_mut().ok_or(ChannelError::NotConnected)?;
            let read = stream.read_buf(&mut self.inbox);
            let n = match deadline {
                Some(deadline) => match time::timeout_at(deadline, read).await {
                    Ok(result) => result.map_err(|source| ChannelError::Network { source })?,
                    Err(_) => return Err(ChannelError::Timeout { duration: timeout }),
                },
                None => read.await.map_err(|source| ChannelError::Network { source })?,
            };
            if n == 0 {
                return Err(ChannelError::ConnectionLost);
            }
        }
    }

    async fn write_once(&mut self, frame: &[u8], timeout: Duration) -> Result<(), ChannelError> {
        self.connect().await?;
        let stream = self.stream.as_mut().ok_or(ChannelError::NotConnected)?;
        let write = stream.write_all(frame);
        if timeout.is_zero() {
            write
                .await
                .map_err(|source| ChannelError::Network { source })?;
        } else {
            match time::timeout(timeout, write).await {
                Ok(result) => result.map_err(|source| ChannelError::Network { source })?,
                Err(_) => return Err(ChannelError::Timeout { duration: timeout }),
            }
        }
        Ok(())
    }

    fn take_frame(&mut self) -> Result<Option<Vec<u8>>, ChannelError> {
        match framing::decode_frame(&self.inbox, self.config.max_message_size) {
            Ok(Some((payload, consumed))) => {
                self.inbox.drain(..consumed);
                Ok(Some(payload))
            }
            Ok(None) => Ok(None),
            Err(FrameError::TooLarge { size, limit }) => {
                Err(ChannelError::MessageTooLarge { size, limit })
            }
        }
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("role", &self.role())
            .field("port", &self.port())
            .field("connected", &self.is_connected())
            .finish()
    }
}
