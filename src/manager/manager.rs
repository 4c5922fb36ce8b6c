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

//! Core channel manager implementation.

use super::callbacks::{MessageSink, RequestHandler};
use super::config::ManagerConfig;
use super::error::ManagerError;
use super::service::{service_port, Service, ServiceMask, Side};
use crate::channel::{Channel, ChannelError};
use crate::queue::MessageQueue;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Sentinel recorded when a loop fails without an OS error code.
const ERROR_WITHOUT_CODE: i32 = -1;

/// Runs a multiplexed session of up to three services over a base port.
///
/// A manager is idle until [`connect`](ChannelManager::connect) (client
/// side) or [`accept`](ChannelManager::accept) (server side) establishes a
/// session; [`disconnect`](ChannelManager::disconnect) returns it to idle,
/// after which it can be reused. Establishment is symmetric and blocking on
/// both sides, so the two calls must run concurrently.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use tracelink::manager::{ChannelManager, ManagerConfig, ServiceMask};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut client = ChannelManager::new(ManagerConfig::default());
/// client
///     .connect(
///         "127.0.0.1",
///         6120,
///         ServiceMask::REQUEST_RESPONSE | ServiceMask::SEND_ASYNC,
///         None,
///     )
///     .await?;
///
/// let response = client.send_request(b"status".to_vec()).await?;
/// println!("server answered {} bytes", response.len());
///
/// client.send_data(b"trace packet".to_vec()).await?;
/// client.disconnect().await;
/// # Ok(())
/// # }
/// ```
pub struct ChannelManager {
    config: ManagerConfig,
    session: Option<Session>,
    last_error: Arc<AtomicI32>,
}

struct Session {
    side: Side,
    base_port: u16,
    mask: ServiceMask,
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
    send_queue: Option<Arc<MessageQueue>>,
    request_tx: Option<mpsc::Sender<PendingRequest>>,
}

enum SessionRole {
    Client { host: String },
    Server { local_only: bool },
}

impl SessionRole {
    fn side(&self) -> Side {
        match self {
            SessionRole::Client { .. } => Side::Client,
            SessionRole::Server { .. } => Side::Server,
        }
    }
}

/// A request in flight from a caller to the request/response loop.
struct PendingRequest {
    payload: Vec<u8>,
    respond_to: oneshot::Sender<Result<Vec<u8>, ChannelError>>,
}

impl ChannelManager {
    /// Creates an idle manager.
    pub fn new(config: ManagerConfig) -> Self {
        Self {
            config,
            session: None,
            last_error: Arc::new(AtomicI32::new(0)),
        }
    }

    /// Returns `true` if a session is active.
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Returns the services of the active session, or the empty mask when
    /// idle.
    pub fn services(&self) -> ServiceMask {
        self.session
            .as_ref()
            .map(|session| session.mask)
            .unwrap_or(ServiceMask::EMPTY)
    }

    /// Returns `true` if any loop recorded a fatal error since the session
    /// was established.
    pub fn has_error(&self) -> bool {
        self.last_error.load(Ordering::Relaxed) != 0
    }

    /// Returns the OS error code of the most recent fatal loop error, or
    /// `-1` when the failure carried no code. `None` means no error.
    pub fn last_error(&self) -> Option<i32> {
        match self.last_error.load(Ordering::Relaxed) {
            0 => None,
            code => Some(code),
        }
    }

    /// Establishes the client side of a session against a server listening
    /// on `base_port` at `host`.
    ///
    /// Spawns one loop task per service in `mask` and waits for every loop
    /// to report its connection established. `on_receive` is required when
    /// `mask` includes [`ServiceMask::RECEIVE_ASYNC`].
    ///
    /// # Errors
    ///
    /// - [`ManagerError::NotAllowed`] if a session is already active, the
    ///   mask is empty, or a required callback is missing.
    /// - [`ManagerError::Startup`] if any service's connection could not be
    ///   established; the whole session is rolled back.
    pub async fn connect(
        &mut self,
        host: &str,
        base_port: u16,
        mask: ServiceMask,
        on_receive: Option<Arc<dyn MessageSink>>,
    ) -> Result<(), ManagerError> {
        self.start(
            SessionRole::Client {
                host: host.to_string(),
            },
            base_port,
            mask,
            on_receive,
            None,
        )
        .await
    }

    /// Establishes the server side of a session, accepting one peer per
    /// service on the ports derived from `base_port`.
    ///
    /// With `local_only` the listeners bind the loopback interface only.
    /// `on_receive` is required when `mask` includes
    /// [`ServiceMask::RECEIVE_ASYNC`]; `on_request` is required when it
    /// includes [`ServiceMask::REQUEST_RESPONSE`].
    ///
    /// # Errors
    ///
    /// Same conditions as [`connect`](ChannelManager::connect), plus bind
    /// failures when a derived port is already in use.
    pub async fn accept(
        &mut self,
        base_port: u16,
        mask: ServiceMask,
        local_only: bool,
        on_receive: Option<Arc<dyn MessageSink>>,
        on_request: Option<Arc<dyn RequestHandler>>,
    ) -> Result<(), ManagerError> {
        self.start(
            SessionRole::Server { local_only },
            base_port,
            mask,
            on_receive,
            on_request,
        )
        .await
    }

    /// Queues a fire-and-forget message for the peer.
    ///
    /// The payload travels on the `SendAsync` data plane; the call returns
    /// once the payload is queued, not once it is delivered. When the queue
    /// is full the call waits for the configured enqueue budget before
    /// failing.
    ///
    /// # Errors
    ///
    /// - [`ManagerError::NotConnected`] when no session is active.
    /// - [`ManagerError::NotAllowed`] when the session was opened without
    ///   [`ServiceMask::SEND_ASYNC`].
    /// - [`ManagerError::QueueFull`] when the queue stayed full for the
    ///   whole budget.
    pub async fn send_data(&self, payload: Vec<u8>) -> Result<(), ManagerError> {
        let session = self.session.as_ref().ok_or(ManagerError::NotConnected)?;
        let queue = session
            .send_queue
            .as_ref()
            .ok_or_else(|| ManagerError::NotAllowed {
                reason: "session was not opened with the send-async service".to_string(),
            })?;
        queue
            .enqueue(
                payload,
                self.config.enqueue_retry_wait,
                self.config.enqueue_retries,
            )
            .await
            .map_err(|_| ManagerError::QueueFull {
                capacity: queue.capacity(),
            })
    }

    /// Sends a request and waits for the server's response.
    ///
    /// Only the client side may initiate requests. Requests from multiple
    /// tasks are serialized by the request/response loop, which pairs each
    /// response with the caller that sent the request, so no external
    /// locking is needed.
    ///
    /// # Errors
    ///
    /// - [`ManagerError::NotConnected`] when no session is active.
    /// - [`ManagerError::NotAllowed`] on the server side, or when the
    ///   session was opened without [`ServiceMask::REQUEST_RESPONSE`].
    /// - [`ManagerError::Terminated`] when the session is torn down before
    ///   the response arrives.
    /// - [`ManagerError::Channel`] when the exchange fails on the wire.
    pub async fn send_request(&self, payload: Vec<u8>) -> Result<Vec<u8>, ManagerError> {
        let session = self.session.as_ref().ok_or(ManagerError::NotConnected)?;
        if session.side == Side::Server {
            return Err(ManagerError::NotAllowed {
                reason: "requests are initiated by the client side".to_string(),
            });
        }
        let request_tx = session
            .request_tx
            .as_ref()
            .ok_or_else(|| ManagerError::NotAllowed {
                reason: "session was not opened with the request/response service".to_string(),
            })?;
        let (respond_to, response_rx) = oneshot::channel();
        request_tx
            .send(PendingRequest {
                payload,
                respond_to,
            })
            .await
            .map_err(|_| ManagerError::Terminated)?;
        match response_rx.await {
            Ok(result) => result.map_err(ManagerError::from),
            Err(_) => Err(ManagerError::Terminated),
        }
    }

    /// Sends a request and delivers the response to `sink` instead of
    /// returning it.
    ///
    /// # Errors
    ///
    /// Same conditions as [`send_request`](ChannelManager::send_request).
    pub async fn send_request_with(
        &self,
        payload: Vec<u8>,
        sink: &dyn MessageSink,
    ) -> Result<(), ManagerError> {
        let response = self.send_request(payload).await?;
        sink.deliver(&response);
        Ok(())
    }

    /// Tears the session down and returns the manager to idle.
    ///
    /// Signals every loop to stop, waits for them to finish, and discards
    /// any undelivered queued messages. Loops observe the signal between
    /// bounded operations, so teardown completes promptly. Idempotent; a
    /// call on an idle manager does nothing.
    pub async fn disconnect(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let Session {
            base_port,
            shutdown,
            tasks,
            send_queue,
            request_tx,
            ..
        } = session;
        let _ = shutdown.send(true);
        // Closing the request channel unblocks the request/response loop
        // and fails callers still waiting for a response.
        drop(request_tx);
        for task in tasks {
            let _ = task.await;
        }
        if let Some(queue) = send_queue {
            queue.purge();
        }
        debug!(base_port, "session closed");
    }

    async fn start(
        &mut self,
        role: SessionRole,
        base_port: u16,
        mask: ServiceMask,
        on_receive: Option<Arc<dyn MessageSink>>,
        on_request: Option<Arc<dyn RequestHandler>>,
    ) -> Result<(), ManagerError> {
        if self.session.is_some() {
            return Err(ManagerError::NotAllowed {
                reason: "a session is already active".to_string(),
            });
        }
        if mask.is_empty() {
            return Err(ManagerError::NotAllowed {
                reason: "service mask is empty".to_string(),
            });
        }
        if mask.contains(ServiceMask::RECEIVE_ASYNC) && on_receive.is_none() {
            return Err(ManagerError::NotAllowed {
                reason: "the receive-async service requires a message sink".to_string(),
            });
        }
        let handler = if role.side() == Side::Server && mask.contains(ServiceMask::REQUEST_RESPONSE)
        {
            Some(on_request.ok_or_else(|| ManagerError::NotAllowed {
                reason: "the request/response service requires a request handler on the serving side"
                    .to_string(),
            })?)
        } else {
            None
        };

        self.last_error.store(0, Ordering::Relaxed);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut tasks = Vec::new();
        let mut pending_ready = Vec::new();
        let mut send_queue = None;
        let mut request_tx = None;

        if mask.contains(ServiceMask::REQUEST_RESPONSE) {
            let channel = self.build_channel(&role, base_port, Service::RequestResponse);
            let (ready_tx, ready_rx) = oneshot::channel();
            let shared = self.loop_shared(&shutdown_rx);
            let task = match &handler {
                Some(handler) => tokio::spawn(run_request_server_loop(
                    channel,
                    Arc::clone(handler),
                    shared,
                    ready_tx,
                )),
                None => {
                    let (tx, rx) = mpsc::channel(self.config.queue_capacity.max(1));
                    request_tx = Some(tx);
                    tokio::spawn(run_request_client_loop(channel, rx, shared, ready_tx))
                }
            };
            tasks.push(task);
            pending_ready.push((Service::RequestResponse, ready_rx));
        }

        if mask.contains(ServiceMask::SEND_ASYNC) {
            let queue = Arc::new(MessageQueue::new(self.config.queue_capacity));
            let channel = self.build_channel(&role, base_port, Service::SendAsync);
            let (ready_tx, ready_rx) = oneshot::channel();
            let shared = self.loop_shared(&shutdown_rx);
            tasks.push(tokio::spawn(run_send_loop(
                channel,
                Arc::clone(&queue),
                shared,
                ready_tx,
            )));
            pending_ready.push((Service::SendAsync, ready_rx));
            send_queue = Some(queue);
        }

        if mask.contains(ServiceMask::RECEIVE_ASYNC) {
            let Some(sink) = on_receive else {
                return Err(ManagerError::NotAllowed {
                    reason: "the receive-async service requires a message sink".to_string(),
                });
            };
            let channel = self.build_channel(&role, base_port, Service::ReceiveAsync);
            let (ready_tx, ready_rx) = oneshot::channel();
            let shared = self.loop_shared(&shutdown_rx);
            tasks.push(tokio::spawn(run_receive_loop(
                channel, sink, shared, ready_tx,
            )));
            pending_ready.push((Service::ReceiveAsync, ready_rx));
        }

        self.session = Some(Session {
            side: role.side(),
            base_port,
            mask,
            shutdown: shutdown_tx,
            tasks,
            send_queue,
            request_tx,
        });

        for (service, ready_rx) in pending_ready {
            let result = match ready_rx.await {
                Ok(result) => result,
                Err(_) => Err(ChannelError::NotConnected),
            };
            if let Err(source) = result {
                warn!(%service, error = %source, "service failed to start, rolling back");
                self.disconnect().await;
                return Err(ManagerError::Startup { service, source });
            }
        }
        info!(base_port, mask = ?mask, "session established");
        Ok(())
    }

    fn build_channel(&self, role: &SessionRole, base_port: u16, service: Service) -> Channel {
        let port = service_port(base_port, service, role.side());
        match role {
            SessionRole::Client { host } => {
                Channel::initiator(host.clone(), port, self.config.channel.clone())
            }
            SessionRole::Server { local_only } => {
                Channel::acceptor(port, *local_only, self.config.channel.clone())
            }
        }
    }

    fn loop_shared(&self, shutdown: &watch::Receiver<bool>) -> LoopShared {
        LoopShared {
            config: self.config.clone(),
            shutdown: shutdown.clone(),
            last_error: Arc::clone(&self.last_error),
        }
    }
}

impl std::fmt::Debug for ChannelManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelManager")
            .field("active", &self.is_active())
            .field("services", &self.services())
            .finish()
    }
}

/// State every loop task carries.
struct LoopShared {
    config: ManagerConfig,
    shutdown: watch::Receiver<bool>,
    last_error: Arc<AtomicI32>,
}

impl LoopShared {
    fn record(&self, error: &ChannelError) {
        self.last_error.store(
            error.os_error().unwrap_or(ERROR_WITHOUT_CODE),
            Ordering::Relaxed,
        );
    }

    fn stopped(&self, changed: Result<(), watch::error::RecvError>) -> bool {
        changed.is_err() || *self.shutdown.borrow()
    }
}

/// Connects the loop's channel and reports readiness to the caller.
///
/// Establishment is raced against the shutdown flag so that a session
/// rolling back one failed service never waits on a sibling loop still
/// blocked in connect or accept. Returns `false` when the loop should exit
/// without entering its body.
async fn report_ready(
    channel: &mut Channel,
    shared: &mut LoopShared,
    ready: oneshot::Sender<Result<(), ChannelError>>,
) -> bool {
    tokio::select! {
        _ = shared.shutdown.changed() => false,
        result = channel.connect() => match result {
            Ok(()) => ready.send(Ok(())).is_ok(),
            Err(error) => {
                shared.record(&error);
                let _ = ready.send(Err(error));
                false
            }
        },
    }
}

/// Delivers inbound data-plane messages to the sink until shutdown.
async fn run_receive_loop(
    mut channel: Channel,
    sink: Arc<dyn MessageSink>,
    mut shared: LoopShared,
    ready: oneshot::Sender<Result<(), ChannelError>>,
) {
    if !report_ready(&mut channel, &mut shared, ready).await {
        return;
    }
    loop {
        tokio::select! {
            changed = shared.shutdown.changed() => {
                if shared.stopped(changed) {
                    break;
                }
            }
            result = channel.read_message(shared.config.read_retries, shared.config.read_timeout) => {
                match result {
                    Ok(payload) => sink.deliver(&payload),
                    Err(error) if error.is_timeout() => {}
                    Err(error) => {
                        shared.record(&error);
                        warn!(error = %error, "receive loop error");
                        // Next iteration re-establishes the connection.
                        channel.disconnect().await;
                    }
                }
            }
        }
    }
    channel.disconnect().await;
}

/// Drains the outbound queue onto the wire until shutdown.
async fn run_send_loop(
    mut channel: Channel,
    queue: Arc<MessageQueue>,
    mut shared: LoopShared,
    ready: oneshot::Sender<Result<(), ChannelError>>,
) {
    if !report_ready(&mut channel, &mut shared, ready).await {
        return;
    }
    loop {
        tokio::select! {
            changed = shared.shutdown.changed() => {
                if shared.stopped(changed) {
                    break;
                }
            }
            result = queue.dequeue(shared.config.dequeue_retry_wait, shared.config.dequeue_retries) => {
                let Ok(payload) = result else {
                    continue;
                };
                tokio::select! {
                    changed = shared.shutdown.changed() => {
                        if shared.stopped(changed) {
                            break;
                        }
                    }
                    written = channel.write_message(
                        &payload,
                        shared.config.write_retries,
                        shared.config.write_timeout,
                    ) => {
                        if let Err(error) = written {
                            shared.record(&error);
                            warn!(error = %error, bytes = payload.len(), "dropping undeliverable message");
                            channel.disconnect().await;
                        }
                    }
                }
            }
        }
    }
    channel.disconnect().await;
}

/// Serves the peer's requests until shutdown.
async fn run_request_server_loop(
    mut channel: Channel,
    handler: Arc<dyn RequestHandler>,
    mut shared: LoopShared,
    ready: oneshot::Sender<Result<(), ChannelError>>,
) {
    if !report_ready(&mut channel, &mut shared, ready).await {
        return;
    }
    loop {
        tokio::select! {
            changed = shared.shutdown.changed() => {
                if shared.stopped(changed) {
                    break;
                }
            }
            result = serve_request(&mut channel, handler.as_ref(), &shared.config) => {
                match result {
                    Ok(()) => {}
                    Err(error) if error.is_timeout() => {}
                    Err(error) => {
                        shared.record(&error);
                        warn!(error = %error, "request loop error");
                        channel.disconnect().await;
                    }
                }
            }
        }
    }
    channel.disconnect().await;
}

/// Reads one request, runs the handler, and writes the response back.
async fn serve_request(
    channel: &mut Channel,
    handler: &dyn RequestHandler,
    config: &ManagerConfig,
) -> Result<(), ChannelError> {
    let request = channel
        .read_message(config.read_retries, config.read_timeout)
        .await?;
    let response = handler.handle(&request).await;
    channel
        .write_message(&response, config.request_retries, Duration::ZERO)
        .await
}

/// Forwards callers' requests to the wire one at a time, pairing each
/// response with the caller that sent the request.
async fn run_request_client_loop(
    mut channel: Channel,
    mut requests: mpsc::Receiver<PendingRequest>,
    mut shared: LoopShared,
    ready: oneshot::Sender<Result<(), ChannelError>>,
) {
    if !report_ready(&mut channel, &mut shared, ready).await {
        return;
    }
    loop {
        tokio::select! {
            changed = shared.shutdown.changed() => {
                if shared.stopped(changed) {
                    break;
                }
            }
            request = requests.recv() => {
                let Some(PendingRequest { payload, respond_to }) = request else {
                    break;
                };
                tokio::select! {
                    changed = shared.shutdown.changed() => {
                        // Dropping the responder fails the caller with
                        // `Terminated`.
                        drop(respond_to);
                        if shared.stopped(changed) {
                            break;
                        }
                    }
                    result = exchange(&mut channel, &payload, &shared.config) => {
                        if let Err(error) = &result {
                            shared.record(error);
                            warn!(error = %error, "request exchange failed");
                        }
                        let _ = respond_to.send(result);
                    }
                }
            }
        }
    }
    channel.disconnect().await;
}

/// One request/response round trip on the wire.
async fn exchange(
    channel: &mut Channel,
    payload: &[u8],
    config: &ManagerConfig,
) -> Result<Vec<u8>, ChannelError> {
    channel
        .write_message(payload, config.request_retries, Duration::ZERO)
        .await?;
    channel
        .read_message(config.request_retries, Duration::ZERO)
        .await
}
