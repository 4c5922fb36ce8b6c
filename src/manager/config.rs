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

//! Configuration for channel managers.

use crate::channel::ChannelConfig;
use std::time::Duration;

/// Configuration for a [`ChannelManager`](crate::manager::ChannelManager).
///
/// The retry budgets mirror the shape used throughout the crate: a number
/// of attempts with a per-attempt timeout. The defaults are tuned for a
/// debugger sitting next to the traced application, where latency is low
/// and brief stalls are common.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use tracelink::manager::ManagerConfig;
///
/// let config = ManagerConfig {
///     queue_capacity: 5000,
///     read_timeout: Duration::from_millis(250),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Capacity of the outbound message queue.
    ///
    /// Default: 1000
    pub queue_capacity: usize,

    /// Per-attempt wait when the outbound queue is full.
    ///
    /// Default: 500 milliseconds
    pub enqueue_retry_wait: Duration,

    /// Attempts before [`send_data`](crate::manager::ChannelManager::send_data)
    /// gives up on a full queue.
    ///
    /// Default: 2
    pub enqueue_retries: u32,

    /// Per-attempt wait when the outbound queue is empty.
    ///
    /// Default: 20 milliseconds
    pub dequeue_retry_wait: Duration,

    /// Attempts the send loop makes before re-checking for shutdown.
    ///
    /// Default: 5
    pub dequeue_retries: u32,

    /// Per-attempt read deadline in the receive loops.
    ///
    /// Default: 100 milliseconds
    pub read_timeout: Duration,

    /// Read attempts per loop iteration.
    ///
    /// Default: 5
    pub read_retries: u32,

    /// Per-attempt write deadline in the send loop.
    ///
    /// Default: 500 milliseconds
    pub write_timeout: Duration,

    /// Write attempts per outbound message.
    ///
    /// Default: 2
    pub write_retries: u32,

    /// Attempts for each half of a request/response exchange. The exchange
    /// itself has no deadline; a request blocks until the response arrives
    /// or the session is torn down.
    ///
    /// Default: 2
    pub request_retries: u32,

    /// Configuration applied to every channel the manager opens.
    pub channel: ChannelConfig,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1000,
            enqueue_retry_wait: Duration::from_millis(500),
            enqueue_retries: 2,
            dequeue_retry_wait: Duration::from_millis(20),
            dequeue_retries: 5,
            read_timeout: Duration::from_millis(100),
            read_retries: 5,
            write_timeout: Duration::from_millis(500),
            write_retries: 2,
            request_retries: 2,
            channel: ChannelConfig::default(),
        }
    }
}

impl ManagerConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }
}
