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

//! Configuration for channels.

use std::time::Duration;

/// Configuration for a [`Channel`](crate::channel::Channel).
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use tracelink::channel::ChannelConfig;
///
/// // Use default configuration
/// let config = ChannelConfig::default();
///
/// // Customize configuration
/// let config = ChannelConfig {
///     connect_retries: 10,
///     connect_retry_wait: Duration::from_millis(100),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Number of dial attempts an initiator makes before
    /// [`connect`](crate::channel::Channel::connect) gives up.
    ///
    /// Only refused and timed-out dials are retried; other failures
    /// surface immediately.
    ///
    /// Default: 100
    pub connect_retries: u32,

    /// Wait between dial attempts.
    ///
    /// Default: 500 milliseconds
    pub connect_retry_wait: Duration,

    /// Listen backlog for acceptor channels.
    ///
    /// Default: 4
    pub backlog: u32,

    /// Maximum payload size in bytes, in either direction.
    ///
    /// An inbound frame advertising a larger payload poisons the stream and
    /// closes the connection; an oversized outbound payload is rejected
    /// before anything is written.
    ///
    /// Default: 64 MiB
    pub max_message_size: u64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            connect_retries: 100,
            connect_retry_wait: Duration::from_millis(500),
            backlog: 4,
            max_message_size: 64 * 1024 * 1024,
        }
    }
}

impl ChannelConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of dial attempts.
    pub fn with_connect_retries(mut self, retries: u32) -> Self {
        self.connect_retries = retries;
        self
    }

    /// Sets the wait between dial attempts.
    pub fn with_connect_retry_wait(mut self, wait: Duration) -> Self {
        self.connect_retry_wait = wait;
        self
    }

    /// Sets the listen backlog.
    pub fn with_backlog(mut self, backlog: u32) -> Self {
        self.backlog = backlog;
        self
    }

    /// Sets the maximum payload size in bytes.
    pub fn with_max_message_size(mut self, size: u64) -> Self {
        self.max_message_size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ChannelConfig::default();
        assert_eq!(config.connect_retries, 100);
        assert_eq!(config.connect_retry_wait, Duration::from_millis(500));
        assert_eq!(config.backlog, 4);
        assert_eq!(config.max_message_size, 64 * 1024 * 1024);
    }

    #[test]
    fn test_builder_pattern() {
        let config = ChannelConfig::new()
            .with_connect_retries(3)
            .with_connect_retry_wait(Duration::from_millis(50))
            .with_backlog(16)
            .with_max_message_size(1024);
        assert_eq!(config.connect_retries, 3);
        assert_eq!(config.connect_retry_wait, Duration::from_millis(50));
        assert_eq!(config.backlog, 16);
        assert_eq!(config.max_message_size, 1024);
    }
}
