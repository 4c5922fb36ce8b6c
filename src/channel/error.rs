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

//! Error types for channel operations.

use crate::error::ErrorKind;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during channel operations.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Failed to establish an outbound connection.
    #[error("failed to connect to {address}: {source}")]
    ConnectFailed {
        /// The address that could not be reached.
        address: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to bind the listening socket.
    #[error("failed to bind port {port}: {source}")]
    BindFailed {
        /// The port that could not be bound.
        port: u16,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to accept an inbound connection.
    #[error("failed to accept on port {port}: {source}")]
    AcceptFailed {
        /// The listening port.
        port: u16,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// An established connection failed mid-operation.
    #[error("network error: {source}")]
    Network {
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The peer closed the connection.
    #[error("connection closed by peer")]
    ConnectionLost,

    /// An operation did not complete within its deadline.
    ///
    /// The connection is still usable; the caller may retry.
    #[error("operation timed out after {duration:?}")]
    Timeout {
        /// The deadline that expired.
        duration: Duration,
    },

    /// A payload exceeded the configured size limit.
    #[error("message of {size} bytes exceeds limit of {limit} bytes")]
    MessageTooLarge {
        /// Payload size, as advertised on the wire or measured locally.
        size: u64,
        /// Configured maximum payload size.
        limit: u64,
    },

    /// The channel has no established connection.
    #[error("channel is not connected")]
    NotConnected,
}

impl ChannelError {
    /// Returns the coarse classification of this error.
    pub fn kind(&self) -> ErrorKind {
        if self.is_timeout() {
            return ErrorKind::Timeout;
        }
        match self {
            ChannelError::MessageTooLarge { .. } => ErrorKind::Memory,
            _ => ErrorKind::Network,
        }
    }

    /// Returns `true` if the failure is transient and the same call can be
    /// retried on the existing connection.
    ///
    /// A refused or timed-out dial counts as transient: the peer may simply
    /// not be listening yet.
    pub fn is_timeout(&self) -> bool {
        match self {
            ChannelError::Timeout { .. } => true,
            ChannelError::ConnectFailed { source, .. } => matches!(
                source.kind(),
                io::ErrorKind::ConnectionRefused
                    | io::ErrorKind::TimedOut
                    | io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }

    /// Returns the raw OS error code behind this failure, if any.
    pub fn os_error(&self) -> Option<i32> {
        match self {
            ChannelError::ConnectFailed { source, .. }
            | ChannelError::BindFailed { source, .. }
            | ChannelError::AcceptFailed { source, .. }
            | ChannelError::Network { source } => source.raw_os_error(),
            _ => None,
        }
    }
}
