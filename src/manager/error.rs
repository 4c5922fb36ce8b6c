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

//! Error types for channel manager operations.

use crate::channel::ChannelError;
use crate::error::ErrorKind;
use crate::manager::Service;
use thiserror::Error;

/// Errors that can occur during channel manager operations.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// No session is active.
    #[error("no active session")]
    NotConnected,

    /// The operation is not permitted for this role or session
    /// configuration.
    #[error("operation not allowed: {reason}")]
    NotAllowed {
        /// Why the operation was rejected.
        reason: String,
    },

    /// A service's loop failed to establish its connection at startup.
    /// Every other loop of the session has been torn down.
    #[error("{service} service failed to start: {source}")]
    Startup {
        /// The service that failed.
        service: Service,
        /// The connection failure.
        #[source]
        source: ChannelError,
    },

    /// The outbound queue stayed full for the whole retry budget.
    #[error("outbound queue full ({capacity} messages)")]
    QueueFull {
        /// Configured queue capacity.
        capacity: usize,
    },

    /// A request/response exchange failed on the wire.
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// The session was torn down while the operation was in flight.
    #[error("session terminated")]
    Terminated,
}

impl ManagerError {
    /// Returns the coarse classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ManagerError::NotConnected => ErrorKind::Network,
            ManagerError::NotAllowed { .. } => ErrorKind::NotAllowed,
            ManagerError::Startup { source, .. } => source.kind(),
            ManagerError::QueueFull { .. } => ErrorKind::Network,
            ManagerError::Channel(source) => source.kind(),
            ManagerError::Terminated => ErrorKind::System,
        }
    }
}
