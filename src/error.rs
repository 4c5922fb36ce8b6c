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

//! Crate-wide error classification.
//!
//! Every layer defines its own `thiserror` enum ([`ChannelError`],
//! [`QueueError`], [`ManagerError`]), and each of those maps onto the small
//! [`ErrorKind`] taxonomy defined here. Callers that do not care about the
//! precise failure can branch on the kind alone:
//!
//! ```rust
//! use tracelink::ErrorKind;
//!
//! fn should_retry(kind: ErrorKind) -> bool {
//!     kind == ErrorKind::Timeout
//! }
//!
//! assert!(should_retry(ErrorKind::Timeout));
//! assert!(!should_retry(ErrorKind::Network));
//! ```
//!
//! [`ChannelError`]: crate::channel::ChannelError
//! [`QueueError`]: crate::queue::QueueError
//! [`ManagerError`]: crate::manager::ManagerError

/// Coarse classification of transport failures.
///
/// The variants partition every error the crate produces:
///
/// - `Timeout` is the only retryable kind. A deadline expired but the
///   connection is intact, so the same call may simply be issued again.
/// - `Network` covers socket-level failures: refused or dropped connections,
///   resets, and write failures. The channel reconnects internally where it
///   can; a surfaced `Network` error means that also failed.
/// - `Memory` marks payloads that exceed the configured message size limit,
///   in either direction.
/// - `NotAllowed` marks operations rejected by role or configuration, such
///   as issuing a request from the serving side.
/// - `System` is the residual kind for everything else (task spawn or join
///   failures, poisoned internal state).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Socket-level failure; the connection is gone or never came up.
    Network,
    /// A deadline expired; the operation is safe to retry.
    Timeout,
    /// A payload exceeded the configured message size limit.
    Memory,
    /// Internal failure outside the network and memory categories.
    System,
    /// The operation is not permitted for this role or configuration.
    NotAllowed,
}

impl ErrorKind {
    /// Returns `true` if the failure is transient and the same call can be
    /// retried without reconnecting.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Timeout)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Network => "network",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Memory => "memory",
            ErrorKind::System => "system",
            ErrorKind::NotAllowed => "not allowed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_timeout_is_retryable() {
        assert!(ErrorKind::Timeout.is_retryable());
        assert!(!ErrorKind::Network.is_retryable());
        assert!(!ErrorKind::Memory.is_retryable());
        assert!(!ErrorKind::System.is_retryable());
        assert!(!ErrorKind::NotAllowed.is_retryable());
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorKind::Network.to_string(), "network");
        assert_eq!(ErrorKind::NotAllowed.to_string(), "not allowed");
    }
}
