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

//! Error types for the bounded message queue.

use crate::error::ErrorKind;
use thiserror::Error;

/// Errors produced by [`MessageQueue`](crate::queue::MessageQueue)
/// operations.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The queue stayed full for the entire retry budget.
    #[error("queue full ({capacity} messages)")]
    Full {
        /// Configured queue capacity.
        capacity: usize,
    },

    /// The queue stayed empty for the entire retry budget.
    #[error("queue empty")]
    Empty,
}

impl QueueError {
    /// Returns the coarse classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueueError::Full { .. } => ErrorKind::Network,
            QueueError::Empty => ErrorKind::Timeout,
        }
    }
}
