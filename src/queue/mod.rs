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

//! Bounded message queue.
//!
//! [`MessageQueue`] decouples producers of outbound messages from the task
//! that writes them to the wire. It holds at most a fixed number of payloads;
//! when the queue is full, producers wait for a bounded budget and then fail
//! rather than growing memory without limit.

mod bounded;
mod error;

pub use self::bounded::MessageQueue;
pub use self::error::QueueError;
