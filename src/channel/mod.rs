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

//! Reliable framed point-to-point channel over TCP.
//!
//! A [`Channel`] owns one TCP connection and exchanges length-prefixed
//! messages over it (see [`crate::framing`]). Each side of a connection has
//! a fixed role: the *initiator* dials out, the *acceptor* listens and takes
//! the next peer that arrives. Reads and writes carry an explicit retry
//! budget, and the channel reconnects internally after network failures so
//! that a long-lived session survives a peer restart.

mod channel;
mod config;
mod error;

pub use self::channel::{Channel, ChannelRole};
pub use self::config::ChannelConfig;
pub use self::error::ChannelError;
