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

//! Multiplexed session management over a base port.
//!
//! A [`ChannelManager`] runs up to three logical services between one client
//! and one server, each on its own TCP connection derived from a shared base
//! port `P`:
//!
//! | Port  | Service                                  |
//! |-------|------------------------------------------|
//! | `P`   | request/response (client asks, server answers) |
//! | `P+1` | client→server fire-and-forget data       |
//! | `P+2` | server→client fire-and-forget data       |
//!
//! Each requested service gets a dedicated loop task; the caller selects
//! services with a [`ServiceMask`] and supplies typed callbacks
//! ([`MessageSink`], [`RequestHandler`]) for inbound traffic. Both sides of
//! a session must request complementary services on the same base port.

mod callbacks;
mod config;
mod error;
mod manager;
mod service;

pub use self::callbacks::{MessageSink, RequestHandler};
pub use self::config::ManagerConfig;
pub use self::error::ManagerError;
pub use self::manager::ChannelManager;
pub use self::service::{Service, ServiceMask};
