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

#![doc = include_str!("../README.md")]
#![allow(clippy::module_inception)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod channel;
pub mod control;
pub mod error;
pub mod framing;
pub mod manager;
pub mod ports;
pub mod queue;

pub use self::channel::{Channel, ChannelConfig, ChannelError, ChannelRole};
pub use self::control::{ControlMessage, DEFAULT_BASE_PORT};
pub use self::error::ErrorKind;
pub use self::manager::{
    ChannelManager, ManagerConfig, ManagerError, MessageSink, RequestHandler, Service, ServiceMask,
};
pub use self::ports::PortPool;
pub use self::queue::{MessageQueue, QueueError};
