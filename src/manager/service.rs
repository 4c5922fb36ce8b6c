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

//! Logical services and the mask used to select them.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// One of the three logical services a session can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// Client sends a request and blocks for the server's response.
    RequestResponse,
    /// Inbound fire-and-forget data, delivered to a callback.
    ReceiveAsync,
    /// Outbound fire-and-forget data, drained from a queue.
    SendAsync,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Service::RequestResponse => "request/response",
            Service::ReceiveAsync => "receive-async",
            Service::SendAsync => "send-async",
        };
        f.write_str(name)
    }
}

/// Bitmask selecting which services a session runs.
///
/// Combine services with `|`:
///
/// ```rust
/// use tracelink::manager::ServiceMask;
///
/// let mask = ServiceMask::REQUEST_RESPONSE | ServiceMask::SEND_ASYNC;
/// assert!(mask.contains(ServiceMask::SEND_ASYNC));
/// assert!(!mask.contains(ServiceMask::RECEIVE_ASYNC));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ServiceMask(u8);

impl ServiceMask {
    /// No services. An empty mask is rejected when starting a session.
    pub const EMPTY: ServiceMask = ServiceMask(0);
    /// The request/response service on the base port.
    pub const REQUEST_RESPONSE: ServiceMask = ServiceMask(0b001);
    /// The inbound data service.
    pub const RECEIVE_ASYNC: ServiceMask = ServiceMask(0b010);
    /// The outbound data service.
    pub const SEND_ASYNC: ServiceMask = ServiceMask(0b100);
    /// All three services.
    pub const ALL: ServiceMask =
        ServiceMask(0b001 | 0b010 | 0b100);

    /// Returns `true` if every service in `other` is also in `self`.
    pub const fn contains(self, other: ServiceMask) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if no services are selected.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns the services selected by this mask.
    pub fn services(self) -> impl Iterator<Item = Service> {
        [
            (ServiceMask::REQUEST_RESPONSE, Service::RequestResponse),
            (ServiceMask::RECEIVE_ASYNC, Service::ReceiveAsync),
            (ServiceMask::SEND_ASYNC, Service::SendAsync),
        ]
        .into_iter()
        .filter(move |(bit, _)| self.contains(*bit))
        .map(|(_, service)| service)
    }
}

impl BitOr for ServiceMask {
    type Output = ServiceMask;

    fn bitor(self, rhs: ServiceMask) -> ServiceMask {
        ServiceMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for ServiceMask {
    fn bitor_assign(&mut self, rhs: ServiceMask) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for ServiceMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("ServiceMask(empty)");
        }
        write!(f, "ServiceMask(")?;
        for (i, service) in self.services().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{service}")?;
        }
        write!(f, ")")
    }
}

/// Which end of the session a manager plays. The client dials every
/// connection; the server accepts them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Client,
    Server,
}

/// Maps a service to its TCP port for the given side.
///
/// The request/response connection lives on the base port. The two data
/// planes are directional, so the port each side uses depends on which end
/// it is: the client sends on `base + 1` and receives on `base + 2`, and
/// the server mirrors that.
pub(crate) fn service_port(base: u16, service: Service, side: Side) -> u16 {
    match (service, side) {
        (Service::RequestResponse, _) => base,
        (Service::SendAsync, Side::Client) | (Service::ReceiveAsync, Side::Server) => base + 1,
        (Service::SendAsync, Side::Server) | (Service::ReceiveAsync, Side::Client) => base + 2,
    }
}
