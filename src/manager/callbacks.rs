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

//! Callback traits for inbound traffic.
//!
//! Both traits have blanket implementations for closures, so most callers
//! never implement them by hand:
//!
//! ```rust
//! use std::sync::Arc;
//! use tracelink::manager::{MessageSink, RequestHandler};
//!
//! let sink: Arc<dyn MessageSink> = Arc::new(|payload: &[u8]| {
//!     println!("received {} bytes", payload.len());
//! });
//!
//! let handler: Arc<dyn RequestHandler> = Arc::new(|request: &[u8]| {
//!     request.to_vec() // echo
//! });
//! ```

use async_trait::async_trait;

/// Receives fire-and-forget messages from the peer.
///
/// Called from the session's receive loop, so implementations should return
/// promptly; hand heavy work off to another task.
pub trait MessageSink: Send + Sync {
    /// Delivers one received payload.
    fn deliver(&self, payload: &[u8]);
}

impl<F> MessageSink for F
where
    F: Fn(&[u8]) + Send + Sync,
{
    fn deliver(&self, payload: &[u8]) {
        self(payload)
    }
}

/// Produces the response to a peer's request.
///
/// The serving side runs one request at a time per session; the next
/// request is not read until the handler returns and its response has been
/// written back.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Computes the response payload for `request`.
    async fn handle(&self, request: &[u8]) -> Vec<u8>;
}

#[async_trait]
impl<F> RequestHandler for F
where
    F: Fn(&[u8]) -> Vec<u8> + Send + Sync,
{
    async fn handle(&self, request: &[u8]) -> Vec<u8> {
        self(request)
    }
}
