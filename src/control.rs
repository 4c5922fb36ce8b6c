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

//! Control-plane payloads.
//!
//! The transport moves opaque byte payloads; this module provides the JSON
//! command vocabulary the tracing debugger speaks over the request/response
//! service. Using it is optional, but both ends of a session must agree on
//! the payload format either way.

use serde::{Deserialize, Serialize};

/// Conventional base port for a tracing session.
pub const DEFAULT_BASE_PORT: u16 = 6120;

/// A control-plane command or notification.
///
/// Serialized as a JSON document with a `command` tag and, where needed, a
/// `parameters` object.
///
/// # Examples
///
/// ```rust
/// use tracelink::control::ControlMessage;
///
/// let payload = ControlMessage::CaptureStart {
///     frame_count: Some(60),
///     trace_file: None,
/// }
/// .to_payload()
/// .unwrap();
///
/// let message = ControlMessage::from_payload(&payload).unwrap();
/// assert!(matches!(
///     message,
///     ControlMessage::CaptureStart { frame_count: Some(60), .. }
/// ));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "parameters", rename_all = "snake_case")]
pub enum ControlMessage {
    /// Liveness probe; the peer answers with any response.
    Ping,
    /// Launch an application under the tracer.
    LaunchApp {
        /// Identifier of the application to launch.
        app_id: String,
        /// Extra command-line arguments for the launched application.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        arguments: Option<String>,
        /// Word size of the target binary, 32 or 64.
        bitness: u32,
        /// Base port the launched application should trace over.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        trace_port: Option<u16>,
    },
    /// Begin capturing GL call frames.
    CaptureStart {
        /// Number of frames to capture; `None` captures until stopped.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        frame_count: Option<u32>,
        /// Target file for the capture; `None` lets the tracer choose.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        trace_file: Option<String>,
    },
    /// Stop an in-progress capture.
    CaptureStop,
    /// Ask for the trace files available on the peer.
    ListCaptures,
    /// Free-form text pushed to the controlling client.
    Notice {
        /// The text to display.
        text: String,
    },
}

impl ControlMessage {
    /// Serializes the message into a transport payload.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error; with this type that only
    /// happens on I/O-less edge cases and can be treated as a bug.
    pub fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Parses a transport payload received from the peer.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error when the payload is not a
    /// well-formed command document.
    pub fn from_payload(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let messages = vec![
            ControlMessage::Ping,
            ControlMessage::LaunchApp {
                app_id: "440".to_string(),
                arguments: Some("-windowed".to_string()),
                bitness: 64,
                trace_port: Some(DEFAULT_BASE_PORT),
            },
            ControlMessage::CaptureStart {
                frame_count: None,
                trace_file: Some("/tmp/run.trace".to_string()),
            },
            ControlMessage::CaptureStop,
            ControlMessage::ListCaptures,
            ControlMessage::Notice {
                text: "capture complete".to_string(),
            },
        ];
        for message in messages {
            let payload = message.to_payload().unwrap();
            assert_eq!(ControlMessage::from_payload(&payload).unwrap(), message);
        }
    }

    #[test]
    fn test_wire_shape() {
        let payload = ControlMessage::Ping.to_payload().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(value["command"], "ping");

        let payload = ControlMessage::CaptureStart {
            frame_count: Some(1),
            trace_file: None,
        }
        .to_payload()
        .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(value["command"], "capture_start");
        assert_eq!(value["parameters"]["frame_count"], 1);
        assert!(value["parameters"].get("trace_file").is_none());
    }

    #[test]
    fn test_malformed_payload_rejected() {
        assert!(ControlMessage::from_payload(b"not json").is_err());
        assert!(ControlMessage::from_payload(br#"{"command":"warp"}"#).is_err());
    }
}
