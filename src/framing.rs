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

//! Wire framing for messages.
//!
//! Every message travels as a length-prefixed frame:
//!
//! ```text
//! +------------------+------------------+
//! | Length (8 bytes) | Payload (N bytes)|
//! |   little-endian  |                  |
//! +------------------+------------------+
//! ```
//!
//! The length covers the payload only and is always little-endian, so peers
//! built for different architectures interoperate. A zero-length frame is
//! valid and carries an empty payload.
//!
//! Decoding is incremental: [`decode_frame`] inspects a byte buffer and
//! either produces a complete frame, asks for more bytes, or rejects an
//! oversized length. It never consumes anything from a partial frame, so a
//! read that is cut short by a timeout leaves the stream position intact and
//! a later retry picks up exactly where it left off.

use thiserror::Error;

/// Size of the length prefix in bytes.
pub const LENGTH_PREFIX_SIZE: usize = 8;

/// Errors that can occur while decoding a frame.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The advertised payload length exceeds the configured limit.
    ///
    /// The bytes after the prefix cannot be trusted once this happens, so
    /// callers must drop the connection rather than resynchronize.
    #[error("frame of {size} bytes exceeds limit of {limit} bytes")]
    TooLarge {
        /// Advertised payload length.
        size: u64,
        /// Configured maximum payload length.
        limit: u64,
    },
}

/// Encodes a payload into a wire frame.
///
/// # Examples
///
/// ```rust
/// use tracelink::framing::{encode_frame, LENGTH_PREFIX_SIZE};
///
/// let frame = encode_frame(b"hello");
/// assert_eq!(frame.len(), LENGTH_PREFIX_SIZE + 5);
/// assert_eq!(&frame[..LENGTH_PREFIX_SIZE], &5u64.to_le_bytes());
/// ```
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    frame.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// Attempts to decode one frame from the front of `buf`.
///
/// Returns `Ok(Some((payload, consumed)))` when a complete frame is present,
/// where `consumed` is the total number of bytes (prefix plus payload) the
/// caller should drain. Returns `Ok(None)` when more bytes are needed.
///
/// # Errors
///
/// Returns [`FrameError::TooLarge`] if the advertised payload length exceeds
/// `limit`.
///
/// # Examples
///
/// ```rust
/// use tracelink::framing::{decode_frame, encode_frame};
///
/// let mut buf = encode_frame(b"ping");
/// buf.extend_from_slice(b"trailing");
///
/// let (payload, consumed) = decode_frame(&buf, 1024).unwrap().unwrap();
/// assert_eq!(payload, b"ping");
/// assert_eq!(&buf[consumed..], b"trailing");
/// ```
pub fn decode_frame(buf: &[u8], limit: u64) -> Result<Option<(Vec<u8>, usize)>, FrameError> {
    if buf.len() < LENGTH_PREFIX_SIZE {
        return Ok(None);
    }
    let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
    prefix.copy_from_slice(&buf[..LENGTH_PREFIX_SIZE]);
    let length = u64::from_le_bytes(prefix);
    if length > limit {
        return Err(FrameError::TooLarge {
            size: length,
            limit,
        });
    }
    let total = LENGTH_PREFIX_SIZE + length as usize;
    if buf.len() < total {
        return Ok(None);
    }
    Ok(Some((buf[LENGTH_PREFIX_SIZE..total].to_vec(), total)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_roundtrip() {
        let payload = b"hello, world".to_vec();
        let frame = encode_frame(&payload);
        let (decoded, consumed) = decode_frame(&frame, 1024).unwrap().unwrap();
        assert_eq!(decoded, payload);
        assert_eq!(consumed, frame.len());
    }

    #[test]
    fn test_empty_payload() {
        let frame = encode_frame(b"");
        assert_eq!(frame.len(), LENGTH_PREFIX_SIZE);
        let (decoded, consumed) = decode_frame(&frame, 1024).unwrap().unwrap();
        assert!(decoded.is_empty());
        assert_eq!(consumed, LENGTH_PREFIX_SIZE);
    }

    #[test]
    fn test_large_payload() {
        let payload = vec![0xAB; 3 * 1024 * 1024];
        let frame = encode_frame(&payload);
        let (decoded, _) = decode_frame(&frame, 4 * 1024 * 1024).unwrap().unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_incomplete_prefix() {
        let frame = encode_frame(b"data");
        assert!(decode_frame(&frame[..3], 1024).unwrap().is_none());
    }

    #[test]
    fn test_incomplete_payload() {
        let frame = encode_frame(b"data");
        assert!(decode_frame(&frame[..frame.len() - 1], 1024).unwrap().is_none());
    }

    #[test]
    fn test_oversized_length_rejected() {
        let frame = encode_frame(&vec![0u8; 100]);
        let result = decode_frame(&frame, 99);
        assert!(matches!(
            result,
            Err(FrameError::TooLarge { size: 100, limit: 99 })
        ));
    }

    #[test]
    fn test_length_is_little_endian() {
        let frame = encode_frame(&[0u8; 0x0102]);
        assert_eq!(frame[0], 0x02);
        assert_eq!(frame[1], 0x01);
        assert_eq!(&frame[2..8], &[0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_multiple_frames_in_buffer() {
        let mut buf = encode_frame(b"first");
        buf.extend_from_slice(&encode_frame(b"second"));

        let (first, consumed) = decode_frame(&buf, 1024).unwrap().unwrap();
        assert_eq!(first, b"first");
        let (second, _) = decode_frame(&buf[consumed..], 1024).unwrap().unwrap();
        assert_eq!(second, b"second");
    }
}
