use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::json::JsonStyle;

/// Byte that ends both the length line and the payload.
pub const TERMINATOR: u8 = b'\n';

/// Longest accepted length line, in digits (`usize::MAX` on 64-bit targets).
pub const MAX_LENGTH_DIGITS: usize = 20;

/// Default maximum payload size: 16 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// Encode a payload into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────────┬──────┬─────────────────┬──────┐
/// │ Length (ASCII    │ "\n" │ Payload         │ "\n" │
/// │ decimal, bytes)  │      │ (Length bytes)  │      │
/// └──────────────────┴──────┴─────────────────┴──────┘
/// ```
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) {
    let length = payload.len().to_string();
    dst.reserve(length.len() + payload.len() + 2);
    dst.put_slice(length.as_bytes());
    dst.put_u8(TERMINATOR);
    dst.put_slice(payload);
    dst.put_u8(TERMINATOR);
}

/// Decode one frame from the front of a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet, in
/// which case the buffer is left untouched. On success, consumes the frame
/// bytes (length line, payload and terminator) and returns the payload.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Bytes>> {
    let window = &src[..src.len().min(MAX_LENGTH_DIGITS + 1)];
    let Some(line_end) = window.iter().position(|&b| b == TERMINATOR) else {
        if window.len() > MAX_LENGTH_DIGITS {
            return Err(invalid_length(window));
        }
        return Ok(None); // Need more data
    };

    let payload_len = parse_length(&src[..line_end])?;
    if payload_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    let total = payload_len.saturating_add(line_end + 2);
    if src.len() < total {
        return Ok(None); // Need more data
    }

    let found = src[total - 1];
    if found != TERMINATOR {
        return Err(FrameError::MissingTerminator { found });
    }

    src.advance(line_end + 1);
    let payload = src.split_to(payload_len).freeze();
    src.advance(1);

    Ok(Some(payload))
}

/// Parse a length line: ASCII digits only, no sign, no leading zeros.
pub fn parse_length(line: &[u8]) -> Result<usize> {
    let digits_only = !line.is_empty() && line.iter().all(u8::is_ascii_digit);
    let leading_zero = line.len() > 1 && line[0] == b'0';
    if !digits_only || leading_zero {
        return Err(invalid_length(line));
    }

    std::str::from_utf8(line)
        .ok()
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(|| invalid_length(line))
}

/// The total wire size of a frame carrying `payload_len` bytes.
pub fn wire_size(payload_len: usize) -> usize {
    payload_len.to_string().len() + payload_len + 2
}

fn invalid_length(line: &[u8]) -> FrameError {
    FrameError::InvalidLength {
        line: String::from_utf8_lossy(line).into_owned(),
    }
}

/// Configuration shared by readers, writers and the async codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 16 MiB.
    pub max_payload_size: usize,
    /// Separator style for encoded values. Default: [`JsonStyle::Spaced`].
    pub style: JsonStyle,
    /// Escape every non-ASCII character as `\uXXXX`. Default: true.
    pub ascii_only: bool,
    /// Flush the sink after every frame. Default: false.
    pub flush_each_frame: bool,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            style: JsonStyle::Spaced,
            ascii_only: true,
            flush_each_frame: false,
        }
    }
}
