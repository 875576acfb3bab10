//! Length-prefixed JSON value framing for byte and text streams.
//!
//! Every value is sent as:
//! - Its encoded length in bytes, as ASCII decimal, followed by `\n`
//! - The JSON payload, followed by `\n`
//!
//! The reader accepts arbitrarily split chunks and returns whole values; no
//! partial reads or buffer management in user code.

#[cfg(feature = "async")]
pub mod async_codec;
pub mod codec;
pub mod error;
pub mod json;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub use async_codec::JsonStreamCodec;
pub use codec::{
    decode_frame, encode_frame, parse_length, wire_size, FrameConfig, DEFAULT_MAX_PAYLOAD,
    MAX_LENGTH_DIGITS, TERMINATOR,
};
pub use error::{FrameError, Result};
pub use json::JsonStyle;
pub use reader::{FrameReader, Values};
pub use serde_json::Value;
pub use writer::FrameWriter;
