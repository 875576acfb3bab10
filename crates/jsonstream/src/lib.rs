//! Send and receive streams of JSON values over pipes and sockets.
//!
//! jsonstream frames each value as `<length>\n<json>\n` so that a receiver can
//! pull whole values out of a byte stream no matter how the transport splits it.
//!
//! # Crate Structure
//!
//! - [`frame`]: value framing: [`FrameWriter`], [`FrameReader`] and the wire codec
//!
//! The `async` feature adds `frame::JsonStreamCodec` for `tokio_util::codec`.

/// Re-export frame types.
pub mod frame {
    pub use jsonstream_frame::*;
}

pub use jsonstream_frame::{FrameConfig, FrameError, FrameReader, FrameWriter, Value};
