//! JSON payload encoding.
//!
//! Payload text is produced by `serde_json` with a custom formatter so that the
//! separator style and non-ASCII escaping are controlled by [`FrameConfig`].
//!
//! [`FrameConfig`]: crate::codec::FrameConfig

use std::io::{self, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};

use crate::error::{FrameError, Result};

/// Separator style for encoded payloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JsonStyle {
    /// `", "` between items and `": "` after keys: `{"a": [1, 2]}`.
    #[default]
    Spaced,
    /// No whitespace at all: `{"a":[1,2]}`.
    Compact,
}

struct PayloadFormatter {
    style: JsonStyle,
    ascii_only: bool,
}

impl PayloadFormatter {
    fn item_separator(&self) -> &'static [u8] {
        match self.style {
            JsonStyle::Spaced => b", ",
            JsonStyle::Compact => b",",
        }
    }
}

impl Formatter for PayloadFormatter {
    fn begin_array_value<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(self.item_separator())
        }
    }

    fn begin_object_key<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(self.item_separator())
        }
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        match self.style {
            JsonStyle::Spaced => writer.write_all(b": "),
            JsonStyle::Compact => writer.write_all(b":"),
        }
    }

    fn write_string_fragment<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        if !self.ascii_only || fragment.is_ascii() {
            return writer.write_all(fragment.as_bytes());
        }

        let mut start = 0;
        for (idx, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(fragment[start..idx].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }
            start = idx + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// Serialize `value` and append the payload text to `dst`.
///
/// On error `dst` may hold a partial payload; callers truncate it.
pub fn encode_into<V>(
    value: &V,
    dst: &mut Vec<u8>,
    style: JsonStyle,
    ascii_only: bool,
) -> Result<()>
where
    V: Serialize + ?Sized,
{
    let formatter = PayloadFormatter { style, ascii_only };
    let mut ser = Serializer::with_formatter(dst, formatter);
    value.serialize(&mut ser).map_err(FrameError::Encode)
}

/// Serialize `value` into a fresh payload buffer.
pub fn to_payload<V>(value: &V, style: JsonStyle, ascii_only: bool) -> Result<Vec<u8>>
where
    V: Serialize + ?Sized,
{
    let mut out = Vec::with_capacity(64);
    encode_into(value, &mut out, style, ascii_only)?;
    Ok(out)
}

/// Deserialize one payload.
pub fn from_payload<V: DeserializeOwned>(payload: &[u8]) -> Result<V> {
    serde_json::from_slice(payload).map_err(FrameError::Decode)
}
