use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use serde::Serialize;

use crate::codec::{encode_frame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::json::encode_into;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes one framed value per call to any `Write` sink.
///
/// The writer never opens, closes or (unless configured) flushes the sink.
/// Each frame is assembled in full before the first byte is written, so an
/// encoding failure leaves the sink untouched.
pub struct FrameWriter<T> {
    inner: T,
    payload: Vec<u8>,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            payload: Vec::with_capacity(INITIAL_BUFFER_CAPACITY),
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Encode `value` and write it as a single frame.
    ///
    /// JSON has no NaN or infinity; non-finite floats are written as `null`.
    pub fn write<V: Serialize + ?Sized>(&mut self, value: &V) -> Result<()> {
        self.payload.clear();
        encode_into(
            value,
            &mut self.payload,
            self.config.style,
            self.config.ascii_only,
        )?;

        if self.payload.len() > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: self.payload.len(),
                max: self.config.max_payload_size,
            });
        }

        self.buf.clear();
        encode_frame(&self.payload, &mut self.buf);
        tracing::trace!(payload_len = self.payload.len(), "writing frame");

        match self.inner.write_all(&self.buf) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::WriteZero => {
                return Err(FrameError::ConnectionClosed)
            }
            Err(err) => return Err(FrameError::Io(err)),
        }

        if self.config.flush_each_frame {
            self.flush()?;
        }
        Ok(())
    }

    /// Write every value from an iterator, stopping at the first error.
    pub fn write_all_values<'a, V, I>(&mut self, values: I) -> Result<usize>
    where
        V: Serialize + 'a,
        I: IntoIterator<Item = &'a V>,
    {
        let mut written = 0usize;
        for value in values {
            self.write(value)?;
            written += 1;
        }
        Ok(written)
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush().map_err(FrameError::Io)
    }

    /// Borrow the underlying sink.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying sink.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner sink.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum payload size for subsequent frame encoding.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
