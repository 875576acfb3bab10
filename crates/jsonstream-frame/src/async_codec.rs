//! `tokio_util::codec` adapter for framed JSON values.

use std::marker::PhantomData;

use bytes::BytesMut;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_frame, encode_frame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::json::{encode_into, from_payload};

/// Codec for use with `FramedRead`, `FramedWrite` and `Framed`.
pub struct JsonStreamCodec<V = Value> {
    config: FrameConfig,
    payload: Vec<u8>,
    _value: PhantomData<fn() -> V>,
}

impl JsonStreamCodec<Value> {
    /// Create a codec for dynamically typed values.
    pub fn new() -> Self {
        Self::typed(FrameConfig::default())
    }

    /// Create a codec for dynamically typed values with explicit configuration.
    pub fn with_config(config: FrameConfig) -> Self {
        Self::typed(config)
    }
}

impl<V> Default for JsonStreamCodec<V> {
    fn default() -> Self {
        Self::typed(FrameConfig::default())
    }
}

impl<V> JsonStreamCodec<V> {
    /// Create a codec that decodes every payload into `V`.
    pub fn typed(config: FrameConfig) -> Self {
        Self {
            config,
            payload: Vec::new(),
            _value: PhantomData,
        }
    }

    /// Current codec configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl<V: DeserializeOwned> Decoder for JsonStreamCodec<V> {
    type Item = V;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<V>> {
        match decode_frame(src, self.config.max_payload_size)? {
            Some(payload) => from_payload(&payload).map(Some),
            None => Ok(None),
        }
    }
}

impl<'a, V, T> Encoder<&'a T> for JsonStreamCodec<V>
where
    T: Serialize + ?Sized,
{
    type Error = FrameError;

    fn encode(&mut self, item: &'a T, dst: &mut BytesMut) -> Result<()> {
        self.payload.clear();
        encode_into(
            item,
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

        encode_frame(&self.payload, dst);
        Ok(())
    }
}

impl<V> Encoder<Value> for JsonStreamCodec<V> {
    type Error = FrameError;

    fn encode(&mut self, item: Value, dst: &mut BytesMut) -> Result<()> {
        Encoder::<&Value>::encode(self, &item, dst)
    }
}
