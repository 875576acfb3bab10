use std::collections::VecDeque;
use std::io::{ErrorKind, Read};
use std::marker::PhantomData;

use bytes::BytesMut;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::codec::{decode_frame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::json::from_payload;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reassembles values from arbitrarily split chunks of a framed stream.
///
/// Feed every chunk received from the transport to [`consume`](Self::consume);
/// it returns the values completed by that chunk and keeps any partial frame
/// for the next call.
///
/// Values completed ahead of a bad frame are still returned; the error is then
/// reported by the next `consume` or by [`finish`](Self::finish). From then on
/// the reader is desynchronized and every call fails with
/// [`FrameError::Desynchronized`] until [`clear`](Self::clear).
pub struct FrameReader<V = Value> {
    buf: BytesMut,
    config: FrameConfig,
    poisoned: bool,
    deferred: Option<FrameError>,
    _value: PhantomData<fn() -> V>,
}

impl FrameReader<Value> {
    /// Create a new reader of dynamically typed values.
    pub fn new() -> Self {
        Self::typed(FrameConfig::default())
    }

    /// Create a new reader of dynamically typed values with explicit configuration.
    pub fn with_config(config: FrameConfig) -> Self {
        Self::typed(config)
    }
}

impl<V> Default for FrameReader<V> {
    fn default() -> Self {
        Self::typed(FrameConfig::default())
    }
}

impl<V> FrameReader<V> {
    /// Create a reader that deserializes every payload into `V`.
    pub fn typed(config: FrameConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            poisoned: false,
            deferred: None,
            _value: PhantomData,
        }
    }

    /// Number of bytes held over from previous chunks.
    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }

    /// True when no partial frame is buffered.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Drop any buffered bytes and clear the desynchronized state.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.poisoned = false;
        self.deferred = None;
    }

    /// Check the stream state once the input is exhausted.
    ///
    /// Fails with an error held back by the last [`consume`](Self::consume),
    /// with [`FrameError::Desynchronized`] if the reader is poisoned, or with
    /// [`FrameError::ConnectionClosed`] if a partial frame is still buffered.
    pub fn finish(&mut self) -> Result<()> {
        if let Some(err) = self.deferred.take() {
            return Err(err);
        }
        if self.poisoned {
            return Err(FrameError::Desynchronized);
        }
        if !self.buf.is_empty() {
            return Err(FrameError::ConnectionClosed);
        }
        Ok(())
    }

    /// Update maximum payload size for subsequent frame decoding.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl<V: DeserializeOwned> FrameReader<V> {
    /// Append `chunk` and return every value it completes, in stream order.
    ///
    /// An empty result means the buffered bytes hold at most a partial frame.
    /// If a bad frame follows values completed by the same chunk, those values
    /// are returned and the error is raised by the next call.
    pub fn consume(&mut self, chunk: impl AsRef<[u8]>) -> Result<Vec<V>> {
        if let Some(err) = self.deferred.take() {
            return Err(err);
        }
        if self.poisoned {
            return Err(FrameError::Desynchronized);
        }

        self.buf.extend_from_slice(chunk.as_ref());

        let mut values = Vec::new();
        loop {
            match self.next_value() {
                Ok(Some(value)) => values.push(value),
                Ok(None) => break,
                Err(err) => {
                    tracing::warn!(error = %err, "frame reader desynchronized");
                    self.poisoned = true;
                    if values.is_empty() {
                        return Err(err);
                    }
                    self.deferred = Some(err);
                    break;
                }
            }
        }

        tracing::trace!(
            decoded = values.len(),
            buffered = self.buf.len(),
            "consumed chunk"
        );
        Ok(values)
    }

    fn next_value(&mut self) -> Result<Option<V>> {
        match decode_frame(&mut self.buf, self.config.max_payload_size)? {
            Some(payload) => from_payload(&payload).map(Some),
            None => Ok(None),
        }
    }

    /// Read one chunk from `inner` (blocking) and consume it.
    ///
    /// Returns `Ok(None)` at a clean EOF. At any other EOF it fails the way
    /// [`finish`](Self::finish) does.
    pub fn read_from<R: Read>(&mut self, inner: &mut R) -> Result<Option<Vec<V>>> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            let read = match inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return self.finish().map(|()| None);
            }

            return self.consume(&chunk[..read]).map(Some);
        }
    }

    /// Iterate over every value read from `inner` until EOF.
    pub fn values<R: Read>(self, inner: R) -> Values<R, V> {
        Values {
            inner,
            reader: self,
            pending: VecDeque::new(),
            done: false,
        }
    }
}

/// Blocking iterator over the values of a framed stream.
///
/// Yields `Err` at most once, after which it is exhausted.
pub struct Values<R, V = Value> {
    inner: R,
    reader: FrameReader<V>,
    pending: VecDeque<V>,
    done: bool,
}

impl<R, V> Values<R, V> {
    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Consume the iterator and return the inner stream.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read, V: DeserializeOwned> Iterator for Values<R, V> {
    type Item = Result<V>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(value) = self.pending.pop_front() {
                return Some(Ok(value));
            }
            if self.done {
                return None;
            }
            match self.reader.read_from(&mut self.inner) {
                Ok(Some(values)) => self.pending.extend(values),
                Ok(None) => self.done = true,
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[test]
    fn consume_single_frame() {
        let mut reader = FrameReader::new();
        assert_eq!(reader.consume("6\n[1, 2]\n").unwrap(), vec![json!([1, 2])]);
        assert!(reader.is_empty());
    }

    #[test]
    fn consume_escaped_unicode() {
        let mut reader = FrameReader::new();
        assert_eq!(
            reader.consume("8\n\"\\u4e09\"\n").unwrap(),
            vec![json!("三")]
        );
    }

    #[test]
    fn consume_raw_utf8_counts_bytes() {
        let mut reader = FrameReader::new();
        assert_eq!(reader.consume("5\n\"三\"\n").unwrap(), vec![json!("三")]);
    }

    #[test]
    fn consume_partial_frames() {
        let mut reader = FrameReader::new();
        let txt = "1\n2\n".repeat(3);

        assert!(reader.consume(&txt[..2]).unwrap().is_empty());
        assert_eq!(
            reader.consume(&txt[2..txt.len() - 2]).unwrap(),
            vec![json!(2), json!(2)]
        );
        assert_eq!(reader.consume(&txt[txt.len() - 2..]).unwrap(), vec![json!(2)]);
        assert!(reader.is_empty());
    }

    #[test]
    fn consume_multiple_frames_in_one_chunk() {
        let mut reader = FrameReader::new();
        let values = reader.consume("6\n[1, 2]\n10\n{\"a\": \"b\"}\n").unwrap();
        assert_eq!(values, vec![json!([1, 2]), json!({"a": "b"})]);
    }

    #[test]
    fn byte_at_a_time_delivery() {
        let wire = b"18\n{\"k\": [1.5, null]}\n";
        let mut reader = FrameReader::new();

        for byte in &wire[..wire.len() - 1] {
            assert!(reader.consume([*byte]).unwrap().is_empty());
        }
        assert_eq!(
            reader.consume(&wire[wire.len() - 1..]).unwrap(),
            vec![json!({"k": [1.5, null]})]
        );
    }

    #[test]
    fn every_split_point_matches_whole_delivery() {
        let wire = "6\n[1, 2]\n4\ntrue\n15\n\"\\u00e9t\\u00e9\"\n";
        let expected = FrameReader::new().consume(wire).unwrap();
        assert_eq!(expected.len(), 3);

        for k in 0..=wire.len() {
            let mut reader = FrameReader::new();
            let mut values = reader.consume(&wire.as_bytes()[..k]).unwrap();
            values.extend(reader.consume(&wire.as_bytes()[k..]).unwrap());
            assert_eq!(values, expected, "split at {k}");
            assert!(reader.is_empty());
        }
    }

    #[test]
    fn empty_chunk_is_a_no_op() {
        let mut reader = FrameReader::new();
        assert!(reader.consume("").unwrap().is_empty());
        assert_eq!(reader.buffered_len(), 0);

        reader.consume("3\n[1").unwrap();
        assert!(reader.consume("").unwrap().is_empty());
        assert_eq!(reader.buffered_len(), 4);
    }

    #[test]
    fn partial_length_line_is_retained() {
        let mut reader = FrameReader::new();
        assert!(reader.consume("1").unwrap().is_empty());
        assert!(reader.consume("0").unwrap().is_empty());
        assert_eq!(reader.buffered_len(), 2);
        assert_eq!(
            reader.consume("\n\"abcdefgh\"\n").unwrap(),
            vec![json!("abcdefgh")]
        );
    }

    #[test]
    fn invalid_length_poisons_reader() {
        let mut reader = FrameReader::new();
        let err = reader.consume("abc\n[]\n").unwrap_err();
        assert!(matches!(err, FrameError::InvalidLength { ref line } if line == "abc"));
        assert!(err.is_framing());

        let err = reader.consume("2\n[]\n").unwrap_err();
        assert!(matches!(err, FrameError::Desynchronized));

        reader.clear();
        assert_eq!(reader.consume("2\n[]\n").unwrap(), vec![json!([])]);
    }

    #[test]
    fn wrong_declared_length_is_detected() {
        let mut reader = FrameReader::new();
        let err = reader.consume("5\n[1, 2]\n").unwrap_err();
        assert!(matches!(err, FrameError::MissingTerminator { found: b']' }));
        assert!(err.is_framing());
    }

    #[test]
    fn values_before_bad_frame_are_returned() {
        let mut reader = FrameReader::new();
        assert_eq!(
            reader.consume("1\n1\n1\n2\nnope\n").unwrap(),
            vec![json!(1), json!(2)]
        );

        let err = reader.consume("4\nnull\n").unwrap_err();
        assert!(matches!(err, FrameError::InvalidLength { ref line } if line == "nope"));
        assert!(matches!(
            reader.consume("4\nnull\n").unwrap_err(),
            FrameError::Desynchronized
        ));
    }

    #[test]
    fn finish_reports_deferred_error() {
        let mut reader = FrameReader::new();
        assert_eq!(reader.consume("1\n1\n3\n[1,\n").unwrap(), vec![json!(1)]);
        assert!(matches!(reader.finish().unwrap_err(), FrameError::Decode(_)));
        assert!(matches!(
            reader.finish().unwrap_err(),
            FrameError::Desynchronized
        ));

        reader.clear();
        reader.finish().unwrap();
    }

    #[test]
    fn finish_reports_partial_frame() {
        let mut reader = FrameReader::new();
        reader.consume("4\nnu").unwrap();
        assert!(matches!(
            reader.finish().unwrap_err(),
            FrameError::ConnectionClosed
        ));
    }

    #[test]
    fn undecodable_payload_is_decode_error() {
        let mut reader = FrameReader::new();
        let err = reader.consume("3\n[1,\n").unwrap_err();
        assert!(matches!(err, FrameError::Decode(_)));
        assert!(!err.is_framing());
    }

    #[test]
    fn oversized_declared_length_fails_before_payload_arrives() {
        let mut reader = FrameReader::new();
        reader.set_max_payload_size(4);
        let err = reader.consume("5\n").unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 5, max: 4 }));
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Event {
        event: String,
        ok: bool,
    }

    #[test]
    fn typed_reader_deserializes_structs() {
        let mut reader = FrameReader::<Event>::default();
        let values = reader
            .consume("29\n{\"event\": \"done\", \"ok\": true}\n")
            .unwrap();
        assert_eq!(
            values,
            vec![Event {
                event: "done".to_string(),
                ok: true
            }]
        );
    }

    #[test]
    fn read_from_byte_by_byte_source() {
        let mut source = ByteByByteReader {
            bytes: b"6\n[1, 2]\n".to_vec(),
            pos: 0,
        };
        let mut reader = FrameReader::new();
        let mut values = Vec::new();
        while let Some(batch) = reader.read_from(&mut source).unwrap() {
            values.extend(batch);
        }
        assert_eq!(values, vec![json!([1, 2])]);
    }

    #[test]
    fn read_from_reports_truncated_stream() {
        let mut source = Cursor::new(b"6\n[1, ".to_vec());
        let mut reader = FrameReader::new();
        assert!(reader.read_from(&mut source).unwrap().unwrap().is_empty());
        let err = reader.read_from(&mut source).unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn interrupted_read_retries() {
        let mut source = InterruptedThenData {
            interrupted: false,
            inner: Cursor::new(b"4\nnull\n".to_vec()),
        };
        let mut reader = FrameReader::new();
        let values = reader.read_from(&mut source).unwrap().unwrap();
        assert_eq!(values, vec![Value::Null]);
    }

    #[test]
    fn values_iterator_yields_until_eof() {
        let source = Cursor::new(b"1\n1\n3\n\"x\"\n2\n{}\n".to_vec());
        let values: Vec<Value> = FrameReader::new()
            .values(source)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(values, vec![json!(1), json!("x"), json!({})]);
    }

    #[test]
    fn values_iterator_stops_after_error() {
        let source = ByteByByteReader {
            bytes: b"1\n1\nzz\n".to_vec(),
            pos: 0,
        };
        let mut values = FrameReader::new().values(source);
        assert!(matches!(values.next(), Some(Ok(_))));
        assert!(matches!(
            values.next(),
            Some(Err(FrameError::InvalidLength { .. }))
        ));
        assert!(values.next().is_none());
    }

    #[test]
    fn values_iterator_yields_values_read_with_bad_frame() {
        let wire = b"1\n1\n1\n2\nzz\n".to_vec();
        let wire_len = wire.len() as u64;
        let mut values = FrameReader::new().values(Cursor::new(wire));

        assert_eq!(values.next().unwrap().unwrap(), json!(1));
        assert_eq!(values.next().unwrap().unwrap(), json!(2));
        assert_eq!(values.get_ref().position(), wire_len);
        assert!(matches!(
            values.next(),
            Some(Err(FrameError::InvalidLength { .. }))
        ));
        assert!(values.next().is_none());

        let source = values.into_inner();
        assert_eq!(source.into_inner().len() as u64, wire_len);
    }

    #[test]
    #[cfg(unix)]
    fn roundtrip_over_pipe() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut writer = crate::writer::FrameWriter::new(left);

        let reader_thread = std::thread::spawn(move || {
            FrameReader::new()
                .values(right)
                .collect::<Result<Vec<_>>>()
                .unwrap()
        });

        for i in 0..64 {
            writer.write(&json!({"seq": i, "name": format!("msg-{i}")})).unwrap();
        }
        drop(writer);

        let values = reader_thread.join().unwrap();
        assert_eq!(values.len(), 64);
        for (i, value) in values.iter().enumerate() {
            assert_eq!(value["seq"], json!(i));
            assert_eq!(value["name"], json!(format!("msg-{i}")));
        }
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }

            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }
}
