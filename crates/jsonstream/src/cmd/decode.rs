use std::io::{self, ErrorKind, Read, Write};

use jsonstream_frame::{FrameConfig, FrameError, FrameReader};

use crate::cmd::{open_input, DecodeArgs};
use crate::exit::{frame_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{write_value, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat, max_payload: usize) -> CliResult<i32> {
    if args.chunk_size == 0 {
        return Err(CliError::new(USAGE, "--chunk-size must be greater than zero"));
    }

    let input = open_input(args.file.as_deref())?;
    let config = FrameConfig {
        max_payload_size: max_payload,
        ..FrameConfig::default()
    };
    let mut stdout = io::stdout().lock();

    let decoded = decode_stream(input, &mut stdout, args.chunk_size, config, format)?;
    tracing::info!(values = decoded, "decoded stream");
    Ok(SUCCESS)
}

/// Feed `input` to a reader `chunk_size` bytes at a time, printing each value.
///
/// A closed output pipe ends decoding quietly.
fn decode_stream<R: Read, W: Write>(
    mut input: R,
    output: &mut W,
    chunk_size: usize,
    config: FrameConfig,
    format: OutputFormat,
) -> CliResult<usize> {
    let mut reader = FrameReader::with_config(config);
    let mut chunk = vec![0u8; chunk_size];
    let mut decoded = 0usize;

    loop {
        let read = match input.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(io_error("read failed", err)),
        };

        let values = reader
            .consume(&chunk[..read])
            .map_err(|err| frame_error(&format!("value {decoded}"), err))?;
        tracing::trace!(read, completed = values.len(), "chunk consumed");

        for value in values {
            match write_value(output, decoded, &value, format) {
                Ok(()) => decoded += 1,
                Err(err) if err.kind() == ErrorKind::BrokenPipe => return Ok(decoded),
                Err(err) => return Err(io_error("write failed", err)),
            }
        }
    }

    let buffered = reader.buffered_len();
    reader.finish().map_err(|err| match err {
        FrameError::ConnectionClosed => CliError::new(
            DATA_INVALID,
            format!("stream ended inside a frame ({buffered} bytes buffered)"),
        ),
        err => frame_error(&format!("value {decoded}"), err),
    })?;
    Ok(decoded)
}
