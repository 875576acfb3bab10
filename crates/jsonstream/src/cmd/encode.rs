use std::io::{self, BufReader, Read, Write};

use jsonstream_frame::{FrameConfig, FrameWriter, JsonStyle, Value};

use crate::cmd::{open_input, EncodeArgs};
use crate::exit::{frame_error, CliError, CliResult, DATA_INVALID, SUCCESS};

pub fn run(args: EncodeArgs, max_payload: usize) -> CliResult<i32> {
    let input = open_input(args.file.as_deref())?;
    let config = frame_config(&args, max_payload);
    let stdout = io::stdout().lock();

    let written = encode_stream(input, stdout, config)?;
    tracing::info!(frames = written, "encoded values");
    Ok(SUCCESS)
}

fn frame_config(args: &EncodeArgs, max_payload: usize) -> FrameConfig {
    FrameConfig {
        max_payload_size: max_payload,
        style: if args.compact {
            JsonStyle::Compact
        } else {
            JsonStyle::Spaced
        },
        ascii_only: !args.no_ascii,
        flush_each_frame: args.flush,
    }
}

/// Frame every whitespace-separated JSON document from `input` onto `output`.
fn encode_stream<R: Read, W: Write>(
    input: R,
    output: W,
    config: FrameConfig,
) -> CliResult<usize> {
    let mut writer = FrameWriter::with_config(io::BufWriter::new(output), config);
    let documents =
        serde_json::Deserializer::from_reader(BufReader::new(input)).into_iter::<Value>();

    let mut written = 0usize;
    for document in documents {
        let value = document.map_err(|err| {
            CliError::new(
                DATA_INVALID,
                format!("input document {} is not valid JSON: {err}", written + 1),
            )
        })?;
        writer
            .write(&value)
            .map_err(|err| frame_error("write failed", err))?;
        tracing::debug!(index = written, "framed value");
        written += 1;
    }

    writer
        .flush()
        .map_err(|err| frame_error("flush failed", err))?;
    Ok(written)
}
