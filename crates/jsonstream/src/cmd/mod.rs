use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};

use crate::exit::{io_error, CliResult};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Frame JSON values read from stdin or a file.
    Encode(EncodeArgs),
    /// Decode a framed stream and print its values.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat, max_payload: usize) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, max_payload),
        Command::Decode(args) => decode::run(args, format, max_payload),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Read JSON values from this file instead of stdin.
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
    /// Omit the spaces after `,` and `:` in payloads.
    #[arg(long)]
    pub compact: bool,
    /// Write non-ASCII characters as UTF-8 instead of `\uXXXX` escapes.
    #[arg(long)]
    pub no_ascii: bool,
    /// Flush stdout after every frame.
    #[arg(long)]
    pub flush: bool,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Read the framed stream from this file instead of stdin.
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
    /// Bytes requested per read from the input.
    #[arg(long, default_value_t = 8192)]
    pub chunk_size: usize,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn open_input(path: Option<&Path>) -> CliResult<Box<dyn Read>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(io::stdin().lock())),
    }
}
