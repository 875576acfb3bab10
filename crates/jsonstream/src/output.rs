use std::io::{self, IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use jsonstream_frame::Value;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    /// One compact JSON document per line.
    Json,
    Table,
    Pretty,
    /// Strings unquoted, everything else as compact JSON.
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

pub fn write_value<W: Write>(
    out: &mut W,
    index: usize,
    value: &Value,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => writeln!(out, "{}", compact(value)),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["INDEX", "TYPE", "VALUE"])
                .add_row(vec![
                    index.to_string(),
                    value_kind(value).to_string(),
                    compact(value),
                ]);
            writeln!(out, "{table}")
        }
        OutputFormat::Pretty => {
            let pretty =
                serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string());
            writeln!(out, "#{index} ({}):\n{pretty}", value_kind(value))
        }
        OutputFormat::Raw => match value {
            Value::String(text) => writeln!(out, "{text}"),
            other => writeln!(out, "{}", compact(other)),
        },
    }
}

pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn compact(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}
