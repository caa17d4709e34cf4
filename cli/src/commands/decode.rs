//! Decode command implementation.

use super::records::{read_records, write_records, RecordFormat};
use super::CodecArgs;
use clap::Parser;
use std::path::PathBuf;

/// Decode command arguments.
#[derive(Parser)]
pub struct DecodeCommand {
    /// Path to the trained model
    #[arg(short, long)]
    pub model: PathBuf,

    /// Length-prefixed encoded records (`-` for stdin)
    #[arg(short, long)]
    pub input: String,

    /// Layout of the decoded output
    #[arg(short, long, value_enum, default_value_t = RecordFormat::Lines)]
    pub format: RecordFormat,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub codec: CodecArgs,
}

use anyhow::{Context, Result as AnyhowResult};
use lexhuff::ModelLoader;

pub fn run(cmd: DecodeCommand) -> AnyhowResult<()> {
    let mut codec = cmd.codec.build()?;
    ModelLoader::load_from_file(codec.as_mut(), &cmd.model)?;

    let streams = read_records(&cmd.input, RecordFormat::LengthPrefixed)?;
    let decoded = streams
        .iter()
        .enumerate()
        .map(|(i, stream)| {
            codec
                .decode(stream)
                .with_context(|| format!("failed to decode record {}", i))
        })
        .collect::<AnyhowResult<Vec<_>>>()?;
    tracing::info!(records = decoded.len(), "decoded records");

    write_records(cmd.output.as_deref(), cmd.format, &decoded)?;
    if let Some(path) = &cmd.output {
        println!("Decoded {} records to {}", decoded.len(), path.display());
    }

    Ok(())
}
