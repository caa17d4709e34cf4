//! Encode command implementation.

use super::records::{read_records, write_records, RecordFormat};
use super::CodecArgs;
use clap::Parser;
use std::path::PathBuf;

/// Encode command arguments.
#[derive(Parser)]
pub struct EncodeCommand {
    /// Path to the trained model
    #[arg(short, long)]
    pub model: PathBuf,

    /// Records to encode (`-` for stdin)
    #[arg(short, long)]
    pub input: String,

    /// Layout of the input file
    #[arg(short, long, value_enum, default_value_t = RecordFormat::Lines)]
    pub format: RecordFormat,

    /// Output file for the length-prefixed encoded records (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub codec: CodecArgs,
}

use anyhow::Result as AnyhowResult;
use lexhuff::ModelLoader;

pub fn run(cmd: EncodeCommand) -> AnyhowResult<()> {
    let mut codec = cmd.codec.build()?;
    ModelLoader::load_from_file(codec.as_mut(), &cmd.model)?;

    let records = read_records(&cmd.input, cmd.format)?;
    let encoded = records
        .iter()
        .map(|record| codec.encode(record))
        .collect::<Result<Vec<_>, _>>()?;

    let raw: usize = records.iter().map(Vec::len).sum();
    let packed: usize = encoded.iter().map(Vec::len).sum();
    tracing::info!(records = records.len(), raw, packed, "encoded records");

    write_records(cmd.output.as_deref(), RecordFormat::LengthPrefixed, &encoded)?;
    if let Some(path) = &cmd.output {
        println!(
            "Encoded {} records ({} -> {} bytes) to {}",
            records.len(),
            raw,
            packed,
            path.display()
        );
    }

    Ok(())
}
