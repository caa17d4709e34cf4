//! Train command implementation.

use super::records::{read_records, RecordFormat};
use super::{spread_sample, CodecArgs};
use clap::Parser;
use std::path::PathBuf;

/// Train command arguments.
#[derive(Parser)]
pub struct TrainCommand {
    /// Path to the training records (`-` for stdin)
    #[arg(short, long)]
    pub input: String,

    /// Where to write the trained model
    #[arg(short, long)]
    pub output: PathBuf,

    /// Layout of the input file
    #[arg(short, long, value_enum, default_value_t = RecordFormat::Lines)]
    pub format: RecordFormat,

    /// Number of records to train on (defaults to what the codec asks for)
    #[arg(short, long)]
    pub sample_size: Option<usize>,

    /// Also write model statistics as JSON to this path
    #[arg(long)]
    pub stats: Option<PathBuf>,

    #[command(flatten)]
    pub codec: CodecArgs,
}

use anyhow::Result as AnyhowResult;
use lexhuff::ModelSaver;
use std::fs;
use std::time::Instant;

pub fn run(cmd: TrainCommand) -> AnyhowResult<()> {
    let mut codec = cmd.codec.build()?;

    println!("Training {} codec...", codec.name());
    println!("  Input: {}", cmd.input);
    println!("  Output: {}", cmd.output.display());
    println!();

    // Read training data
    let start = Instant::now();
    let records = read_records(&cmd.input, cmd.format)?;
    println!(
        "Read {} records in {:.2}s",
        records.len(),
        start.elapsed().as_secs_f64()
    );

    let sample_size = cmd
        .sample_size
        .unwrap_or_else(|| codec.sample_size(records.len()));
    let sample = spread_sample(&records, sample_size);
    tracing::debug!(records = records.len(), sample = sample.len(), "selected training sample");

    // Train
    let start = Instant::now();
    codec.learn(&sample)?;
    println!(
        "Learning finished on {} records in {:.2}s",
        sample.len(),
        start.elapsed().as_secs_f64()
    );

    if let Some(stats) = codec.stats() {
        println!("  Symbols: {}", stats.symbols);
        println!("  Longest code: {} bits", stats.longest_code);
        println!("  Mean code length: {:.2} bits", stats.mean_code_length);
        if let Some(path) = &cmd.stats {
            fs::write(path, serde_json::to_string_pretty(&stats)?)?;
        }
    }
    println!();

    // Save model
    let start = Instant::now();
    ModelSaver::save_to_file(codec.as_ref(), &cmd.output)?;
    println!(
        "Model saved to {} in {:.2}s",
        cmd.output.display(),
        start.elapsed().as_secs_f64()
    );

    Ok(())
}
