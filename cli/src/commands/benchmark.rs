//! Benchmark command implementation.

use super::records::{read_records, RecordFormat};
use super::{spread_sample, CodecArgs};
use clap::Parser;
use std::path::PathBuf;

/// Benchmark command arguments.
#[derive(Parser)]
pub struct BenchmarkCommand {
    /// Path to the test records
    #[arg(short, long)]
    pub input: String,

    /// Layout of the input file
    #[arg(short, long, value_enum, default_value_t = RecordFormat::Lines)]
    pub format: RecordFormat,

    /// Number of records to train on (defaults to what the codec asks for)
    #[arg(short, long)]
    pub sample_size: Option<usize>,

    /// Only encode the first N records
    #[arg(short, long)]
    pub records: Option<usize>,

    /// Also check that a saved and reloaded model decodes the same streams
    #[arg(long, default_value_t = false)]
    pub save_test: bool,

    /// Write the report as JSON to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    #[command(flatten)]
    pub codec: CodecArgs,
}

use anyhow::{bail, Result as AnyhowResult};
use serde::Serialize;
use std::fs;
use std::time::{Duration, Instant};

/// Min, max and total of a set of timings.
#[derive(Debug, Default, Serialize)]
pub struct TimingSummary {
    pub min_ms: f64,
    pub max_ms: f64,
    pub mean_ms: f64,
    pub total_ms: f64,
}

impl TimingSummary {
    fn from_durations(durations: &[Duration]) -> Self {
        if durations.is_empty() {
            return Self::default();
        }
        let ms: Vec<f64> = durations.iter().map(|d| d.as_secs_f64() * 1000.0).collect();
        let total_ms: f64 = ms.iter().sum();
        Self {
            min_ms: ms.iter().copied().fold(f64::INFINITY, f64::min),
            max_ms: ms.iter().copied().fold(0.0, f64::max),
            mean_ms: total_ms / ms.len() as f64,
            total_ms,
        }
    }
}

/// Result of a benchmark run.
#[derive(Debug, Serialize)]
pub struct BenchmarkReport {
    pub codec: String,
    pub records: usize,
    pub sample_size: usize,
    pub learn_seconds: f64,
    pub raw_bytes: usize,
    pub encoded_bytes: usize,
    pub model_bytes: usize,
    /// Space saved per record, worst and best
    pub min_ratio: f64,
    pub max_ratio: f64,
    /// Space saved over all records
    pub ratio: f64,
    /// Space saved when the model is counted too
    pub ratio_with_model: f64,
    pub encode: TimingSummary,
    pub decode: TimingSummary,
    pub save_test_passed: Option<bool>,
}

fn saving(encoded: usize, raw: usize) -> f64 {
    if raw == 0 {
        0.0
    } else {
        1.0 - encoded as f64 / raw as f64
    }
}

pub fn run(cmd: BenchmarkCommand) -> AnyhowResult<()> {
    let mut codec = cmd.codec.build()?;

    println!("Preparing test file...");
    let records = read_records(&cmd.input, cmd.format)?;
    if records.is_empty() {
        bail!("{} contains no records", cmd.input);
    }

    let sample_size = cmd
        .sample_size
        .unwrap_or_else(|| codec.sample_size(records.len()));
    let sample = spread_sample(&records, sample_size);

    println!("Start learning test on {} records", sample.len());
    let start = Instant::now();
    codec.learn(&sample)?;
    let learn_seconds = start.elapsed().as_secs_f64();
    println!("Learning finished in {:.3}s", learn_seconds);

    let count = cmd.records.map_or(records.len(), |n| n.min(records.len()));
    println!();
    println!("Start encoding test on {} records", count);

    let mut encode_times = Vec::with_capacity(count);
    let mut decode_times = Vec::with_capacity(count);
    let mut encoded_records = Vec::with_capacity(count);
    let mut raw_bytes = 0;
    let mut encoded_bytes = 0;
    let mut min_ratio = f64::INFINITY;
    let mut max_ratio = f64::NEG_INFINITY;

    for (i, record) in records.iter().take(count).enumerate() {
        let start = Instant::now();
        let encoded = codec.encode(record)?;
        encode_times.push(start.elapsed());

        let start = Instant::now();
        let decoded = codec.decode(&encoded)?;
        decode_times.push(start.elapsed());

        if &decoded != record {
            bail!("record {} in {} did not survive the round trip", i, cmd.input);
        }

        let ratio = saving(encoded.len(), record.len());
        min_ratio = min_ratio.min(ratio);
        max_ratio = max_ratio.max(ratio);
        raw_bytes += record.len();
        encoded_bytes += encoded.len();
        encoded_records.push(encoded);
    }

    let model = codec.save()?;

    let save_test_passed = if cmd.save_test {
        let mut reloaded = cmd.codec.build()?;
        reloaded.load(&model)?;
        let passed = encoded_records
            .iter()
            .zip(&records)
            .all(|(stream, record)| reloaded.decode(stream).ok().as_ref() == Some(record));
        Some(passed)
    } else {
        None
    };

    let report = BenchmarkReport {
        codec: codec.name().to_string(),
        records: count,
        sample_size: sample.len(),
        learn_seconds,
        raw_bytes,
        encoded_bytes,
        model_bytes: model.len(),
        min_ratio,
        max_ratio,
        ratio: saving(encoded_bytes, raw_bytes),
        ratio_with_model: saving(encoded_bytes + model.len(), raw_bytes),
        encode: TimingSummary::from_durations(&encode_times),
        decode: TimingSummary::from_durations(&decode_times),
        save_test_passed,
    };

    print_report(&report);
    if let Some(path) = &cmd.report {
        fs::write(path, serde_json::to_string_pretty(&report)?)?;
    }

    Ok(())
}

fn print_report(report: &BenchmarkReport) {
    println!();
    println!("Compression ratio:");
    println!(
        "  Min: {:.4}  Max: {:.4}  Average: {:.4}",
        report.min_ratio, report.max_ratio, report.ratio
    );
    println!("  Including model: {:.4}", report.ratio_with_model);
    println!("  Model size: {} bytes", report.model_bytes);
    println!();
    for (label, timing) in [("Compression", &report.encode), ("Decompression", &report.decode)] {
        println!("{} time (ms):", label);
        println!(
            "  Min: {:.4}  Max: {:.4}  Average: {:.4}",
            timing.min_ms, timing.max_ms, timing.mean_ms
        );
        println!("  Whole file: {:.2}", timing.total_ms);
    }
    if let Some(passed) = report.save_test_passed {
        println!();
        println!(
            "Save/load finished {}",
            if passed { "correctly" } else { "incorrectly" }
        );
    }
}
