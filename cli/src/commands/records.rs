//! Reading and writing record files.
//!
//! A record file is either newline separated text or a sequence of records
//! each prefixed by its length as a little-endian `u32`.

use anyhow::{bail, Context, Result as AnyhowResult};
use clap::ValueEnum;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Layout of a record file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RecordFormat {
    /// One record per line; the trailing newline is not part of the record
    Lines,
    /// `u32` little-endian length, then the record bytes
    LengthPrefixed,
}

/// Read all records of a file, or of stdin when `path` is `-`.
pub fn read_records(path: &str, format: RecordFormat) -> AnyhowResult<Vec<Vec<u8>>> {
    let data = if path == "-" {
        let mut buffer = Vec::new();
        std::io::Read::read_to_end(&mut std::io::stdin(), &mut buffer)?;
        buffer
    } else {
        fs::read(path).with_context(|| format!("failed to read {}", path))?
    };

    match format {
        RecordFormat::Lines => Ok(split_lines(&data)),
        RecordFormat::LengthPrefixed => split_length_prefixed(&data),
    }
}

fn split_lines(data: &[u8]) -> Vec<Vec<u8>> {
    let mut records: Vec<Vec<u8>> = data
        .split(|&b| b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line).to_vec())
        .collect();
    // A final newline terminates the last record rather than starting a new one.
    if data.last() == Some(&b'\n') || data.is_empty() {
        records.pop();
    }
    records
}

fn split_length_prefixed(data: &[u8]) -> AnyhowResult<Vec<Vec<u8>>> {
    let mut records = Vec::new();
    let mut pos = 0;
    while pos < data.len() {
        let Some(header) = data.get(pos..pos + 4) else {
            bail!("truncated length prefix at offset {}", pos);
        };
        let len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
        pos += 4;
        let Some(record) = data.get(pos..pos + len) else {
            bail!(
                "record at offset {} claims {} bytes but only {} remain",
                pos - 4,
                len,
                data.len() - pos
            );
        };
        records.push(record.to_vec());
        pos += len;
    }
    Ok(records)
}

/// Serialise records with a `u32` little-endian length prefix.
pub fn write_length_prefixed<W: Write, S: AsRef<[u8]>>(
    writer: &mut W,
    records: &[S],
) -> AnyhowResult<()> {
    for record in records {
        let record = record.as_ref();
        let len = u32::try_from(record.len()).context("record longer than 4 GiB")?;
        writer.write_all(&len.to_le_bytes())?;
        writer.write_all(record)?;
    }
    Ok(())
}

/// Serialise records as lines.
pub fn write_lines<W: Write, S: AsRef<[u8]>>(writer: &mut W, records: &[S]) -> AnyhowResult<()> {
    for record in records {
        writer.write_all(record.as_ref())?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

/// Write records to a file, or to stdout when `path` is `None`.
pub fn write_records<S: AsRef<[u8]>>(
    path: Option<&Path>,
    format: RecordFormat,
    records: &[S],
) -> AnyhowResult<()> {
    let mut buffer = Vec::new();
    match format {
        RecordFormat::Lines => write_lines(&mut buffer, records)?,
        RecordFormat::LengthPrefixed => write_length_prefixed(&mut buffer, records)?,
    }

    match path {
        Some(path) => fs::write(path, &buffer)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            lock.write_all(&buffer)?;
            lock.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lines() {
        assert_eq!(
            split_lines(b"alpha\nbeta\r\n\ngamma"),
            vec![b"alpha".to_vec(), b"beta".to_vec(), Vec::new(), b"gamma".to_vec()]
        );
        assert_eq!(split_lines(b"one\n"), vec![b"one".to_vec()]);
        assert!(split_lines(b"").is_empty());
    }

    #[test]
    fn test_length_prefixed_roundtrip() {
        let records: [&[u8]; 3] = [b"first", b"", b"\x00\n\xff"];
        let mut buffer = Vec::new();
        write_length_prefixed(&mut buffer, &records).unwrap();
        assert_eq!(buffer.len(), 3 * 4 + 8);

        let parsed = split_length_prefixed(&buffer).unwrap();
        assert_eq!(parsed, records.map(|r| r.to_vec()).to_vec());
    }

    #[test]
    fn test_length_prefixed_truncated() {
        assert!(split_length_prefixed(&[1, 0]).is_err());
        assert!(split_length_prefixed(&[5, 0, 0, 0, b'a']).is_err());
    }

    #[test]
    fn test_read_records_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("records.txt");
        fs::write(&path, "GET /\nPOST /login\n").unwrap();

        let records = read_records(path.to_str().unwrap(), RecordFormat::Lines).unwrap();
        assert_eq!(records, vec![b"GET /".to_vec(), b"POST /login".to_vec()]);
    }
}
