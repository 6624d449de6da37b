// SPDX-FileCopyrightText: 2025 Knitli Inc. <knitli@knit.li>
// SPDX-FileContributor: Adam Poulemanos for Knitli <adam@knit.li>
// SPDX-License-Identifier: MIT OR Apache-2.0
//! Wires the Latin-1 transcoding adapter and the chunked array parser
//! together into the path-based entry points the executor and
//! auto-tuner use.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use ioc_core::{Entry, IocError, Result};

use crate::chunks::stream_chunks;
use crate::latin1::Latin1Reader;

const READ_BUFFER: usize = 64 * 1024;

fn open(path: &Path) -> Result<Latin1Reader<BufReader<File>>> {
    let file = File::open(path).map_err(|source| IocError::InputReadError { path: path.to_path_buf(), source })?;
    Ok(Latin1Reader::new(BufReader::with_capacity(READ_BUFFER, file)))
}

/// Streams `path`'s top-level JSON array in `chunk_size`-sized batches,
/// invoking `on_chunk` for each one (plus a final partial batch).
pub fn stream_file_chunks<F>(path: &Path, chunk_size: usize, on_chunk: F) -> Result<()>
where
    F: FnMut(Vec<Entry>) -> Result<()>,
{
    let reader = open(path)?;
    stream_chunks(reader, chunk_size, on_chunk).map_err(|e| match e {
        IocError::WorkerTaskError { reason, .. } => {
            IocError::WorkerTaskError { path: path.to_path_buf(), reason }
        }
        other => other,
    })
}

/// Reads up to `max_entries` entries from `path`'s array, for the
/// auto-tuner's representative-sample benchmark corpus. Stops as soon
/// as the sample is full rather than reading the whole file.
pub fn sample_entries(path: &Path, max_entries: usize) -> Result<Vec<Entry>> {
    let mut sample = Vec::with_capacity(max_entries);
    let result = stream_file_chunks(path, max_entries.max(1), |chunk| {
        sample.extend(chunk);
        if sample.len() >= max_entries {
            // Signal "enough" without treating it as a real failure;
            // the caller only wants the prefix, not the rest of the file.
            Err(IocError::WorkerTaskError { path: path.to_path_buf(), reason: "sample filled".to_string() })
        } else {
            Ok(())
        }
    });
    match result {
        Ok(()) | Err(IocError::WorkerTaskError { .. }) => {
            sample.truncate(max_entries);
            Ok(sample)
        }
        Err(other) => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn write_json_array(dir: &tempfile::TempDir, name: &str, n: usize) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let entries: Vec<_> = (0..n).map(|i| json!({"id": i, "api": format!("Fn{i}(x)")})).collect();
        let content = serde_json::to_string(&entries).unwrap();
        std::fs::File::create(&path).unwrap().write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn stream_file_chunks_respects_chunk_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json_array(&dir, "in.json", 5);
        let mut total = 0;
        let mut chunk_lens = Vec::new();
        stream_file_chunks(&path, 2, |c| {
            chunk_lens.push(c.len());
            total += c.len();
            Ok(())
        })
        .unwrap();
        assert_eq!(total, 5);
        assert_eq!(chunk_lens, vec![2, 2, 1]);
    }

    #[test]
    fn sample_entries_stops_at_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json_array(&dir, "in.json", 100);
        let sample = sample_entries(&path, 10).unwrap();
        assert_eq!(sample.len(), 10);
    }

    #[test]
    fn sample_entries_handles_short_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json_array(&dir, "in.json", 3);
        let sample = sample_entries(&path, 10).unwrap();
        assert_eq!(sample.len(), 3);
    }
}
