// SPDX-FileCopyrightText: 2025 Knitli Inc. <knitli@knit.li>
// SPDX-FileContributor: Adam Poulemanos for Knitli <adam@knit.li>
// SPDX-License-Identifier: MIT OR Apache-2.0
//! Output sinks: an in-memory `Vec<MatchRecord>` for callers that want
//! the whole result set, or a streamed JSON array written incrementally
//! so memory use doesn't track output size (§4.4).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use ioc_core::{IocError, MatchRecord, Result};

pub trait OutputSink: Send {
    fn write_batch(&mut self, records: Vec<MatchRecord>) -> Result<()>;

    /// Closes the sink, returning any records it held back for the
    /// caller rather than writing out (§4.4: a sink either streams to a
    /// file or hands its accumulated records back). `FileSink` has
    /// already written everything, so it returns an empty vec here.
    fn finish(self: Box<Self>) -> Result<Vec<MatchRecord>>;
}

#[derive(Default)]
pub struct MemorySink {
    records: Vec<MatchRecord>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn into_records(self) -> Vec<MatchRecord> {
        self.records
    }
}

impl OutputSink for MemorySink {
    fn write_batch(&mut self, mut records: Vec<MatchRecord>) -> Result<()> {
        self.records.append(&mut records);
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Vec<MatchRecord>> {
        Ok(self.records)
    }
}

pub struct FileSink {
    writer: BufWriter<File>,
    wrote_any: bool,
}

impl FileSink {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|source| IocError::InputReadError { path: path.to_path_buf(), source })?;
        let mut writer = BufWriter::new(file);
        writer.write_all(b"[").map_err(|source| IocError::InputReadError { path: path.to_path_buf(), source })?;
        Ok(FileSink { writer, wrote_any: false })
    }
}

impl OutputSink for FileSink {
    fn write_batch(&mut self, records: Vec<MatchRecord>) -> Result<()> {
        for record in &records {
            if self.wrote_any {
                self.writer
                    .write_all(b",\n")
                    .map_err(|e| IocError::OutputWriteError { reason: e.to_string() })?;
            }
            serde_json::to_writer(&mut self.writer, record)
                .map_err(|e| IocError::OutputWriteError { reason: e.to_string() })?;
            self.wrote_any = true;
        }
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<Vec<MatchRecord>> {
        self.writer
            .write_all(b"]\n")
            .map_err(|e| IocError::OutputWriteError { reason: e.to_string() })?;
        self.writer.flush().map_err(|e| IocError::OutputWriteError { reason: e.to_string() })?;
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ioc_core::{MatchMetadata, MatchSources, MatchTaxonomy, RuleIdentity, Taxonomy};
    use serde_json::Map;
    use std::path::PathBuf;

    fn sample_record() -> MatchRecord {
        MatchRecord {
            api: "CreateFileW".to_string(),
            attributes: Map::new(),
            rule: RuleIdentity { name: "r".to_string(), variant: None },
            metadata: MatchMetadata { version: None, authors: vec![], description: None },
            taxonomy: MatchTaxonomy { rule: Taxonomy::default(), variant: Taxonomy::default() },
            sources: MatchSources { input_path: PathBuf::from("in.json"), rule_path: PathBuf::from("r.yml") },
        }
    }

    #[test]
    fn memory_sink_collects_across_batches() {
        let mut sink = MemorySink::new();
        sink.write_batch(vec![sample_record()]).unwrap();
        sink.write_batch(vec![sample_record()]).unwrap();
        assert_eq!(sink.into_records().len(), 2);
    }

    #[test]
    fn file_sink_writes_valid_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let mut sink: Box<dyn OutputSink> = Box::new(FileSink::create(&path).unwrap());
        sink.write_batch(vec![sample_record(), sample_record()]).unwrap();
        assert!(sink.finish().unwrap().is_empty());
        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
    }
}
