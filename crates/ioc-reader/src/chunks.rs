// SPDX-FileCopyrightText: 2025 Knitli Inc. <knitli@knit.li>
// SPDX-FileContributor: Adam Poulemanos for Knitli <adam@knit.li>
// SPDX-License-Identifier: MIT OR Apache-2.0
//! Incremental top-level-JSON-array parsing (§4.3): the input is one
//! big `[ ... ]` of entries, which we never materialize in full. We
//! drive `serde_json`'s own `Deserializer::deserialize_seq` with a
//! `Visitor` that pulls elements one at a time via `SeqAccess` and
//! flushes a fixed-size `Vec<Entry>` chunk to the caller as soon as it
//! fills, the way `estuary-flow`'s JSON format parser drives
//! `serde_json::de::Deserializer` directly over a buffered reader
//! instead of collecting a `Vec<Value>` up front.

use std::fmt;
use std::io::Read;

use ioc_core::{Entry, IocError, Result};
use serde::de::{Deserializer as _, SeqAccess, Visitor};

struct ChunkVisitor<'a, F> {
    chunk_size: usize,
    on_chunk: &'a mut F,
}

impl<'de, 'a, F> Visitor<'de> for ChunkVisitor<'a, F>
where
    F: FnMut(Vec<Entry>) -> Result<()>,
{
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a JSON array of entries")
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut buf = Vec::with_capacity(self.chunk_size);
        while let Some(entry) = seq.next_element::<Entry>()? {
            buf.push(entry);
            if buf.len() >= self.chunk_size {
                let full = std::mem::replace(&mut buf, Vec::with_capacity(self.chunk_size));
                (self.on_chunk)(full).map_err(serde::de::Error::custom)?;
            }
        }
        if !buf.is_empty() {
            (self.on_chunk)(buf).map_err(serde::de::Error::custom)?;
        }
        Ok(())
    }
}

/// Parses `reader` as a top-level JSON array, invoking `on_chunk` with
/// each `chunk_size`-sized batch of entries as soon as it fills, plus a
/// final partial batch if one remains. Chunk boundaries never split an
/// entry.
pub fn stream_chunks<R, F>(reader: R, chunk_size: usize, mut on_chunk: F) -> Result<()>
where
    R: Read,
    F: FnMut(Vec<Entry>) -> Result<()>,
{
    let chunk_size = chunk_size.max(1);
    let mut de = serde_json::Deserializer::from_reader(reader);
    de.deserialize_seq(ChunkVisitor { chunk_size, on_chunk: &mut on_chunk })
        .map_err(|e| IocError::WorkerTaskError {
            path: std::path::PathBuf::new(),
            reason: format!("JSON array parse error: {e}"),
        })
}
