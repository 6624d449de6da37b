// SPDX-FileCopyrightText: 2025 Knitli Inc. <knitli@knit.li>
// SPDX-FileContributor: Adam Poulemanos for Knitli <adam@knit.li>
// SPDX-License-Identifier: MIT OR Apache-2.0
//! Streaming, encoding-tolerant reading of the JSON-array input format
//! (§4.3): Latin-1 transcoding so malformed input never aborts parsing,
//! fixed-size chunk accumulation, and whole-file SHA-256 hashing.

mod chunks;
mod latin1;
mod reader;
mod sha;

pub use chunks::stream_chunks;
pub use latin1::Latin1Reader;
pub use reader::{sample_entries, stream_file_chunks};
pub use sha::file_sha256;
