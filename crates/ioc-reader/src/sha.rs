// SPDX-FileCopyrightText: 2025 Knitli Inc. <knitli@knit.li>
// SPDX-FileContributor: Adam Poulemanos for Knitli <adam@knit.li>
// SPDX-License-Identifier: MIT OR Apache-2.0
//! Whole-file SHA-256, hashed once per input before chunking starts
//! (§4.3): a cheap fingerprint for a run's output metadata, computed in
//! fixed-size blocks so it never loads the file into memory at once.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use ioc_core::{IocError, Result};
use sha2::{Digest, Sha256};

const BLOCK_SIZE: usize = 8 * 1024;

/// Hashes `path`'s contents in 8 KiB blocks, returning the lowercase
/// hex digest.
pub fn file_sha256(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|source| IocError::InputReadError { path: path.to_path_buf(), source })?;
    let mut hasher = Sha256::new();
    let mut block = [0u8; BLOCK_SIZE];
    loop {
        let n = file
            .read(&mut block)
            .map_err(|source| IocError::InputReadError { path: path.to_path_buf(), source })?;
        if n == 0 {
            break;
        }
        hasher.update(&block[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
