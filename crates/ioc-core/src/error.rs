// SPDX-FileCopyrightText: 2025 Knitli Inc. <knitli@knit.li>
// SPDX-FileContributor: Adam Poulemanos for Knitli <adam@knit.li>
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::path::PathBuf;

use thiserror::Error;

/// The crate-wide error type for the extraction pipeline.
///
/// Philosophy: compile-time strictness (bad rule documents abort the
/// load), runtime leniency (a bad entry, chunk, or selector never
/// terminates the pipeline - those paths log and carry on instead of
/// producing an `IocError`).
#[derive(Error, Debug)]
pub enum IocError {
    #[error("invalid rule format in {source_path}: {reason}")]
    InvalidRuleFormat { source_path: PathBuf, reason: String },

    #[error("failed to compile rule from {source_path}: {reason} (pattern: {pattern:?})")]
    RuleCompileError {
        source_path: PathBuf,
        reason: String,
        pattern: Option<String>,
    },

    #[error("unknown operator `{0}`")]
    UnknownOperator(String),

    #[error("cannot read input `{path}`: {source}")]
    InputReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("worker task failed on `{path}`: {reason}")]
    WorkerTaskError { path: PathBuf, reason: String },

    #[error("output sink failed: {reason}")]
    OutputWriteError { reason: String },
}

pub type Result<T> = std::result::Result<T, IocError>;
