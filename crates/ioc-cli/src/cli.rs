// SPDX-FileCopyrightText: 2025 Knitli Inc. <knitli@knit.li>
// SPDX-FileContributor: Adam Poulemanos for Knitli <adam@knit.li>
// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command-line configuration surface (§6): a single `clap`-derived
//! struct covers every knob the engine exposes, since the tool is
//! driven entirely by flags and no config file format is introduced.

use std::path::PathBuf;

use clap::Parser;

/// Extracts indicators of compromise from JSON entry streams using a
/// directory (or file) of YAML rule documents.
#[derive(Debug, Parser)]
#[command(name = "ioc-extractor", version, about)]
pub struct Cli {
    /// Input JSON files to scan (each a top-level array of entries).
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Rule files or directories of `.yml`/`.yaml` rule documents.
    #[arg(short = 'p', long = "patterns", required = true)]
    pub patterns: Vec<PathBuf>,

    /// Write matches to this file as a streamed JSON array instead of
    /// collecting them in memory.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Worker thread count. 0 or unset auto-detects from CPU count and
    /// load average.
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Entries per chunk handed to a worker. Unset runs the auto-tuner
    /// (or, with `--benchmark` off and no prior tuning, a RAM-aware
    /// fallback heuristic).
    #[arg(short = 'c', long)]
    pub chunk_size: Option<usize>,

    /// Benchmark thread/chunk-size candidates before running, instead
    /// of using `--threads`/`--chunk-size` directly.
    #[arg(long)]
    pub benchmark: bool,

    /// Entries sampled per input when `--benchmark` is set.
    #[arg(long, default_value_t = 20_000)]
    pub benchmark_sample_size: usize,

    /// Load and validate rules and report what would run, without
    /// scanning any input.
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity: unset is quiet, `-v` logs a run
    /// summary, `-vv` logs per-entry/per-rule detail.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}
