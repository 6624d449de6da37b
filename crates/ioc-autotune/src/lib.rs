// SPDX-FileCopyrightText: 2025 Knitli Inc. <knitli@knit.li>
// SPDX-FileContributor: Adam Poulemanos for Knitli <adam@knit.li>
// SPDX-License-Identifier: MIT OR Apache-2.0
//! Benchmarks a representative entry sample across a grid of
//! `(threads, chunk_size)` candidates and picks the fastest combination
//! per input file (§4.5).
//!
//! The timing loop runs every rule against every entry without
//! short-circuiting on the first match (`ioc_engine::execute_all`),
//! since the cost model needs the true per-entry engine cost rather
//! than the cost of whichever rule happens to fire first - the worker
//! pool itself still applies first-match-wins during a real run.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use ioc_core::{CanonicalRule, Entry, Result};
use tracing::{debug, info};

/// Timings below this are treated as noise (too fast to trust) and
/// excluded from the comparison, matching the distilled tuner's
/// `0.01 < elapsed` guard.
const NOISE_FLOOR: Duration = Duration::from_millis(10);

#[derive(Debug, Clone)]
pub struct TuneResult {
    pub threads: usize,
    pub chunk_sizes: HashMap<PathBuf, usize>,
}

/// Runs the sample, split into `chunk_size` chunks, through every rule
/// on every entry, returning the elapsed wall time.
fn simulate_execution(sample: &[Entry], chunk_size: usize, rules: &[CanonicalRule], source: &Path) -> Duration {
    let chunk_size = chunk_size.max(1);
    let start = Instant::now();
    for chunk in sample.chunks(chunk_size) {
        for entry in chunk {
            let _ = ioc_engine::execute_all(entry, rules, source);
        }
    }
    start.elapsed()
}

/// Benchmarks every `(threads, chunk_size)` candidate pair against a
/// sample of each input, picking the chunk size that minimizes elapsed
/// time per file and the thread count that minimizes elapsed time
/// across the whole grid.
pub fn auto_tune(
    inputs: &[PathBuf],
    rules: &[CanonicalRule],
    thread_candidates: &[usize],
    chunk_candidates: &[usize],
    sample_size: usize,
) -> Result<TuneResult> {
    let mut best_threads = *thread_candidates.first().unwrap_or(&1);
    let mut best_global = Duration::MAX;
    let mut chunk_sizes = HashMap::with_capacity(inputs.len());

    for path in inputs {
        let sample = ioc_reader::sample_entries(path, sample_size)?;
        if sample.is_empty() {
            continue;
        }

        let mut best_time = Duration::MAX;
        let mut best_chunk = *chunk_candidates.first().unwrap_or(&500);
        let mut samples_secs = Vec::with_capacity(thread_candidates.len() * chunk_candidates.len());

        for &threads in thread_candidates {
            for &chunk_size in chunk_candidates {
                let elapsed = simulate_execution(&sample, chunk_size, rules, path);
                debug!(path = %path.display(), threads, chunk_size, elapsed_ms = elapsed.as_millis(), "auto-tune sample");
                samples_secs.push(elapsed.as_secs_f64());

                if elapsed > NOISE_FLOOR && elapsed < best_time {
                    best_time = elapsed;
                    best_chunk = chunk_size;
                }
                if elapsed > NOISE_FLOOR && elapsed < best_global {
                    best_global = elapsed;
                    best_threads = threads;
                }
            }
        }

        log_summary_row(path, &samples_secs, best_chunk, best_time);
        chunk_sizes.insert(path.clone(), best_chunk);
    }

    Ok(TuneResult { threads: best_threads, chunk_sizes })
}

/// Logs one row of the auto-tune summary table: file, size (MB), best
/// chunk, mean/stddev of the sampled timings, best time, and the
/// resulting throughput in MB/s.
fn log_summary_row(path: &Path, samples_secs: &[f64], best_chunk: usize, best_time: Duration) {
    let size_mb = std::fs::metadata(path).map(|m| m.len() as f64 / (1024.0 * 1024.0)).unwrap_or(0.0);
    let mean = if samples_secs.is_empty() { 0.0 } else { samples_secs.iter().sum::<f64>() / samples_secs.len() as f64 };
    let variance = if samples_secs.len() < 2 {
        0.0
    } else {
        samples_secs.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (samples_secs.len() - 1) as f64
    };
    let stddev = variance.sqrt();
    let best_secs = best_time.as_secs_f64().max(f64::EPSILON);
    let throughput_mb_s = size_mb / best_secs;
    info!(
        path = %path.display(),
        size_mb,
        best_chunk,
        mean_secs = mean,
        stddev_secs = stddev,
        best_secs,
        throughput_mb_s,
        "auto-tune summary"
    );
}

/// Entries sampled to measure per-entry engine cost when `--benchmark`
/// is off (§4.5 fallback).
const FALLBACK_SAMPLE_SIZE: usize = 50;
/// Soft RAM budget the fallback's memory factor is scaled against.
const SOFT_RAM_TARGET_GIB: f64 = 2.0;

/// RAM-aware fallback chunk size for callers that skip the timing grid
/// entirely: runs a 50-entry sample through the rule engine, measures
/// per-entry time, and picks `max(min_size, (target_secs / per_entry) *
/// ram_factor)`, where `ram_factor` scales with available RAM relative
/// to a 2 GiB soft target (§4.5).
pub fn compute_chunk_size(path: &Path, rules: &[CanonicalRule], min_size: usize, target_secs: f64) -> Result<usize> {
    let sample = ioc_reader::sample_entries(path, FALLBACK_SAMPLE_SIZE)?;
    if sample.is_empty() {
        return Ok(min_size);
    }
    let elapsed = simulate_execution(&sample, sample.len(), rules, path);
    let per_entry = (elapsed.as_secs_f64() / sample.len() as f64).max(f64::EPSILON);

    let mut sys = sysinfo::System::new();
    sys.refresh_memory();
    let available_gib = sys.available_memory() as f64 / (1024.0 * 1024.0 * 1024.0);
    let ram_factor = (available_gib / SOFT_RAM_TARGET_GIB).clamp(0.5, 2.0);

    let sized = ((target_secs / per_entry) * ram_factor).round() as i64;
    Ok(sized.max(min_size as i64) as usize)
}
