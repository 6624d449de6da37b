// SPDX-FileCopyrightText: 2025 Knitli Inc. <knitli@knit.li>
// SPDX-FileContributor: Adam Poulemanos for Knitli <adam@knit.li>
// SPDX-License-Identifier: MIT OR Apache-2.0
//! The producer/consumer pipeline: one thread reads every input file
//! and pushes fixed-size chunks onto a bounded channel (the channel
//! capacity, `2 * workers`, is the backpressure knob - the producer
//! blocks once workers fall behind instead of buffering the whole
//! input in memory); a worker pool drains the channel, running every
//! rule against every entry in a chunk and forwarding match batches to
//! a single writer thread that owns the output sink.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::{bounded, unbounded};
use dashmap::DashMap;
use ioc_core::{CanonicalRule, IocError, Result};
use tracing::{debug, info, warn};

use crate::sink::OutputSink;

struct Task {
    input_path: PathBuf,
    /// Whole-file digest, computed once per input before its first chunk
    /// is produced (§4.3), carried alongside every chunk from that file
    /// so worker-side logging can tag a chunk back to its source content
    /// without re-reading or re-hashing the file.
    file_hash: Arc<str>,
    chunk: Vec<ioc_core::Entry>,
}

/// Aggregate counters and timing for one pipeline run.
#[derive(Debug, Default)]
pub struct ExecutionSummary {
    pub total_matches: u64,
    pub total_entries: u64,
    pub counts_by_rule: Vec<(String, u64)>,
    pub elapsed_secs: f64,
    /// Records handed back by the sink on close (§4.4): populated for a
    /// `MemorySink`, empty for a `FileSink`, which has already written
    /// everything to disk.
    pub matches: Vec<ioc_core::MatchRecord>,
}

/// Runs the full pipeline over `inputs` using `rules`, with `workers`
/// worker threads, writing results to `sink`. Each input carries its
/// own chunk size (the auto-tuner, or its RAM-aware fallback, may pick
/// a different size per file, §4.5) rather than one size for the whole
/// run. `cancel` is checked cooperatively between chunks so a caller
/// (e.g. a CLI handling Ctrl-C) can stop a long run early.
pub fn run(
    inputs: &[(PathBuf, usize)],
    rules: Arc<Vec<CanonicalRule>>,
    workers: usize,
    mut sink: Box<dyn OutputSink>,
    cancel: Arc<AtomicBool>,
) -> Result<ExecutionSummary> {
    let workers = workers.max(1);
    let start = Instant::now();

    let (task_tx, task_rx) = bounded::<Task>(workers * 2);
    let (result_tx, result_rx) = unbounded::<Vec<ioc_core::MatchRecord>>();
    let counts: Arc<DashMap<String, u64>> = Arc::new(DashMap::new());
    let total_entries = Arc::new(std::sync::atomic::AtomicU64::new(0));

    let producer_inputs = inputs.to_vec();
    let producer_cancel = Arc::clone(&cancel);
    let producer = std::thread::spawn(move || -> Result<()> {
        for (input_path, chunk_size) in &producer_inputs {
            if producer_cancel.load(Ordering::Relaxed) {
                break;
            }
            let file_hash: Arc<str> = match ioc_reader::file_sha256(input_path) {
                Ok(digest) => digest.into(),
                Err(e) => {
                    warn!(path = %input_path.display(), error = %e, "failed to hash input");
                    continue;
                }
            };
            debug!(path = %input_path.display(), file_hash = %file_hash, "input hashed");
            let result = ioc_reader::stream_file_chunks(input_path, *chunk_size, |chunk| {
                if producer_cancel.load(Ordering::Relaxed) {
                    return Err(IocError::WorkerTaskError {
                        path: input_path.clone(),
                        reason: "cancelled".to_string(),
                    });
                }
                task_tx
                    .send(Task { input_path: input_path.clone(), file_hash: Arc::clone(&file_hash), chunk })
                    .map_err(|_| IocError::WorkerTaskError {
                        path: input_path.clone(),
                        reason: "result channel closed".to_string(),
                    })
            });
            if let Err(e) = result {
                warn!(path = %input_path.display(), error = %e, "failed to read input");
            }
        }
        drop(task_tx);
        Ok(())
    });

    let writer = std::thread::spawn(move || -> Result<Vec<ioc_core::MatchRecord>> {
        for batch in result_rx {
            sink.write_batch(batch)?;
        }
        sink.finish()
    });

    rayon::scope(|scope| {
        for worker_id in 0..workers {
            let task_rx = task_rx.clone();
            let result_tx = result_tx.clone();
            let rules = Arc::clone(&rules);
            let counts = Arc::clone(&counts);
            let cancel = Arc::clone(&cancel);
            let total_entries = Arc::clone(&total_entries);
            scope.spawn(move |_| {
                worker_loop(worker_id, &task_rx, &result_tx, &rules, &counts, &cancel, &total_entries);
            });
        }
    });
    drop(result_tx);

    producer.join().map_err(|_| IocError::WorkerTaskError {
        path: PathBuf::new(),
        reason: "producer thread panicked".to_string(),
    })??;
    let matches = writer.join().map_err(|_| IocError::WorkerTaskError {
        path: PathBuf::new(),
        reason: "writer thread panicked".to_string(),
    })??;

    let counts_by_rule: Vec<(String, u64)> = counts.iter().map(|e| (e.key().clone(), *e.value())).collect();
    let total_matches = counts_by_rule.iter().map(|(_, c)| *c).sum();

    info!(total_matches, elapsed = ?start.elapsed(), "pipeline run complete");

    Ok(ExecutionSummary {
        total_matches,
        total_entries: total_entries.load(Ordering::Relaxed),
        counts_by_rule,
        elapsed_secs: start.elapsed().as_secs_f64(),
        matches,
    })
}

#[allow(clippy::too_many_arguments)]
fn worker_loop(
    worker_id: usize,
    task_rx: &crossbeam_channel::Receiver<Task>,
    result_tx: &crossbeam_channel::Sender<Vec<ioc_core::MatchRecord>>,
    rules: &[CanonicalRule],
    counts: &DashMap<String, u64>,
    cancel: &AtomicBool,
    total_entries: &std::sync::atomic::AtomicU64,
) {
    while let Ok(task) = task_rx.recv() {
        if cancel.load(Ordering::Relaxed) {
            break;
        }
        let mut matches = Vec::new();
        for entry in &task.chunk {
            if let Some(record) = ioc_engine::execute_first_match(entry, rules, &task.input_path) {
                *counts.entry(rule_key(&record)).or_insert(0) += 1;
                matches.push(record);
            }
        }
        total_entries.fetch_add(task.chunk.len() as u64, Ordering::Relaxed);
        debug!(
            worker_id,
            file_hash = %task.file_hash,
            entries = task.chunk.len(),
            matches = matches.len(),
            "chunk processed"
        );
        if !matches.is_empty() && result_tx.send(matches).is_err() {
            break;
        }
    }
}

fn rule_key(record: &ioc_core::MatchRecord) -> String {
    match &record.rule.variant {
        Some(variant) => format!("{}::{}", record.rule.name, variant),
        None => record.rule.name.clone(),
    }
}
