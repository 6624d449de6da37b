// SPDX-FileCopyrightText: 2025 Knitli Inc. <knitli@knit.li>
// SPDX-FileContributor: Adam Poulemanos for Knitli <adam@knit.li>
// SPDX-License-Identifier: MIT OR Apache-2.0
//! Wires the rule loader, the executor's parallel pipeline, and the
//! auto-tuner into the single `ioc-extractor` binary (§6).
//!
//! Exit codes (§6): `0` on success or on a cooperative interrupt (a
//! partial result is not a failure), non-zero for an invalid rule set,
//! an unreadable input, or an output path the sink can't open.

mod cli;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use ioc_core::CanonicalRule;
use ioc_executor::{FileSink, MemorySink, OutputSink};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cli::Cli;

/// Default floor for an un-tuned chunk size (§6's `chunk_size` default).
const MIN_CHUNK_SIZE: usize = 500;
/// Target wall-clock time the RAM-aware fallback chunk size aims for.
const FALLBACK_TARGET_SECS: f64 = 1.0;

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn install_interrupt_handler(cancel: &Arc<AtomicBool>) {
    let cancel = Arc::clone(cancel);
    let _ = ctrlc::set_handler(move || {
        warn!("interrupt received, draining in-flight chunks and flushing output");
        cancel.store(true, Ordering::Relaxed);
    });
}

/// Resolves each input's chunk size when neither `--chunk-size` nor
/// `--benchmark` picked one: a RAM-aware sample-timed fallback, per
/// input (§4.5).
fn fallback_chunk_sizes(inputs: &[PathBuf], rules: &[CanonicalRule]) -> Vec<(PathBuf, usize)> {
    inputs
        .iter()
        .map(|path| {
            let size = ioc_autotune::compute_chunk_size(path, rules, MIN_CHUNK_SIZE, FALLBACK_TARGET_SECS)
                .unwrap_or(MIN_CHUNK_SIZE);
            (path.clone(), size)
        })
        .collect()
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let rules = ioc_rules::load_rules(&cli.patterns).context("failed to load rule set")?;
    info!(rule_count = rules.len(), "rules loaded");

    // A plain dry run (no `--benchmark`) has nothing further to compute:
    // report the loaded rule set and stop. A benchmarked dry run instead
    // falls through to the auto-tuner below and exits right after it,
    // since "exits after auto-tuning" (§6) is the point of combining the
    // two flags - the operator wants the tuned summary table without
    // committing to a full run.
    if cli.dry_run && !cli.benchmark {
        for rule in &rules {
            info!(name = %rule.name, variant = ?rule.variant(), source = %rule.source.display(), "rule would run");
        }
        println!("{} rule(s) loaded from {} path(s); dry run, no input scanned", rules.len(), cli.patterns.len());
        return Ok(ExitCode::SUCCESS);
    }

    let rules = Arc::new(rules);
    let mut workers = ioc_executor::detect_workers(cli.threads);

    // Resolving chunk sizes: an explicit `--chunk-size` wins outright;
    // otherwise `--benchmark` grid-searches per input and also picks
    // the worker count; absent both, each input falls back to its own
    // RAM-aware sample-timed size (§4.4, §4.5, §6).
    let sized_inputs: Vec<(PathBuf, usize)> = if let Some(explicit) = cli.chunk_size {
        cli.inputs.iter().map(|path| (path.clone(), explicit)).collect()
    } else if cli.benchmark {
        let thread_candidates: Vec<usize> = [1, 2, 4, workers].into_iter().filter(|n| *n > 0).collect();
        let chunk_candidates = vec![MIN_CHUNK_SIZE, MIN_CHUNK_SIZE * 2, MIN_CHUNK_SIZE * 4];
        let tuned = ioc_autotune::auto_tune(&cli.inputs, &rules, &thread_candidates, &chunk_candidates, cli.benchmark_sample_size)
            .context("auto-tune failed")?;
        workers = tuned.threads;
        info!(threads = workers, "auto-tune selected worker count");
        cli.inputs
            .iter()
            .map(|path| (path.clone(), tuned.chunk_sizes.get(path).copied().unwrap_or(MIN_CHUNK_SIZE)))
            .collect()
    } else {
        fallback_chunk_sizes(&cli.inputs, &rules)
    };

    if cli.dry_run {
        println!(
            "auto-tune selected {workers} worker(s); dry run, no input scanned (see log for per-file chunk sizes)"
        );
        return Ok(ExitCode::SUCCESS);
    }

    let cancel = Arc::new(AtomicBool::new(false));
    install_interrupt_handler(&cancel);

    let writing_to_file = cli.output.is_some();
    let sink: Box<dyn OutputSink> = match &cli.output {
        Some(path) => Box::new(FileSink::create(path).context("failed to open output file")?),
        None => Box::new(MemorySink::new()),
    };

    let summary = ioc_executor::run(&sized_inputs, Arc::clone(&rules), workers, sink, Arc::clone(&cancel))
        .context("pipeline execution failed")?;

    for (name, count) in &summary.counts_by_rule {
        info!(rule = name, matches = count, "rule fired");
    }
    if cancel.load(Ordering::Relaxed) {
        warn!(total_matches = summary.total_matches, total_entries = summary.total_entries, "run interrupted; returning partial results");
    } else {
        info!(total_matches = summary.total_matches, total_entries = summary.total_entries, "run complete");
    }

    if writing_to_file {
        println!("wrote {} match(es) across {} entries to {}", summary.total_matches, summary.total_entries, cli.output.unwrap().display());
    } else {
        let rendered = serde_json::to_string_pretty(&summary.matches).context("failed to render match records")?;
        println!("{rendered}");
        eprintln!("{} match(es) across {} entries", summary.total_matches, summary.total_entries);
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
