// SPDX-FileCopyrightText: 2025 Knitli Inc. <knitli@knit.li>
// SPDX-FileContributor: Adam Poulemanos for Knitli <adam@knit.li>
// SPDX-License-Identifier: MIT OR Apache-2.0
//! Parallel producer/consumer execution of a compiled rule set over a
//! set of input files (§4.4).

mod executor;
mod heuristics;
mod sink;

pub use executor::{run, ExecutionSummary};
pub use heuristics::detect_workers;
pub use sink::{FileSink, MemorySink, OutputSink};
