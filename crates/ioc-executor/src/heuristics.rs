// SPDX-FileCopyrightText: 2025 Knitli Inc. <knitli@knit.li>
// SPDX-FileContributor: Adam Poulemanos for Knitli <adam@knit.li>
// SPDX-License-Identifier: MIT OR Apache-2.0
//! Worker-count heuristic used when the caller doesn't pin a value
//! explicitly (§4.4). The chunk-size fallback lives in `ioc-autotune`
//! instead, since it needs the rule engine and a reader sample -
//! resources this crate's callers already hold when they need it.

use sysinfo::System;

/// `requested`, if positive, wins outright. Otherwise: CPU count minus
/// the 1-minute load average, floored at 1.
#[must_use]
pub fn detect_workers(requested: Option<usize>) -> usize {
    if let Some(n) = requested {
        if n > 0 {
            return n;
        }
    }
    let cpus = num_cpus::get();
    let load = System::load_average().one;
    let busy = load.floor() as usize;
    cpus.saturating_sub(busy).max(1)
}
