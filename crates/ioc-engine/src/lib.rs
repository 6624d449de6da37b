// SPDX-FileCopyrightText: 2025 Knitli Inc. <knitli@knit.li>
// SPDX-FileContributor: Adam Poulemanos for Knitli <adam@knit.li>
// SPDX-License-Identifier: MIT OR Apache-2.0
//! Rule engine: resolves a compiled rule's scope, evaluates its
//! predicate tree against an entry, and assembles the resulting
//! [`ioc_core::MatchRecord`].

mod engine;
mod operators;
mod selector;
mod transform;

pub use engine::{execute_all, execute_first_match, execute_rule, process_select};
pub use operators::evaluate;
pub use selector::resolve as resolve_selector;
pub use transform::apply_chain as apply_transforms;
