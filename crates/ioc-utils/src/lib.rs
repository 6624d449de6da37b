// SPDX-FileCopyrightText: 2025 Knitli Inc. <knitli@knit.li>
// SPDX-FileContributor: Adam Poulemanos for Knitli <adam@knit.li>
// SPDX-License-Identifier: MIT OR Apache-2.0
//! Hash map and set aliases used across the extraction pipeline.
//!
//! Thread uses [`rapidhash::RapidHashMap`] and [`rapidhash::RapidHashSet`] as
//! stand-ins for `std::collections::HashMap` and `std::collections::HashSet`
//! (they ARE the standard collections, just with the
//! [`rapidhash::fast::RandomState`] hash builder). For the extraction
//! engine's workloads - per-rule counters, taxonomy dedup - it's fast and
//! sufficiently collision-resistant with a random seed.

use rapidhash::fast::RandomState;

/// A type alias for [`rapidhash::RapidHashMap`].
pub type RapidMap<K, V> = rapidhash::RapidHashMap<K, V>;
/// A type alias for [`rapidhash::RapidHashSet`].
pub type RapidSet<T> = rapidhash::RapidHashSet<T>;

/// Creates a new `RapidMap` with the specified capacity.
#[inline]
#[must_use]
pub fn map_with_capacity<K, V>(capacity: usize) -> RapidMap<K, V>
where
    K: std::hash::Hash + Eq,
{
    RapidMap::with_capacity_and_hasher(capacity, RandomState::default())
}

/// Creates a new `RapidSet` with the specified capacity.
#[inline]
#[must_use]
pub fn set_with_capacity<T>(capacity: usize) -> RapidSet<T>
where
    T: std::hash::Hash + Eq,
{
    RapidSet::with_capacity_and_hasher(capacity, RandomState::default())
}

/// Order-preserving deduplication of a list of strings.
///
/// Used to merge rule/variant taxonomy lists (`categories`, `tags`,
/// `attck`, `mbcs`) without disturbing authoring order.
#[must_use]
pub fn dedup_preserve_order(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = set_with_capacity::<String>(0);
    let mut out = Vec::new();
    for item in items {
        if seen.insert(item.clone()) {
            out.push(item);
        }
    }
    out
}
