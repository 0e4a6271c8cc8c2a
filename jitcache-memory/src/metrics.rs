// Copyright 2025 jitcache Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::Debug;

use metrics::{counter, gauge, Counter, Gauge};

/// Per-cache metric handles, labelled with the cache name.
///
/// The `speculative_*` counters are bumped instead of `hit`/`miss` when a lookup
/// carries the [`crate::LookupHint::Speculative`] hint, so that probe lookups do
/// not skew the expected hit rate.
#[derive(Clone)]
pub struct Metrics {
    /// Inserts of a non-resident key.
    pub insert: Counter,
    /// Inserts displacing a resident key.
    pub replace: Counter,
    /// Lookup hits.
    pub hit: Counter,
    /// Lookup misses.
    pub miss: Counter,
    /// Lookup hits with the speculative hint.
    pub speculative_hit: Counter,
    /// Lookup misses with the speculative hint.
    pub speculative_miss: Counter,
    /// Records evicted to make room.
    pub evict: Counter,
    /// Records removed by key, including clears.
    pub remove: Counter,
    /// Records released by their last outstanding entry.
    pub release: Counter,

    /// Total charge of the resident records.
    pub usage: Gauge,
}

impl Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish()
    }
}

impl Metrics {
    /// Register the metric handles for a cache with the given name.
    pub fn new(name: &str) -> Self {
        let op =
            |op: &'static str| counter!("jitcache_memory_op_total", "name" => name.to_string(), "op" => op);

        Self {
            insert: op("insert"),
            replace: op("replace"),
            hit: op("hit"),
            miss: op("miss"),
            speculative_hit: op("speculative_hit"),
            speculative_miss: op("speculative_miss"),
            evict: op("evict"),
            remove: op("remove"),
            release: op("release"),
            usage: gauge!("jitcache_memory_usage", "name" => name.to_string()),
        }
    }

    /// Metric handles that record nothing. For tests and benches.
    pub fn noop() -> Self {
        Self {
            insert: Counter::noop(),
            replace: Counter::noop(),
            hit: Counter::noop(),
            miss: Counter::noop(),
            speculative_hit: Counter::noop(),
            speculative_miss: Counter::noop(),
            evict: Counter::noop(),
            remove: Counter::noop(),
            release: Counter::noop(),
            usage: Gauge::noop(),
        }
    }
}
