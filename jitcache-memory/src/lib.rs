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

//! Sharded, capacity-bounded in-memory cache with pluggable eviction.
//!
//! The cache keys shared ownership of its records through [`RawCacheEntry`]
//! handles: a record with outstanding handles is pinned and never evicted, and
//! its value stays valid after eviction or removal until the last handle is
//! dropped. Because of that, the total charge may transiently exceed the
//! configured capacity while every resident record is pinned.
//!
//! [`LruCache`] is the strict least-recently-used instantiation.

mod assert;
pub mod code;
pub mod eviction;
mod indexer;
mod metrics;
mod raw;
pub mod record;

pub use eviction::lru::{Lru, LruConfig};
pub use metrics::Metrics;
pub use raw::{LookupHint, RawCache, RawCacheConfig, RawCacheEntry};
pub use record::Deleter;

/// Cache with the strict LRU eviction algorithm.
pub type LruCache<K, V, S = ahash::RandomState> = RawCache<Lru<K, V>, S>;
/// Entry of [`LruCache`].
pub type LruCacheEntry<K, V, S = ahash::RandomState> = RawCacheEntry<Lru<K, V>, S>;
