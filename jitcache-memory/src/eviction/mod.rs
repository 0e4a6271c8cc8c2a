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

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};

use crate::{
    code::{Key, Value},
    record::Record,
};

/// Config trait for an eviction policy.
pub trait EvictionConfig: Send + Sync + 'static + Clone + Serialize + DeserializeOwned + Default {}
impl<T> EvictionConfig for T where T: Send + Sync + 'static + Clone + Serialize + DeserializeOwned + Default {}

/// Operation the policy performs when a record is acquired or released by a cache entry.
///
/// The flavor decides which lock the cache takes on the shard before applying the op.
pub enum Op<E>
where
    E: Eviction,
{
    /// Do nothing.
    Noop,
    /// Operation that requires an immutable reference to the policy.
    Immutable(Box<dyn Fn(&E, &Arc<Record<E>>) + Send + Sync + 'static>),
    /// Operation that requires a mutable reference to the policy.
    Mutable(Box<dyn FnMut(&mut E, &Arc<Record<E>>) + Send + Sync + 'static>),
}

impl<E> Op<E>
where
    E: Eviction,
{
    /// No-op.
    pub fn noop() -> Self {
        Self::Noop
    }

    /// Op with an immutable reference to the policy.
    pub fn immutable<F>(f: F) -> Self
    where
        F: Fn(&E, &Arc<Record<E>>) + Send + Sync + 'static,
    {
        Self::Immutable(Box::new(f))
    }

    /// Op with a mutable reference to the policy.
    pub fn mutable<F>(f: F) -> Self
    where
        F: FnMut(&mut E, &Arc<Record<E>>) + Send + Sync + 'static,
    {
        Self::Mutable(Box::new(f))
    }
}

/// Eviction policy of a cache shard.
///
/// The policy owns the membership of every record it tracks via the record's
/// intrusive link; record policy state behind [`Record::state`] is only accessed
/// with the owning shard locked.
pub trait Eviction: Send + Sync + 'static + Sized {
    /// Policy config type.
    type Config: EvictionConfig;
    /// Cache key type.
    type Key: Key;
    /// Cache value type.
    type Value: Value;
    /// Per-record policy state type.
    type State: Default + Send + Sync + 'static;

    /// Create a policy instance for a shard with the given capacity slice.
    fn new(capacity: usize, config: &Self::Config) -> Self;

    /// Track a record.
    ///
    /// The record must not be tracked by the policy.
    fn push(&mut self, record: Arc<Record<Self>>);

    /// Untrack and return the next record to evict, if any record is evictable.
    fn pop(&mut self) -> Option<Arc<Record<Self>>>;

    /// Untrack a record.
    ///
    /// The record must be tracked by the policy.
    fn remove(&mut self, record: &Arc<Record<Self>>);

    /// Untrack all records.
    fn clear(&mut self);

    /// Op to apply when a record is acquired by a cache entry.
    fn acquire() -> Op<Self>;

    /// Op to apply when a record loses its last outstanding cache entry.
    fn release() -> Op<Self>;
}

pub mod lru;

#[cfg(test)]
pub mod test_utils;
