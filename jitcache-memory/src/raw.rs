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

use std::{fmt::Debug, hash::Hash, ops::Deref, sync::Arc};

use equivalent::Equivalent;
use itertools::Itertools;
use parking_lot::RwLock;

use crate::{
    code::HashBuilder,
    eviction::{Eviction, Op},
    indexer::HashTableIndexer,
    metrics::Metrics,
    record::{Data, Deleter, Record},
    strict_assert,
};

/// Caller expectation attached to a lookup.
///
/// The hint only selects which hit/miss counters are bumped. It never affects
/// the lookup result or the eviction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupHint {
    /// The caller expects the key to be resident.
    #[default]
    ExpectHit,
    /// The caller is probing and a miss is unremarkable.
    Speculative,
}

/// Config of the sharded cache.
pub struct RawCacheConfig<E, S>
where
    E: Eviction,
    S: HashBuilder,
{
    /// Total capacity in charge units, split over the shards.
    pub capacity: usize,
    /// Shard count, must be non-zero.
    pub shards: usize,
    /// Eviction policy config.
    pub eviction_config: E::Config,
    /// Hash builder used for both shard selection and the shard index.
    pub hash_builder: S,
    /// Metric handles, typically [`Metrics::new`] with the cache name.
    pub metrics: Arc<Metrics>,
}

struct RawCacheShard<E>
where
    E: Eviction,
{
    eviction: E,
    indexer: HashTableIndexer<E>,

    usage: usize,
    capacity: usize,

    metrics: Arc<Metrics>,
}

impl<E> RawCacheShard<E>
where
    E: Eviction,
{
    /// Evict records until the usage fits the target, or nothing evictable remains.
    fn evict(&mut self, target: usize, garbage: &mut Vec<Arc<Record<E>>>) {
        while self.usage > target {
            let evicted = match self.eviction.pop() {
                Some(evicted) => evicted,
                None => break,
            };
            self.metrics.evict.increment(1);

            let e = self.indexer.remove(evicted.hash(), evicted.key()).unwrap();
            assert_eq!(Arc::as_ptr(&evicted), Arc::as_ptr(&e));

            strict_assert!(!evicted.is_in_indexer());
            strict_assert!(!evicted.is_in_eviction());

            self.usage -= evicted.charge();
            self.metrics.usage.decrement(evicted.charge() as f64);

            garbage.push(evicted);
        }
    }

    fn emplace(&mut self, record: Arc<Record<E>>, garbage: &mut Vec<Arc<Record<E>>>) {
        // Displace the resident record for the key first, so that its charge
        // does not count against the room being made for the new one.
        if let Some(old) = self.indexer.remove(record.hash(), record.key()) {
            self.metrics.replace.increment(1);

            if old.is_in_eviction() {
                self.eviction.remove(&old);
            }
            strict_assert!(!old.is_in_indexer());
            strict_assert!(!old.is_in_eviction());

            self.usage -= old.charge();
            self.metrics.usage.decrement(old.charge() as f64);

            garbage.push(old);
        } else {
            self.metrics.insert.increment(1);
        }

        let charge = record.charge();

        // The shard may transiently exceed its capacity if every resident
        // record is pinned.
        self.evict(self.capacity.saturating_sub(charge), garbage);

        let displaced = self.indexer.insert(record.clone());
        strict_assert!(displaced.is_none());
        strict_assert!(record.is_in_indexer());

        self.eviction.push(record.clone());
        strict_assert!(record.is_in_eviction());

        self.usage += charge;
        self.metrics.usage.increment(charge as f64);

        // The entry handed back to the caller pins the record until dropped.
        record.inc_refs(1);
        self.acquire_mutable(&record);
    }

    fn remove<Q>(&mut self, hash: u64, key: &Q) -> Option<Arc<Record<E>>>
    where
        Q: Hash + Equivalent<E::Key> + ?Sized,
    {
        let record = self.indexer.remove(hash, key)?;

        if record.is_in_eviction() {
            self.eviction.remove(&record);
        }
        strict_assert!(!record.is_in_indexer());
        strict_assert!(!record.is_in_eviction());

        self.usage -= record.charge();

        self.metrics.remove.increment(1);
        self.metrics.usage.decrement(record.charge() as f64);

        record.inc_refs(1);

        Some(record)
    }

    fn get_noop<Q>(&self, hash: u64, key: &Q, hint: LookupHint) -> Option<Arc<Record<E>>>
    where
        Q: Hash + Equivalent<E::Key> + ?Sized,
    {
        self.get_inner(hash, key, hint)
    }

    fn get_immutable<Q>(&self, hash: u64, key: &Q, hint: LookupHint) -> Option<Arc<Record<E>>>
    where
        Q: Hash + Equivalent<E::Key> + ?Sized,
    {
        self.get_inner(hash, key, hint)
            .inspect(|record| self.acquire_immutable(record))
    }

    fn get_mutable<Q>(&mut self, hash: u64, key: &Q, hint: LookupHint) -> Option<Arc<Record<E>>>
    where
        Q: Hash + Equivalent<E::Key> + ?Sized,
    {
        self.get_inner(hash, key, hint)
            .inspect(|record| self.acquire_mutable(record))
    }

    fn get_inner<Q>(&self, hash: u64, key: &Q, hint: LookupHint) -> Option<Arc<Record<E>>>
    where
        Q: Hash + Equivalent<E::Key> + ?Sized,
    {
        let record = match self.indexer.get(hash, key).cloned() {
            Some(record) => {
                match hint {
                    LookupHint::ExpectHit => self.metrics.hit.increment(1),
                    LookupHint::Speculative => self.metrics.speculative_hit.increment(1),
                }
                record
            }
            None => {
                match hint {
                    LookupHint::ExpectHit => self.metrics.miss.increment(1),
                    LookupHint::Speculative => self.metrics.speculative_miss.increment(1),
                }
                return None;
            }
        };

        strict_assert!(record.is_in_indexer());

        record.inc_refs(1);

        Some(record)
    }

    fn clear(&mut self, garbage: &mut Vec<Arc<Record<E>>>) {
        let records = self.indexer.drain().collect_vec();
        self.eviction.clear();

        self.metrics.remove.increment(records.len() as u64);
        self.metrics.usage.decrement(self.usage as f64);
        self.usage = 0;

        for record in records {
            strict_assert!(!record.is_in_indexer());
            strict_assert!(!record.is_in_eviction());

            garbage.push(record);
        }
    }

    fn acquire_immutable(&self, record: &Arc<Record<E>>) {
        match E::acquire() {
            Op::Immutable(f) => f(&self.eviction, record),
            _ => unreachable!(),
        }
    }

    fn acquire_mutable(&mut self, record: &Arc<Record<E>>) {
        match E::acquire() {
            Op::Noop => {}
            Op::Immutable(f) => f(&self.eviction, record),
            Op::Mutable(mut f) => f(&mut self.eviction, record),
        }
    }

    fn release_immutable(&self, record: &Arc<Record<E>>) {
        match E::release() {
            Op::Immutable(f) => f(&self.eviction, record),
            _ => unreachable!(),
        }
    }

    fn release_mutable(&mut self, record: &Arc<Record<E>>) {
        match E::release() {
            Op::Noop => {}
            Op::Immutable(f) => f(&self.eviction, record),
            Op::Mutable(mut f) => f(&mut self.eviction, record),
        }
    }
}

struct RawCacheInner<E, S>
where
    E: Eviction,
    S: HashBuilder,
{
    shards: Vec<RwLock<RawCacheShard<E>>>,

    capacity: usize,

    hash_builder: Arc<S>,
    metrics: Arc<Metrics>,
}

impl<E, S> RawCacheInner<E, S>
where
    E: Eviction,
    S: HashBuilder,
{
    fn clear(&self) {
        let mut garbage = vec![];

        self.shards
            .iter()
            .for_each(|shard| shard.write().clear(&mut garbage));

        // Deallocate records outside the lock critical sections.
        drop(garbage);
    }
}

impl<E, S> Drop for RawCacheInner<E, S>
where
    E: Eviction,
    S: HashBuilder,
{
    fn drop(&mut self) {
        self.clear();
    }
}

/// Sharded, capacity-bounded, in-memory cache.
///
/// Every operation is a short critical section under one shard's lock; nothing
/// blocks and nothing fails. Entries returned by [`RawCache::insert`] and
/// [`RawCache::get`] pin the underlying record: a pinned record is never
/// evicted, and its value stays valid until the last entry referring to it is
/// dropped, whether or not the record is still resident.
pub struct RawCache<E, S>
where
    E: Eviction,
    S: HashBuilder,
{
    inner: Arc<RawCacheInner<E, S>>,
}

impl<E, S> Clone for RawCache<E, S>
where
    E: Eviction,
    S: HashBuilder,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E, S> RawCache<E, S>
where
    E: Eviction,
    S: HashBuilder,
{
    /// Create a cache from the config.
    ///
    /// # Panics
    ///
    /// Panics if the configured shard count is zero.
    pub fn new(config: RawCacheConfig<E, S>) -> Self {
        assert!(config.shards > 0, "shards must be greater than zero.");

        let shards = (0..config.shards)
            .map(|index| Self::shard_capacity_for(config.capacity, config.shards, index))
            .map(|shard_capacity| RawCacheShard {
                eviction: E::new(shard_capacity, &config.eviction_config),
                indexer: HashTableIndexer::default(),
                usage: 0,
                capacity: shard_capacity,
                metrics: config.metrics.clone(),
            })
            .map(RwLock::new)
            .collect_vec();

        let inner = RawCacheInner {
            shards,
            capacity: config.capacity,
            hash_builder: Arc::new(config.hash_builder),
            metrics: config.metrics,
        };

        Self { inner: Arc::new(inner) }
    }

    /// Insert a key value pair into the cache, returning an entry pinning the new record.
    ///
    /// The resident record for the key, if any, is displaced first. Afterwards
    /// unpinned records are evicted in least-recently-used order until the
    /// shard usage fits its capacity or nothing evictable remains.
    pub fn insert(&self, key: E::Key, value: E::Value, charge: usize) -> RawCacheEntry<E, S> {
        self.insert_inner(key, value, charge, None)
    }

    /// [`RawCache::insert`] with a release callback.
    ///
    /// The deleter runs exactly once, when the record is no longer resident and
    /// the last entry referring to it has been dropped.
    pub fn insert_with_deleter(
        &self,
        key: E::Key,
        value: E::Value,
        charge: usize,
        deleter: Deleter<E::Key, E::Value>,
    ) -> RawCacheEntry<E, S> {
        self.insert_inner(key, value, charge, Some(deleter))
    }

    fn insert_inner(
        &self,
        key: E::Key,
        value: E::Value,
        charge: usize,
        deleter: Option<Deleter<E::Key, E::Value>>,
    ) -> RawCacheEntry<E, S> {
        let hash = self.inner.hash_builder.hash_one(&key);
        let record = Arc::new(Record::new(Data {
            key,
            value,
            hash,
            charge,
            deleter,
        }));

        let mut garbage = vec![];

        self.inner.shards[self.shard(hash)]
            .write()
            .emplace(record.clone(), &mut garbage);

        // Deallocate displaced and evicted records outside the lock critical section.
        drop(garbage);

        RawCacheEntry {
            inner: self.inner.clone(),
            record,
        }
    }

    /// Lookup with [`LookupHint::ExpectHit`].
    pub fn get<Q>(&self, key: &Q) -> Option<RawCacheEntry<E, S>>
    where
        Q: Hash + Equivalent<E::Key> + ?Sized,
    {
        self.get_with_hint(key, LookupHint::ExpectHit)
    }

    /// Lookup the resident record for a key.
    ///
    /// A hit pins the record and returns an entry for it. A miss returns
    /// `None`; it is a normal outcome, not an error.
    pub fn get_with_hint<Q>(&self, key: &Q, hint: LookupHint) -> Option<RawCacheEntry<E, S>>
    where
        Q: Hash + Equivalent<E::Key> + ?Sized,
    {
        let hash = self.inner.hash_builder.hash_one(key);

        let record = match E::acquire() {
            Op::Noop => self.inner.shards[self.shard(hash)].read().get_noop(hash, key, hint),
            Op::Immutable(_) => self.inner.shards[self.shard(hash)]
                .read()
                .get_immutable(hash, key, hint),
            Op::Mutable(_) => self.inner.shards[self.shard(hash)]
                .write()
                .get_mutable(hash, key, hint),
        }?;

        Some(RawCacheEntry {
            inner: self.inner.clone(),
            record,
        })
    }

    /// Evict the resident record for a key, if any.
    ///
    /// The returned entry keeps the removed record alive until dropped;
    /// entries obtained before the removal stay valid either way.
    pub fn remove<Q>(&self, key: &Q) -> Option<RawCacheEntry<E, S>>
    where
        Q: Hash + Equivalent<E::Key> + ?Sized,
    {
        let hash = self.inner.hash_builder.hash_one(key);

        let record = self.inner.shards[self.shard(hash)].write().remove(hash, key)?;

        Some(RawCacheEntry {
            inner: self.inner.clone(),
            record,
        })
    }

    /// Check whether the cache holds a resident record for a key, without promoting it.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        Q: Hash + Equivalent<E::Key> + ?Sized,
    {
        let hash = self.inner.hash_builder.hash_one(key);

        self.inner.shards[self.shard(hash)]
            .read()
            .indexer
            .get(hash, key)
            .is_some()
    }

    /// Evict all records.
    pub fn clear(&self) {
        self.inner.clear();
    }

    /// Total capacity in charge units.
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Total charge of the resident records.
    pub fn usage(&self) -> usize {
        self.inner.shards.iter().map(|shard| shard.read().usage).sum()
    }

    /// Shard count.
    pub fn shards(&self) -> usize {
        self.inner.shards.len()
    }

    /// Metric handles of the cache.
    pub fn metrics(&self) -> &Metrics {
        &self.inner.metrics
    }

    fn shard(&self, hash: u64) -> usize {
        hash as usize % self.inner.shards.len()
    }

    fn shard_capacity_for(total: usize, shards: usize, index: usize) -> usize {
        let base = total / shards;
        let remainder = total % shards;
        base + usize::from(index < remainder)
    }
}

/// Entry of the sharded cache, one unit of shared ownership over a record.
///
/// Dropping the entry releases the unit; when the last entry of a resident
/// record is dropped, the record rejoins the evictable order.
pub struct RawCacheEntry<E, S>
where
    E: Eviction,
    S: HashBuilder,
{
    inner: Arc<RawCacheInner<E, S>>,
    record: Arc<Record<E>>,
}

impl<E, S> Debug for RawCacheEntry<E, S>
where
    E: Eviction,
    S: HashBuilder,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawCacheEntry").field("record", &self.record).finish()
    }
}

impl<E, S> Drop for RawCacheEntry<E, S>
where
    E: Eviction,
    S: HashBuilder,
{
    fn drop(&mut self) {
        if self.record.dec_refs(1) == 0 {
            self.inner.metrics.release.increment(1);

            let shard = &self.inner.shards[self.record.hash() as usize % self.inner.shards.len()];
            match E::release() {
                Op::Noop => {}
                Op::Immutable(_) => shard.read().release_immutable(&self.record),
                Op::Mutable(_) => shard.write().release_mutable(&self.record),
            }
        }
    }
}

impl<E, S> Clone for RawCacheEntry<E, S>
where
    E: Eviction,
    S: HashBuilder,
{
    fn clone(&self) -> Self {
        self.record.inc_refs(1);
        Self {
            inner: self.inner.clone(),
            record: self.record.clone(),
        }
    }
}

impl<E, S> Deref for RawCacheEntry<E, S>
where
    E: Eviction,
    S: HashBuilder,
{
    type Target = E::Value;

    fn deref(&self) -> &Self::Target {
        self.value()
    }
}

unsafe impl<E, S> Send for RawCacheEntry<E, S>
where
    E: Eviction,
    S: HashBuilder,
{
}

unsafe impl<E, S> Sync for RawCacheEntry<E, S>
where
    E: Eviction,
    S: HashBuilder,
{
}

impl<E, S> RawCacheEntry<E, S>
where
    E: Eviction,
    S: HashBuilder,
{
    /// Hash of the entry key.
    pub fn hash(&self) -> u64 {
        self.record.hash()
    }

    /// Key of the entry.
    pub fn key(&self) -> &E::Key {
        self.record.key()
    }

    /// Value of the entry.
    pub fn value(&self) -> &E::Value {
        self.record.value()
    }

    /// Charge of the entry against the cache capacity.
    pub fn charge(&self) -> usize {
        self.record.charge()
    }

    /// Count of outstanding entries over the same record, this one included.
    pub fn refs(&self) -> usize {
        self.record.refs()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        hash::{BuildHasher, Hasher},
        sync::atomic::{AtomicUsize, Ordering},
    };

    use rand::{rngs::SmallRng, RngCore, SeedableRng};

    use super::*;
    use crate::eviction::lru::{Lru, LruConfig};

    /// Identity-ish hasher so that tests can steer keys to shards.
    #[derive(Debug, Default)]
    struct ModHasher {
        state: u64,
    }

    impl Hasher for ModHasher {
        fn finish(&self) -> u64 {
            self.state
        }

        fn write(&mut self, bytes: &[u8]) {
            for byte in bytes {
                self.state = (self.state << 8) + *byte as u64;
            }
        }

        fn write_u64(&mut self, i: u64) {
            self.write(&i.to_be_bytes())
        }
    }

    impl BuildHasher for ModHasher {
        type Hasher = Self;

        fn build_hasher(&self) -> Self::Hasher {
            Self::default()
        }
    }

    type TestCache = RawCache<Lru<u64, u64>, ModHasher>;

    fn cache_for_test(capacity: usize, shards: usize) -> TestCache {
        RawCache::new(RawCacheConfig {
            capacity,
            shards,
            eviction_config: LruConfig,
            hash_builder: ModHasher::default(),
            metrics: Arc::new(Metrics::noop()),
        })
    }

    fn is_send_sync_static<T: Send + Sync + 'static>() {}

    #[test]
    fn test_send_sync_static() {
        is_send_sync_static::<TestCache>();
        is_send_sync_static::<RawCacheEntry<Lru<u64, u64>, ModHasher>>();
    }

    #[test_log::test]
    fn test_insert_get_remove() {
        let cache = cache_for_test(4, 1);

        let e = cache.insert(1, 100, 1);
        assert_eq!(*e, 100);
        assert_eq!(e.key(), &1);
        assert_eq!(e.charge(), 1);
        drop(e);

        assert_eq!(cache.usage(), 1);
        assert!(cache.contains(&1));

        let e = cache.get(&1).unwrap();
        assert_eq!(e.value(), &100);
        drop(e);

        assert!(cache.get(&2).is_none());

        let e = cache.remove(&1).unwrap();
        assert_eq!(*e, 100);
        drop(e);
        assert_eq!(cache.usage(), 0);
        assert!(cache.get(&1).is_none());
        assert!(cache.remove(&1).is_none());
    }

    #[test_log::test]
    fn test_lru_eviction_order() {
        let cache = cache_for_test(3, 1);

        cache.insert(0, 0, 1);
        cache.insert(1, 1, 1);
        cache.insert(2, 2, 1);
        assert_eq!(cache.usage(), 3);

        // Promote 0, leaving 1 as the least recently used.
        cache.get(&0).unwrap();

        cache.insert(3, 3, 1);
        assert_eq!(cache.usage(), 3);
        assert!(cache.get(&1).is_none());
        assert!(cache.get(&0).is_some());
        assert!(cache.get(&2).is_some());
        assert!(cache.get(&3).is_some());
    }

    #[test_log::test]
    fn test_replace_does_not_evict_others() {
        let cache = cache_for_test(2, 1);

        cache.insert(1, 1, 1);
        cache.insert(2, 2, 1);
        assert_eq!(cache.usage(), 2);

        // Replacing a resident key frees its charge first, so no other record
        // is evicted to make room.
        cache.insert(2, 22, 1);
        assert_eq!(cache.usage(), 2);
        assert_eq!(*cache.get(&1).unwrap(), 1);
        assert_eq!(*cache.get(&2).unwrap(), 22);
    }

    #[test_log::test]
    fn test_pinned_record_survives_eviction_pressure() {
        let cache = cache_for_test(2, 1);

        let e1 = cache.insert(1, 1, 1);
        cache.insert(2, 2, 1);
        cache.insert(3, 3, 1);

        // 2 was the only evictable record.
        assert!(cache.get(&2).is_none());
        assert!(cache.get(&3).is_some());
        assert_eq!(*e1, 1);
        assert!(cache.get(&1).is_some());

        // Once released, 1 rejoins the LRU order at the most-recently-used end.
        drop(e1);
        cache.insert(4, 4, 1);
        assert!(cache.get(&3).is_none());
        assert!(cache.get(&1).is_some());
        assert!(cache.get(&4).is_some());
    }

    #[test_log::test]
    fn test_charge_weighted_eviction() {
        let cache = cache_for_test(10, 1);

        cache.insert(1, 1, 4);
        cache.insert(2, 2, 4);
        assert_eq!(cache.usage(), 8);

        // An oversized record evicts as much as needed.
        cache.insert(3, 3, 8);
        assert_eq!(cache.usage(), 8);
        assert!(cache.get(&1).is_none());
        assert!(cache.get(&2).is_none());
        assert!(cache.get(&3).is_some());
    }

    #[test_log::test]
    fn test_deleter_runs_once_after_last_release() {
        let fired = Arc::new(AtomicUsize::new(0));

        let cache = cache_for_test(4, 1);

        let f = fired.clone();
        let e = cache.insert_with_deleter(1, 1, 1, Box::new(move |_, _| {
            f.fetch_add(1, Ordering::SeqCst);
        }));

        let removed = cache.remove(&1).unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        drop(removed);
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        // The last entry over the non-resident record drops it.
        drop(e);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test_log::test]
    fn test_deleter_runs_on_eviction() {
        let fired = Arc::new(AtomicUsize::new(0));

        let cache = cache_for_test(2, 1);

        let f = fired.clone();
        cache.insert_with_deleter(1, 1, 1, Box::new(move |_, _| {
            f.fetch_add(1, Ordering::SeqCst);
        }));

        cache.insert(2, 2, 1);
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        cache.insert(3, 3, 1);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test_log::test]
    fn test_clear() {
        let cache = cache_for_test(4, 2);

        for i in 0..4 {
            cache.insert(i, i, 1);
        }
        assert_eq!(cache.usage(), 4);

        cache.clear();
        assert_eq!(cache.usage(), 0);
        for i in 0..4 {
            assert!(cache.get(&i).is_none());
        }
    }

    #[test]
    fn test_capacity_distribution_without_loss() {
        let cache = cache_for_test(3, 2);

        for key in 0..3 {
            let entry = cache.insert(key, key, 1);
            drop(entry);
        }

        assert_eq!(cache.usage(), 3);

        for key in 0..3 {
            let entry = cache.get(&key).expect("entry should exist");
            assert_eq!(*entry, key);
            drop(entry);
        }
    }

    #[test]
    fn test_capacity_distribution_with_more_shards_than_capacity() {
        let cache = cache_for_test(2, 4);

        for key in 0..2 {
            let entry = cache.insert(key, key, 1);
            drop(entry);
        }

        assert_eq!(cache.usage(), 2);

        for key in 0..2 {
            let entry = cache.get(&key).expect("entry should exist");
            assert_eq!(*entry, key);
            drop(entry);
        }

        assert!(cache.get(&2).is_none());
    }

    #[test_log::test]
    fn test_fuzzy() {
        let cache = cache_for_test(256, 4);

        let handles = (0..8)
            .map(|i| {
                let c = cache.clone();
                std::thread::spawn(move || {
                    let mut rng = SmallRng::seed_from_u64(i);
                    for _ in 0..100000 {
                        let key = rng.next_u64();
                        if let Some(entry) = c.get(&key) {
                            assert_eq!(key, *entry);
                            drop(entry);
                            continue;
                        }
                        c.insert(key, key, 1);
                    }
                })
            })
            .collect_vec();

        handles.into_iter().for_each(|handle| handle.join().unwrap());

        assert_eq!(cache.usage(), cache.capacity());
    }
}
