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

use std::{
    cell::UnsafeCell,
    fmt::Debug,
    sync::atomic::{AtomicU64, AtomicUsize, Ordering},
};

use bitflags::bitflags;
use intrusive_collections::LinkedListAtomicLink;

use crate::eviction::Eviction;

bitflags! {
    /// Atomic record state flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct Flags: u64 {
        /// The record is resident, reachable by lookup.
        const IN_INDEXER = 0b00000001;
        /// The record is tracked by the eviction policy.
        const IN_EVICTION = 0b00000010;
    }
}

/// Release callback of a cache record.
///
/// Invoked exactly once with the owned key and value when the record is no longer
/// resident and the last reference to it is released. For values whose `Drop` impl
/// already performs the release, no deleter is needed.
pub type Deleter<K, V> = Box<dyn FnOnce(K, V) + Send + 'static>;

/// Data of a cache record.
pub struct Data<E>
where
    E: Eviction,
{
    /// Record key.
    pub key: E::Key,
    /// Record value.
    pub value: E::Value,
    /// Hash of the record key.
    pub hash: u64,
    /// Charge against the cache capacity.
    pub charge: usize,
    /// Optional release callback.
    pub deleter: Option<Deleter<E::Key, E::Value>>,
}

/// [`Record`] holds the information of a cached entry.
pub struct Record<E>
where
    E: Eviction,
{
    data: Option<Data<E>>,
    /// Intrusive link shared by the eviction policy lists.
    ///
    /// A record is linked into at most one list at a time.
    pub(crate) link: LinkedListAtomicLink,
    state: UnsafeCell<E::State>,
    refs: AtomicUsize,
    flags: AtomicU64,
}

unsafe impl<E> Send for Record<E> where E: Eviction {}
unsafe impl<E> Sync for Record<E> where E: Eviction {}

impl<E> Debug for Record<E>
where
    E: Eviction,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("Record");
        if let Some(data) = self.data.as_ref() {
            s.field("hash", &data.hash);
        }
        s.finish()
    }
}

impl<E> Drop for Record<E>
where
    E: Eviction,
{
    fn drop(&mut self) {
        if let Some(data) = self.data.take() {
            if let Some(deleter) = data.deleter {
                deleter(data.key, data.value);
            }
        }
    }
}

impl<E> Record<E>
where
    E: Eviction,
{
    /// Create a record with data.
    pub fn new(data: Data<E>) -> Self {
        Record {
            data: Some(data),
            link: LinkedListAtomicLink::default(),
            state: Default::default(),
            refs: AtomicUsize::new(0),
            flags: AtomicU64::new(0),
        }
    }

    /// Get the immutable reference of the record key.
    pub fn key(&self) -> &E::Key {
        &self.data.as_ref().unwrap().key
    }

    /// Get the immutable reference of the record value.
    pub fn value(&self) -> &E::Value {
        &self.data.as_ref().unwrap().value
    }

    /// Get the record hash.
    pub fn hash(&self) -> u64 {
        self.data.as_ref().unwrap().hash
    }

    /// Get the record charge against the shard capacity.
    pub fn charge(&self) -> usize {
        self.data.as_ref().unwrap().charge
    }

    /// Get the record state wrapped with [`UnsafeCell`].
    ///
    /// The state must only be accessed with the owning shard locked.
    pub fn state(&self) -> &UnsafeCell<E::State> {
        &self.state
    }

    /// Set in eviction flag.
    pub fn set_in_eviction(&self, val: bool) {
        self.set_flags(Flags::IN_EVICTION, val, Ordering::Release);
    }

    /// Get in eviction flag.
    pub fn is_in_eviction(&self) -> bool {
        self.get_flags(Flags::IN_EVICTION, Ordering::Acquire)
    }

    /// Set in indexer flag.
    ///
    /// A record with the flag set is resident: it is reachable by lookup and
    /// counted against the shard capacity.
    pub fn set_in_indexer(&self, val: bool) {
        self.set_flags(Flags::IN_INDEXER, val, Ordering::Release);
    }

    /// Get in indexer flag.
    pub fn is_in_indexer(&self) -> bool {
        self.get_flags(Flags::IN_INDEXER, Ordering::Acquire)
    }

    /// Set the record atomic flags.
    pub fn set_flags(&self, flags: Flags, val: bool, order: Ordering) {
        match val {
            true => self.flags.fetch_or(flags.bits(), order),
            false => self.flags.fetch_and(!flags.bits(), order),
        };
    }

    /// Get the record atomic flags.
    pub fn get_flags(&self, flags: Flags, order: Ordering) -> bool {
        self.flags.load(order) & flags.bits() == flags.bits()
    }

    /// Get the atomic reference count.
    ///
    /// The count covers outstanding cache entries only; residency is tracked by
    /// the `IN_INDEXER` flag.
    pub fn refs(&self) -> usize {
        self.refs.load(Ordering::Acquire)
    }

    /// Increase the atomic reference count.
    ///
    /// This function returns the new reference count after the op.
    pub fn inc_refs(&self, val: usize) -> usize {
        let old = self.refs.fetch_add(val, Ordering::SeqCst);
        tracing::trace!(
            "[record]: inc record (hash: {}) refs: {} => {}",
            self.hash(),
            old,
            old + val
        );
        old + val
    }

    /// Decrease the atomic reference count.
    ///
    /// This function returns the new reference count after the op.
    pub fn dec_refs(&self, val: usize) -> usize {
        let old = self.refs.fetch_sub(val, Ordering::SeqCst);
        tracing::trace!(
            "[record]: dec record (hash: {}) refs: {} => {}",
            self.hash(),
            old,
            old - val
        );
        old - val
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;
    use crate::eviction::lru::Lru;

    fn record(deleter: Option<Deleter<u64, u64>>) -> Record<Lru<u64, u64>> {
        Record::new(Data {
            key: 1,
            value: 42,
            hash: 1,
            charge: 1,
            deleter,
        })
    }

    #[test]
    fn test_record_refs() {
        let r = record(None);
        assert_eq!(r.refs(), 0);
        assert_eq!(r.inc_refs(2), 2);
        assert_eq!(r.dec_refs(1), 1);
        assert_eq!(r.dec_refs(1), 0);
    }

    #[test]
    fn test_record_deleter_fires_on_drop() {
        let fired = Arc::new(AtomicUsize::new(0));
        let f = fired.clone();
        let r = record(Some(Box::new(move |key, value| {
            assert_eq!(key, 1);
            assert_eq!(value, 42);
            f.fetch_add(1, Ordering::SeqCst);
        })));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        drop(r);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
