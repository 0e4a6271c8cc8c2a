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

use intrusive_collections::{intrusive_adapter, LinkedList, LinkedListAtomicLink};
use serde::{Deserialize, Serialize};

use super::{Eviction, Op};
use crate::{
    code::{Key, Value},
    record::Record,
    strict_assert,
};

/// Strict LRU eviction algorithm config.
///
/// The algorithm has no tunables: victims are taken from the
/// least-recently-used end, pinned records are never victims.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LruConfig;

/// Strict LRU eviction algorithm state.
#[derive(Debug, Default)]
pub struct LruState {
    is_pinned: bool,
}

intrusive_adapter! { Adapter<K, V> = Arc<Record<Lru<K, V>>>: Record<Lru<K, V>> { link: LinkedListAtomicLink } where K: Key, V: Value }

/// Strict LRU eviction algorithm.
///
/// Records with outstanding cache entries are parked on a separate pin list and
/// never surface from [`Eviction::pop`]. A record released back by its last
/// cache entry rejoins the LRU list at the most-recently-used end.
pub struct Lru<K, V>
where
    K: Key,
    V: Value,
{
    /// Evictable records, head is the least recently used.
    list: LinkedList<Adapter<K, V>>,
    /// Records pinned by outstanding cache entries.
    pin_list: LinkedList<Adapter<K, V>>,
}

impl<K, V> Eviction for Lru<K, V>
where
    K: Key,
    V: Value,
{
    type Config = LruConfig;
    type Key = K;
    type Value = V;
    type State = LruState;

    fn new(_capacity: usize, _config: &Self::Config) -> Self {
        Self {
            list: LinkedList::new(Adapter::new()),
            pin_list: LinkedList::new(Adapter::new()),
        }
    }

    fn push(&mut self, record: Arc<Record<Self>>) {
        let state = unsafe { &mut *record.state().get() };

        strict_assert!(!record.link.is_linked());
        strict_assert!(!state.is_pinned);

        record.set_in_eviction(true);
        self.list.push_back(record);
    }

    fn pop(&mut self) -> Option<Arc<Record<Self>>> {
        let record = self.list.pop_front()?;

        let state = unsafe { &mut *record.state().get() };
        strict_assert!(!record.link.is_linked());
        strict_assert!(!state.is_pinned);

        record.set_in_eviction(false);

        Some(record)
    }

    fn remove(&mut self, record: &Arc<Record<Self>>) {
        let state = unsafe { &mut *record.state().get() };

        strict_assert!(record.link.is_linked());

        if state.is_pinned {
            unsafe { self.pin_list.cursor_mut_from_ptr(Arc::as_ptr(record)) }
                .remove()
                .unwrap();
            state.is_pinned = false;
        } else {
            unsafe { self.list.cursor_mut_from_ptr(Arc::as_ptr(record)) }
                .remove()
                .unwrap();
        }

        strict_assert!(!record.link.is_linked());

        record.set_in_eviction(false);
    }

    fn clear(&mut self) {
        while self.pop().is_some() {}

        // Unlink pinned records to prevent a leak via the intrusive adapter.
        while let Some(record) = self.pin_list.pop_front() {
            let state = unsafe { &mut *record.state().get() };
            strict_assert!(state.is_pinned);
            state.is_pinned = false;
            record.set_in_eviction(false);
        }

        assert!(self.list.is_empty());
        assert!(self.pin_list.is_empty());
    }

    fn acquire() -> Op<Self> {
        Op::mutable(|this: &mut Self, record| {
            if !record.is_in_eviction() {
                return;
            }

            let state = unsafe { &mut *record.state().get() };
            strict_assert!(record.link.is_linked());

            if state.is_pinned {
                return;
            }

            // Pin the record by moving it to the pin list.
            let r = unsafe { this.list.cursor_mut_from_ptr(Arc::as_ptr(record)) }
                .remove()
                .unwrap();
            this.pin_list.push_back(r);

            state.is_pinned = true;
        })
    }

    fn release() -> Op<Self> {
        Op::mutable(|this: &mut Self, record| {
            if !record.is_in_eviction() {
                return;
            }

            let state = unsafe { &mut *record.state().get() };
            strict_assert!(record.link.is_linked());

            if !state.is_pinned {
                return;
            }

            // A concurrent lookup may have re-pinned the record between the
            // reference count reaching zero and the shard lock being taken.
            if record.refs() > 0 {
                return;
            }

            // Unpin the record by moving it back to the most-recently-used end.
            let r = unsafe { this.pin_list.cursor_mut_from_ptr(Arc::as_ptr(record)) }
                .remove()
                .unwrap();
            this.list.push_back(r);

            state.is_pinned = false;
        })
    }
}
