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

use std::{hash::Hash, sync::Arc};

use equivalent::Equivalent;
use hashbrown::hash_table::{Entry as HashTableEntry, HashTable};

use crate::{eviction::Eviction, record::Record, strict_assert};

/// Resident record index of a cache shard.
///
/// The indexer maintains the `IN_INDEXER` residency flag of every record that
/// passes through it: a record is resident exactly while the indexer holds it.
pub struct HashTableIndexer<E>
where
    E: Eviction,
{
    table: HashTable<Arc<Record<E>>>,
}

unsafe impl<E> Send for HashTableIndexer<E> where E: Eviction {}
unsafe impl<E> Sync for HashTableIndexer<E> where E: Eviction {}

impl<E> Default for HashTableIndexer<E>
where
    E: Eviction,
{
    fn default() -> Self {
        Self {
            table: Default::default(),
        }
    }
}

impl<E> HashTableIndexer<E>
where
    E: Eviction,
{
    /// Index a record, returning the displaced resident record for the same key, if any.
    pub fn insert(&mut self, mut record: Arc<Record<E>>) -> Option<Arc<Record<E>>> {
        strict_assert!(!record.is_in_indexer());
        record.set_in_indexer(true);

        match self
            .table
            .entry(record.hash(), |r| r.key() == record.key(), |r| r.hash())
        {
            HashTableEntry::Occupied(mut o) => {
                std::mem::swap(o.get_mut(), &mut record);
                strict_assert!(record.is_in_indexer());
                record.set_in_indexer(false);
                Some(record)
            }
            HashTableEntry::Vacant(v) => {
                v.insert(record);
                None
            }
        }
    }

    /// Get the resident record for a key, if any.
    pub fn get<Q>(&self, hash: u64, key: &Q) -> Option<&Arc<Record<E>>>
    where
        Q: Hash + Equivalent<E::Key> + ?Sized,
    {
        self.table.find(hash, |r| key.equivalent(r.key())).inspect(|r| {
            strict_assert!(r.is_in_indexer());
        })
    }

    /// Unindex and return the resident record for a key, if any.
    pub fn remove<Q>(&mut self, hash: u64, key: &Q) -> Option<Arc<Record<E>>>
    where
        Q: Hash + Equivalent<E::Key> + ?Sized,
    {
        match self.table.entry(hash, |r| key.equivalent(r.key()), |r| r.hash()) {
            HashTableEntry::Occupied(o) => {
                let (r, _) = o.remove();
                strict_assert!(r.is_in_indexer());
                r.set_in_indexer(false);
                Some(r)
            }
            HashTableEntry::Vacant(_) => None,
        }
    }

    /// Unindex all records.
    pub fn drain(&mut self) -> impl Iterator<Item = Arc<Record<E>>> + '_ {
        self.table.drain().inspect(|r| {
            strict_assert!(r.is_in_indexer());
            r.set_in_indexer(false);
        })
    }
}
