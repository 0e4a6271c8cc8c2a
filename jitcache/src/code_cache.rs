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

use bytes::{Bytes, BytesMut};
use jitcache_memory::{LookupHint, LruCache, LruConfig, Metrics, RawCache, RawCacheConfig};

use crate::{artifact::JitArtifact, error::Result};

const DEFAULT_SHARDS: usize = 16;

/// Cache of JIT-compiled artifacts, keyed by the encoded generating inputs.
///
/// The cache holds shared ownership of its artifacts. An [`Arc`] returned by
/// [`CodeCache::lookup`] stays valid after the artifact is evicted; eviction
/// only drops the cache's own reference. Each artifact counts one charge unit
/// against the capacity, so the capacity is a bound on the artifact count.
pub struct CodeCache<A>
where
    A: JitArtifact,
{
    cache: LruCache<Bytes, Arc<A>>,
}

impl<A> Clone for CodeCache<A>
where
    A: JitArtifact,
{
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
        }
    }
}

impl<A> CodeCache<A>
where
    A: JitArtifact,
{
    /// Create a cache holding up to `capacity` artifacts.
    pub fn new(capacity: usize) -> Self {
        Self::with_shards(capacity, DEFAULT_SHARDS)
    }

    /// [`CodeCache::new`] with an explicit shard count.
    ///
    /// # Panics
    ///
    /// Panics if `shards` is zero.
    pub fn with_shards(capacity: usize, shards: usize) -> Self {
        let cache = RawCache::new(RawCacheConfig {
            capacity,
            shards,
            eviction_config: LruConfig,
            hash_builder: ahash::RandomState::default(),
            metrics: Arc::new(Metrics::new("code")),
        });

        Self { cache }
    }

    /// Compute the cache key of an artifact.
    pub fn key_for(artifact: &A) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        artifact.encode_key(&mut buf)?;
        Ok(buf.freeze())
    }

    /// Cache an artifact under the key of its generating inputs.
    ///
    /// An artifact already cached under the same key is displaced. The only
    /// failure is the artifact failing to encode its key, in which case the
    /// cache is left unchanged.
    pub fn add_entry(&self, artifact: &Arc<A>) -> Result<()> {
        let key = Self::key_for(artifact)?;
        tracing::trace!(key_len = key.len(), "caching compiled artifact");

        // The returned entry is dropped right away; the artifact is kept alive
        // by the cache's own Arc clone until it is evicted or displaced.
        let _ = self.cache.insert(key, Arc::clone(artifact), 1);

        Ok(())
    }

    /// Lookup the artifact cached under a key.
    ///
    /// A miss is a normal outcome and yields `None`. A hit promotes the
    /// artifact to most recently used.
    pub fn lookup(&self, key: &[u8]) -> Option<Arc<A>> {
        self.cache
            .get_with_hint(key, LookupHint::ExpectHit)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Count of cached artifacts.
    pub fn usage(&self) -> usize {
        self.cache.usage()
    }

    /// Maximum count of cached artifacts.
    pub fn capacity(&self) -> usize {
        self.cache.capacity()
    }
}

#[cfg(test)]
mod tests {
    use bytes::BufMut;

    use super::*;
    use crate::error::Error;

    struct Func {
        name: &'static str,
        code: Vec<u8>,
    }

    impl Func {
        fn new(name: &'static str, code: &[u8]) -> Arc<Self> {
            Arc::new(Self {
                name,
                code: code.to_vec(),
            })
        }
    }

    impl JitArtifact for Func {
        fn encode_key(&self, buf: &mut BytesMut) -> Result<()> {
            buf.put_slice(self.name.as_bytes());
            Ok(())
        }
    }

    struct Broken;

    impl JitArtifact for Broken {
        fn encode_key(&self, _: &mut BytesMut) -> Result<()> {
            Err(Error::key_encoding("unresolved symbol reference"))
        }
    }

    #[test_log::test]
    fn test_add_and_lookup_round_trip() {
        let cache = CodeCache::new(4);

        let f = Func::new("mul", b"\xf7\xe1");
        cache.add_entry(&f).unwrap();

        let found = cache.lookup(b"mul").unwrap();
        assert!(Arc::ptr_eq(&f, &found));
        assert_eq!(found.code, b"\xf7\xe1");
        assert_eq!(cache.usage(), 1);
    }

    #[test_log::test]
    fn test_lookup_miss_is_none() {
        let cache = CodeCache::<Func>::new(4);
        assert!(cache.lookup(b"missing").is_none());
    }

    #[test_log::test]
    fn test_capacity_bounds_artifact_count() {
        let cache = CodeCache::with_shards(4, 1);

        let names = ["f0", "f1", "f2", "f3", "f4", "f5", "f6", "f7", "f8", "f9"];
        for name in names {
            cache.add_entry(&Func::new(name, b"\x90")).unwrap();
        }

        assert_eq!(cache.usage(), 4);
        for name in &names[..6] {
            assert!(cache.lookup(name.as_bytes()).is_none());
        }
        for name in &names[6..] {
            assert!(cache.lookup(name.as_bytes()).is_some());
        }
    }

    #[test_log::test]
    fn test_lru_eviction_order() {
        let cache = CodeCache::with_shards(2, 1);

        cache.add_entry(&Func::new("f1", b"\x01")).unwrap();
        cache.add_entry(&Func::new("f2", b"\x02")).unwrap();
        cache.add_entry(&Func::new("f3", b"\x03")).unwrap();

        // f1 was the least recently used of the three.
        assert!(cache.lookup(b"f1").is_none());
        assert!(cache.lookup(b"f3").is_some());
        assert!(cache.lookup(b"f2").is_some());

        // f3 is now the least recently used and is the next victim.
        cache.add_entry(&Func::new("f4", b"\x04")).unwrap();
        assert!(cache.lookup(b"f3").is_none());
        assert!(cache.lookup(b"f2").is_some());
        assert!(cache.lookup(b"f4").is_some());
    }

    #[test_log::test]
    fn test_looked_up_artifact_survives_eviction() {
        let cache = CodeCache::with_shards(1, 1);

        cache.add_entry(&Func::new("hot", b"\xc3")).unwrap();
        let held = cache.lookup(b"hot").unwrap();

        cache.add_entry(&Func::new("other", b"\x90")).unwrap();
        assert!(cache.lookup(b"hot").is_none());

        // Eviction only dropped the cache's reference.
        assert_eq!(held.code, b"\xc3");
        assert_eq!(Arc::strong_count(&held), 1);
    }

    #[test_log::test]
    fn test_overwrite_same_key() {
        let cache = CodeCache::with_shards(2, 1);

        let old = Func::new("f", b"\x01");
        let unrelated = Func::new("g", b"\x02");
        cache.add_entry(&old).unwrap();
        cache.add_entry(&unrelated).unwrap();

        // Displacing a key frees its slot first, so "g" is not evicted.
        let new = Func::new("f", b"\x03");
        cache.add_entry(&new).unwrap();

        assert_eq!(cache.usage(), 2);
        assert_eq!(cache.lookup(b"f").unwrap().code, b"\x03");
        assert!(cache.lookup(b"g").is_some());

        // The cache released its reference to the displaced artifact.
        assert_eq!(Arc::strong_count(&old), 1);
    }

    #[test_log::test]
    fn test_concurrent_add_and_lookup() {
        let cache: CodeCache<Func> = CodeCache::new(64);

        let handles = (0..8usize)
            .map(|i| {
                let c = cache.clone();
                std::thread::spawn(move || {
                    let names = ["p", "q", "r", "s"];
                    for round in 0..1000 {
                        let name = names[(i + round) % names.len()];
                        match c.lookup(name.as_bytes()) {
                            Some(found) => assert_eq!(found.name, name),
                            None => c.add_entry(&Func::new(name, &[i as u8])).unwrap(),
                        }
                    }
                })
            })
            .collect::<Vec<_>>();

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(cache.usage() <= cache.capacity());
        for name in ["p", "q", "r", "s"] {
            assert!(cache.lookup(name.as_bytes()).is_some());
        }
    }

    #[test_log::test]
    fn test_add_entry_key_encoding_failure() {
        let cache = CodeCache::new(4);

        let err = cache.add_entry(&Arc::new(Broken)).unwrap_err();
        assert!(matches!(err, Error::KeyEncoding { .. }));
        assert_eq!(cache.usage(), 0);
    }
}
