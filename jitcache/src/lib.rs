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

//! Content-addressed cache for JIT-compiled artifacts.
//!
//! Compiling is expensive, so compiled artifacts are cached under a byte key
//! encoding the inputs they were generated from. Recompiling the same inputs
//! reproduces the same key and hits the cache instead.
//!
//! ```
//! use std::sync::Arc;
//!
//! use bytes::BytesMut;
//! use jitcache::{CodeCache, JitArtifact, Result};
//!
//! struct Module {
//!     ir_digest: [u8; 8],
//! }
//!
//! impl JitArtifact for Module {
//!     fn encode_key(&self, buf: &mut BytesMut) -> Result<()> {
//!         buf.extend_from_slice(&self.ir_digest);
//!         Ok(())
//!     }
//! }
//!
//! let cache = CodeCache::new(1024);
//! let module = Arc::new(Module { ir_digest: [7; 8] });
//! cache.add_entry(&module)?;
//!
//! let key = CodeCache::key_for(&*module)?;
//! assert!(cache.lookup(&key).is_some());
//! # Ok::<(), jitcache::Error>(())
//! ```

mod artifact;
mod code_cache;
mod error;

pub use artifact::JitArtifact;
pub use code_cache::CodeCache;
pub use error::{Error, Result};
