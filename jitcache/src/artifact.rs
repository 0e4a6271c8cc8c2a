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

use bytes::BytesMut;

use crate::error::Result;

/// A compiled artifact that can be cached by the identity of its generating inputs.
pub trait JitArtifact: Send + Sync + 'static {
    /// Append the byte encoding of the artifact's generating inputs to `buf`.
    ///
    /// The encoding must be injective: artifacts compiled from different inputs
    /// must produce different keys, and recompiling the same inputs must
    /// reproduce the same key.
    fn encode_key(&self, buf: &mut BytesMut) -> Result<()>;
}
