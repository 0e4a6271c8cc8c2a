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

use thiserror::Error;

/// Error type of the artifact cache.
///
/// Cache misses are not errors; lookups report them as `None`.
#[derive(Error, Debug)]
pub enum Error {
    /// An artifact failed to encode its cache key.
    #[error("key encoding failed: {reason}")]
    KeyEncoding {
        /// What went wrong while encoding.
        reason: String,
    },
}

impl Error {
    /// Create a [`Error::KeyEncoding`] error.
    pub fn key_encoding(reason: impl Into<String>) -> Self {
        Self::KeyEncoding { reason: reason.into() }
    }
}

/// Result type of the artifact cache.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::key_encoding("unresolved symbol reference");
        assert_eq!(e.to_string(), "key encoding failed: unresolved symbol reference");
    }
}
