// Copyright 2025 the Stasis authors
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

//! The keyed blob-store contract used to persist snapshots across a
//! simulation boundary.
//!
//! The persistence layer treats a stored snapshot as an opaque byte blob
//! under a well-known key; the store's own format is unspecified. Backends
//! live with the orchestration layer.

use std::fmt;

/// An error raised by a [`SnapshotStore`] backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError(String);

impl StoreError {
    /// Wraps a backend-specific failure message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Snapshot store failure: {}", self.0)
    }
}

impl std::error::Error for StoreError {}

/// A keyed store for opaque snapshot blobs.
///
/// Implementations must guarantee that a `put` followed by a `get`/`take` of
/// the same key returns the identical bytes. Keys are short identifier-like
/// strings chosen by the caller.
pub trait SnapshotStore {
    /// Stores `bytes` under `key`, replacing any previous value.
    fn put(&mut self, key: &str, bytes: Vec<u8>) -> Result<(), StoreError>;

    /// Returns the bytes stored under `key`, if any, leaving them in place.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Removes and returns the bytes stored under `key`, if any.
    fn take(&mut self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Removes the value stored under `key`. Removing an absent key is not
    /// an error.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}
