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

use std::collections::HashMap;

use stasis_core::store::{SnapshotStore, StoreError};

/// An in-memory snapshot store.
///
/// Sufficient when the process hosting the stage outlives the whole
/// snapshot/restore cycle; use [`DirectoryStore`](crate::store::DirectoryStore)
/// when the blob must survive the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    /// Creates an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of stored blobs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the store holds nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SnapshotStore for MemoryStore {
    fn put(&mut self, key: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), bytes);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn take(&mut self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.remove(key))
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_take_round_trip() {
        let mut store = MemoryStore::new();
        store.put("a", vec![1, 2, 3]).unwrap();

        assert_eq!(store.get("a").unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(store.take("a").unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(store.take("a").unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn removing_an_absent_key_is_fine() {
        let mut store = MemoryStore::new();
        assert!(store.remove("missing").is_ok());
    }
}
