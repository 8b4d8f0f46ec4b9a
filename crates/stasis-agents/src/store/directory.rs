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

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use stasis_core::store::{SnapshotStore, StoreError};

use crate::store::sanitize_key;

/// A snapshot store backed by one file per key inside a directory.
///
/// Blobs survive the process, so a snapshot parked before a process restart
/// is still there afterwards. Keys are sanitized into file names; the blob
/// bytes are written verbatim.
#[derive(Debug)]
pub struct DirectoryStore {
    dir: PathBuf,
}

impl DirectoryStore {
    /// Creates a store rooted at `dir`. The directory is created lazily on
    /// the first `put`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory this store writes into.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.blob", sanitize_key(key)))
    }
}

impl SnapshotStore for DirectoryStore {
    fn put(&mut self, key: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| StoreError::new(e.to_string()))?;
        fs::write(self.path_for(key), bytes).map_err(|e| StoreError::new(e.to_string()))
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::new(e.to_string())),
        }
    }

    fn take(&mut self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let bytes = self.get(key)?;
        if bytes.is_some() {
            self.remove(key)?;
        }
        Ok(bytes)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::new(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blobs_survive_a_new_store_over_the_same_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DirectoryStore::new(dir.path());
        store.put("stasis.pending_restore", vec![7; 32]).unwrap();

        // A fresh store over the same directory sees the blob.
        let mut reopened = DirectoryStore::new(dir.path());
        assert_eq!(
            reopened.take("stasis.pending_restore").unwrap(),
            Some(vec![7; 32])
        );
        assert_eq!(reopened.get("stasis.pending_restore").unwrap(), None);
    }

    #[test]
    fn keys_are_sanitized_into_file_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DirectoryStore::new(dir.path());
        store.put("stasis.rescue/odd key", vec![1]).unwrap();

        assert_eq!(store.get("stasis.rescue/odd key").unwrap(), Some(vec![1]));
        let entries: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, vec!["stasis.rescue_odd_key.blob".to_string()]);
    }
}
