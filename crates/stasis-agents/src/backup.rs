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

//! Container backups: the recovery backstop for a restore gone wrong.
//!
//! Restoration destroys the originals before rebuilding them and does not
//! roll back on failure, so the surrounding workflow writes a copy of every
//! loaded container to a recovery directory before each simulation run. The
//! backups are human-readable RON so they can be inspected by hand.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use stasis_data::stage::Stage;
use stasis_lanes::encode;

use crate::store::sanitize_key;

/// Writes per-container recovery snapshots into a directory.
pub struct BackupWriter {
    dir: PathBuf,
}

impl BackupWriter {
    /// Creates a writer targeting `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory backups are written into.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Captures every loaded container of `stage` into one RON file each,
    /// clearing the previous backup set first. Returns the number of
    /// containers written.
    pub fn write_all(&self, stage: &Stage) -> anyhow::Result<usize> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating backup directory {}", self.dir.display()))?;

        // Only the latest backup set is kept.
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                fs::remove_file(entry.path())?;
            }
        }

        let mut written = 0;
        for container in stage.loaded_container_paths() {
            let roots = stage
                .container_roots(&container)
                .map(|roots| roots.to_vec())
                .unwrap_or_default();
            let snapshot = encode(stage, &roots);
            let text = ron::ser::to_string_pretty(&snapshot, ron::ser::PrettyConfig::default())
                .with_context(|| format!("serializing backup of container '{container}'"))?;

            let file = self.dir.join(format!("{}.ron", sanitize_key(&container)));
            fs::write(&file, text)
                .with_context(|| format!("writing backup file {}", file.display()))?;
            written += 1;
        }

        log::info!(
            "backed up {written} containers to {}",
            self.dir.display()
        );
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_one_file_per_loaded_container_and_clears_old_ones() {
        let dir = tempfile::tempdir().unwrap();
        let writer = BackupWriter::new(dir.path());

        let mut stage = Stage::new();
        stage.add_container("world/main");
        stage.add_container("world/annex");
        stage.add_container("world/unloaded");
        stage.set_container_loaded("world/unloaded", false);
        stage.create_node("world/main", "a").unwrap();
        stage.create_node("world/annex", "b").unwrap();

        // A stale file from a previous run must disappear.
        fs::write(dir.path().join("stale.ron"), "()").unwrap();

        let written = writer.write_all(&stage).unwrap();
        assert_eq!(written, 2);

        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["world_annex.ron", "world_main.ron"]);

        let text = fs::read_to_string(dir.path().join("world_main.ron")).unwrap();
        assert!(text.contains("nodes"), "backup should be readable RON");
    }
}
