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

//! Change detection between a stored snapshot and the current live state.
//!
//! Restoring is far more expensive than comparing, so the orchestration
//! layer checks for differences first and skips the restore when nothing
//! happened. The check is a full re-encode plus value equality — O(size of
//! the hierarchy), which is acceptable at a mode-transition boundary; no
//! structural diff is needed because the only action on "changed" is
//! "restore everything".

use stasis_core::NodeId;
use stasis_data::snapshot::Snapshot;
use stasis_data::stage::Stage;

use crate::capture_lane::encode;

/// Re-encodes `selection` and compares it against `stored`.
///
/// Returns `true` if the live state differs from the snapshot. The
/// comparison is full value equality; the snapshots' capture ids are
/// ignored.
pub fn has_changes(stage: &Stage, stored: &Snapshot, selection: &[NodeId]) -> bool {
    let fresh = encode(stage, selection);
    fresh != *stored
}

#[cfg(test)]
mod tests {
    use super::*;
    use stasis_core::math::Vec3;

    #[test]
    fn unchanged_stage_reports_no_changes() {
        let mut stage = Stage::new();
        stage.add_container("c");
        let root = stage.create_node("c", "root").unwrap();
        let child = stage.create_node("c", "child").unwrap();
        stage.set_parent(child, Some(root));

        let stored = encode(&stage, &[root]);
        assert!(!has_changes(&stage, &stored, &[root]));
    }

    #[test]
    fn field_edits_are_detected() {
        let mut stage = Stage::new();
        stage.add_container("c");
        let root = stage.create_node("c", "root").unwrap();

        let stored = encode(&stage, &[root]);
        stage.node_mut(root).unwrap().spatial_mut().translation = Vec3::new(1.0, 0.0, 0.0);
        assert!(has_changes(&stage, &stored, &[root]));
    }

    #[test]
    fn structural_edits_are_detected() {
        let mut stage = Stage::new();
        stage.add_container("c");
        let root = stage.create_node("c", "root").unwrap();
        let stored = encode(&stage, &[root]);

        let child = stage.create_node("c", "child").unwrap();
        stage.set_parent(child, Some(root));
        assert!(has_changes(&stage, &stored, &[root]));
    }
}
