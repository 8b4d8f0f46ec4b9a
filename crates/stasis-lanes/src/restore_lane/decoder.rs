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

use stasis_core::{NodeId, StableId};
use stasis_data::behavior::{Behavior, BehaviorRegistry, Spatial};
use stasis_data::snapshot::Snapshot;
use stasis_data::stage::Stage;

use crate::restore_lane::{resolver, RestoreError};

/// Checks whether a snapshot is currently restorable: its rejection flag is
/// clear and at least one of its roots targets a loaded container.
pub fn can_restore(snapshot: &Snapshot, stage: &Stage) -> bool {
    if snapshot.found_static {
        return false;
    }
    snapshot.root_offsets.iter().any(|&offset| {
        snapshot
            .nodes
            .get(offset as usize)
            .is_some_and(|node| stage.is_container_loaded(&node.container_path))
    })
}

/// Rebuilds the captured forest inside `stage` and returns the new true
/// roots, in the snapshot's root order.
///
/// With `destroy_originals` set, the original hierarchies (found by the
/// snapshot's root ids) are destroyed *before* anything is created, so
/// sibling positions assigned during fixup are not perturbed by
/// soon-to-vanish originals. Roots whose container is not loaded are
/// skipped; their slice of the object ledger is padded so internal
/// reference indices stay aligned for the surviving roots.
pub fn restore(
    stage: &mut Stage,
    snapshot: &Snapshot,
    registry: &BehaviorRegistry,
    destroy_originals: bool,
) -> Result<Vec<NodeId>, RestoreError> {
    if snapshot.found_static {
        return Err(RestoreError::RejectedSnapshot);
    }

    if destroy_originals {
        for &root_sid in &snapshot.root_ids {
            // Originals that already vanished are fine. Originals in
            // unloaded containers must survive: their root is about to be
            // skipped, so destroying them would lose the only copy.
            let Some(original) = stage.node_by_stable(root_sid) else {
                continue;
            };
            let in_loaded_container = stage
                .node(original)
                .map(|node| stage.is_container_loaded(node.container()))
                .unwrap_or(false);
            if in_loaded_container {
                stage.destroy_node(original);
            }
        }
    }

    let mut rebuild = Rebuild::default();
    let mut new_roots = Vec::new();

    for root_index in 0..snapshot.root_count() {
        let span = snapshot.root_span(root_index);
        let container = &snapshot
            .nodes
            .get(span.start)
            .ok_or_else(|| {
                RestoreError::UnexpectedFailure(format!(
                    "root offset {} is outside the node sequence",
                    span.start
                ))
            })?
            .container_path;
        if !stage.is_container_loaded(container) {
            log::warn!(
                "container '{}' is not loaded; skipping restore of root {}",
                container,
                root_index
            );
            rebuild.pad_span(snapshot, span);
            continue;
        }

        let (_, root) = rebuild.read_node(stage, snapshot, registry, span.start)?;
        new_roots.push(root);
    }

    resolver::fix_structure(stage, snapshot, &rebuild.created);
    resolver::resolve_references(stage, snapshot, &rebuild.created, &rebuild.ledger)?;

    Ok(new_roots)
}

/// Bookkeeping of one restore pass.
#[derive(Default)]
struct Rebuild {
    /// The creation-order object ledger, mirroring the encoder's membership
    /// enumeration. `None` entries stand in for objects of skipped roots.
    ledger: Vec<Option<StableId>>,
    /// Every created node with the index of its encoded counterpart.
    created: Vec<(u32, NodeId)>,
}

impl Rebuild {
    /// Records vacant ledger entries for every object a skipped root span
    /// would have created, keeping later indices aligned.
    fn pad_span(&mut self, snapshot: &Snapshot, span: std::ops::Range<usize>) {
        for encoded in &snapshot.nodes[span] {
            self.ledger.push(None);
            for _ in &encoded.behaviors {
                self.ledger.push(None);
            }
        }
    }

    /// Recursively consumes the flat node sequence starting at `index`,
    /// mirroring the order the encoder wrote it in. Returns the index of
    /// the last consumed node and the node created for `index`.
    fn read_node(
        &mut self,
        stage: &mut Stage,
        snapshot: &Snapshot,
        registry: &BehaviorRegistry,
        index: usize,
    ) -> Result<(usize, NodeId), RestoreError> {
        let encoded = snapshot.nodes.get(index).ok_or_else(|| {
            RestoreError::UnexpectedFailure(format!("encoded node index {index} out of range"))
        })?;

        let node_id = stage
            .create_node(&encoded.container_path, "")
            .ok_or_else(|| {
                RestoreError::UnexpectedFailure(format!(
                    "container '{}' disappeared mid-restore",
                    encoded.container_path
                ))
            })?;
        self.created.push((index as u32, node_id));

        {
            let node = stage.node_mut(node_id).expect("node was just created");
            node.apply_state(&encoded.state)
                .map_err(|e| RestoreError::UnexpectedFailure(e.to_string()))?;
            self.ledger.push(Some(node.stable_id()));
        }

        for (slot, encoded_behavior) in encoded.behaviors.iter().enumerate() {
            if slot == 0 {
                // The primary spatial cannot be detached; it is reused and
                // overwritten in place rather than recreated.
                if encoded_behavior.type_key != Spatial::TYPE_KEY {
                    return Err(RestoreError::UnexpectedFailure(format!(
                        "slot 0 encodes '{}' instead of the primary spatial",
                        encoded_behavior.type_key
                    )));
                }
                let node = stage.node_mut(node_id).expect("node was just created");
                let primary = &mut node.behaviors_mut()[0];
                primary
                    .get_mut()
                    .apply_state(&encoded_behavior.state)
                    .map_err(|e| RestoreError::UnexpectedFailure(e.to_string()))?;
                self.ledger.push(Some(primary.stable_id()));
            } else {
                let behavior = registry.instantiate(&encoded_behavior.type_key).ok_or(
                    RestoreError::TypeResolution {
                        type_key: encoded_behavior.type_key.clone(),
                    },
                )?;
                let sid = stage.attach(node_id, behavior).ok_or_else(|| {
                    RestoreError::UnexpectedFailure("freshly created node vanished".to_string())
                })?;
                let node = stage.node_mut(node_id).expect("node was just created");
                node.behaviors_mut()[slot]
                    .get_mut()
                    .apply_state(&encoded_behavior.state)
                    .map_err(|e| RestoreError::UnexpectedFailure(e.to_string()))?;
                self.ledger.push(Some(sid));
            }
        }

        // The tree is read back depth-first, since that is how it was
        // written out.
        let mut cursor = index;
        for _ in 0..encoded.child_count {
            let (next, child) = self.read_node(stage, snapshot, registry, cursor + 1)?;
            cursor = next;
            stage.set_parent(child, Some(node_id));
        }

        Ok((cursor, node_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture_lane::encode;

    fn registry() -> BehaviorRegistry {
        BehaviorRegistry::new()
    }

    #[test]
    fn rejected_snapshots_are_refused() {
        let mut stage = Stage::new();
        stage.add_container("c");
        let root = stage.create_node("c", "root").unwrap();
        stage.node_mut(root).unwrap().set_static(true);

        let snapshot = encode(&stage, &[root]);
        assert!(!can_restore(&snapshot, &stage));
        assert!(matches!(
            restore(&mut stage, &snapshot, &registry(), false),
            Err(RestoreError::RejectedSnapshot)
        ));
    }

    #[test]
    fn unknown_behavior_type_aborts_the_restore() {
        let mut stage = Stage::new();
        stage.add_container("c");
        let root = stage.create_node("c", "root").unwrap();
        stage.attach(root, Box::<stasis_data::behavior::Waypoint>::default());

        let mut snapshot = encode(&stage, &[root]);
        snapshot.nodes[0].behaviors[1].type_key = "stasis.renamed_away".to_string();

        let result = restore(&mut stage, &snapshot, &registry(), false);
        assert!(matches!(
            result,
            Err(RestoreError::TypeResolution { type_key }) if type_key == "stasis.renamed_away"
        ));
    }

    #[test]
    fn unloaded_container_skips_that_root_but_restores_others() {
        let mut stage = Stage::new();
        stage.add_container("c/main");
        stage.add_container("c/annex");
        let a = stage.create_node("c/main", "a").unwrap();
        let b = stage.create_node("c/annex", "b").unwrap();

        let snapshot = encode(&stage, &[a, b]);
        stage.set_container_loaded("c/annex", false);
        assert!(can_restore(&snapshot, &stage));

        let roots = restore(&mut stage, &snapshot, &registry(), true).unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(stage.node(roots[0]).unwrap().name, "a");
        // The skipped original survives untouched in its unloaded container.
        assert!(stage.node(b).is_some());
    }

    #[test]
    fn nothing_is_restorable_without_any_loaded_container() {
        let mut stage = Stage::new();
        stage.add_container("c");
        let root = stage.create_node("c", "root").unwrap();

        let snapshot = encode(&stage, &[root]);
        stage.set_container_loaded("c", false);
        assert!(!can_restore(&snapshot, &stage));
    }
}
