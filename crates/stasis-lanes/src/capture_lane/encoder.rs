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

use stasis_core::graph::{depth_first, true_roots};
use stasis_core::{NodeId, StableId};
use stasis_data::behavior::Behavior;
use stasis_data::snapshot::{EncodedBehavior, EncodedNode, Snapshot};
use stasis_data::stage::Stage;

use crate::capture_lane::RefLedger;

/// Identifier of the flat depth-first payload encoding, written into the
/// snapshot container header.
pub const SNAPSHOT_CODEC_ID: &str = "ST_FLAT_V1";

/// Captures `selection` and all descendants into a [`Snapshot`].
///
/// The selection may be empty (the snapshot is then empty), may contain
/// duplicates, stale handles, and nested picks; it is reduced to its true
/// roots first. Encoding never mutates the stage, and two calls on an
/// unchanged stage produce equal snapshots.
///
/// A static-flagged node does not stop the capture: the snapshot is still
/// produced in full, with its rejection flag set, and the caller decides
/// what to do with it.
pub fn encode(stage: &Stage, selection: &[NodeId]) -> Snapshot {
    let live: Vec<NodeId> = selection
        .iter()
        .copied()
        .filter(|&id| stage.node(id).is_some())
        .collect();
    let roots = true_roots(stage, &live);

    let membership = enumerate_membership(stage, &roots);
    let ledger = RefLedger::new(&membership);

    let mut snapshot = Snapshot::new();
    for &root in &roots {
        let Some(root_node) = stage.node(root) else {
            continue;
        };
        snapshot.root_offsets.push(snapshot.nodes.len() as u32);
        snapshot.root_ids.push(root_node.stable_id());
        encode_node(stage, &ledger, root, &mut snapshot);
    }
    snapshot
}

/// Enumerates the membership set: for every root, each node of its subtree
/// in depth-first order, the node itself immediately followed by its
/// behaviors in slot order.
///
/// This order defines the ledger indices used by `Internal` classifications
/// and is re-derived at restore time from creation order.
fn enumerate_membership(stage: &Stage, roots: &[NodeId]) -> Vec<StableId> {
    let mut membership = Vec::new();
    for &root in roots {
        for id in depth_first(stage, root) {
            let Some(node) = stage.node(id) else {
                continue;
            };
            membership.push(node.stable_id());
            for slot in node.behaviors() {
                membership.push(slot.stable_id());
            }
        }
    }
    membership
}

fn encode_node(stage: &Stage, ledger: &RefLedger, id: NodeId, snapshot: &mut Snapshot) {
    let Some(node) = stage.node(id) else {
        return;
    };

    let behaviors = node
        .behaviors()
        .iter()
        .map(|slot| {
            let behavior = slot.get();
            EncodedBehavior {
                type_key: behavior.type_key().to_string(),
                state: behavior.state_bytes(),
                refs: behavior
                    .ref_fields()
                    .into_iter()
                    .map(|field| ledger.classify(stage, field))
                    .collect(),
            }
        })
        .collect();

    let encoded = EncodedNode {
        state: node.state_bytes(),
        refs: node
            .ref_fields()
            .into_iter()
            .map(|field| ledger.classify(stage, field))
            .collect(),
        container_path: node.container().to_string(),
        parent_id: node
            .parent()
            .and_then(|parent| stage.node(parent))
            .map(|parent| parent.stable_id()),
        sibling_index: stage.sibling_index(id).unwrap_or(0) as u32,
        child_count: node.children().len() as u32,
        first_child: snapshot.nodes.len() as u32 + 1,
        behaviors,
    };
    snapshot.nodes.push(encoded);

    if node.is_static() {
        snapshot.found_static = true;
        log::warn!(
            "capture visited static node '{}'; the snapshot will be refused at restore",
            node.name
        );
    }

    for &child in node.children() {
        encode_node(stage, ledger, child, snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stasis_data::snapshot::RefSlot;

    /// R with children C1, C2; C1 has a grandchild.
    fn small_forest(stage: &mut Stage) -> (NodeId, NodeId, NodeId, NodeId) {
        stage.add_container("world/main");
        let r = stage.create_node("world/main", "R").unwrap();
        let c1 = stage.create_node("world/main", "C1").unwrap();
        let c2 = stage.create_node("world/main", "C2").unwrap();
        let g = stage.create_node("world/main", "G").unwrap();
        stage.set_parent(c1, Some(r));
        stage.set_parent(c2, Some(r));
        stage.set_parent(g, Some(c1));
        (r, c1, c2, g)
    }

    #[test]
    fn first_child_always_points_one_past_self() {
        let mut stage = Stage::new();
        let (r, ..) = small_forest(&mut stage);

        let snapshot = encode(&stage, &[r]);

        assert_eq!(snapshot.nodes.len(), 4);
        for (index, node) in snapshot.nodes.iter().enumerate() {
            assert_eq!(node.first_child, index as u32 + 1);
        }
    }

    #[test]
    fn depth_first_layout_keeps_subtrees_contiguous() {
        let mut stage = Stage::new();
        let (r, ..) = small_forest(&mut stage);

        let snapshot = encode(&stage, &[r]);

        // Encoded order must be R, C1, G, C2.
        let names: Vec<String> = snapshot
            .nodes
            .iter()
            .map(|node| {
                let state: stasis_data::stage::NodeState =
                    stasis_data::behavior::decode_state(&node.state).unwrap();
                state.name
            })
            .collect();
        assert_eq!(names, ["R", "C1", "G", "C2"]);
        assert_eq!(snapshot.nodes[0].child_count, 2);
        assert_eq!(snapshot.nodes[1].child_count, 1);
    }

    #[test]
    fn nested_selection_collapses_to_one_root() {
        let mut stage = Stage::new();
        let (r, c1, _, g) = small_forest(&mut stage);

        let snapshot = encode(&stage, &[c1, r, g]);

        assert_eq!(snapshot.root_count(), 1);
        assert_eq!(snapshot.root_ids, vec![stage.node(r).unwrap().stable_id()]);
        assert_eq!(snapshot.nodes.len(), 4);
    }

    #[test]
    fn roots_record_their_external_parent() {
        let mut stage = Stage::new();
        let (r, c1, ..) = small_forest(&mut stage);

        // Capture only C1's subtree: its parent R stays outside the set.
        let snapshot = encode(&stage, &[c1]);

        assert_eq!(
            snapshot.nodes[0].parent_id,
            Some(stage.node(r).unwrap().stable_id())
        );
        assert_eq!(snapshot.nodes[0].sibling_index, 0);
    }

    #[test]
    fn static_nodes_set_the_rejection_flag_but_capture_continues() {
        let mut stage = Stage::new();
        let (r, _, c2, _) = small_forest(&mut stage);
        stage.node_mut(c2).unwrap().set_static(true);

        let snapshot = encode(&stage, &[r]);

        assert!(snapshot.found_static);
        assert_eq!(snapshot.nodes.len(), 4, "capture must still be complete");
    }

    #[test]
    fn encoding_is_deterministic_for_an_unchanged_stage() {
        let mut stage = Stage::new();
        let (r, ..) = small_forest(&mut stage);

        let first = encode(&stage, &[r]);
        let second = encode(&stage, &[r]);

        assert_ne!(first.capture_id, second.capture_id);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_selection_yields_an_empty_snapshot() {
        let stage = Stage::new();
        let snapshot = encode(&stage, &[]);
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.root_count(), 0);
        assert!(!snapshot.found_static);
    }

    #[test]
    fn internal_references_use_membership_enumeration_indices() {
        use stasis_data::behavior::Seeker;

        let mut stage = Stage::new();
        stage.add_container("world/main");
        let a = stage.create_node("world/main", "A").unwrap();
        let b = stage.create_node("world/main", "B").unwrap();
        stage.set_parent(b, Some(a));

        let b_sid = stage.node(b).unwrap().stable_id();
        let seeker = Seeker {
            target: Some(b_sid),
            ..Default::default()
        };
        stage.attach(a, Box::new(seeker));

        let snapshot = encode(&stage, &[a]);

        // Enumeration: A(0), A.spatial(1), A.seeker(2), B(3), B.spatial(4).
        let seeker_refs = &snapshot.nodes[0].behaviors[1].refs;
        assert_eq!(seeker_refs, &[RefSlot::Internal(3)]);
    }
}
