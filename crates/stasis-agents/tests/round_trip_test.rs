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

//! Full capture/restore round trips over hierarchies with no external
//! references: the rebuilt forest must match the captured one field for
//! field and position for position, modulo object identity.

use approx::assert_relative_eq;
use stasis_core::math::Vec3;
use stasis_core::NodeId;
use stasis_data::behavior::{BehaviorRegistry, PersistMarker, Seeker, Waypoint};
use stasis_data::stage::Stage;
use stasis_lanes::{can_restore, encode, restore};

/// R
/// ├── C1 (seeker)
/// │   └── G (waypoint)
/// └── C2
fn build_tree(stage: &mut Stage) -> NodeId {
    stage.add_container("world/main");
    let r = stage.create_node("world/main", "R").unwrap();
    let c1 = stage.create_node("world/main", "C1").unwrap();
    let c2 = stage.create_node("world/main", "C2").unwrap();
    let g = stage.create_node("world/main", "G").unwrap();
    stage.set_parent(c1, Some(r));
    stage.set_parent(c2, Some(r));
    stage.set_parent(g, Some(c1));

    stage.node_mut(r).unwrap().spatial_mut().translation = Vec3::new(1.0, 2.0, 3.0);
    stage.node_mut(c1).unwrap().spatial_mut().translation = Vec3::new(0.0, 1.5, 0.0);
    stage.node_mut(c1).unwrap().active = false;

    stage.attach(
        c1,
        Box::new(Seeker {
            move_speed: 4.5,
            ..Default::default()
        }),
    );
    stage.attach(g, Box::<Waypoint>::default());
    r
}

#[test]
fn round_trip_preserves_structure_and_field_values() {
    // --- 1. ARRANGE ---
    let mut stage = Stage::new();
    let r = build_tree(&mut stage);

    // --- 2. ACT ---
    let snapshot = encode(&stage, &[r]);
    assert!(can_restore(&snapshot, &stage));
    let roots = restore(&mut stage, &snapshot, &BehaviorRegistry::new(), true).unwrap();

    // --- 3. ASSERT ---
    assert_eq!(roots.len(), 1);
    let new_r = roots[0];
    assert!(stage.node(r).is_none(), "original root must be destroyed");

    let r_node = stage.node(new_r).unwrap();
    assert_eq!(r_node.name, "R");
    assert_eq!(r_node.spatial().translation, Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(r_node.children().len(), 2);

    let new_c1 = r_node.children()[0];
    let new_c2 = r_node.children()[1];
    let c1_node = stage.node(new_c1).unwrap();
    let c2_node = stage.node(new_c2).unwrap();
    assert_eq!(c1_node.name, "C1");
    assert_eq!(c2_node.name, "C2");
    assert!(!c1_node.active);
    assert_relative_eq!(c1_node.spatial().translation.y, 1.5);
    assert_eq!(stage.sibling_index(new_c1), Some(0));
    assert_eq!(stage.sibling_index(new_c2), Some(1));

    let seeker = c1_node.typed::<Seeker>().expect("seeker must be restored");
    assert_relative_eq!(seeker.move_speed, 4.5);

    let new_g = c1_node.children()[0];
    let g_node = stage.node(new_g).unwrap();
    assert_eq!(g_node.name, "G");
    assert!(g_node.typed::<Waypoint>().is_some());
}

#[test]
fn round_trip_of_a_single_bare_node_with_all_null_references() {
    let mut stage = Stage::new();
    stage.add_container("world/main");
    let solo = stage.create_node("world/main", "solo").unwrap();
    stage.attach(solo, Box::<Seeker>::default());

    let snapshot = encode(&stage, &[solo]);

    // One node, two behaviors (spatial + seeker), nothing but null refs.
    assert_eq!(snapshot.nodes.len(), 1);
    assert_eq!(snapshot.nodes[0].behaviors.len(), 2);
    for behavior in &snapshot.nodes[0].behaviors {
        assert!(behavior
            .refs
            .iter()
            .all(|slot| *slot == stasis_data::snapshot::RefSlot::Null));
    }

    let roots = restore(&mut stage, &snapshot, &BehaviorRegistry::new(), true).unwrap();
    let node = stage.node(roots[0]).unwrap();
    assert_eq!(node.name, "solo");
    assert_eq!(node.typed::<Seeker>().unwrap().target, None);
    assert_eq!(node.children().len(), 0);
}

#[test]
fn encoded_layout_upholds_the_depth_first_invariant() {
    let mut stage = Stage::new();
    let r = build_tree(&mut stage);
    let extra = stage.create_node("world/main", "extra").unwrap();

    let snapshot = encode(&stage, &[r, extra]);

    // first_child == index + 1 wherever there are children, and each
    // subtree occupies exactly the following descendant slots.
    for (index, node) in snapshot.nodes.iter().enumerate() {
        if node.child_count > 0 {
            assert_eq!(node.first_child as usize, index + 1);
        }
    }
    // Root spans: R's subtree has 4 nodes, "extra" has 1.
    assert_eq!(snapshot.root_span(0), 0..4);
    assert_eq!(snapshot.root_span(1), 4..5);
}

#[test]
fn capture_is_deterministic_and_restore_does_not_consume_the_snapshot() {
    let mut stage = Stage::new();
    let r = build_tree(&mut stage);

    let first = encode(&stage, &[r]);
    let second = encode(&stage, &[r]);
    assert_eq!(first, second);

    // The snapshot stays intact across a restore and can be applied again.
    let registry = BehaviorRegistry::new();
    let before = first.clone();
    let roots_a = restore(&mut stage, &first, &registry, true).unwrap();
    assert_eq!(first, before);
    let roots_b = restore(&mut stage, &first, &registry, true).unwrap();
    assert_eq!(roots_a.len(), roots_b.len());
}

#[test]
fn restored_marker_state_survives_the_trip() {
    let mut stage = Stage::new();
    let r = build_tree(&mut stage);
    stage.attach(r, Box::new(PersistMarker { enabled: false }));

    let snapshot = encode(&stage, &[r]);
    let roots = restore(&mut stage, &snapshot, &BehaviorRegistry::new(), true).unwrap();

    let marker = stage
        .node(roots[0])
        .unwrap()
        .typed::<PersistMarker>()
        .expect("marker must be restored");
    assert!(!marker.enabled);
}
