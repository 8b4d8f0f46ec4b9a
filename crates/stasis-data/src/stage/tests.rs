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

use super::*;
use crate::behavior::{Seeker, Waypoint};

fn stage_with_container() -> Stage {
    let mut stage = Stage::new();
    stage.add_container("world/main");
    stage
}

#[test]
fn create_node_registers_primary_spatial_and_stable_ids() {
    // --- 1. SETUP ---
    let mut stage = stage_with_container();

    // --- 2. ACTION ---
    let id = stage.create_node("world/main", "hero").unwrap();

    // --- 3. ASSERTIONS ---
    let node = stage.node(id).unwrap();
    assert_eq!(node.name, "hero");
    assert_eq!(node.behaviors().len(), 1, "spatial must occupy slot 0");
    assert_eq!(node.spatial(), &Spatial::identity());

    assert_eq!(stage.find(node.stable_id()), Some(ObjectRef::Node(id)));
    assert_eq!(
        stage.find(node.behaviors()[0].stable_id()),
        Some(ObjectRef::Behavior { node: id, slot: 0 })
    );
    assert_eq!(stage.container_roots("world/main").unwrap(), &[id]);
}

#[test]
fn create_node_in_unknown_container_fails() {
    let mut stage = stage_with_container();
    assert!(stage.create_node("world/other", "x").is_none());
}

#[test]
fn destroy_node_releases_whole_subtree() {
    let mut stage = stage_with_container();
    let root = stage.create_node("world/main", "root").unwrap();
    let child = stage.create_node("world/main", "child").unwrap();
    let grandchild = stage.create_node("world/main", "grandchild").unwrap();
    stage.set_parent(child, Some(root));
    stage.set_parent(grandchild, Some(child));

    let child_sid = stage.node(child).unwrap().stable_id();
    let grandchild_sid = stage.node(grandchild).unwrap().stable_id();

    assert!(stage.destroy_node(root));

    assert!(stage.node(root).is_none());
    assert!(stage.node(child).is_none());
    assert!(stage.node(grandchild).is_none());
    assert!(!stage.is_alive(child_sid));
    assert!(!stage.is_alive(grandchild_sid));
    assert!(stage.container_roots("world/main").unwrap().is_empty());
    assert_eq!(stage.node_count(), 0);
}

#[test]
fn recycled_slots_invalidate_stale_handles() {
    let mut stage = stage_with_container();
    let first = stage.create_node("world/main", "first").unwrap();
    stage.destroy_node(first);

    let second = stage.create_node("world/main", "second").unwrap();
    assert_eq!(second.index, first.index, "slot should be recycled");
    assert_ne!(second.generation, first.generation);
    assert!(stage.node(first).is_none(), "stale handle must not resolve");
    assert!(stage.node(second).is_some());
}

#[test]
fn set_parent_moves_between_sibling_lists() {
    let mut stage = stage_with_container();
    let a = stage.create_node("world/main", "a").unwrap();
    let b = stage.create_node("world/main", "b").unwrap();

    assert!(stage.set_parent(b, Some(a)));
    assert_eq!(stage.node(a).unwrap().children(), &[b]);
    assert_eq!(stage.node(b).unwrap().parent(), Some(a));
    assert_eq!(stage.container_roots("world/main").unwrap(), &[a]);

    assert!(stage.set_parent(b, None));
    assert_eq!(stage.node(a).unwrap().children(), &[] as &[_]);
    assert_eq!(stage.container_roots("world/main").unwrap(), &[a, b]);
}

#[test]
fn set_parent_refuses_cycles() {
    let mut stage = stage_with_container();
    let a = stage.create_node("world/main", "a").unwrap();
    let b = stage.create_node("world/main", "b").unwrap();
    stage.set_parent(b, Some(a));

    assert!(!stage.set_parent(a, Some(b)));
    assert!(!stage.set_parent(a, Some(a)));
    assert_eq!(stage.node(a).unwrap().parent(), None);
}

#[test]
fn reparenting_across_containers_retargets_the_subtree() {
    let mut stage = stage_with_container();
    stage.add_container("world/annex");
    let host = stage.create_node("world/annex", "host").unwrap();
    let root = stage.create_node("world/main", "root").unwrap();
    let child = stage.create_node("world/main", "child").unwrap();
    stage.set_parent(child, Some(root));

    assert!(stage.set_parent(root, Some(host)));
    assert_eq!(stage.node(root).unwrap().container(), "world/annex");
    assert_eq!(stage.node(child).unwrap().container(), "world/annex");
    assert!(stage.container_roots("world/main").unwrap().is_empty());
}

#[test]
fn sibling_index_round_trips_and_clamps() {
    let mut stage = stage_with_container();
    let a = stage.create_node("world/main", "a").unwrap();
    let b = stage.create_node("world/main", "b").unwrap();
    let c = stage.create_node("world/main", "c").unwrap();

    assert_eq!(stage.sibling_index(b), Some(1));
    assert!(stage.set_sibling_index(c, 0));
    assert_eq!(stage.container_roots("world/main").unwrap(), &[c, a, b]);

    // Past-the-end indices clamp to the last position.
    assert!(stage.set_sibling_index(c, 99));
    assert_eq!(stage.container_roots("world/main").unwrap(), &[a, b, c]);
}

#[test]
fn attach_and_typed_access() {
    let mut stage = stage_with_container();
    let node = stage.create_node("world/main", "wp").unwrap();

    let sid = stage.attach(node, Box::<Waypoint>::default()).unwrap();
    assert_eq!(
        stage.find(sid),
        Some(ObjectRef::Behavior { node, slot: 1 })
    );

    assert!(stage.node(node).unwrap().typed::<Waypoint>().is_some());
    assert!(stage.node(node).unwrap().typed::<Seeker>().is_none());

    stage
        .node_mut(node)
        .unwrap()
        .typed_mut::<Waypoint>()
        .unwrap()
        .connected
        .push(None);
    assert_eq!(
        stage.node(node).unwrap().typed::<Waypoint>().unwrap().connected,
        vec![None]
    );
}

#[test]
fn stable_ids_are_never_reused_within_a_stage() {
    let mut stage = stage_with_container();
    let first = stage.create_node("world/main", "first").unwrap();
    let first_sid = stage.node(first).unwrap().stable_id();
    stage.destroy_node(first);

    let second = stage.create_node("world/main", "second").unwrap();
    let second_sid = stage.node(second).unwrap().stable_id();
    assert_ne!(first_sid, second_sid);
    assert!(!stage.is_alive(first_sid));
}
