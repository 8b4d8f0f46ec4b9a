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

//! The live environment: containers of node trees plus the stable-id index.
//!
//! The [`Stage`] owns every live node and behavior. It is the single shared
//! mutable resource of the snapshot system; encode reads it, restore mutates
//! it, and both run to completion on the owning thread.

mod node;
mod node_store;

pub use node::{BehaviorSlot, Node, NodeState};

use std::collections::HashMap;

use stasis_core::graph::Hierarchy;
use stasis_core::{NodeId, StableId};

use crate::behavior::{Behavior, Spatial};
use node_store::NodeStore;

/// A live handle to either a node or one behavior attached to a node.
///
/// This is what a [`StableId`] resolves to while the object is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectRef {
    /// A node.
    Node(NodeId),
    /// The behavior at `slot` on `node`.
    Behavior {
        /// The owning node.
        node: NodeId,
        /// The behavior's slot index on the owning node.
        slot: usize,
    },
}

/// A named, loadable group of root nodes (the unit of scene granularity).
///
/// Restore only re-creates nodes whose container is currently loaded; an
/// unloaded container causes its roots to be skipped, not the whole restore.
struct Container {
    path: String,
    loaded: bool,
    roots: Vec<NodeId>,
}

/// The central owner of all live scene objects.
#[derive(Default)]
pub struct Stage {
    store: NodeStore,
    containers: Vec<Container>,
    stable_index: HashMap<StableId, ObjectRef>,
    next_stable_id: u64,
}

impl Stage {
    /// Creates a new, empty stage.
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc_stable_id(&mut self) -> StableId {
        self.next_stable_id += 1;
        StableId::from_raw(self.next_stable_id)
    }

    fn container_index(&self, path: &str) -> Option<usize> {
        self.containers.iter().position(|c| c.path == path)
    }

    // --- Containers ---

    /// Adds a container under `path`, initially loaded. Adding an existing
    /// path is a no-op.
    pub fn add_container(&mut self, path: &str) {
        if self.container_index(path).is_none() {
            self.containers.push(Container {
                path: path.to_string(),
                loaded: true,
                roots: Vec::new(),
            });
        }
    }

    /// Marks a container loaded or unloaded. Returns `false` for an unknown
    /// path. Unloading keeps the container's nodes alive; it only gates
    /// restore placement.
    pub fn set_container_loaded(&mut self, path: &str, loaded: bool) -> bool {
        match self.container_index(path) {
            Some(index) => {
                self.containers[index].loaded = loaded;
                true
            }
            None => false,
        }
    }

    /// Returns `true` if `path` names a currently loaded container.
    pub fn is_container_loaded(&self, path: &str) -> bool {
        self.container_index(path)
            .map(|index| self.containers[index].loaded)
            .unwrap_or(false)
    }

    /// The paths of all currently loaded containers, in registration order.
    pub fn loaded_container_paths(&self) -> Vec<String> {
        self.containers
            .iter()
            .filter(|c| c.loaded)
            .map(|c| c.path.clone())
            .collect()
    }

    /// The root nodes of a container, in sibling order.
    pub fn container_roots(&self, path: &str) -> Option<&[NodeId]> {
        self.container_index(path)
            .map(|index| self.containers[index].roots.as_slice())
    }

    // --- Nodes ---

    /// Creates a node named `name` at the root of the container at `path`,
    /// with its primary [`Spatial`] attached at slot 0.
    ///
    /// Returns `None` if no such container exists.
    pub fn create_node(&mut self, path: &str, name: &str) -> Option<NodeId> {
        let container_index = self.container_index(path)?;

        let node_sid = self.alloc_stable_id();
        let spatial_sid = self.alloc_stable_id();
        let node = Node {
            stable_id: node_sid,
            name: name.to_string(),
            active: true,
            is_static: false,
            container: path.to_string(),
            parent: None,
            children: Vec::new(),
            behaviors: vec![BehaviorSlot {
                stable_id: spatial_sid,
                behavior: Box::<Spatial>::default(),
            }],
        };
        let id = self.store.insert(node);

        self.stable_index.insert(node_sid, ObjectRef::Node(id));
        self.stable_index
            .insert(spatial_sid, ObjectRef::Behavior { node: id, slot: 0 });
        self.containers[container_index].roots.push(id);
        Some(id)
    }

    /// Destroys a node and its entire subtree. Returns `false` for a stale
    /// handle.
    pub fn destroy_node(&mut self, id: NodeId) -> bool {
        let Some(node) = self.store.get(id) else {
            return false;
        };
        let parent = node.parent;
        let container = node.container.clone();

        // Detach from the sibling list first so release() never observes a
        // half-linked tree.
        match parent {
            Some(parent_id) => {
                if let Some(parent_node) = self.store.get_mut(parent_id) {
                    parent_node.children.retain(|&child| child != id);
                }
            }
            None => {
                if let Some(index) = self.container_index(&container) {
                    self.containers[index].roots.retain(|&root| root != id);
                }
            }
        }

        self.release(id);
        log::debug!("destroyed node subtree at slot {}", id.index);
        true
    }

    /// Recursively removes `id` and its descendants from the store and the
    /// stable-id index.
    fn release(&mut self, id: NodeId) {
        let Some(node) = self.store.remove(id) else {
            return;
        };
        self.stable_index.remove(&node.stable_id);
        for slot in &node.behaviors {
            self.stable_index.remove(&slot.stable_id);
        }
        for child in node.children {
            self.release(child);
        }
    }

    /// Borrows a node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.store.get(id)
    }

    /// Mutably borrows a node.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.store.get_mut(id)
    }

    /// Iterates over all live nodes, in slot order.
    pub fn iter_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.store.iter().map(|(id, _)| id)
    }

    /// The number of live nodes.
    pub fn node_count(&self) -> usize {
        self.store.len()
    }

    // --- Behaviors ---

    /// Attaches `behavior` to `node`, assigning it a fresh stable id.
    /// Returns the behavior's stable id, or `None` for a stale handle.
    pub fn attach(&mut self, node: NodeId, behavior: Box<dyn Behavior>) -> Option<StableId> {
        let sid = self.alloc_stable_id();
        let node_ref = self.store.get_mut(node)?;
        let slot = node_ref.behaviors.len();
        node_ref.behaviors.push(BehaviorSlot {
            stable_id: sid,
            behavior,
        });
        self.stable_index
            .insert(sid, ObjectRef::Behavior { node, slot });
        Some(sid)
    }

    // --- Structure ---

    /// Re-parents `child` under `new_parent`, or to its container root for
    /// `None`. Local spatial values are applied verbatim: there is no
    /// world-position compensation.
    ///
    /// The child is appended at the end of its new sibling list and adopts
    /// its new parent's container. Returns `false` for stale handles or a
    /// move that would create a cycle.
    pub fn set_parent(&mut self, child: NodeId, new_parent: Option<NodeId>) -> bool {
        let Some(child_node) = self.store.get(child) else {
            return false;
        };
        let old_parent = child_node.parent;
        let old_container = child_node.container.clone();

        let target_container = match new_parent {
            Some(parent_id) => {
                if parent_id == child || self.is_ancestor_of(child, parent_id) {
                    return false;
                }
                match self.store.get(parent_id) {
                    Some(parent_node) => parent_node.container.clone(),
                    None => return false,
                }
            }
            None => old_container.clone(),
        };

        // Detach.
        match old_parent {
            Some(parent_id) => {
                if let Some(parent_node) = self.store.get_mut(parent_id) {
                    parent_node.children.retain(|&c| c != child);
                }
            }
            None => {
                if let Some(index) = self.container_index(&old_container) {
                    self.containers[index].roots.retain(|&root| root != child);
                }
            }
        }

        // Attach.
        match new_parent {
            Some(parent_id) => {
                if let Some(parent_node) = self.store.get_mut(parent_id) {
                    parent_node.children.push(child);
                }
            }
            None => {
                if let Some(index) = self.container_index(&target_container) {
                    self.containers[index].roots.push(child);
                }
            }
        }
        if let Some(child_node) = self.store.get_mut(child) {
            child_node.parent = new_parent;
        }

        if target_container != old_container {
            self.retarget_container(child, &target_container);
        }
        true
    }

    fn is_ancestor_of(&self, ancestor: NodeId, node: NodeId) -> bool {
        stasis_core::graph::is_ancestor(self, ancestor, node)
    }

    fn retarget_container(&mut self, node: NodeId, path: &str) {
        let children = match self.store.get_mut(node) {
            Some(n) => {
                n.container = path.to_string();
                n.children.clone()
            }
            None => return,
        };
        for child in children {
            self.retarget_container(child, path);
        }
    }

    /// The node's position among its siblings (within its parent's children
    /// or its container's roots).
    pub fn sibling_index(&self, id: NodeId) -> Option<usize> {
        let node = self.store.get(id)?;
        let siblings = match node.parent {
            Some(parent_id) => self.store.get(parent_id)?.children.as_slice(),
            None => self.container_roots(&node.container)?,
        };
        siblings.iter().position(|&sibling| sibling == id)
    }

    /// Moves the node to position `index` among its siblings. Indices past
    /// the end clamp to the last position. Returns `false` for a stale
    /// handle.
    pub fn set_sibling_index(&mut self, id: NodeId, index: usize) -> bool {
        let Some(node) = self.store.get(id) else {
            return false;
        };
        let parent = node.parent;
        let container = node.container.clone();

        let siblings = match parent {
            Some(parent_id) => match self.store.get_mut(parent_id) {
                Some(parent_node) => &mut parent_node.children,
                None => return false,
            },
            None => match self.container_index(&container) {
                Some(ci) => &mut self.containers[ci].roots,
                None => return false,
            },
        };
        let Some(current) = siblings.iter().position(|&sibling| sibling == id) else {
            return false;
        };
        siblings.remove(current);
        let clamped = index.min(siblings.len());
        siblings.insert(clamped, id);
        true
    }

    // --- Stable identifiers ---

    /// Resolves a stable id to a live object, if it is still alive.
    pub fn find(&self, id: StableId) -> Option<ObjectRef> {
        self.stable_index.get(&id).copied()
    }

    /// Returns `true` if `id` refers to a live object.
    pub fn is_alive(&self, id: StableId) -> bool {
        self.stable_index.contains_key(&id)
    }

    /// Resolves a stable id to a node handle, if it names a live node.
    pub fn node_by_stable(&self, id: StableId) -> Option<NodeId> {
        match self.find(id)? {
            ObjectRef::Node(node) => Some(node),
            ObjectRef::Behavior { .. } => None,
        }
    }
}

impl Hierarchy for Stage {
    type Id = NodeId;

    fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.store.get(id).and_then(|node| node.parent)
    }

    fn children_of(&self, id: NodeId) -> Vec<NodeId> {
        self.store
            .get(id)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests;
