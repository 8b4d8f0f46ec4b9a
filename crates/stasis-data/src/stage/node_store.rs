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

//! Internal node storage and handle management.

use stasis_core::NodeId;

use crate::stage::Node;

/// Internal slot arena for live nodes.
///
/// The `NodeStore` maintains a dense list of node slots. Destroying a node
/// frees its slot for reuse via a free list; the slot's generation counter
/// is bumped on reuse so stale handles cannot alias the new occupant.
#[derive(Default)]
pub(crate) struct NodeStore {
    /// Every slot ever allocated. The slot's `NodeId` carries the current
    /// generation; the `Option` is `Some` only while a node lives there.
    slots: Vec<(NodeId, Option<Node>)>,
    /// Slot indices available for reuse.
    free: Vec<u32>,
}

impl NodeStore {
    /// Creates a new, empty `NodeStore`.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Places `node` into a fresh or recycled slot and returns its handle.
    pub fn insert(&mut self, node: Node) -> NodeId {
        if let Some(index) = self.free.pop() {
            let (id_slot, node_slot) = &mut self.slots[index as usize];
            id_slot.generation += 1;
            *node_slot = Some(node);
            *id_slot
        } else {
            let id = NodeId {
                index: self.slots.len() as u32,
                generation: 0,
            };
            self.slots.push((id, Some(node)));
            id
        }
    }

    /// Removes the node addressed by `id`, returning it if the handle was
    /// live.
    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        let (slot_id, node_slot) = self.slots.get_mut(id.index as usize)?;
        if slot_id.generation != id.generation {
            return None;
        }
        let node = node_slot.take();
        if node.is_some() {
            self.free.push(id.index);
        }
        node
    }

    /// Returns a reference to the node addressed by `id`, if live.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .and_then(|(slot_id, node)| {
                if slot_id.generation == id.generation {
                    node.as_ref()
                } else {
                    None
                }
            })
    }

    /// Returns a mutable reference to the node addressed by `id`, if live.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .and_then(|(slot_id, node)| {
                if slot_id.generation == id.generation {
                    node.as_mut()
                } else {
                    None
                }
            })
    }

    /// Iterates over all live nodes in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.slots
            .iter()
            .filter_map(|(id, node)| node.as_ref().map(|n| (*id, n)))
    }

    /// Returns the number of live nodes.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|(_, node)| node.is_some()).count()
    }
}
