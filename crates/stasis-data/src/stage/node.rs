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

use serde::{Deserialize, Serialize};
use stasis_core::{NodeId, StableId};

use crate::behavior::{decode_state, encode_state, Behavior, Spatial};

/// One behavior attached to a node: the instance plus its own stable id.
///
/// Behaviors are addressable objects in their own right (reference fields
/// may target a behavior, not just a node), so every slot carries a stable
/// id issued at attach time.
pub struct BehaviorSlot {
    pub(crate) stable_id: StableId,
    pub(crate) behavior: Box<dyn Behavior>,
}

impl BehaviorSlot {
    /// The stable id of this behavior instance.
    pub fn stable_id(&self) -> StableId {
        self.stable_id
    }

    /// Borrows the behavior.
    pub fn get(&self) -> &dyn Behavior {
        self.behavior.as_ref()
    }

    /// Mutably borrows the behavior.
    pub fn get_mut(&mut self) -> &mut dyn Behavior {
        self.behavior.as_mut()
    }
}

/// A positioned entity in a container's tree, owning zero or more child
/// nodes and one or more behaviors.
///
/// Slot 0 always holds the node's [`Spatial`], created with the node.
pub struct Node {
    pub(crate) stable_id: StableId,
    /// Display name of the node.
    pub name: String,
    /// Whether the node participates in simulation.
    pub active: bool,
    pub(crate) is_static: bool,
    pub(crate) container: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) behaviors: Vec<BehaviorSlot>,
}

/// The stable serializable form of a node's own non-reference state.
#[derive(Debug, Serialize, Deserialize)]
pub struct NodeState {
    /// Display name of the node.
    pub name: String,
    /// Whether the node participates in simulation.
    pub active: bool,
    /// The immutability flag.
    pub is_static: bool,
}

impl Node {
    /// The stable id of this node.
    pub fn stable_id(&self) -> StableId {
        self.stable_id
    }

    /// Whether the node is flagged immutable/batched. Static nodes cannot be
    /// faithfully reconstructed field-by-field, so capture rejects them.
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Sets the immutability flag.
    pub fn set_static(&mut self, is_static: bool) {
        self.is_static = is_static;
    }

    /// The path of the container the node currently belongs to.
    pub fn container(&self) -> &str {
        &self.container
    }

    /// The node's parent, or `None` for a container root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The node's children, in sibling order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// All attached behaviors, in slot order. Slot 0 is the `Spatial`.
    pub fn behaviors(&self) -> &[BehaviorSlot] {
        &self.behaviors
    }

    /// Mutable access to the attached behaviors.
    pub fn behaviors_mut(&mut self) -> &mut [BehaviorSlot] {
        &mut self.behaviors
    }

    /// Borrows the node's `Spatial`.
    pub fn spatial(&self) -> &Spatial {
        // Slot 0 holds the Spatial for every node, by construction.
        self.behaviors[0]
            .behavior
            .as_any()
            .downcast_ref::<Spatial>()
            .expect("slot 0 must hold the primary Spatial")
    }

    /// Mutably borrows the node's `Spatial`.
    pub fn spatial_mut(&mut self) -> &mut Spatial {
        self.behaviors[0]
            .behavior
            .as_any_mut()
            .downcast_mut::<Spatial>()
            .expect("slot 0 must hold the primary Spatial")
    }

    /// Borrows the first attached behavior of type `B`, if any.
    pub fn typed<B: Behavior>(&self) -> Option<&B> {
        self.behaviors
            .iter()
            .find_map(|slot| slot.behavior.as_any().downcast_ref::<B>())
    }

    /// Mutably borrows the first attached behavior of type `B`, if any.
    pub fn typed_mut<B: Behavior>(&mut self) -> Option<&mut B> {
        self.behaviors
            .iter_mut()
            .find_map(|slot| slot.behavior.as_any_mut().downcast_mut::<B>())
    }

    /// Serializes the node's own non-reference state into an opaque blob.
    pub fn state_bytes(&self) -> Vec<u8> {
        encode_state(&NodeState {
            name: self.name.clone(),
            active: self.active,
            is_static: self.is_static,
        })
    }

    /// Overwrites the node's own non-reference state from an opaque blob.
    pub fn apply_state(&mut self, bytes: &[u8]) -> Result<(), bincode::error::DecodeError> {
        let state: NodeState = decode_state(bytes)?;
        self.name = state.name;
        self.active = state.active;
        self.is_static = state.is_static;
        Ok(())
    }

    /// The node's own reference-typed fields, in stable order.
    ///
    /// Nodes carry no reference fields of their own today; the capture
    /// encoding keeps a slot for them regardless, so this stays the single
    /// point of truth if that changes.
    pub fn ref_fields(&self) -> Vec<Option<StableId>> {
        Vec::new()
    }

    /// Overwrites the node's own reference-typed fields.
    pub fn apply_ref_fields(&mut self, _refs: &[Option<StableId>]) {}
}
