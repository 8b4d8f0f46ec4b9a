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

//! The flat, restorable snapshot representation.
//!
//! A snapshot is one ordered sequence of encoded nodes per captured root,
//! concatenated, plus the offsets locating each root. Node order within a
//! root is strict depth-first, parent immediately followed by its full
//! subtree; `first_child` is always the node's own index plus one. The
//! capture and restore lanes both lean on that layout: it lets the decoder
//! re-derive the encoder's object enumeration purely from creation order.

use serde::{Deserialize, Serialize};
use stasis_core::{CaptureId, StableId};
use std::ops::Range;

/// The classification of one reference-typed field at capture time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefSlot {
    /// The field held no reference.
    Null,
    /// The field referenced an object inside the captured set, identified
    /// by its position in the capture's object ledger.
    Internal(u32),
    /// The field referenced an object outside the captured set, identified
    /// by its stable id.
    External(StableId),
}

/// One captured behavior: enough identity to re-instantiate the type, its
/// opaque state, and one classification per reference-typed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedBehavior {
    /// The behavior's stable type key.
    pub type_key: String,
    /// The opaque non-reference state blob.
    pub state: Vec<u8>,
    /// Classifications of the behavior's reference fields, in field order.
    pub refs: Vec<RefSlot>,
}

/// One captured node with its structural metadata and attached behaviors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedNode {
    /// The opaque non-reference state blob of the node itself.
    pub state: Vec<u8>,
    /// Classifications of the node's own reference fields, in field order.
    pub refs: Vec<RefSlot>,
    /// The path of the container the node belonged to.
    pub container_path: String,
    /// The stable id of the node's parent at capture time; presence doubles
    /// as the has-parent flag. Only consulted for roots at restore — deeper
    /// nodes are re-parented by the recursive rebuild itself.
    pub parent_id: Option<StableId>,
    /// The node's position among its siblings at capture time.
    pub sibling_index: u32,
    /// The number of direct children.
    pub child_count: u32,
    /// Index of the first child in the flat sequence. By construction of
    /// the depth-first order this is always the node's own index plus one.
    pub first_child: u32,
    /// The node's behaviors, in slot order (slot 0 is the primary spatial).
    pub behaviors: Vec<EncodedBehavior>,
}

/// A complete captured forest: the persisted/transferable artifact.
///
/// Equality deliberately ignores [`Snapshot::capture_id`]; change detection
/// compares content, and the id only tags the capture operation itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Tag identifying this capture operation in logs and derived keys.
    pub capture_id: CaptureId,
    /// All captured nodes, one depth-first run per root, concatenated.
    pub nodes: Vec<EncodedNode>,
    /// Index into `nodes` of each true root, in capture order.
    pub root_offsets: Vec<u32>,
    /// Stable id of each original true root, parallel to `root_offsets`.
    /// Used to find (and optionally destroy) the originals at restore time.
    pub root_ids: Vec<StableId>,
    /// Set when any captured node was flagged immutable/batched. A snapshot
    /// with this flag set must never be restored.
    pub found_static: bool,
}

impl Snapshot {
    /// Creates an empty snapshot with a fresh capture id.
    pub fn new() -> Self {
        Self {
            capture_id: CaptureId::new(),
            nodes: Vec::new(),
            root_offsets: Vec::new(),
            root_ids: Vec::new(),
            found_static: false,
        }
    }

    /// Returns `true` if the snapshot captured nothing.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The number of captured roots.
    pub fn root_count(&self) -> usize {
        self.root_offsets.len()
    }

    /// The range of `nodes` indices occupied by the subtree of root number
    /// `root_index`. Each root's full subtree is contiguous: it runs from
    /// the root's offset to the next root's offset (or the end).
    pub fn root_span(&self, root_index: usize) -> Range<usize> {
        let start = self.root_offsets[root_index] as usize;
        let end = self
            .root_offsets
            .get(root_index + 1)
            .map(|&offset| offset as usize)
            .unwrap_or(self.nodes.len());
        start..end
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
            && self.root_offsets == other.root_offsets
            && self.root_ids == other.root_ids
            && self.found_static == other.found_static
    }
}
