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

//! Object identifiers used across the stage and snapshot layers.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A unique handle to a live node in a stage.
///
/// It combines an index with a generation count to solve the "ABA problem".
/// When a node is destroyed, its index can be recycled for a new node, but
/// the generation is incremented, so stale `NodeId` handles pointing at a
/// recycled slot become invalid instead of aliasing the new node.
///
/// `NodeId`s are meaningful only within one live stage and are never
/// persisted; snapshots identify objects by [`StableId`] or by ledger
/// position instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    /// The index of the node's slot in the stage's node store.
    pub index: u32,
    /// A generation counter, incremented each time the index is recycled.
    pub generation: u32,
}

/// A process-lifetime-stable identifier for a live object (node or behavior).
///
/// A `StableId` is issued by the stage when the object is created and is
/// never reused within a process, so it can be used to re-find an object
/// across operations. It is only valid while the referenced object remains
/// alive: once the object is destroyed, lookups for its id fail and any
/// stored copy of the id is dangling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StableId(u64);

impl StableId {
    /// Wraps a raw id value. Intended for the stage's id allocator.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id value.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for StableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A globally unique tag assigned to every captured snapshot.
///
/// The capture id identifies one capture operation in logs and derived store
/// keys (e.g. rescue keys). It carries no structural meaning: snapshot
/// equality for change detection ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaptureId(Uuid);

impl CaptureId {
    /// Creates a new, random (version 4) `CaptureId`.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CaptureId {
    /// Creates a new, random (version 4) `CaptureId`.
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CaptureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
