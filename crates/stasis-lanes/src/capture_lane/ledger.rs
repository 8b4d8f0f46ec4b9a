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

use std::collections::HashMap;

use stasis_core::StableId;
use stasis_data::snapshot::RefSlot;
use stasis_data::stage::Stage;

/// The capture-time reference ledger.
///
/// Built once per encode pass from the fixed membership set (every node and
/// behavior in the captured hierarchies, in enumeration order), then used
/// to classify each reference-typed field as null, internal (member of the
/// set, addressed by ledger index), or external (alive outside the set,
/// addressed by stable id).
///
/// The index assigned here is the contract with the restore side: the
/// decoder re-derives the same indices purely from its creation order, so
/// the enumeration order feeding this ledger must match the encoder's node
/// walk exactly.
pub struct RefLedger {
    index_of: HashMap<StableId, u32>,
}

impl RefLedger {
    /// Builds a ledger assigning consecutive indices to `membership` in the
    /// given order.
    pub fn new(membership: &[StableId]) -> Self {
        let index_of = membership
            .iter()
            .enumerate()
            .map(|(index, &id)| (id, index as u32))
            .collect();
        Self { index_of }
    }

    /// The number of ledger entries.
    pub fn len(&self) -> usize {
        self.index_of.len()
    }

    /// Returns `true` if the ledger is empty.
    pub fn is_empty(&self) -> bool {
        self.index_of.is_empty()
    }

    /// Classifies one reference-typed field value.
    ///
    /// A reference to an object that no longer lives in `stage` reads as
    /// null, matching what the field would resolve to if followed.
    pub fn classify(&self, stage: &Stage, field: Option<StableId>) -> RefSlot {
        match field {
            None => RefSlot::Null,
            Some(id) => {
                if let Some(&index) = self.index_of.get(&id) {
                    RefSlot::Internal(index)
                } else if stage.is_alive(id) {
                    RefSlot::External(id)
                } else {
                    RefSlot::Null
                }
            }
        }
    }
}
