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

//! The second half of a restore: structural fixup and reference rewriting.
//!
//! Both passes run only after every node of the restore exists. Forward and
//! cyclic references make single-pass construction impossible, so creation
//! records a ledger and the link work happens here.

use stasis_core::{NodeId, StableId};
use stasis_data::behavior::Behavior;
use stasis_data::snapshot::{RefSlot, Snapshot};
use stasis_data::stage::Stage;

use crate::restore_lane::RestoreError;

/// Pass 1: re-attach restored roots to their outside parents and put every
/// created node at its captured sibling position.
///
/// Non-root nodes were already parented during the recursive rebuild; only
/// nodes whose live parent is still unset (exactly the restored roots)
/// consult their encoded parent id. A parent that no longer exists leaves
/// the node at its container root with a warning.
pub(crate) fn fix_structure(stage: &mut Stage, snapshot: &Snapshot, created: &[(u32, NodeId)]) {
    for &(encoded_index, node_id) in created {
        let encoded = &snapshot.nodes[encoded_index as usize];

        let live_parent = stage.node(node_id).and_then(|node| node.parent());
        if live_parent.is_none() {
            if let Some(parent_sid) = encoded.parent_id {
                match stage.node_by_stable(parent_sid) {
                    // No world-position preservation: local values stay
                    // verbatim, preserving the exact relative transform.
                    Some(parent) => {
                        stage.set_parent(node_id, Some(parent));
                    }
                    None => log::warn!(
                        "restored root's parent {parent_sid} no longer exists; \
                         leaving it at the container root"
                    ),
                }
            }
        }

        stage.set_sibling_index(node_id, encoded.sibling_index as usize);
    }
}

/// Pass 2: rewrite every reference-typed field of every created object.
///
/// Fields are revisited in the order their classifications were recorded:
/// `Null` stays null, `Internal(i)` binds to the object created at ledger
/// position `i`, and `External(id)` re-binds to the original outside object
/// if it is still alive — a vanished external target degrades to null with
/// a warning rather than failing the restore.
pub(crate) fn resolve_references(
    stage: &mut Stage,
    snapshot: &Snapshot,
    created: &[(u32, NodeId)],
    ledger: &[Option<StableId>],
) -> Result<(), RestoreError> {
    for &(encoded_index, node_id) in created {
        let encoded = &snapshot.nodes[encoded_index as usize];

        let node_refs = resolve_slots(stage, &encoded.refs, ledger)?;
        if let Some(node) = stage.node_mut(node_id) {
            node.apply_ref_fields(&node_refs);
        }

        for (slot, encoded_behavior) in encoded.behaviors.iter().enumerate() {
            let refs = resolve_slots(stage, &encoded_behavior.refs, ledger)?;
            if let Some(node) = stage.node_mut(node_id) {
                if let Some(behavior_slot) = node.behaviors_mut().get_mut(slot) {
                    behavior_slot.get_mut().apply_ref_fields(&refs);
                }
            }
        }
    }
    Ok(())
}

fn resolve_slots(
    stage: &Stage,
    slots: &[RefSlot],
    ledger: &[Option<StableId>],
) -> Result<Vec<Option<StableId>>, RestoreError> {
    slots
        .iter()
        .map(|slot| match *slot {
            RefSlot::Null => Ok(None),
            RefSlot::Internal(index) => match ledger.get(index as usize) {
                Some(&Some(sid)) => Ok(Some(sid)),
                Some(&None) => {
                    log::warn!(
                        "internal reference targets an object of a skipped root; \
                         recovering as null"
                    );
                    Ok(None)
                }
                None => Err(RestoreError::UnexpectedFailure(format!(
                    "internal reference index {index} is outside the object ledger"
                ))),
            },
            RefSlot::External(id) => {
                if stage.is_alive(id) {
                    Ok(Some(id))
                } else {
                    log::warn!("external reference {id} could not be found; recovering as null");
                    Ok(None)
                }
            }
        })
        .collect()
}
