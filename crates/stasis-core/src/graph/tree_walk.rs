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

//! True-root filtering and depth-first ordering over a generic tree.
//!
//! The capture pipeline relies on two guarantees from this module: a set of
//! selected objects is reduced to its "true roots" (members not descended
//! from another member), and every root's subtree is visited in a strict
//! parent-before-children, siblings-in-order sequence. Encoder and decoder
//! both depend on that sequence being identical between runs.

use std::hash::Hash;

/// Read access to a parent/children tree structure.
///
/// Implemented by any environment that owns tree-shaped objects and wants
/// them walked. The contract mirrors the rest of the crate: `children_of`
/// must report children in their current sibling order, and `parent_of`
/// must be consistent with it.
pub trait Hierarchy {
    /// The handle type used to address nodes in the hierarchy.
    type Id: Copy + Eq + Hash;

    /// Returns the parent of `id`, or `None` for a top-level node.
    fn parent_of(&self, id: Self::Id) -> Option<Self::Id>;

    /// Returns the children of `id` in sibling order.
    fn children_of(&self, id: Self::Id) -> Vec<Self::Id>;
}

/// Returns `true` if `ancestor` appears on `node`'s parent chain.
///
/// A node is not its own ancestor.
pub fn is_ancestor<H: Hierarchy>(hierarchy: &H, ancestor: H::Id, node: H::Id) -> bool {
    let mut current = hierarchy.parent_of(node);
    while let Some(id) = current {
        if id == ancestor {
            return true;
        }
        current = hierarchy.parent_of(id);
    }
    false
}

/// Reduces a list of candidate roots to its true roots.
///
/// A single candidate is always a true root. Otherwise a candidate is kept
/// iff no *other* candidate is an ancestor of it; two unrelated candidates
/// are both roots. Duplicates are dropped, first occurrence wins, and the
/// caller's order is preserved.
pub fn true_roots<H: Hierarchy>(hierarchy: &H, candidates: &[H::Id]) -> Vec<H::Id> {
    let mut unique: Vec<H::Id> = Vec::with_capacity(candidates.len());
    for &candidate in candidates {
        if !unique.contains(&candidate) {
            unique.push(candidate);
        }
    }

    if unique.len() <= 1 {
        return unique;
    }

    unique
        .iter()
        .copied()
        .filter(|&candidate| {
            !unique
                .iter()
                .any(|&other| other != candidate && is_ancestor(hierarchy, other, candidate))
        })
        .collect()
}

/// Produces the depth-first node order of `root`'s subtree.
///
/// The root comes first, then each child's full depth-first order, children
/// visited in their existing sibling order.
pub fn depth_first<H: Hierarchy>(hierarchy: &H, root: H::Id) -> Vec<H::Id> {
    let mut order = Vec::new();
    collect(hierarchy, root, &mut order);
    order
}

fn collect<H: Hierarchy>(hierarchy: &H, node: H::Id, order: &mut Vec<H::Id>) {
    order.push(node);
    for child in hierarchy.children_of(node) {
        collect(hierarchy, child, order);
    }
}
