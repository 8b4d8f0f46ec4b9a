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

//! The behavior contract: typed units of state attached to nodes.
//!
//! A behavior exposes everything the capture lanes need without the lanes
//! knowing its concrete type: a stable type key for re-instantiation, an
//! opaque codec for its non-reference state, and enumeration of its
//! reference-typed fields in a stable, repeatable order. The field order
//! contract is load-bearing: encode and restore walk the same fields in the
//! same relative positions, so `ref_fields` and `apply_ref_fields` must
//! agree on count and order for equivalently-shaped values.

mod marker;
mod registry;
mod seeker;
mod spatial;
mod waypoint;

pub use marker::PersistMarker;
pub use registry::BehaviorRegistry;
pub use seeker::Seeker;
pub use spatial::Spatial;
pub use waypoint::Waypoint;

use serde::{de::DeserializeOwned, Serialize};
use stasis_core::StableId;
use std::any::Any;

/// A typed unit of state/logic attached to a node.
///
/// Implementations are plain data holders; the snapshot system drives them
/// exclusively through this contract.
pub trait Behavior: Send + Sync + 'static {
    /// The stable identity used to re-instantiate this type at restore
    /// time. Must never change once snapshots referencing it exist.
    fn type_key(&self) -> &'static str;

    /// Serializes the behavior's non-reference state into an opaque blob.
    fn state_bytes(&self) -> Vec<u8>;

    /// Overwrites the behavior's non-reference state from an opaque blob
    /// previously produced by [`Behavior::state_bytes`] on a value of the
    /// same type.
    fn apply_state(&mut self, bytes: &[u8]) -> Result<(), bincode::error::DecodeError>;

    /// Returns the current values of the behavior's reference-typed fields,
    /// in stable field order. The returned length must depend only on the
    /// state applied via [`Behavior::apply_state`], never on which targets
    /// happen to be set.
    fn ref_fields(&self) -> Vec<Option<StableId>>;

    /// Overwrites the behavior's reference-typed fields. `refs` has the
    /// same length and order `ref_fields` reports for this state.
    fn apply_ref_fields(&mut self, refs: &[Option<StableId>]);

    /// Returns this behavior as [`Any`] for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns this behavior as mutable [`Any`] for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Encodes a behavior's serializable state form into its opaque blob.
///
/// Encoding plain state structs cannot fail, matching the encode side of
/// the codec contract being infallible.
pub fn encode_state<S: Serialize>(state: &S) -> Vec<u8> {
    bincode::serde::encode_to_vec(state, bincode::config::standard()).unwrap()
}

/// Decodes an opaque blob back into a serializable state form.
pub fn decode_state<S: DeserializeOwned>(bytes: &[u8]) -> Result<S, bincode::error::DecodeError> {
    let (state, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;
    Ok(state)
}
