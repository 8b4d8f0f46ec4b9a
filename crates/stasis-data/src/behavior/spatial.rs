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
use stasis_core::math::{Quaternion, Vec3};
use stasis_core::StableId;
use std::any::Any;

use crate::behavior::{decode_state, encode_state, Behavior};

/// The built-in primary behavior describing a node's position, rotation,
/// and scale relative to its parent (or to the container origin for roots).
///
/// Every node owns exactly one `Spatial`, created with the node at slot 0;
/// it cannot be detached. Restore reuses the existing instance in place
/// instead of instantiating a new one. All values are local: re-parenting
/// leaves them untouched, so a restored subtree keeps its exact relative
/// transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spatial {
    /// The translation (position) of the node.
    pub translation: Vec3,
    /// The rotation of the node, represented as a quaternion.
    pub rotation: Quaternion,
    /// The scale of the node.
    pub scale: Vec3,
}

/// The stable serializable form of [`Spatial`].
#[derive(Debug, Serialize, Deserialize)]
pub struct SpatialState {
    /// The translation of the node.
    pub translation: Vec3,
    /// The rotation of the node.
    pub rotation: Quaternion,
    /// The scale of the node.
    pub scale: Vec3,
}

impl Spatial {
    /// The stable type identity of `Spatial`.
    pub const TYPE_KEY: &'static str = "stasis.spatial";

    /// Creates a new identity `Spatial`: no translation, rotation, or scaling.
    pub fn identity() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quaternion::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    /// Creates a new `Spatial` with a given translation, and identity
    /// rotation/scale.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }
}

impl Default for Spatial {
    /// Returns the identity `Spatial`.
    fn default() -> Self {
        Self::identity()
    }
}

impl Behavior for Spatial {
    fn type_key(&self) -> &'static str {
        Self::TYPE_KEY
    }

    fn state_bytes(&self) -> Vec<u8> {
        encode_state(&SpatialState {
            translation: self.translation,
            rotation: self.rotation,
            scale: self.scale,
        })
    }

    fn apply_state(&mut self, bytes: &[u8]) -> Result<(), bincode::error::DecodeError> {
        let state: SpatialState = decode_state(bytes)?;
        self.translation = state.translation;
        self.rotation = state.rotation;
        self.scale = state.scale;
        Ok(())
    }

    fn ref_fields(&self) -> Vec<Option<StableId>> {
        Vec::new()
    }

    fn apply_ref_fields(&mut self, _refs: &[Option<StableId>]) {}

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
