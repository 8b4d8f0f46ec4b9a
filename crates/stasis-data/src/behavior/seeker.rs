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
use stasis_core::math::LinearRgba;
use stasis_core::StableId;
use std::any::Any;

use crate::behavior::{decode_state, encode_state, Behavior};

/// A simple agent that moves toward a target [`Waypoint`](crate::behavior::Waypoint).
///
/// Carries one scalar reference field (`target`), which makes it the
/// smallest behavior exercising cross-object references.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seeker {
    /// Debug color of the agent.
    pub color: LinearRgba,
    /// Movement speed in units per second.
    pub move_speed: f32,
    /// The waypoint the agent is moving toward, if any.
    pub target: Option<StableId>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SeekerState {
    color: LinearRgba,
    move_speed: f32,
}

impl Seeker {
    /// The stable type identity of `Seeker`.
    pub const TYPE_KEY: &'static str = "stasis.seeker";
}

impl Default for Seeker {
    fn default() -> Self {
        Self {
            color: LinearRgba::RED,
            move_speed: 1.0,
            target: None,
        }
    }
}

impl Behavior for Seeker {
    fn type_key(&self) -> &'static str {
        Self::TYPE_KEY
    }

    fn state_bytes(&self) -> Vec<u8> {
        encode_state(&SeekerState {
            color: self.color,
            move_speed: self.move_speed,
        })
    }

    fn apply_state(&mut self, bytes: &[u8]) -> Result<(), bincode::error::DecodeError> {
        let state: SeekerState = decode_state(bytes)?;
        self.color = state.color;
        self.move_speed = state.move_speed;
        Ok(())
    }

    fn ref_fields(&self) -> Vec<Option<StableId>> {
        vec![self.target]
    }

    fn apply_ref_fields(&mut self, refs: &[Option<StableId>]) {
        self.target = refs.first().copied().flatten();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
