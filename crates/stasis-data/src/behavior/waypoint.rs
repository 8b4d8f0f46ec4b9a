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
use stasis_core::StableId;
use std::any::Any;

use crate::behavior::{decode_state, encode_state, Behavior};

/// A navigation waypoint holding references to the waypoints it connects to.
///
/// The connection list is a variable-length reference field: its length is
/// part of the behavior's non-reference state, so a restored waypoint
/// recovers its shape before the reference pass fills in the targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Waypoint {
    /// Connected waypoints, by stable id. `None` entries are broken links.
    pub connected: Vec<Option<StableId>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WaypointState {
    connected_len: u32,
}

impl Waypoint {
    /// The stable type identity of `Waypoint`.
    pub const TYPE_KEY: &'static str = "stasis.waypoint";
}

impl Behavior for Waypoint {
    fn type_key(&self) -> &'static str {
        Self::TYPE_KEY
    }

    fn state_bytes(&self) -> Vec<u8> {
        encode_state(&WaypointState {
            connected_len: self.connected.len() as u32,
        })
    }

    fn apply_state(&mut self, bytes: &[u8]) -> Result<(), bincode::error::DecodeError> {
        let state: WaypointState = decode_state(bytes)?;
        // Restore the shape; targets arrive through apply_ref_fields.
        self.connected = vec![None; state.connected_len as usize];
        Ok(())
    }

    fn ref_fields(&self) -> Vec<Option<StableId>> {
        self.connected.clone()
    }

    fn apply_ref_fields(&mut self, refs: &[Option<StableId>]) {
        self.connected = refs.to_vec();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
