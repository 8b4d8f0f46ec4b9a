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

/// Opt-in marker: a node carrying an enabled `PersistMarker` asks for its
/// whole hierarchy to be captured at the end of a simulation run and
/// restored afterwards.
///
/// Eligibility is decided by the persistence layer: the marker must be
/// enabled, no ancestor may carry an enabled marker (the outermost marker
/// wins), and no descendant may be static.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistMarker {
    /// Whether the marker currently opts its hierarchy in.
    pub enabled: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistMarkerState {
    enabled: bool,
}

impl PersistMarker {
    /// The stable type identity of `PersistMarker`.
    pub const TYPE_KEY: &'static str = "stasis.persist_marker";
}

impl Default for PersistMarker {
    /// Returns an enabled marker.
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Behavior for PersistMarker {
    fn type_key(&self) -> &'static str {
        Self::TYPE_KEY
    }

    fn state_bytes(&self) -> Vec<u8> {
        encode_state(&PersistMarkerState {
            enabled: self.enabled,
        })
    }

    fn apply_state(&mut self, bytes: &[u8]) -> Result<(), bincode::error::DecodeError> {
        let state: PersistMarkerState = decode_state(bytes)?;
        self.enabled = state.enabled;
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
