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

//! # Stasis Lanes
//!
//! The hot-path pipelines of the snapshot system: capturing a live forest
//! into a flat [`Snapshot`](stasis_data::snapshot::Snapshot), restoring a
//! snapshot back into live objects, and cheap change detection between the
//! two.

pub mod capture_lane;
pub mod change;
pub mod restore_lane;

pub use capture_lane::{encode, SNAPSHOT_CODEC_ID};
pub use change::has_changes;
pub use restore_lane::{can_restore, restore, RestoreError};
