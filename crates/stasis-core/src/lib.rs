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

//! # Stasis Core
//!
//! Foundational crate containing identifiers, contracts, and utilities shared
//! by the Stasis snapshot/restore system.

#![warn(missing_docs)]

pub mod graph;
pub mod ident;
pub mod math;
pub mod snapshot;
pub mod store;

pub use ident::{CaptureId, NodeId, StableId};
pub use store::SnapshotStore;
