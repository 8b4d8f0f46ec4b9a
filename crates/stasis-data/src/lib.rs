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

//! # Stasis Data
//!
//! Data layouts for the Stasis snapshot system: the live stage model
//! (containers, nodes, attached behaviors), the behavior contract and its
//! built-in implementations, and the flat snapshot representation the
//! capture/restore lanes operate on.

pub mod behavior;
pub mod snapshot;
pub mod stage;
