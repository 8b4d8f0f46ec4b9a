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

//! # Stasis Agents
//!
//! Orchestration around the capture/restore lanes: the persistence agent
//! driving the simulation-boundary lifecycle, snapshot store backends, and
//! the container backup writer.

pub mod backup;
pub mod persistence_agent;
pub mod store;

pub use backup::BackupWriter;
pub use persistence_agent::{AgentError, PersistenceAgent, PENDING_RESTORE_KEY};
pub use store::{DirectoryStore, MemoryStore};
