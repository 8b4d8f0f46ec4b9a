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

//! The restore pipeline: destroy-before-create, recursive re-creation of
//! the encoded forest, and the two-pass reference resolver.
//!
//! Error policy: an unavailable container skips that root only; a dangling
//! external reference recovers as null with a warning; an unresolvable
//! behavior type or any other reconstruction fault aborts the whole call.
//! The pipeline does not roll back partially created nodes — the
//! surrounding orchestration's backup mechanism is the recovery backstop.

mod decoder;
mod resolver;

pub use decoder::{can_restore, restore};

use thiserror::Error;

/// A fatal fault while restoring a snapshot.
#[derive(Debug, Error)]
pub enum RestoreError {
    /// The snapshot's rejection flag is set: it captured a static node and
    /// cannot be reconstructed field-by-field.
    #[error("snapshot was rejected at capture time (contains a static node)")]
    RejectedSnapshot,

    /// A behavior type named by the snapshot is not registered. A node
    /// cannot be partially typed, so the whole restore aborts.
    #[error("behavior type '{type_key}' could not be resolved")]
    TypeResolution {
        /// The unresolvable type key.
        type_key: String,
    },

    /// Any other fault during node/behavior reconstruction (corrupt state
    /// blobs, inconsistent layout). Restoration does not roll back; recover
    /// from the container backups.
    #[error("unexpected failure while rebuilding nodes: {0}")]
    UnexpectedFailure(String),
}
