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

//! The agent driving the snapshot lifecycle across a simulation run.
//!
//! When a run is about to end, every hierarchy opted in via an eligible
//! [`PersistMarker`] is captured and parked in the snapshot store under a
//! well-known key. When the run has fully ended, the agent picks the parked
//! snapshot up again, short-circuits if nothing changed, and otherwise
//! restores the captured hierarchies in place of their originals.

use stasis_core::graph::depth_first;
use stasis_core::snapshot::SnapshotFile;
use stasis_core::store::{SnapshotStore, StoreError};
use stasis_core::NodeId;
use stasis_data::behavior::{BehaviorRegistry, PersistMarker};
use stasis_data::snapshot::Snapshot;
use stasis_data::stage::Stage;
use stasis_lanes::restore_lane::RestoreError;
use stasis_lanes::{can_restore, encode, has_changes, restore, SNAPSHOT_CODEC_ID};

use std::fmt;

/// The well-known store key a pending snapshot parks under between the end
/// of a run and its restoration.
pub const PENDING_RESTORE_KEY: &str = "stasis.pending_restore";

/// An error that can occur within the `PersistenceAgent`.
#[derive(Debug)]
pub enum AgentError {
    /// The snapshot store failed.
    StoreFailure(StoreError),
    /// A stored blob had an invalid or foreign header.
    InvalidHeader(&'static str),
    /// The snapshot payload could not be encoded or decoded.
    CodecFailure(String),
    /// The restore lanes failed after originals were already destroyed.
    RestoreFailed(RestoreError),
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentError::StoreFailure(e) => write!(f, "Persistence failed: {e}"),
            AgentError::InvalidHeader(msg) => {
                write!(f, "Persistence failed: invalid stored header - {msg}")
            }
            AgentError::CodecFailure(msg) => {
                write!(f, "Persistence failed: payload codec - {msg}")
            }
            AgentError::RestoreFailed(e) => write!(f, "Persistence failed: {e}"),
        }
    }
}

impl std::error::Error for AgentError {}

type RestoreSubscriber = Box<dyn FnMut(&[NodeId])>;

/// The orchestrator owning the snapshot store, the behavior registry used
/// for re-instantiation, and the restore notification list.
pub struct PersistenceAgent {
    store: Box<dyn SnapshotStore>,
    registry: BehaviorRegistry,
    subscribers: Vec<RestoreSubscriber>,
}

impl PersistenceAgent {
    /// Creates an agent over `store` with the built-in behavior registry.
    pub fn new(store: Box<dyn SnapshotStore>) -> Self {
        Self::with_registry(store, BehaviorRegistry::new())
    }

    /// Creates an agent over `store` with a caller-provided registry.
    pub fn with_registry(store: Box<dyn SnapshotStore>, registry: BehaviorRegistry) -> Self {
        Self {
            store,
            registry,
            subscribers: Vec::new(),
        }
    }

    /// Mutable access to the behavior registry, for registering
    /// project-specific behavior types.
    pub fn registry_mut(&mut self) -> &mut BehaviorRegistry {
        &mut self.registry
    }

    /// Registers a callback invoked with the new roots after every
    /// successful restore.
    pub fn on_restore(&mut self, subscriber: impl FnMut(&[NodeId]) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Collects every node whose hierarchy is opted in for persistence: the
    /// node carries an enabled [`PersistMarker`], no ancestor carries one
    /// (the outermost marker wins), and nothing in its subtree is static.
    pub fn eligible_roots(stage: &Stage) -> Vec<NodeId> {
        stage
            .iter_nodes()
            .filter(|&id| Self::is_eligible(stage, id))
            .collect()
    }

    fn is_eligible(stage: &Stage, id: NodeId) -> bool {
        let has_enabled_marker = |node_id: NodeId| {
            stage
                .node(node_id)
                .and_then(|node| node.typed::<PersistMarker>())
                .map(|marker| marker.enabled)
                .unwrap_or(false)
        };

        if !has_enabled_marker(id) {
            return false;
        }

        let mut ancestor = stage.node(id).and_then(|node| node.parent());
        while let Some(ancestor_id) = ancestor {
            if has_enabled_marker(ancestor_id) {
                return false;
            }
            ancestor = stage.node(ancestor_id).and_then(|node| node.parent());
        }

        depth_first(stage, id).into_iter().all(|descendant| {
            stage
                .node(descendant)
                .map(|node| !node.is_static())
                .unwrap_or(true)
        })
    }

    /// Lifecycle hook: the simulation run is about to end.
    ///
    /// Captures every eligible hierarchy and parks the snapshot in the
    /// store under [`PENDING_RESTORE_KEY`].
    pub fn on_run_ending(&mut self, stage: &Stage) -> Result<(), AgentError> {
        let roots = Self::eligible_roots(stage);
        let snapshot = encode(stage, &roots);

        let payload =
            bincode::serde::encode_to_vec(&snapshot, bincode::config::standard())
                .map_err(|e| AgentError::CodecFailure(e.to_string()))?;
        let file = SnapshotFile::new(SNAPSHOT_CODEC_ID, payload);
        self.store
            .put(PENDING_RESTORE_KEY, file.to_bytes())
            .map_err(AgentError::StoreFailure)?;

        log::info!(
            "capture {}: parked {} hierarchies ({} nodes)",
            snapshot.capture_id,
            snapshot.root_count(),
            snapshot.nodes.len()
        );
        Ok(())
    }

    /// Lifecycle hook: the simulation run has fully ended.
    ///
    /// Picks up the parked snapshot, skips restoration when the live state
    /// already matches it, and otherwise rebuilds the captured hierarchies,
    /// destroying the originals. Returns the new roots, or `None` when
    /// there was nothing to do.
    pub fn on_run_ended(&mut self, stage: &mut Stage) -> Result<Option<Vec<NodeId>>, AgentError> {
        let Some(bytes) = self
            .store
            .take(PENDING_RESTORE_KEY)
            .map_err(AgentError::StoreFailure)?
        else {
            return Ok(None);
        };

        let file = SnapshotFile::from_bytes(&bytes).map_err(AgentError::InvalidHeader)?;
        if file.header.codec_id_str() != Some(SNAPSHOT_CODEC_ID) {
            return Err(AgentError::InvalidHeader("unknown payload codec"));
        }
        let (snapshot, _): (Snapshot, usize) =
            bincode::serde::decode_from_slice(&file.payload, bincode::config::standard())
                .map_err(|e| AgentError::CodecFailure(e.to_string()))?;

        // Comparing is much cheaper than restoring, so that happens first.
        let current_roots = Self::eligible_roots(stage);
        if !has_changes(stage, &snapshot, &current_roots) {
            log::info!("capture {}: no changes, restore skipped", snapshot.capture_id);
            return Ok(None);
        }

        if !can_restore(&snapshot, stage) {
            if snapshot.found_static {
                let rescue_key = format!("stasis.rescue.{}", snapshot.capture_id);
                self.store
                    .put(&rescue_key, bytes)
                    .map_err(AgentError::StoreFailure)?;
                log::error!(
                    "capture {}: contains a static node, whose batched state cannot be \
                     rebuilt field-by-field; restore refused. The payload was kept under \
                     store key '{rescue_key}'.",
                    snapshot.capture_id
                );
            } else {
                log::warn!(
                    "capture {}: no captured container is currently loaded; restore skipped",
                    snapshot.capture_id
                );
            }
            return Ok(None);
        }

        match restore(stage, &snapshot, &self.registry, true) {
            Ok(roots) => {
                let mut summary = format!("restored {} hierarchies:", roots.len());
                for &root in &roots {
                    if let Some(node) = stage.node(root) {
                        summary.push_str("\n  ");
                        summary.push_str(&node.name);
                    }
                }
                log::info!("capture {}: {summary}", snapshot.capture_id);

                for subscriber in &mut self.subscribers {
                    subscriber(&roots);
                }
                Ok(Some(roots))
            }
            Err(e) => {
                log::error!(
                    "capture {}: restore failed after the originals were destroyed: {e}. \
                     Recover the previous state from the container backups.",
                    snapshot.capture_id
                );
                Err(AgentError::RestoreFailed(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use stasis_core::math::Vec3;

    fn marked_stage() -> (Stage, NodeId, NodeId) {
        let mut stage = Stage::new();
        stage.add_container("world/main");
        let root = stage.create_node("world/main", "root").unwrap();
        let child = stage.create_node("world/main", "child").unwrap();
        stage.set_parent(child, Some(root));
        stage.attach(root, Box::<PersistMarker>::default());
        (stage, root, child)
    }

    #[test]
    fn eligibility_requires_an_outermost_enabled_marker() {
        let (mut stage, root, child) = marked_stage();

        assert_eq!(PersistenceAgent::eligible_roots(&stage), vec![root]);

        // A nested marker defers to the one above it.
        stage.attach(child, Box::<PersistMarker>::default());
        assert_eq!(PersistenceAgent::eligible_roots(&stage), vec![root]);

        // Disabling the outer marker promotes the nested one.
        stage
            .node_mut(root)
            .unwrap()
            .typed_mut::<PersistMarker>()
            .unwrap()
            .enabled = false;
        assert_eq!(PersistenceAgent::eligible_roots(&stage), vec![child]);
    }

    #[test]
    fn static_descendants_make_a_hierarchy_ineligible() {
        let (mut stage, root, child) = marked_stage();
        stage.node_mut(child).unwrap().set_static(true);
        assert!(PersistenceAgent::eligible_roots(&stage).is_empty());
        let _ = root;
    }

    #[test]
    fn unchanged_run_skips_the_restore() {
        let (mut stage, root, _) = marked_stage();
        let mut agent = PersistenceAgent::new(Box::<MemoryStore>::default());

        agent.on_run_ending(&stage).unwrap();
        let outcome = agent.on_run_ended(&mut stage).unwrap();

        assert!(outcome.is_none(), "identical state must not be restored");
        assert!(stage.node(root).is_some(), "original must survive");
    }

    #[test]
    fn changed_run_restores_and_notifies() {
        let (mut stage, root, _) = marked_stage();
        let mut agent = PersistenceAgent::new(Box::<MemoryStore>::default());

        // The run moves the root, and the capture keeps that change.
        stage.node_mut(root).unwrap().spatial_mut().translation = Vec3::new(9.0, 0.0, 0.0);
        agent.on_run_ending(&stage).unwrap();

        // The mode transition reverts the live state.
        stage.node_mut(root).unwrap().spatial_mut().translation = Vec3::ZERO;

        let notified = std::rc::Rc::new(std::cell::Cell::new(0usize));
        let seen = notified.clone();
        agent.on_restore(move |roots| seen.set(roots.len()));

        let outcome = agent.on_run_ended(&mut stage).unwrap();
        let roots = outcome.expect("changed state must restore");
        assert_eq!(roots.len(), 1);
        assert_eq!(notified.get(), 1);

        // The restored copy carries the run's state, not the reverted one.
        let restored = stage.node(roots[0]).unwrap();
        assert_eq!(restored.spatial().translation, Vec3::new(9.0, 0.0, 0.0));
        assert!(stage.node(root).is_none(), "original must be destroyed");
    }

    #[test]
    fn empty_store_is_a_quiet_no_op() {
        let (mut stage, _, _) = marked_stage();
        let mut agent = PersistenceAgent::new(Box::<MemoryStore>::default());
        assert!(agent.on_run_ended(&mut stage).unwrap().is_none());
    }
}
