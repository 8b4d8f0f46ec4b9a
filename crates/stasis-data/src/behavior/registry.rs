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

use std::collections::HashMap;

use crate::behavior::{Behavior, PersistMarker, Seeker, Spatial, Waypoint};

/// A function that produces a fresh, default instance of one behavior type.
type BehaviorFactory = Box<dyn Fn() -> Box<dyn Behavior> + Send + Sync>;

/// A registry mapping behavior type keys to their instantiation functions.
///
/// This is the restore-side half of the type-erasure scheme: snapshots name
/// behavior types by their stable string key, and the registry turns a key
/// back into a live instance whose state can then be overwritten from the
/// encoded blob. A key the registry does not know is a fatal condition for
/// the restore that hits it; there is deliberately no skip-missing-type
/// policy.
pub struct BehaviorRegistry {
    map: HashMap<String, BehaviorFactory>,
}

impl BehaviorRegistry {
    /// Creates a registry with all built-in behavior types registered.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Spatial::TYPE_KEY, || Box::<Spatial>::default());
        registry.register(PersistMarker::TYPE_KEY, || Box::<PersistMarker>::default());
        registry.register(Waypoint::TYPE_KEY, || Box::<Waypoint>::default());
        registry.register(Seeker::TYPE_KEY, || Box::<Seeker>::default());
        registry
    }

    /// Creates a registry with no registered types.
    pub fn empty() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Registers a behavior type under its stable key.
    ///
    /// Re-registering a key replaces the previous factory.
    pub fn register(
        &mut self,
        type_key: &str,
        factory: impl Fn() -> Box<dyn Behavior> + Send + Sync + 'static,
    ) {
        self.map.insert(type_key.to_string(), Box::new(factory));
    }

    /// Returns `true` if `type_key` is registered.
    pub fn contains(&self, type_key: &str) -> bool {
        self.map.contains_key(type_key)
    }

    /// Instantiates a fresh behavior of the given type, or `None` if the
    /// key is unknown.
    pub fn instantiate(&self, type_key: &str) -> Option<Box<dyn Behavior>> {
        self.map.get(type_key).map(|factory| factory())
    }
}

impl Default for BehaviorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_types_are_registered() {
        let registry = BehaviorRegistry::new();
        for key in [
            Spatial::TYPE_KEY,
            PersistMarker::TYPE_KEY,
            Waypoint::TYPE_KEY,
            Seeker::TYPE_KEY,
        ] {
            let instance = registry.instantiate(key).expect("missing built-in");
            assert_eq!(instance.type_key(), key);
        }
    }

    #[test]
    fn unknown_keys_resolve_to_none() {
        let registry = BehaviorRegistry::new();
        assert!(registry.instantiate("stasis.renamed_away").is_none());
        assert!(!registry.contains("stasis.renamed_away"));
    }
}
