// Copyright (c) The pkggraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The trait evaluator (component C5): computing the set of enabled traits for a package from a
//! root selection, by fixed-point expansion over each trait's `enabledTraits` list.

use crate::manifest::PackageManifest;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeSet, HashMap};
use std::hash::{Hash, Hasher};

/// The name used for a package's default trait selection when the root requests nothing
/// explicit.
pub const DEFAULT_TRAIT: &str = "default";

/// Expands a root trait selection into the full enabled-trait set for `manifest`, via repeated
/// union of each selected trait's `enabledTraits` list until a fixed point is reached.
///
/// If `selection` is empty, the seed is `{default}` (whether or not the package actually
/// declares a `default` trait — expanding a trait name the package doesn't declare is a no-op,
/// not an error, matching a plain union-based fixed point).
pub fn enabled_traits(manifest: &PackageManifest, selection: &BTreeSet<String>) -> BTreeSet<String> {
    let mut enabled: BTreeSet<String> = if selection.is_empty() {
        let mut seed = BTreeSet::new();
        seed.insert(DEFAULT_TRAIT.to_string());
        seed
    } else {
        selection.clone()
    };

    loop {
        let mut to_add = Vec::new();
        for name in &enabled {
            if let Some(decl) = manifest.traits.iter().find(|t| &t.name == name) {
                for enabled_by_this in &decl.enabled_traits {
                    if !enabled.contains(enabled_by_this) {
                        to_add.push(enabled_by_this.clone());
                    }
                }
            }
        }
        if to_add.is_empty() {
            break;
        }
        enabled.extend(to_add);
    }

    enabled
}

/// Memoizes [`enabled_traits`] by `(package_identity, selection)`, per the design note in spec
/// §9 ("Manifest trait-gated dependency set").
#[derive(Default)]
pub struct TraitEvaluator {
    cache: HashMap<(String, u64), BTreeSet<String>>,
}

impl TraitEvaluator {
    /// Creates a fresh, empty evaluator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the enabled-trait set for `manifest` under `selection`, computing and caching it
    /// if this is the first time this exact pair has been seen.
    pub fn evaluate(&mut self, manifest: &PackageManifest, selection: &BTreeSet<String>) -> BTreeSet<String> {
        let key = (manifest.identity.as_str().to_string(), selection_hash(selection));
        if let Some(cached) = self.cache.get(&key) {
            return cached.clone();
        }
        let result = enabled_traits(manifest, selection);
        self.cache.insert(key, result.clone());
        result
    }
}

fn selection_hash(selection: &BTreeSet<String>) -> u64 {
    let mut hasher = DefaultHasher::new();
    for name in selection {
        name.hash(&mut hasher);
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{Identity, IdentityKind};
    use crate::tools_version::ToolsVersion;
    use crate::manifest::TraitDecl;

    fn manifest_with_traits(traits: Vec<TraitDecl>) -> PackageManifest {
        PackageManifest {
            identity: Identity::from_normalized("foo", IdentityKind::Root),
            display_name: "Foo".to_string(),
            tools_version: ToolsVersion::new(6, 0),
            platforms: Vec::new(),
            traits,
            dependencies: Vec::new(),
            products: Vec::new(),
            targets: Vec::new(),
        }
    }

    #[test]
    fn no_selection_seeds_default() {
        let manifest = manifest_with_traits(vec![TraitDecl {
            name: "default".to_string(),
            enabled_traits: vec!["fancy".to_string()],
        }]);
        let enabled = enabled_traits(&manifest, &BTreeSet::new());
        assert!(enabled.contains("default"));
        assert!(enabled.contains("fancy"));
    }

    #[test]
    fn fixed_point_expands_transitively() {
        let manifest = manifest_with_traits(vec![
            TraitDecl {
                name: "a".to_string(),
                enabled_traits: vec!["b".to_string()],
            },
            TraitDecl {
                name: "b".to_string(),
                enabled_traits: vec!["c".to_string()],
            },
            TraitDecl {
                name: "c".to_string(),
                enabled_traits: vec![],
            },
        ]);
        let mut selection = BTreeSet::new();
        selection.insert("a".to_string());
        let enabled = enabled_traits(&manifest, &selection);
        assert_eq!(enabled, ["a", "b", "c"].into_iter().map(String::from).collect());
    }

    #[test]
    fn evaluator_caches_by_identity_and_selection() {
        let manifest = manifest_with_traits(vec![]);
        let mut evaluator = TraitEvaluator::new();
        let mut selection = BTreeSet::new();
        selection.insert("x".to_string());
        let first = evaluator.evaluate(&manifest, &selection);
        let second = evaluator.evaluate(&manifest, &selection);
        assert_eq!(first, second);
        assert_eq!(evaluator.cache.len(), 1);
    }
}
