// Copyright (c) The pkggraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The dependency pruner (component C11): flags, warns about, or drops declared package
//! dependencies that no target in the graph actually uses.

use crate::diagnostics::DiagnosticBus;
use crate::graph::resolve::{ResolvedDependency, ResolvedModule};
use crate::identity::Identity;
use crate::manifest::{PackageManifest, ProductKind};
use std::collections::{BTreeSet, HashSet};

/// Whether a package's products are *all* executables -- these are exempted from the unused-
/// dependency warning unless the target-based feature gate is enabled (spec §6), since they may
/// be invoked as CLI tools from a plugin or build script rather than linked into any target.
fn is_executable_only(manifest: &PackageManifest) -> bool {
    !manifest.products.is_empty()
        && manifest
            .products
            .iter()
            .all(|p| matches!(p.kind, ProductKind::Executable))
}

/// Returns the set of dependency identities (declared by `root`) actually used by some resolved
/// target dependency anywhere in the reachable module set, where "used" means: a
/// [`ResolvedDependency::Product`] edge exists whose product belongs to that dependency and whose
/// condition is satisfiable by the *consuming* module's owning package's enabled traits (platform
/// and configuration axes are intentionally not enumerated here -- spec §4.8 only requires
/// satisfiability "under at least one enabled trait configuration").
fn used_dependency_identities(
    modules: &[ResolvedModule],
    product_owners: &std::collections::HashMap<String, Identity>,
    enabled_traits_by_package: &std::collections::HashMap<Identity, BTreeSet<String>>,
) -> HashSet<Identity> {
    let mut used = HashSet::new();
    for module in modules {
        let consumer_traits = enabled_traits_by_package
            .get(&module.owning_package)
            .cloned()
            .unwrap_or_default();
        for dep in &module.dependencies {
            if let ResolvedDependency::Product { product, condition } = dep {
                let traits_ok = condition
                    .as_ref()
                    .map(|c| c.traits.is_subset(&consumer_traits))
                    .unwrap_or(true);
                if !traits_ok {
                    continue;
                }
                if let Some(owner) = product_owners.get(product) {
                    used.insert(owner.clone());
                }
            }
        }
    }
    used
}

/// Runs the pruner for a single root package's declared dependencies.
///
/// Returns the identities that should be **kept** in `dependency_packages` (i.e. everything
/// minus what `pruneDependencies` silently dropped). Warnings are pushed for unused dependencies
/// when `prune_dependencies` is false; nothing is pushed when it's true (silent omission, spec
/// §4.8).
pub fn prune_root_dependencies(
    bus: &mut DiagnosticBus,
    root_identity: &Identity,
    root_manifest: &PackageManifest,
    dependency_manifests: &std::collections::HashMap<Identity, &PackageManifest>,
    modules: &[ResolvedModule],
    product_owners: &std::collections::HashMap<String, Identity>,
    enabled_traits_by_package: &std::collections::HashMap<Identity, BTreeSet<String>>,
    prune_dependencies: bool,
    target_based_dependency_resolution: bool,
) -> Vec<Identity> {
    let used = used_dependency_identities(modules, product_owners, enabled_traits_by_package);
    let mut kept = Vec::new();

    for dep in &root_manifest.dependencies {
        let identity = dep.identity();
        let Some(dep_manifest) = dependency_manifests.get(&identity) else {
            kept.push(identity);
            continue;
        };

        if used.contains(&identity) || dep_manifest.is_system_module() {
            kept.push(identity);
            continue;
        }

        let skip_warning_for_executable_only = is_executable_only(dep_manifest) && !target_based_dependency_resolution;

        if prune_dependencies {
            // Silently omitted: not pushed into `kept`, no diagnostic either way.
            continue;
        }

        if skip_warning_for_executable_only {
            kept.push(identity);
            continue;
        }

        bus.with_metadata(
            crate::diagnostics::DiagnosticMetadata {
                package_identity: Some(root_identity.as_str().to_string()),
                package_kind: Some(format!("{:?}", identity.kind())),
                ..Default::default()
            },
            |bus| {
                bus.warning(format!("dependency '{}' is not used by any target", identity));
            },
        );
        kept.push(identity);
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityKind;
    use crate::manifest::{DependencyDecl, ProductDecl, TargetDecl, TargetSettings, TargetType};
    use crate::tools_version::ToolsVersion;
    use std::collections::HashMap;
    use versionset::VersionSet;

    fn manifest(identity: &str, deps: Vec<DependencyDecl>, products: Vec<ProductDecl>, targets: Vec<TargetDecl>) -> PackageManifest {
        PackageManifest {
            identity: Identity::from_normalized(identity, IdentityKind::FileSystem),
            display_name: identity.to_string(),
            tools_version: ToolsVersion::new(5, 0),
            platforms: Vec::new(),
            traits: Vec::new(),
            dependencies: deps,
            products,
            targets,
        }
    }

    fn dep(location: &str) -> DependencyDecl {
        DependencyDecl {
            kind: IdentityKind::FileSystem,
            location: location.to_string(),
            version_requirement: VersionSet::any(),
            deprecated_alias: None,
            forwarded_traits: Vec::new(),
        }
    }

    #[test]
    fn unused_dependency_warns_when_pruning_disabled() {
        let mut bus = DiagnosticBus::new();
        let bar = manifest("bar", vec![], vec![ProductDecl {
            name: "BarLib".to_string(),
            kind: ProductKind::Library(crate::manifest::LibraryKind::Automatic),
            targets: vec!["BarLib".to_string()],
        }], vec![TargetDecl {
            name: "BarLib".to_string(),
            target_type: TargetType::Regular,
            dependencies: vec![],
            settings: TargetSettings::default(),
            plugin_capability: None,
            package_access: false,
            has_sources: true,
        }]);
        let foo = manifest("foo", vec![dep("bar")], vec![], vec![]);

        let mut dep_manifests = HashMap::new();
        dep_manifests.insert(bar.identity.clone(), &bar);

        let kept = prune_root_dependencies(
            &mut bus,
            &foo.identity,
            &foo,
            &dep_manifests,
            &[],
            &HashMap::new(),
            &HashMap::new(),
            false,
            true,
        );
        assert_eq!(kept, vec![bar.identity.clone()]);
        assert!(!bus.has_errors());
        assert_eq!(bus.diagnostics().len(), 1);
        assert!(bus.diagnostics()[0].message.contains("dependency 'bar' is not used by any target"));
    }

    #[test]
    fn pruning_enabled_silently_drops_unused() {
        let mut bus = DiagnosticBus::new();
        let bar = manifest("bar", vec![], vec![ProductDecl {
            name: "BarLib".to_string(),
            kind: ProductKind::Library(crate::manifest::LibraryKind::Automatic),
            targets: vec!["BarLib".to_string()],
        }], vec![]);
        let foo = manifest("foo", vec![dep("bar")], vec![], vec![]);
        let mut dep_manifests = HashMap::new();
        dep_manifests.insert(bar.identity.clone(), &bar);

        let kept = prune_root_dependencies(
            &mut bus,
            &foo.identity,
            &foo,
            &dep_manifests,
            &[],
            &HashMap::new(),
            &HashMap::new(),
            true,
            true,
        );
        assert!(kept.is_empty());
        assert!(bus.diagnostics().is_empty());
    }

    #[test]
    fn executable_only_unused_dependency_is_exempt_without_feature_gate() {
        let mut bus = DiagnosticBus::new();
        let biz = manifest("biz", vec![], vec![ProductDecl {
            name: "biztool".to_string(),
            kind: ProductKind::Executable,
            targets: vec!["biztool".to_string()],
        }], vec![]);
        let foo = manifest("foo", vec![dep("biz")], vec![], vec![]);
        let mut dep_manifests = HashMap::new();
        dep_manifests.insert(biz.identity.clone(), &biz);

        let kept = prune_root_dependencies(
            &mut bus,
            &foo.identity,
            &foo,
            &dep_manifests,
            &[],
            &HashMap::new(),
            &HashMap::new(),
            false,
            false,
        );
        assert_eq!(kept, vec![biz.identity.clone()]);
        assert!(bus.diagnostics().is_empty());
    }
}
