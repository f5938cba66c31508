// Copyright (c) The pkggraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The validator (component C8): global invariants checked after linkage, before platform
//! derivation. Every check here only reads the graph being assembled and appends to the
//! diagnostic bus -- none of them mutate anything.

use crate::diagnostics::DiagnosticBus;
use crate::graph::resolve::{ResolvedDependency, ResolvedModule, ResolvedPackage, ResolvedProduct};
use crate::manifest::TargetType;
use crate::tools_version::ToolsVersion;
use itertools::Itertools;
use petgraph::graph::NodeIndex;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Groups reachable modules by name; any group spanning >= 2 distinct owning packages is a
/// duplicate-target error listing the owning identities sorted ascending.
pub fn check_duplicate_targets(bus: &mut DiagnosticBus, modules: &[ResolvedModule]) {
    let mut by_name: HashMap<&str, BTreeSet<String>> = HashMap::new();
    for module in modules {
        by_name
            .entry(module.name.as_str())
            .or_default()
            .insert(module.owning_package.as_str().to_string());
    }
    let mut offending: Vec<(&str, &BTreeSet<String>)> = by_name
        .iter()
        .filter(|(_, identities)| identities.len() >= 2)
        .map(|(name, identities)| (*name, identities))
        .collect();
    offending.sort_by_key(|(name, _)| *name);

    for (name, identities) in offending {
        let list: Vec<String> = identities.iter().cloned().collect();
        bus.error(format!(
            "multiple packages ('{}') declare targets with a conflicting name: '{}'",
            list.join("', '"),
            name
        ));
    }
}

/// Same treatment as [`check_duplicate_targets`], for product names.
pub fn check_duplicate_products(bus: &mut DiagnosticBus, products: &[ResolvedProduct]) {
    let mut by_name: HashMap<&str, BTreeSet<String>> = HashMap::new();
    for product in products {
        by_name
            .entry(product.name.as_str())
            .or_default()
            .insert(product.owning_package.as_str().to_string());
    }
    let mut offending: Vec<(&str, &BTreeSet<String>)> = by_name
        .iter()
        .filter(|(_, identities)| identities.len() >= 2)
        .map(|(name, identities)| (*name, identities))
        .collect();
    offending.sort_by_key(|(name, _)| *name);

    for (name, identities) in offending {
        let list: Vec<String> = identities.iter().cloned().collect();
        bus.error(format!(
            "multiple packages ('{}') declare products with a conflicting name: '{}'",
            list.join("', '"),
            name
        ));
    }
}

/// If two packages of distinct identities export identical sets of target names (same
/// cardinality), that's almost always the same upstream added twice under different
/// URLs/identities. Lists up to three shared target names plus `"and N others"`.
pub fn check_similar_packages(bus: &mut DiagnosticBus, packages: &[ResolvedPackage]) {
    let name_sets: Vec<(&str, BTreeSet<&str>)> = packages
        .iter()
        .map(|p| (p.identity.as_str(), p.manifest.targets.iter().map(|t| t.name.as_str()).collect()))
        .collect();

    let mut reported: HashSet<(usize, usize)> = HashSet::new();
    for i in 0..name_sets.len() {
        for j in (i + 1)..name_sets.len() {
            let (id_a, set_a) = &name_sets[i];
            let (id_b, set_b) = &name_sets[j];
            if id_a == id_b || set_a.is_empty() {
                continue;
            }
            if set_a.len() == set_b.len() && set_a == set_b && reported.insert((i, j)) {
                let names: Vec<&str> = set_a.iter().copied().sorted().collect();
                let shown: Vec<&str> = names.iter().take(3).copied().collect();
                let mut msg = format!(
                    "multiple similar packages named '{}' and '{}' declare the same targets: '{}'",
                    id_a,
                    id_b,
                    shown.join("', '")
                );
                if names.len() > 3 {
                    msg.push_str(&format!(" and {} others", names.len() - 3));
                }
                bus.error(msg);
            }
        }
    }
}

/// Invariant #5: no non-test target may depend, directly or transitively through module-to-
/// module edges, on a test target. Linkage (C6) already rejects the direct-edge case; this walks
/// the whole module graph to catch transitive reachability.
pub fn check_no_transitive_test_dependency(bus: &mut DiagnosticBus, modules: &[ResolvedModule]) {
    for (idx, module) in modules.iter().enumerate() {
        if module.target_type.is_test() {
            continue;
        }
        let start = NodeIndex::new(idx);
        let mut stack = vec![start];
        let mut seen = HashSet::new();
        seen.insert(start);
        while let Some(node) = stack.pop() {
            for dep in &modules[node.index()].dependencies {
                if let ResolvedDependency::Module { target, .. } = dep {
                    if seen.insert(*target) {
                        let reached = &modules[target.index()];
                        if reached.target_type.is_test() {
                            bus.error(format!(
                                "Invalid dependency: '{}' cannot depend on test target dependency '{}'",
                                module.name, reached.name
                            ));
                        } else {
                            stack.push(*target);
                        }
                    }
                }
            }
        }
    }
}

/// Invariant #6: a product may not list a test target among its members.
pub fn check_product_test_members(bus: &mut DiagnosticBus, modules: &[ResolvedModule], products: &[ResolvedProduct]) {
    for product in products {
        for &member in &product.members {
            let module = &modules[member.index()];
            if module.target_type.is_test() {
                bus.error(format!(
                    "product '{}' cannot contain test target '{}'",
                    product.name, module.name
                ));
            }
        }
    }
}

/// Fatal for the offending product's owning package; also emits a warning naming the expected
/// `Sources/<name>` path, per invariant #9.
pub fn check_empty_members(bus: &mut DiagnosticBus, modules: &[ResolvedModule], products: &[ResolvedProduct]) {
    for product in products {
        for &member in &product.members {
            let module = &modules[member.index()];
            if !module_has_sources(module) {
                bus.with_metadata(
                    crate::diagnostics::DiagnosticMetadata {
                        package_identity: Some(product.owning_package.as_str().to_string()),
                        product_name: Some(product.name.clone()),
                        module_name: Some(module.name.clone()),
                        ..Default::default()
                    },
                    |bus| {
                        bus.error(format!(
                            "target '{}' referenced in product '{}' has no source files",
                            module.name, product.name
                        ));
                        bus.warning(format!(
                            "expected source files to be present at 'Sources/{}'",
                            module.name
                        ));
                    },
                );
            }
        }
    }
}

fn module_has_sources(module: &ResolvedModule) -> bool {
    module.has_sources
}

/// Invariant #8 (pre-6.2 only): for every usage of a product `P` by a target `T` in a different
/// package, walk `P`'s transitive member-module closure (following module-to-module edges); if
/// any reached module has unsafe build-flag settings, that's an error tagged with `T`.
pub fn check_unsafe_flag_leakage(
    bus: &mut DiagnosticBus,
    modules: &[ResolvedModule],
    products_by_name: &HashMap<String, &ResolvedProduct>,
) {
    for (idx, module) in modules.iter().enumerate() {
        let consumer_tools_version = module.consumer_tools_version;
        if consumer_tools_version >= ToolsVersion::UNSAFE_FLAGS_LEAKAGE_DISABLED {
            continue;
        }
        for dep in &module.dependencies {
            if let ResolvedDependency::Product { product, .. } = dep {
                let Some(resolved_product) = products_by_name.get(product) else {
                    continue;
                };
                if resolved_product.owning_package == module.owning_package {
                    continue;
                }
                if transitive_closure_has_unsafe_flags(modules, &resolved_product.members) {
                    bus.error(format!(
                        "target '{}' cannot be used by target '{}' from another package because it uses unsafe build flags (requires tools-version 6.2 or later)",
                        product, modules[idx].name
                    ));
                }
            }
        }
    }
}

fn transitive_closure_has_unsafe_flags(modules: &[ResolvedModule], roots: &[NodeIndex<u32>]) -> bool {
    let mut stack: Vec<NodeIndex<u32>> = roots.to_vec();
    let mut seen: HashSet<NodeIndex<u32>> = roots.iter().copied().collect();
    while let Some(node) = stack.pop() {
        let module = &modules[node.index()];
        if module.uses_unsafe_flags {
            return true;
        }
        for dep in &module.dependencies {
            if let ResolvedDependency::Module { target, .. } = dep {
                if seen.insert(*target) {
                    stack.push(*target);
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Condition;
    use crate::identity::{Identity, IdentityKind};
    use crate::manifest::ProductKind;
    use crate::platform::PlatformTable;

    fn module(name: &str, owner: &str, target_type: TargetType) -> ResolvedModule {
        ResolvedModule {
            name: name.to_string(),
            target_type,
            owning_package: Identity::from_normalized(owner, IdentityKind::FileSystem),
            platforms: PlatformTable::default(),
            dependencies: Vec::new(),
            uses_unsafe_flags: false,
            package_access: false,
            has_sources: true,
            consumer_tools_version: ToolsVersion::new(5, 0),
        }
    }

    #[test]
    fn duplicate_targets_across_packages_is_an_error() {
        let mut bus = DiagnosticBus::new();
        let modules = vec![
            module("Bar", "foo", TargetType::Regular),
            module("Bar", "bar", TargetType::Regular),
        ];
        check_duplicate_targets(&mut bus, &modules);
        assert!(bus.has_errors());
        assert!(bus.diagnostics()[0].message.contains("conflicting name: 'Bar'"));
    }

    #[test]
    fn same_package_same_name_is_fine() {
        let mut bus = DiagnosticBus::new();
        let modules = vec![module("Bar", "foo", TargetType::Regular)];
        check_duplicate_targets(&mut bus, &modules);
        assert!(!bus.has_errors());
    }

    #[test]
    fn transitive_test_dependency_is_rejected() {
        let mut bus = DiagnosticBus::new();
        let mut a = module("A", "foo", TargetType::Regular);
        let mut b = module("B", "foo", TargetType::Regular);
        let c = module("C", "foo", TargetType::Test);
        b.dependencies.push(ResolvedDependency::Module {
            target: NodeIndex::new(2),
            condition: None,
        });
        a.dependencies.push(ResolvedDependency::Module {
            target: NodeIndex::new(1),
            condition: None,
        });
        let modules = vec![a, b, c];
        check_no_transitive_test_dependency(&mut bus, &modules);
        assert!(bus.has_errors());
        assert!(bus.diagnostics()[0].message.contains("'A' cannot depend on test target dependency 'C'"));
    }

    #[test]
    fn product_listing_test_target_is_rejected() {
        let mut bus = DiagnosticBus::new();
        let modules = vec![module("FooTests", "foo", TargetType::Test)];
        let products = vec![ResolvedProduct {
            name: "Foo".to_string(),
            kind: ProductKind::Library(crate::manifest::LibraryKind::Automatic),
            owning_package: Identity::from_normalized("foo", IdentityKind::FileSystem),
            members: vec![NodeIndex::new(0)],
            platforms: PlatformTable::default(),
        }];
        check_product_test_members(&mut bus, &modules, &products);
        assert!(bus.has_errors());
        assert!(bus.diagnostics()[0].message.contains("'Foo' cannot contain test target 'FooTests'"));
    }

    #[test]
    fn product_listing_regular_member_is_fine() {
        let mut bus = DiagnosticBus::new();
        let modules = vec![module("Foo", "foo", TargetType::Regular)];
        let products = vec![ResolvedProduct {
            name: "Foo".to_string(),
            kind: ProductKind::Library(crate::manifest::LibraryKind::Automatic),
            owning_package: Identity::from_normalized("foo", IdentityKind::FileSystem),
            members: vec![NodeIndex::new(0)],
            platforms: PlatformTable::default(),
        }];
        check_product_test_members(&mut bus, &modules, &products);
        assert!(!bus.has_errors());
    }

    #[test]
    fn unsafe_flags_leak_pre_6_2() {
        let mut bus = DiagnosticBus::new();
        let mut unsafe_module = module("Unsafe", "bar", TargetType::Regular);
        unsafe_module.uses_unsafe_flags = true;
        let mut consumer = module("Consumer", "foo", TargetType::Regular);
        consumer.dependencies.push(ResolvedDependency::Product {
            product: "BarLib".to_string(),
            condition: Some(Condition::always()),
        });
        let modules = vec![consumer, unsafe_module];
        let product = ResolvedProduct {
            name: "BarLib".to_string(),
            kind: ProductKind::Library(crate::manifest::LibraryKind::Automatic),
            owning_package: Identity::from_normalized("bar", IdentityKind::FileSystem),
            members: vec![NodeIndex::new(1)],
            platforms: PlatformTable::default(),
        };
        let mut products_by_name = HashMap::new();
        products_by_name.insert("BarLib".to_string(), &product);
        check_unsafe_flag_leakage(&mut bus, &modules, &products_by_name);
        assert!(bus.has_errors());
    }
}
