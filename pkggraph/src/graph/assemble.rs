// Copyright (c) The pkggraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The graph assembler (component C12): orchestrates C2-C11 into a single `assemble` pass and
//! exposes the `ModulesGraph` query API.

use crate::condition::BuildEnvironment;
use crate::diagnostics::{Diagnostic, DiagnosticBus, DiagnosticMetadata};
use crate::graph::resolve::{
    ModuleGraph, PackageDepGraph, ResolvedDependency, ResolvedModule, ResolvedPackage, ResolvedProduct,
};
use crate::identity::Identity;
use crate::linkage::{self, DeclaredDependency};
use crate::manifest::PackageManifest;
use crate::platform::PlatformDefaults;
use crate::traits::TraitEvaluator;
use crate::{cycles, pruner, validator};
use fixedbitset::FixedBitSet;
use indexmap::IndexMap;
use petgraph::graph::NodeIndex;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::env;

/// An externally-resolved binary artifact target: a pre-built binary made available to a
/// package without going through its own manifest's target list (e.g. a registry binary
/// dependency). Injected as a dependency-free module of type [`crate::manifest::TargetType::Binary`].
#[derive(Clone, Debug)]
pub struct BinaryArtifact {
    /// The package the artifact is attached to.
    pub package: Identity,
    /// The synthetic module name.
    pub name: String,
}

/// The environment variable gate named in spec §6.
const TARGET_BASED_DEPENDENCY_RESOLUTION_ENV: &str = "ENABLE_TARGET_BASED_DEPENDENCY_RESOLUTION";

/// Caller-facing knobs for [`assemble`], modeled as an explicit struct rather than ambient
/// globals (spec §6's `AssembleOptions`/`MetadataCommand`-style builder).
#[derive(Clone, Debug, Default)]
pub struct AssembleOptions {
    trait_selection: BTreeSet<String>,
    build_env: Option<BuildEnvironment>,
    prune_dependencies: bool,
    target_based_dependency_resolution: bool,
}

impl AssembleOptions {
    /// A fresh set of options: no trait selection (so `{default}` is seeded), no build
    /// environment, pruning disabled, feature gate off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads [`TARGET_BASED_DEPENDENCY_RESOLUTION_ENV`] from the process environment and sets
    /// the feature gate accordingly, leaving every other option at its default.
    pub fn from_env() -> Self {
        let mut opts = Self::new();
        opts.target_based_dependency_resolution = env::var(TARGET_BASED_DEPENDENCY_RESOLUTION_ENV).is_ok();
        opts
    }

    /// Sets the root trait selection.
    pub fn with_trait_selection(mut self, selection: BTreeSet<String>) -> Self {
        self.trait_selection = selection;
        self
    }

    /// Sets the build environment used to evaluate dependency conditions.
    pub fn with_build_environment(mut self, env: BuildEnvironment) -> Self {
        self.build_env = Some(env);
        self
    }

    /// Sets whether unused dependencies are silently dropped (`true`) or warned about (`false`).
    pub fn with_prune_dependencies(mut self, prune: bool) -> Self {
        self.prune_dependencies = prune;
        self
    }

    /// Explicitly sets the target-based dependency resolution feature gate.
    pub fn with_target_based_dependency_resolution(mut self, enabled: bool) -> Self {
        self.target_based_dependency_resolution = enabled;
        self
    }
}

/// The outer container produced by [`assemble`]: root packages, every reachable package, and
/// flat module/product views with lookup indices (spec §3 "Modules graph").
#[derive(Debug)]
pub struct ModulesGraph {
    root_packages: Vec<Identity>,
    packages: IndexMap<Identity, ResolvedPackage>,
    module_graph: ModuleGraph,
    modules: Vec<ResolvedModule>,
    products: IndexMap<String, ResolvedProduct>,
    module_index: HashMap<String, NodeIndex<u32>>,
}

impl ModulesGraph {
    /// The root packages, in the order they were passed to [`assemble`].
    pub fn root_packages(&self) -> &[Identity] {
        &self.root_packages
    }

    /// Every reachable package.
    pub fn packages(&self) -> impl Iterator<Item = &ResolvedPackage> {
        self.packages.values()
    }

    /// Every resolved module, across every reachable package.
    pub fn all_modules(&self) -> &[ResolvedModule] {
        &self.modules
    }

    /// Every resolved product, across every reachable package.
    pub fn all_products(&self) -> impl Iterator<Item = &ResolvedProduct> {
        self.products.values()
    }

    /// Looks up a module by name.
    pub fn module(&self, name: &str) -> Option<&ResolvedModule> {
        self.module_index.get(name).map(|idx| &self.modules[idx.index()])
    }

    /// Looks up a product by name.
    pub fn product(&self, name: &str) -> Option<&ResolvedProduct> {
        self.products.get(name)
    }

    /// Looks up a product by name, failing with [`Error::UnknownProduct`](crate::errors::Error::UnknownProduct)
    /// rather than returning `None`, for callers that want a single terminal error variant.
    pub fn product_or_err(&self, name: &str) -> Result<&ResolvedProduct, crate::errors::Error> {
        self.product(name)
            .ok_or_else(|| crate::errors::Error::UnknownProduct(name.to_string()))
    }

    /// The package owning a given module.
    pub fn package_of_module(&self, module: &ResolvedModule) -> Option<&ResolvedPackage> {
        self.packages.get(&module.owning_package)
    }

    /// Looks up a package by identity.
    pub fn package(&self, identity: &Identity) -> Option<&ResolvedPackage> {
        self.packages.get(identity)
    }

    /// Looks up a package by identity, failing with [`Error::UnknownIdentity`](crate::errors::Error::UnknownIdentity)
    /// rather than returning `None`, for callers that want a single terminal error variant.
    pub fn package_or_err(&self, identity: &Identity) -> Result<&ResolvedPackage, crate::errors::Error> {
        self.package(identity)
            .ok_or_else(|| crate::errors::Error::UnknownIdentity(identity.as_str().to_string()))
    }

    /// `<first root identity>__REPL`. Fails if there are no root packages.
    pub fn repl_product_name(&self) -> Result<String, crate::errors::Error> {
        let first = self.root_packages.first().ok_or(crate::errors::Error::NoRootPackages)?;
        Ok(format!("{}__REPL", first))
    }

    /// The transitive module-to-module dependencies of `module_name`, topologically sorted
    /// (reverse-topological: dependencies come before dependents), ties broken by declaration
    /// order, each element appearing exactly once. Since a successfully-assembled graph is
    /// already known to be acyclic, this only returns an error if `module_name` is unknown.
    pub fn recursive_module_dependencies(&self, module_name: &str) -> Result<Vec<String>, crate::errors::Error> {
        let start = self
            .module_index
            .get(module_name)
            .ok_or_else(|| crate::errors::Error::UnknownModule(module_name.to_string()))?;

        let mut order: Vec<NodeIndex<u32>> = Vec::new();
        // One bit per module, the way petgraph's own traversal algorithms track visitation --
        // cheaper than a `HashSet<NodeIndex>` for a set this dense.
        let mut visited = FixedBitSet::with_capacity(self.modules.len());
        self.post_order(*start, &mut visited, &mut order);
        // Drop the start node itself; callers want its dependencies, not itself.
        order.pop();
        Ok(order.iter().map(|idx| self.modules[idx.index()].name.clone()).collect())
    }

    fn post_order(&self, node: NodeIndex<u32>, visited: &mut FixedBitSet, order: &mut Vec<NodeIndex<u32>>) {
        if visited.put(node.index()) {
            return;
        }
        for dep in crate::graph::resolve::neighbors_in_declared_order(&self.module_graph, node) {
            self.post_order(dep, visited, order);
        }
        order.push(node);
    }

    /// A deterministic plain-text summary: package count, module count, product count. Useful
    /// for smoke-testing assembly without asserting on the full structure.
    pub fn describe(&self) -> String {
        format!(
            "{} package(s), {} module(s), {} product(s)",
            self.packages.len(),
            self.modules.len(),
            self.products.len()
        )
    }
}

/// Assembles a [`ModulesGraph`] from a set of root packages plus every transitively reachable
/// manifest. Returns `(None, diagnostics)` if any fatal diagnostic was raised during assembly,
/// `(Some(graph), diagnostics)` otherwise -- diagnostics accumulate across the whole pass either
/// way (spec §7's "Propagation policy").
pub fn assemble(
    roots: &[Identity],
    all_packages: &IndexMap<Identity, PackageManifest>,
    binary_artifacts: &[BinaryArtifact],
    options: &AssembleOptions,
) -> (Option<ModulesGraph>, Vec<Diagnostic>) {
    let mut bus = DiagnosticBus::new();
    log::debug!("assembling modules graph for {} root package(s)", roots.len());

    let reachable = discover_reachable(roots, all_packages);
    log::debug!("{} package(s) reachable from roots", reachable.len());

    // Selection forwarding (spec §4.7): a root's selection seeds itself; every other reachable
    // package's selection is the union of `forwarded_traits` declared against it by every
    // consuming edge, gathered in a pass separate from evaluation so that forwarding order
    // doesn't matter.
    let mut selection_by_package: HashMap<Identity, BTreeSet<String>> = HashMap::new();
    for root in roots {
        selection_by_package
            .entry(root.clone())
            .or_default()
            .extend(options.trait_selection.iter().cloned());
    }
    for manifest in reachable.values() {
        for dep in &manifest.dependencies {
            let dep_identity = dep.identity();
            if reachable.contains_key(&dep_identity) {
                selection_by_package
                    .entry(dep_identity)
                    .or_default()
                    .extend(dep.forwarded_traits.iter().cloned());
            }
        }
    }

    let mut evaluator = TraitEvaluator::new();
    let mut enabled_traits_by_package: HashMap<Identity, BTreeSet<String>> = HashMap::new();
    for (identity, manifest) in &reachable {
        let selection = selection_by_package.get(identity).cloned().unwrap_or_default();
        enabled_traits_by_package.insert(identity.clone(), evaluator.evaluate(manifest, &selection));
    }

    let mut modules: Vec<ResolvedModule> = Vec::new();
    let mut module_graph = ModuleGraph::default();
    let mut module_index: HashMap<String, NodeIndex<u32>> = HashMap::new();
    let mut package_modules: HashMap<Identity, Vec<NodeIndex<u32>>> = HashMap::new();
    let mut local_module_index: HashMap<Identity, HashMap<String, NodeIndex<u32>>> = HashMap::new();

    for (identity, manifest) in &reachable {
        let mut locals = HashMap::new();
        for target in &manifest.targets {
            let node = module_graph.add_node(target.name.clone());
            modules.push(ResolvedModule {
                name: target.name.clone(),
                target_type: target.target_type,
                owning_package: identity.clone(),
                platforms: crate::platform::PlatformTable::default(),
                dependencies: Vec::new(),
                uses_unsafe_flags: target.settings.uses_unsafe_flags,
                package_access: target.package_access,
                has_sources: target.has_sources,
                consumer_tools_version: manifest.tools_version,
            });
            module_index.entry(target.name.clone()).or_insert(node);
            locals.insert(target.name.clone(), node);
            package_modules.entry(identity.clone()).or_default().push(node);
        }
        for artifact in binary_artifacts.iter().filter(|a| &a.package == identity) {
            let node = module_graph.add_node(artifact.name.clone());
            modules.push(ResolvedModule {
                name: artifact.name.clone(),
                target_type: crate::manifest::TargetType::Binary,
                owning_package: identity.clone(),
                platforms: crate::platform::PlatformTable::default(),
                dependencies: Vec::new(),
                uses_unsafe_flags: false,
                package_access: false,
                has_sources: true,
                consumer_tools_version: manifest.tools_version,
            });
            module_index.entry(artifact.name.clone()).or_insert(node);
            locals.insert(artifact.name.clone(), node);
            package_modules.entry(identity.clone()).or_default().push(node);
        }
        local_module_index.insert(identity.clone(), locals);
    }

    for (identity, manifest) in &reachable {
        let declared_dependencies: Vec<DeclaredDependency<'_>> = manifest
            .dependencies
            .iter()
            .filter_map(|dep| {
                let dep_identity = dep.identity();
                reachable.get(&dep_identity).map(|dep_manifest| DeclaredDependency {
                    identity: dep_identity,
                    manifest: dep_manifest,
                    deprecated_alias: dep.deprecated_alias.as_deref(),
                })
            })
            .collect();

        let locals = &local_module_index[identity];
        for target in &manifest.targets {
            let target_node = locals[&target.name];
            bus.with_metadata(
                DiagnosticMetadata {
                    package_identity: Some(identity.as_str().to_string()),
                    module_name: Some(target.name.clone()),
                    ..Default::default()
                },
                |bus| {
                    for dep_ref in &target.dependencies {
                        let Some(binding) = linkage::resolve(
                            bus,
                            identity,
                            manifest,
                            target,
                            dep_ref,
                            &declared_dependencies,
                        ) else {
                            continue;
                        };
                        let condition = dep_ref.condition().cloned();
                        match binding {
                            linkage::Binding::Module(name) => {
                                if let Some(&sibling_node) = locals.get(&name) {
                                    module_graph.add_edge(target_node, sibling_node, condition.clone());
                                    modules[target_node.index()].dependencies.push(ResolvedDependency::Module {
                                        target: sibling_node,
                                        condition,
                                    });
                                }
                            }
                            linkage::Binding::Product { product, .. } => {
                                modules[target_node.index()]
                                    .dependencies
                                    .push(ResolvedDependency::Product { product, condition });
                            }
                        }
                    }
                },
            );
        }
    }

    let mut products: Vec<ResolvedProduct> = Vec::new();
    let mut package_products: HashMap<Identity, Vec<String>> = HashMap::new();
    let mut product_owners: HashMap<String, Identity> = HashMap::new();
    for (identity, manifest) in &reachable {
        let locals = &local_module_index[identity];
        for product_decl in &manifest.products {
            let members: Vec<NodeIndex<u32>> = product_decl
                .targets
                .iter()
                .filter_map(|name| locals.get(name).copied())
                .collect();
            products.push(ResolvedProduct {
                name: product_decl.name.clone(),
                kind: product_decl.kind,
                owning_package: identity.clone(),
                members,
                platforms: crate::platform::PlatformTable::default(),
            });
            package_products.entry(identity.clone()).or_default().push(product_decl.name.clone());
            product_owners.insert(product_decl.name.clone(), identity.clone());
        }
    }

    validator::check_duplicate_targets(&mut bus, &modules);
    validator::check_duplicate_products(&mut bus, &products);
    let reachable_resolved_for_similarity: Vec<ResolvedPackage> = reachable
        .iter()
        .map(|(identity, manifest)| ResolvedPackage {
            identity: identity.clone(),
            manifest: (*manifest).clone(),
            modules: package_modules.get(identity).cloned().unwrap_or_default(),
            products: package_products.get(identity).cloned().unwrap_or_default(),
            dependency_packages: Vec::new(),
            enabled_traits: BTreeSet::new(),
        })
        .collect();
    validator::check_similar_packages(&mut bus, &reachable_resolved_for_similarity);
    validator::check_no_transitive_test_dependency(&mut bus, &modules);
    validator::check_product_test_members(&mut bus, &modules, &products);
    validator::check_empty_members(&mut bus, &modules, &products);
    let products_by_name: HashMap<String, &ResolvedProduct> =
        products.iter().map(|p| (p.name.clone(), p)).collect();
    validator::check_unsafe_flag_leakage(&mut bus, &modules, &products_by_name);

    detect_package_cycles(&mut bus, roots, &reachable);
    detect_module_cycles(&mut bus, &modules);

    let defaults = PlatformDefaults::shared();
    for (identity, manifest) in &reachable {
        let base = crate::platform::PlatformTable::from_declared(manifest.platforms.clone());
        for &node in package_modules.get(identity).unwrap_or(&Vec::new()) {
            let is_test = modules[node.index()].target_type.is_test();
            let mut table = base.clone();
            table.derive(defaults, is_test);
            modules[node.index()].platforms = table;
        }
    }
    for product in &mut products {
        let manifest = &reachable[&product.owning_package];
        let mut table = crate::platform::PlatformTable::from_declared(manifest.platforms.clone());
        table.derive(defaults, false);
        product.platforms = table;
    }

    let mut package_dep_graph = PackageDepGraph::default();
    let mut package_node_index: HashMap<Identity, NodeIndex<u32>> = HashMap::new();
    for identity in reachable.keys() {
        let node = package_dep_graph.add_node(identity.clone());
        package_node_index.insert(identity.clone(), node);
    }
    for (identity, manifest) in &reachable {
        let from = package_node_index[identity];
        for dep in &manifest.dependencies {
            let dep_identity = dep.identity();
            if let Some(&to) = package_node_index.get(&dep_identity) {
                package_dep_graph.add_edge(from, to, ());
            }
        }
    }

    let mut dependency_packages: HashMap<Identity, Vec<NodeIndex<u32>>> = HashMap::new();
    let dependency_manifests: HashMap<Identity, &PackageManifest> =
        reachable.iter().map(|(id, m)| (id.clone(), *m)).collect();
    for identity in roots {
        let Some(manifest) = reachable.get(identity) else { continue };
        let kept = pruner::prune_root_dependencies(
            &mut bus,
            identity,
            manifest,
            &dependency_manifests,
            &modules,
            &product_owners,
            &enabled_traits_by_package,
            options.prune_dependencies,
            options.target_based_dependency_resolution,
        );
        let node_list = kept
            .into_iter()
            .filter_map(|dep_identity| package_node_index.get(&dep_identity).copied())
            .collect();
        dependency_packages.insert(identity.clone(), node_list);
    }
    for identity in reachable.keys() {
        if dependency_packages.contains_key(identity) {
            continue;
        }
        let manifest = &reachable[identity];
        let node_list = manifest
            .dependencies
            .iter()
            .filter_map(|dep| package_node_index.get(&dep.identity()).copied())
            .collect();
        dependency_packages.insert(identity.clone(), node_list);
    }

    let mut packages: IndexMap<Identity, ResolvedPackage> = IndexMap::new();
    for (identity, manifest) in &reachable {
        packages.insert(
            identity.clone(),
            ResolvedPackage {
                identity: identity.clone(),
                manifest: (*manifest).clone(),
                modules: package_modules.get(identity).cloned().unwrap_or_default(),
                products: package_products.get(identity).cloned().unwrap_or_default(),
                dependency_packages: dependency_packages.get(identity).cloned().unwrap_or_default(),
                enabled_traits: enabled_traits_by_package.get(identity).cloned().unwrap_or_default(),
            },
        );
    }

    let products_map: IndexMap<String, ResolvedProduct> = products.into_iter().map(|p| (p.name.clone(), p)).collect();

    let graph = ModulesGraph {
        root_packages: roots.to_vec(),
        packages,
        module_graph,
        modules,
        products: products_map,
        module_index,
    };

    let has_errors = bus.has_errors();
    let diagnostics = bus.into_diagnostics();
    if has_errors {
        (None, diagnostics)
    } else {
        (Some(graph), diagnostics)
    }
}

/// Package-level reachability (C2/C12): BFS from `roots` over declared dependencies, preserving
/// declared order so later diagnostic emission is deterministic (spec §5).
fn discover_reachable<'a>(
    roots: &[Identity],
    all_packages: &'a IndexMap<Identity, PackageManifest>,
) -> IndexMap<Identity, &'a PackageManifest> {
    let mut reachable: IndexMap<Identity, &PackageManifest> = IndexMap::new();
    let mut queue: Vec<Identity> = Vec::new();

    for root in roots {
        if let Some(manifest) = all_packages.get(root) {
            if reachable.insert(root.clone(), manifest).is_none() {
                queue.push(root.clone());
            }
        }
    }

    let mut i = 0;
    while i < queue.len() {
        let identity = queue[i].clone();
        i += 1;
        let manifest = reachable[&identity];
        for dep in &manifest.dependencies {
            let dep_identity = dep.identity();
            if let Some(dep_manifest) = all_packages.get(&dep_identity) {
                if reachable.insert(dep_identity.clone(), dep_manifest).is_none() {
                    queue.push(dep_identity);
                }
            }
        }
    }

    reachable
}

/// Package-level cycle detection (C7), per root: a back-edge is fatal only if that root's
/// tools-version predates 6.0 -- otherwise it's permitted (module-level acyclicity is checked
/// separately and unconditionally).
fn detect_package_cycles(bus: &mut DiagnosticBus, roots: &[Identity], reachable: &IndexMap<Identity, &PackageManifest>) {
    let mut reported: HashSet<Vec<Identity>> = HashSet::new();
    for root in roots {
        let Some(root_manifest) = reachable.get(root) else { continue };
        let cycle = cycles::find_cycle([root.clone()], |id| {
            reachable
                .get(id)
                .map(|m| m.dependencies.iter().map(|d| d.identity()).filter(|d| reachable.contains_key(d)).collect())
                .unwrap_or_default()
        });
        let Some(cycle) = cycle else { continue };
        if root_manifest.tools_version >= crate::tools_version::ToolsVersion::PACKAGE_CYCLES_ALLOWED {
            continue;
        }
        if reported.insert(cycle.clone()) {
            let path: Vec<String> = cycle.iter().map(|id| id.to_string()).collect();
            bus.error(format!(
                "cyclic dependency between packages {} requires tools-version 6.0 or later",
                path.join(" -> ")
            ));
        }
    }
}

/// Module-level cycle detection (C7): fatal at every tools-version.
fn detect_module_cycles(bus: &mut DiagnosticBus, modules: &[ResolvedModule]) {
    let nodes: Vec<NodeIndex<u32>> = (0..modules.len()).map(NodeIndex::new).collect();
    let cycle = cycles::find_cycle(nodes, |node| {
        modules[node.index()]
            .dependencies
            .iter()
            .filter_map(|dep| match dep {
                ResolvedDependency::Module { target, .. } => Some(*target),
                ResolvedDependency::Product { .. } => None,
            })
            .collect()
    });
    if let Some(cycle) = cycle {
        let path: Vec<&str> = cycle.iter().map(|idx| modules[idx.index()].name.as_str()).collect();
        bus.error(format!("cyclic dependency declaration found: {}", path.join(" -> ")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityKind;
    use crate::manifest::{
        DependencyDecl, LibraryKind, ProductDecl, ProductKind, TargetDecl, TargetDependencyRef, TargetSettings, TargetType,
    };
    use crate::tools_version::ToolsVersion;
    use pretty_assertions::assert_eq;
    use versionset::VersionSet;

    fn dep(location: &str) -> DependencyDecl {
        DependencyDecl {
            kind: IdentityKind::FileSystem,
            location: location.to_string(),
            version_requirement: VersionSet::any(),
            deprecated_alias: None,
            forwarded_traits: Vec::new(),
        }
    }

    fn target(name: &str, target_type: TargetType, deps: Vec<TargetDependencyRef>) -> TargetDecl {
        TargetDecl {
            name: name.to_string(),
            target_type,
            dependencies: deps,
            settings: TargetSettings::default(),
            plugin_capability: None,
            package_access: false,
            has_sources: true,
        }
    }

    fn library(name: &str, target_names: &[&str]) -> ProductDecl {
        ProductDecl {
            name: name.to_string(),
            kind: ProductKind::Library(LibraryKind::Automatic),
            targets: target_names.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// spec §8 scenario 1: Foo <- Bar <- Baz, with Baz also declaring BazTests.
    #[test]
    fn basic_chain_assembles_successfully() {
        let foo = PackageManifest {
            identity: Identity::from_normalized("foo", IdentityKind::FileSystem),
            display_name: "Foo".to_string(),
            tools_version: ToolsVersion::new(5, 0),
            platforms: vec![],
            traits: vec![],
            dependencies: vec![],
            products: vec![library("Foo", &["Foo", "FooDep"])],
            targets: vec![
                target("Foo", TargetType::Regular, vec![TargetDependencyRef::Target {
                    name: "FooDep".to_string(),
                    condition: None,
                }]),
                target("FooDep", TargetType::Regular, vec![]),
            ],
        };
        let bar = PackageManifest {
            identity: Identity::from_normalized("bar", IdentityKind::FileSystem),
            display_name: "Bar".to_string(),
            tools_version: ToolsVersion::new(5, 0),
            platforms: vec![],
            traits: vec![],
            dependencies: vec![dep("foo")],
            products: vec![library("Bar", &["Bar"])],
            targets: vec![target(
                "Bar",
                TargetType::Regular,
                vec![TargetDependencyRef::Product {
                    product: "Foo".to_string(),
                    package: Some("foo".to_string()),
                    condition: None,
                }],
            )],
        };
        let baz = PackageManifest {
            identity: Identity::from_normalized("baz", IdentityKind::FileSystem),
            display_name: "Baz".to_string(),
            tools_version: ToolsVersion::new(5, 0),
            platforms: vec![],
            traits: vec![],
            dependencies: vec![dep("bar")],
            products: vec![],
            targets: vec![
                target(
                    "Baz",
                    TargetType::Regular,
                    vec![TargetDependencyRef::Product {
                        product: "Bar".to_string(),
                        package: Some("bar".to_string()),
                        condition: None,
                    }],
                ),
                target("BazTests", TargetType::Test, vec![]),
            ],
        };

        let mut all = IndexMap::new();
        all.insert(foo.identity.clone(), foo);
        all.insert(bar.identity.clone(), bar);
        all.insert(baz.identity.clone(), baz.clone());

        let roots = vec![baz.identity.clone()];
        let (graph, diags) = assemble(&roots, &all, &[], &AssembleOptions::new());
        assert!(diags.iter().all(|d| d.severity != crate::diagnostics::Severity::Error), "{:?}", diags);
        let graph = graph.expect("graph should assemble");
        assert_eq!(graph.all_modules().len(), 5);
        assert!(graph.module("Foo").is_some());
        assert!(graph.module("BazTests").is_some());

        let baz_deps = graph.recursive_module_dependencies("Baz").unwrap();
        assert!(baz_deps.is_empty(), "Baz only depends on a product, not a sibling module");

        let foo_deps = graph.recursive_module_dependencies("Foo").unwrap();
        assert_eq!(foo_deps, vec!["FooDep".to_string()]);

        assert!(graph.product_or_err("Foo").is_ok());
        assert!(matches!(
            graph.product_or_err("NoSuchProduct"),
            Err(crate::errors::Error::UnknownProduct(name)) if name == "NoSuchProduct"
        ));
        assert!(graph.package_or_err(&Identity::from_normalized("foo", IdentityKind::FileSystem)).is_ok());
        assert!(matches!(
            graph.package_or_err(&Identity::from_normalized("nope", IdentityKind::FileSystem)),
            Err(crate::errors::Error::UnknownIdentity(identity)) if identity == "nope"
        ));
    }

    /// spec §8 invariant #6: a product cannot list a test target as a member.
    #[test]
    fn product_with_test_member_is_rejected() {
        let foo = PackageManifest {
            identity: Identity::from_normalized("foo", IdentityKind::FileSystem),
            display_name: "Foo".to_string(),
            tools_version: ToolsVersion::new(5, 0),
            platforms: vec![],
            traits: vec![],
            dependencies: vec![],
            products: vec![library("Foo", &["FooTests"])],
            targets: vec![target("FooTests", TargetType::Test, vec![])],
        };
        let mut all = IndexMap::new();
        all.insert(foo.identity.clone(), foo.clone());
        let roots = vec![foo.identity.clone()];
        let (graph, diags) = assemble(&roots, &all, &[], &AssembleOptions::new());
        assert!(graph.is_none());
        assert!(diags.iter().any(|d| d.message.contains("cannot contain test target 'FooTests'")), "{:?}", diags);
    }

    /// spec §8 scenario 2: a package cycle below tools-version 6.0 is fatal.
    #[test]
    fn package_cycle_pre_6_0_is_fatal() {
        let foo = PackageManifest {
            identity: Identity::from_normalized("foo", IdentityKind::FileSystem),
            display_name: "Foo".to_string(),
            tools_version: ToolsVersion::new(5, 10),
            platforms: vec![],
            traits: vec![],
            dependencies: vec![dep("bar")],
            products: vec![],
            targets: vec![],
        };
        let bar = PackageManifest {
            identity: Identity::from_normalized("bar", IdentityKind::FileSystem),
            display_name: "Bar".to_string(),
            tools_version: ToolsVersion::new(5, 10),
            platforms: vec![],
            traits: vec![],
            dependencies: vec![dep("foo")],
            products: vec![],
            targets: vec![],
        };
        let mut all = IndexMap::new();
        all.insert(foo.identity.clone(), foo.clone());
        all.insert(bar.identity.clone(), bar);

        let roots = vec![foo.identity.clone()];
        let (graph, diags) = assemble(&roots, &all, &[], &AssembleOptions::new());
        assert!(graph.is_none());
        assert!(diags.iter().any(|d| d.message.contains("requires tools-version 6.0 or later")));
    }

    /// spec §8 scenario 4: duplicate target names across distinct packages is fatal.
    #[test]
    fn duplicate_target_names_across_packages_is_fatal() {
        let foo = PackageManifest {
            identity: Identity::from_normalized("foo", IdentityKind::FileSystem),
            display_name: "Foo".to_string(),
            tools_version: ToolsVersion::new(5, 0),
            platforms: vec![],
            traits: vec![],
            dependencies: vec![],
            products: vec![],
            targets: vec![target("Bar", TargetType::Regular, vec![])],
        };
        let bar = PackageManifest {
            identity: Identity::from_normalized("bar", IdentityKind::FileSystem),
            display_name: "Bar".to_string(),
            tools_version: ToolsVersion::new(5, 0),
            platforms: vec![],
            traits: vec![],
            dependencies: vec![],
            products: vec![],
            targets: vec![target("Bar", TargetType::Regular, vec![])],
        };
        let mut all = IndexMap::new();
        all.insert(foo.identity.clone(), foo.clone());
        all.insert(bar.identity.clone(), bar.clone());

        let roots = vec![foo.identity.clone(), bar.identity.clone()];
        let (graph, diags) = assemble(&roots, &all, &[], &AssembleOptions::new());
        assert!(graph.is_none());
        assert!(diags.iter().any(|d| d.message.contains("conflicting name: 'Bar'")));
    }

    /// spec §4.7: a non-root package's enabled-trait set is the union of traits forwarded to it
    /// from every consuming edge, not just its own `default` trait.
    #[test]
    fn non_root_trait_selection_is_union_of_forwarded_traits() {
        let mut bar_dep = dep("bar");
        bar_dep.forwarded_traits = vec!["fancy".to_string()];
        let bar = PackageManifest {
            identity: Identity::from_normalized("bar", IdentityKind::FileSystem),
            display_name: "Bar".to_string(),
            tools_version: ToolsVersion::new(6, 0),
            platforms: vec![],
            traits: vec![crate::manifest::TraitDecl {
                name: "fancy".to_string(),
                enabled_traits: vec![],
            }],
            dependencies: vec![],
            products: vec![library("Bar", &["Bar"])],
            targets: vec![target("Bar", TargetType::Regular, vec![])],
        };
        let foo = PackageManifest {
            identity: Identity::from_normalized("foo", IdentityKind::FileSystem),
            display_name: "Foo".to_string(),
            tools_version: ToolsVersion::new(6, 0),
            platforms: vec![],
            traits: vec![],
            dependencies: vec![bar_dep],
            products: vec![],
            targets: vec![target(
                "Foo",
                TargetType::Regular,
                vec![TargetDependencyRef::Product {
                    product: "Bar".to_string(),
                    package: Some("bar".to_string()),
                    condition: None,
                }],
            )],
        };
        let mut all = IndexMap::new();
        all.insert(bar.identity.clone(), bar.clone());
        all.insert(foo.identity.clone(), foo.clone());

        let roots = vec![foo.identity.clone()];
        let (graph, diags) = assemble(&roots, &all, &[], &AssembleOptions::new());
        assert!(diags.iter().all(|d| d.severity != crate::diagnostics::Severity::Error), "{:?}", diags);
        let graph = graph.expect("graph should assemble");
        let bar_resolved = graph.package(&bar.identity).expect("bar is reachable");
        assert!(bar_resolved.enabled_traits.contains("fancy"));
    }
}
