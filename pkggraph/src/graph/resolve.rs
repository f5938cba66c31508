// Copyright (c) The pkggraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The resolved entity model: modules, products, and packages as they exist after assembly.
//!
//! Modules reference their owning package and other modules only through arena-style keys
//! (`Identity`, module/product name strings, or petgraph `NodeIndex`es) rather than through Rust
//! references, so the structure can contain cycles (caught and rejected before the graph is
//! returned, but representable while being checked) without any unsafe code or `Rc`/`RefCell`.

use crate::condition::Condition;
use crate::identity::Identity;
use crate::manifest::{PackageManifest, ProductKind, TargetType};
use crate::platform::PlatformTable;
use crate::tools_version::ToolsVersion;
use petgraph::graph::{Directed, Graph, NodeIndex};
use std::collections::BTreeSet;

/// The index type used for both the module graph and the package graph.
pub type Ix = u32;

/// An edge in the module graph: a resolved target dependency, pointing either at a sibling
/// module or at a product exported by a package dependency.
#[derive(Clone, Debug)]
pub enum ResolvedDependency {
    /// A dependency on another module, by node index into the module graph.
    Module {
        target: NodeIndex<Ix>,
        condition: Option<Condition>,
    },
    /// A dependency on a product, by name (products aren't graph nodes -- they can't
    /// participate in the module-level cycle check, since only module-to-module edges can form
    /// the cycles that check cares about).
    Product {
        product: String,
        condition: Option<Condition>,
    },
}

impl ResolvedDependency {
    pub fn condition(&self) -> Option<&Condition> {
        match self {
            ResolvedDependency::Module { condition, .. } => condition.as_ref(),
            ResolvedDependency::Product { condition, .. } => condition.as_ref(),
        }
    }
}

/// A target, resolved into the graph.
#[derive(Clone, Debug)]
pub struct ResolvedModule {
    pub name: String,
    pub target_type: TargetType,
    pub owning_package: Identity,
    pub platforms: PlatformTable,
    pub dependencies: Vec<ResolvedDependency>,
    pub uses_unsafe_flags: bool,
    pub package_access: bool,
    /// Whether the (external) loader found any recognized source files for this target, carried
    /// over from [`crate::manifest::TargetDecl::has_sources`] for the empty-member check (C8).
    pub has_sources: bool,
    /// The tools-version of the package that *owns* this module, used to gate the unsafe-flag
    /// leakage check (C8) at each usage site.
    pub consumer_tools_version: ToolsVersion,
}

/// A product, resolved into the graph.
#[derive(Clone, Debug)]
pub struct ResolvedProduct {
    pub name: String,
    pub kind: ProductKind,
    pub owning_package: Identity,
    /// Member modules, by node index into the module graph, in declaration order.
    pub members: Vec<NodeIndex<Ix>>,
    pub platforms: PlatformTable,
}

/// A package, resolved into the graph.
#[derive(Clone, Debug)]
pub struct ResolvedPackage {
    pub identity: Identity,
    pub manifest: PackageManifest,
    /// This package's own modules, by node index, in declaration order.
    pub modules: Vec<NodeIndex<Ix>>,
    /// This package's own products, by name, in declaration order.
    pub products: Vec<String>,
    /// Declared package dependencies actually kept in the graph (after pruning), by node index
    /// into the package graph, in declaration order.
    pub dependency_packages: Vec<NodeIndex<Ix>>,
    pub enabled_traits: BTreeSet<String>,
}

/// The module-to-module dependency graph: nodes are modules (by name, globally unique), edges
/// are resolved module-to-module bindings. Product edges are *not* represented here -- they
/// can't participate in a module-level cycle (spec §4.4).
pub type ModuleGraph = Graph<String, Option<Condition>, Directed, Ix>;

/// The package-to-package dependency graph: nodes are packages (by identity), edges are
/// declared package dependencies.
pub type PackageDepGraph = Graph<Identity, (), Directed, Ix>;

/// Returns the out-neighbors of `node` in declared order.
///
/// petgraph stores each node's outgoing edges as a singly-linked list with new edges pushed to
/// the front, so a plain `.edges()` walk yields them newest-first; since edges are only ever
/// added here (never removed) during assembly, reversing that walk recovers declaration order.
pub fn neighbors_in_declared_order<N, E>(graph: &Graph<N, E, Directed, Ix>, node: NodeIndex<Ix>) -> Vec<NodeIndex<Ix>> {
    let mut targets: Vec<NodeIndex<Ix>> = graph
        .neighbors_directed(node, petgraph::Direction::Outgoing)
        .collect();
    targets.reverse();
    targets
}
