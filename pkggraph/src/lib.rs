// Copyright (c) The pkggraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolve and validate a package's modules graph.
//!
//! Given a set of root package manifests plus the resolved transitive dependency manifests that
//! an external loader supplies, `pkggraph` produces a single [`graph::ModulesGraph`]: a
//! validated, acyclic-at-the-module-level, enriched representation of every package, product,
//! module (target), and edge, annotated with platform derivation, conditional activation, trait
//! evaluation, and product-usage pruning. It sits between manifest loading and dependency fetching
//! (both external) and build plan generation (also external).
//!
//! Three engines do the hard part:
//!
//! * [`linkage`] maps each target-dependency reference to a sibling module in the same package or
//!   a product exported by a declared package dependency;
//! * [`validator`] (together with [`cycles`]) enforces the global invariants: unique target/
//!   product names, package- and module-level acyclicity, the legal target-type dependency
//!   matrix, and unsafe-flag leakage;
//! * [`platform`] and [`condition`] propagate declared platform minima down the graph and
//!   evaluate per-dependency conditions against a concrete build environment.
//!
//! [`traits`] computes the enabled-trait set per package by fixed-point expansion, and
//! [`pruner`] decides which declared dependencies a root actually uses. [`graph::assemble`] wires
//! all of the above into one pass and returns a queryable [`graph::ModulesGraph`].
//!
//! # Example
//!
//! ```
//! use pkggraph::graph::{assemble, AssembleOptions};
//! use pkggraph::identity::{Identity, IdentityKind};
//! use pkggraph::manifest::{PackageManifest, TargetDecl, TargetSettings, TargetType};
//! use pkggraph::tools_version::ToolsVersion;
//! use indexmap::IndexMap;
//!
//! let identity = Identity::from_normalized("foo", IdentityKind::Root);
//! let manifest = PackageManifest {
//!     identity: identity.clone(),
//!     display_name: "Foo".to_string(),
//!     tools_version: ToolsVersion::new(6, 0),
//!     platforms: vec![],
//!     traits: vec![],
//!     dependencies: vec![],
//!     products: vec![],
//!     targets: vec![TargetDecl {
//!         name: "Foo".to_string(),
//!         target_type: TargetType::Regular,
//!         dependencies: vec![],
//!         settings: TargetSettings::default(),
//!         plugin_capability: None,
//!         package_access: false,
//!         has_sources: true,
//!     }],
//! };
//!
//! let mut all = IndexMap::new();
//! all.insert(identity.clone(), manifest);
//!
//! let (graph, diagnostics) = assemble(&[identity], &all, &[], &AssembleOptions::new());
//! assert!(diagnostics.is_empty());
//! assert_eq!(graph.unwrap().all_modules().len(), 1);
//! ```
//!
//! # Optional features
//!
//! * `proptest1`: enables `versionset`'s `proptest1` feature, for property-based testing of code
//!   built on top of this crate.

#![warn(missing_docs)]

pub mod condition;
mod cycles;
pub mod diagnostics;
pub mod errors;
pub mod graph;
pub mod identity;
pub mod linkage;
pub mod manifest;
pub mod platform;
mod pruner;
pub mod resolved_packages;
pub mod tools_version;
pub mod traits;
mod validator;

pub use diagnostics::{Diagnostic, DiagnosticBus, DiagnosticMetadata, Severity};
pub use errors::Error;
pub use graph::{assemble, AssembleOptions, BinaryArtifact, ModulesGraph};
pub use identity::{Identity, IdentityKind};
pub use tools_version::ToolsVersion;

// Re-exported so downstream crates can build version requirements without a direct `versionset`
// dependency, the way `guppy` inlines `target_spec`'s public types (see `graph/mod.rs` upstream).
#[doc(no_inline)]
pub use versionset::VersionSet;
