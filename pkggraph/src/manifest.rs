// Copyright (c) The pkggraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The manifest model (component C4): an immutable, in-memory description of a package exactly
//! as loaded by the (external) manifest loader.

use crate::condition::Condition;
use crate::identity::{Identity, IdentityKind};
use crate::platform::PlatformSpec;
use crate::tools_version::ToolsVersion;
use versionset::VersionSet;

/// How a target depends on something, before resolution.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TargetDependencyRef {
    /// An unqualified name: could resolve to a sibling module or, ambiguously, a product.
    ByName { name: String, condition: Option<Condition> },
    /// Explicitly declared to be a sibling module in the same package.
    Target { name: String, condition: Option<Condition> },
    /// Explicitly declared to be a product exported by a package dependency.
    Product {
        product: String,
        package: Option<String>,
        condition: Option<Condition>,
    },
}

impl TargetDependencyRef {
    /// The condition attached to this reference, if any.
    pub fn condition(&self) -> Option<&Condition> {
        match self {
            TargetDependencyRef::ByName { condition, .. } => condition.as_ref(),
            TargetDependencyRef::Target { condition, .. } => condition.as_ref(),
            TargetDependencyRef::Product { condition, .. } => condition.as_ref(),
        }
    }
}

/// What kind of compilable unit a target is.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum TargetType {
    Regular,
    Executable,
    Test,
    System,
    Plugin,
    Macro,
    Binary,
}

impl TargetType {
    /// Whether this target type is a test target, for the type-dependency matrix (C8) and the
    /// "no non-test target depends on a test target" invariant.
    pub fn is_test(self) -> bool {
        matches!(self, TargetType::Test)
    }
}

/// Per-target build settings relevant to this core; everything else (compiler flags, defines)
/// is opaque to the graph and lives with the external build planner.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TargetSettings {
    /// Whether this target's settings include any unsafe build-flag usage (C8's unsafe-flag
    /// leakage check).
    pub uses_unsafe_flags: bool,
}

/// A target as declared in a manifest.
#[derive(Clone, Debug)]
pub struct TargetDecl {
    pub name: String,
    pub target_type: TargetType,
    pub dependencies: Vec<TargetDependencyRef>,
    pub settings: TargetSettings,
    /// The plugin capability this target provides, if it is a `plugin` target.
    pub plugin_capability: Option<String>,
    /// Whether this target's declaration grants `package`-level access to siblings.
    pub package_access: bool,
    /// Whether the (external) loader found any recognized source files for this target.
    pub has_sources: bool,
}

/// A library product's linkage preference.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum LibraryKind {
    Automatic,
    Static,
    Dynamic,
}

/// What kind of externally-visible bundle a product is.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ProductKind {
    Library(LibraryKind),
    Executable,
    Plugin,
    Macro,
    Snippet,
    Test,
}

/// A product as declared in a manifest.
#[derive(Clone, Debug)]
pub struct ProductDecl {
    pub name: String,
    pub kind: ProductKind,
    /// The names of this product's member targets, in declaration order.
    pub targets: Vec<String>,
}

/// A package dependency as declared in a manifest.
#[derive(Clone, Debug)]
pub struct DependencyDecl {
    pub kind: IdentityKind,
    /// The declared location (path or URL); normalized into an [`Identity`] by the resolver.
    pub location: String,
    /// The version requirement the (external) version resolver already satisfied.
    pub version_requirement: VersionSet,
    /// A secondary, user-facing name honored when resolving target-dependency references below
    /// [`ToolsVersion::DEPRECATED_ALIAS_RESOLUTION_REMOVED`].
    pub deprecated_alias: Option<String>,
    /// Traits of the dependency this declaration unconditionally forwards into it, contributing
    /// to the union the trait evaluator (C5) computes for a non-root package (spec §4.7: "the
    /// union of selections forwarded to it from every consuming edge").
    pub forwarded_traits: Vec<String>,
}

impl DependencyDecl {
    /// The identity this dependency declaration resolves to.
    pub fn identity(&self) -> Identity {
        Identity::normalize(&self.location, self.kind)
    }
}

/// A trait declaration: a named feature flag, and the other traits it transitively enables.
#[derive(Clone, Debug)]
pub struct TraitDecl {
    pub name: String,
    pub enabled_traits: Vec<String>,
}

/// An immutable, in-memory description of a package, exactly as loaded.
#[derive(Clone, Debug)]
pub struct PackageManifest {
    pub identity: Identity,
    pub display_name: String,
    pub tools_version: ToolsVersion,
    pub platforms: Vec<PlatformSpec>,
    pub traits: Vec<TraitDecl>,
    pub dependencies: Vec<DependencyDecl>,
    pub products: Vec<ProductDecl>,
    pub targets: Vec<TargetDecl>,
}

impl PackageManifest {
    /// Looks up a target by name within this manifest.
    pub fn target(&self, name: &str) -> Option<&TargetDecl> {
        self.targets.iter().find(|t| t.name == name)
    }

    /// Looks up a product by name within this manifest.
    pub fn product(&self, name: &str) -> Option<&ProductDecl> {
        self.products.iter().find(|p| p.name == name)
    }

    /// Whether this package exposes only a module map and no targets (a "system module"
    /// package), exempt from unused-dependency warnings (C11).
    pub fn is_system_module(&self) -> bool {
        self.targets.iter().all(|t| t.target_type == TargetType::System)
    }
}
