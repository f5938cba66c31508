// Copyright (c) The pkggraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The linkage resolver (component C6): binds each target-dependency reference to either a
//! sibling module in the same package or a product exported by a declared package dependency.
//!
//! This module is deliberately graph-agnostic: it takes the manifests it needs as plain
//! references and returns a [`Binding`] by value, so the assembler (C12) can call it during the
//! edge-resolution pass without the module graph's node indices leaking into this logic. The
//! assembler is responsible for turning a `Binding::Module` into a `NodeIndex` once every
//! package's module nodes exist.

use crate::diagnostics::DiagnosticBus;
use crate::identity::Identity;
use crate::manifest::{PackageManifest, TargetDecl, TargetDependencyRef, TargetType};
use crate::tools_version::ToolsVersion;
use std::collections::BTreeMap;

/// Where a resolved target-dependency reference points.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Binding {
    /// A sibling module in the referring target's own package.
    Module(String),
    /// A product exported by a declared package dependency.
    Product { product: String, package: Identity },
}

/// One of the referring package's declared dependencies, with the fields linkage needs:
/// its resolved identity, the declaring manifest's display name and product list, and any
/// deprecated alias.
pub struct DeclaredDependency<'a> {
    pub identity: Identity,
    pub manifest: &'a PackageManifest,
    pub deprecated_alias: Option<&'a str>,
}

/// Resolves a single target-dependency reference for `referring_target` in `referring_manifest`,
/// against its declared dependencies. Pushes any diagnostics to `bus`. Returns `None` if no
/// binding could be made (a diagnostic was always pushed in that case).
pub fn resolve(
    bus: &mut DiagnosticBus,
    referring_identity: &Identity,
    referring_manifest: &PackageManifest,
    referring_target: &TargetDecl,
    dep_ref: &TargetDependencyRef,
    declared_dependencies: &[DeclaredDependency<'_>],
) -> Option<Binding> {
    match dep_ref {
        TargetDependencyRef::Target { name, .. } => {
            resolve_sibling(bus, referring_target, name, referring_manifest)
        }
        TargetDependencyRef::ByName { name, .. } => {
            if referring_manifest.target(name).is_some() {
                return resolve_sibling(bus, referring_target, name, referring_manifest);
            }
            resolve_byname_product(
                bus,
                referring_identity,
                referring_manifest,
                referring_target,
                name,
                declared_dependencies,
            )
        }
        TargetDependencyRef::Product { product, package, .. } => resolve_explicit_product(
            bus,
            referring_identity,
            referring_manifest,
            referring_target,
            product,
            package.as_deref(),
            declared_dependencies,
        ),
    }
}

fn resolve_sibling(
    bus: &mut DiagnosticBus,
    referring_target: &TargetDecl,
    name: &str,
    referring_manifest: &PackageManifest,
) -> Option<Binding> {
    let sibling = referring_manifest.target(name)?;
    if sibling.target_type.is_test() && !referring_target.target_type.is_test() {
        bus.error(format!(
            "Invalid dependency: '{}' cannot depend on test target dependency '{}'",
            referring_target.name, name
        ));
        return None;
    }
    Some(Binding::Module(name.to_string()))
}

/// Rule 2: a bare `byName` reference that isn't a sibling module is interpreted as a product
/// reference. At tools-version >= 5.2, if it matches exactly one product across declared
/// dependencies, that's ambiguous and must be rejected in favor of an explicit declaration.
fn resolve_byname_product(
    bus: &mut DiagnosticBus,
    referring_identity: &Identity,
    referring_manifest: &PackageManifest,
    referring_target: &TargetDecl,
    name: &str,
    declared_dependencies: &[DeclaredDependency<'_>],
) -> Option<Binding> {
    let candidates: Vec<&DeclaredDependency<'_>> = declared_dependencies
        .iter()
        .filter(|dep| dep.manifest.product(name).is_some())
        .collect();

    if referring_manifest.tools_version >= ToolsVersion::EXPLICIT_PRODUCT_DECLARATION_REQUIRED {
        if candidates.is_empty() {
            return emit_product_not_found(
                bus,
                referring_identity,
                referring_target,
                name,
                referring_manifest,
                declared_dependencies,
            );
        }
        for dep in &candidates {
            bus.error(format!(
                "dependency '{}' in target '{}' requires explicit declaration; reference the package in the target dependency with '.product(name: \"{}\", package: \"{}\")'",
                name, referring_target.name, name, dep.identity
            ));
        }
        return None;
    }

    // Below 5.2, a unique byName match against a declared dependency's products binds directly.
    match candidates.as_slice() {
        [dep] => Some(Binding::Product {
            product: name.to_string(),
            package: dep.identity.clone(),
        }),
        [] => emit_product_not_found(
            bus,
            referring_identity,
            referring_target,
            name,
            referring_manifest,
            declared_dependencies,
        ),
        _ => {
            for dep in &candidates {
                bus.error(format!(
                    "product '{}' required by package '{}' target '{}' is ambiguous between multiple dependencies, including '{}'",
                    name, referring_identity, referring_target.name, dep.identity
                ));
            }
            None
        }
    }
}

/// Rule 3/4: an explicit `product(name, package?)` reference.
fn resolve_explicit_product(
    bus: &mut DiagnosticBus,
    referring_identity: &Identity,
    referring_manifest: &PackageManifest,
    referring_target: &TargetDecl,
    product: &str,
    package: Option<&str>,
    declared_dependencies: &[DeclaredDependency<'_>],
) -> Option<Binding> {
    let honor_deprecated_alias = referring_manifest.tools_version < ToolsVersion::DEPRECATED_ALIAS_RESOLUTION_REMOVED;
    let matching_package = match package {
        Some(pkg) => declared_dependencies
            .iter()
            .find(|dep| dependency_matches_name(dep, pkg, honor_deprecated_alias)),
        None => declared_dependencies.iter().find(|dep| dep.manifest.product(product).is_some()),
    };

    let dep = match matching_package {
        Some(dep) => dep,
        None => {
            // `pkg` didn't match any declared dependency by identity/display name/alias; if
            // `product` matches a product in some *other* declared dependency, suggest it.
            if let Some(found) = declared_dependencies.iter().find(|d| d.manifest.product(product).is_some()) {
                bus.error(format!(
                    "product '{}' required by package '{}' target '{}' not found. Did you mean '.product(name: \"{}\", package: \"{}\")'?",
                    product, referring_identity, referring_target.name, product, found.identity
                ));
            } else {
                return emit_product_not_found(
                    bus,
                    referring_identity,
                    referring_target,
                    product,
                    referring_manifest,
                    declared_dependencies,
                );
            }
            return None;
        }
    };

    if &dep.identity == referring_identity {
        bus.error(format!(
            "product '{}' required by package '{}' target '{}' is declared in the same package",
            product, referring_identity, referring_target.name
        ));
        return None;
    }

    if dep.manifest.product(product).is_none() {
        if let Some(found) = declared_dependencies.iter().find(|d| d.manifest.product(product).is_some()) {
            bus.error(format!(
                "product '{}' required by package '{}' target '{}' not found in package '{}'. Did you mean '.product(name: \"{}\", package: \"{}\")'?",
                product, referring_identity, referring_target.name, dep.identity, product, found.identity
            ));
        } else {
            return emit_product_not_found(
                bus,
                referring_identity,
                referring_target,
                product,
                referring_manifest,
                declared_dependencies,
            );
        }
        return None;
    }

    Some(Binding::Product {
        product: product.to_string(),
        package: dep.identity.clone(),
    })
}

/// `honor_deprecated_alias` gates whether [`DeclaredDependency::deprecated_alias`] is consulted at
/// all -- below [`ToolsVersion::DEPRECATED_ALIAS_RESOLUTION_REMOVED`] it's honored like any other
/// name; at or above it, a reference must use the identity or display name (spec §4.2).
fn dependency_matches_name(dep: &DeclaredDependency<'_>, name: &str, honor_deprecated_alias: bool) -> bool {
    dep.identity.as_str().eq_ignore_ascii_case(name)
        || dep.manifest.display_name.eq_ignore_ascii_case(name)
        || (honor_deprecated_alias && dep.deprecated_alias.map(|a| a.eq_ignore_ascii_case(name)).unwrap_or(false))
}

/// Rule 5: no binding was found anywhere. Emits the not-found diagnostic, extended with a
/// Levenshtein-distance suggestion: sibling module names are tried first, then products visible
/// through declared dependencies. Never suggests a name from an undeclared dependency.
fn emit_product_not_found(
    bus: &mut DiagnosticBus,
    referring_identity: &Identity,
    referring_target: &TargetDecl,
    name: &str,
    referring_manifest: &PackageManifest,
    declared_dependencies: &[DeclaredDependency<'_>],
) -> Option<Binding> {
    let mut message = format!(
        "product '{}' required by package '{}' target '{}' not found",
        name, referring_identity, referring_target.name
    );

    if let Some(suggestion) = suggest_name(name, referring_manifest, declared_dependencies) {
        message.push_str(&format!(". Did you mean '{}'?", suggestion));
    }

    bus.error(message);
    None
}

/// Bounded Levenshtein suggestion: sibling module names first, then declared-dependency product
/// names, each within distance <= 2. Ties are broken by the order candidates are visited
/// (sibling modules in declaration order, then dependencies in declaration order).
fn suggest_name(
    name: &str,
    referring_manifest: &PackageManifest,
    declared_dependencies: &[DeclaredDependency<'_>],
) -> Option<String> {
    const MAX_DISTANCE: usize = 2;
    let mut best: Option<(usize, String)> = None;
    let mut consider = |candidate: &str| {
        let dist = levenshtein(name, candidate);
        if dist <= MAX_DISTANCE && best.as_ref().map(|(d, _)| dist < *d).unwrap_or(true) {
            best = Some((dist, candidate.to_string()));
        }
    };

    for target in &referring_manifest.targets {
        consider(&target.name);
    }
    for dep in declared_dependencies {
        for product in &dep.manifest.products {
            consider(&product.name);
        }
    }

    best.map(|(_, name)| name)
}

/// Plain Wagner-Fischer edit distance over bytes -- identifier-like names here are ASCII in
/// practice, and byte-distance is a fine proxy for "looks like a typo".
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<u8> = a.bytes().collect();
    let b: Vec<u8> = b.bytes().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Used by the dependency pruner (C11) to index a package's products by name for usage-tracking.
pub fn product_index(manifest: &PackageManifest) -> BTreeMap<&str, &crate::manifest::ProductDecl> {
    manifest.products.iter().map(|p| (p.name.as_str(), p)).collect()
}
