// Copyright (c) The pkggraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Package identity: the normalized, lower-cased key by which packages are deduplicated.

use std::fmt;

/// How a package dependency was located.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum IdentityKind {
    /// The root package being resolved.
    Root,
    /// A dependency found on the local filesystem.
    FileSystem,
    /// A dependency cloned from a local source-control checkout.
    LocalSourceControl,
    /// A dependency fetched from a remote source-control URL.
    RemoteSourceControl,
    /// A dependency fetched from a package registry.
    Registry,
}

/// A normalized, lower-cased package identity.
///
/// Two locations that normalize to the same `Identity` denote the same package: the graph is
/// keyed by this value, not by the original location string.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Identity {
    normalized: String,
    kind: IdentityKind,
}

impl Identity {
    /// Normalizes a declared package location into an `Identity`.
    ///
    /// * `FileSystem`/`LocalSourceControl`/`RemoteSourceControl`: the final path component,
    ///   trailing separators and a trailing `.git` suffix stripped, lower-cased.
    /// * `Registry`: a `scope.name` pair, case-folded and kept as the canonical lowercase form.
    /// * `Root`: same rule as filesystem locations.
    pub fn normalize(location: &str, kind: IdentityKind) -> Identity {
        let normalized = match kind {
            IdentityKind::Registry => normalize_registry(location),
            IdentityKind::Root
            | IdentityKind::FileSystem
            | IdentityKind::LocalSourceControl
            | IdentityKind::RemoteSourceControl => normalize_path_like(location),
        };
        Identity { normalized, kind }
    }

    /// Constructs an `Identity` directly from an already-normalized string. Intended for test
    /// fixtures and for round-tripping an identity previously produced by [`Identity::as_str`].
    pub fn from_normalized(normalized: impl Into<String>, kind: IdentityKind) -> Identity {
        Identity {
            normalized: normalized.into().to_lowercase(),
            kind,
        }
    }

    /// The kind of location this identity was derived from.
    pub fn kind(&self) -> IdentityKind {
        self.kind
    }

    /// The normalized string key.
    pub fn as_str(&self) -> &str {
        &self.normalized
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.normalized)
    }
}

fn normalize_path_like(location: &str) -> String {
    let trimmed = location.trim_end_matches(|c| c == '/' || c == '\\');
    let leaf = trimmed
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(trimmed);
    let leaf = leaf.strip_suffix(".git").unwrap_or(leaf);
    leaf.to_lowercase()
}

fn normalize_registry(location: &str) -> String {
    // Accept "scope.name", "scope/name", or a bare "name" (no scope).
    let lowered = location.to_lowercase();
    match lowered.split_once(|c| c == '.' || c == '/') {
        Some((scope, name)) => format!("{}.{}", scope, name),
        None => lowered,
    }
}
