// Copyright (c) The pkggraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types returned by `pkggraph`.
//!
//! Per spec §7's propagation policy, fatal *assembly* problems (module cycles, duplicate
//! targets, unsafe-flag leakage, ...) are not variants here -- they are
//! [`Diagnostic`](crate::diagnostics::Diagnostic)s at [`Severity::Error`](crate::diagnostics::Severity::Error),
//! collected on the bus alongside every non-fatal diagnostic in the same pass. `Error` covers
//! only out-of-band failures: queries against an already-built graph for a name it doesn't
//! contain, and I/O/parse failures from the resolved-packages file loader.

use std::error;
use std::fmt;
use std::io;

/// Error type describing the sorts of errors `pkggraph` can return.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// A module name was looked up that isn't present in the graph.
    UnknownModule(String),
    /// A product name was looked up that isn't present in the graph.
    UnknownProduct(String),
    /// A package identity was looked up that isn't present in the graph.
    UnknownIdentity(String),
    /// [`replProductName`](crate::graph::ModulesGraph::repl_product_name) was called on a graph
    /// with no root packages.
    NoRootPackages,
    /// Reading the resolved-packages file failed at the filesystem level.
    ResolvedPackagesIo(io::Error),
    /// The resolved-packages file's contents did not parse as the expected JSON document.
    ResolvedPackagesParse(serde_json::Error),
    /// The resolved-packages file contained two pin entries for the same normalized identity.
    ResolvedPackagesDuplicateEntry {
        /// The path of the offending file.
        path: String,
        /// The normalized identity that appeared more than once.
        identity: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownModule(name) => write!(f, "unknown module '{}'", name),
            Error::UnknownProduct(name) => write!(f, "unknown product '{}'", name),
            Error::UnknownIdentity(identity) => write!(f, "unknown package identity '{}'", identity),
            Error::NoRootPackages => write!(f, "cannot compute a REPL product name: no root packages"),
            Error::ResolvedPackagesIo(err) => write!(f, "error reading resolved-packages file: {}", err),
            Error::ResolvedPackagesParse(err) => write!(f, "error parsing resolved-packages file: {}", err),
            Error::ResolvedPackagesDuplicateEntry { path, identity } => write!(
                f,
                "{} file is corrupted or malformed; fix or delete the file to continue: duplicated entry for package \"{}\"",
                path, identity
            ),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::ResolvedPackagesIo(err) => Some(err),
            Error::ResolvedPackagesParse(err) => Some(err),
            _ => None,
        }
    }
}
