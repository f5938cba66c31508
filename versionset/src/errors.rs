// Copyright (c) The pkggraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types returned by `versionset`.

use std::error;
use std::fmt;

/// Error type describing the sorts of errors `versionset` can return.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// A version string did not parse as `major.minor.patch[-prerelease][+build]`.
    InvalidVersion {
        /// The input that failed to parse.
        input: String,
        /// A human-readable reason.
        reason: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidVersion { input, reason } => {
                write!(f, "invalid semantic version '{}': {}", input, reason)
            }
        }
    }
}

impl error::Error for Error {}
