// Copyright (c) The pkggraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic version parsing and ordering (semver 2.0, §11).

use crate::errors::Error;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A single dot-separated pre-release identifier: either a bare non-negative integer (no
/// leading zeros) or an alphanumeric string.
///
/// Numeric identifiers always sort below alphanumeric ones, per semver 2.0 §11.4.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum PrereleaseId {
    /// A numeric identifier, e.g. the `5` in `1.0.0-beta.5`.
    Numeric(u64),
    /// An alphanumeric identifier, e.g. `beta` in `1.0.0-beta.5`.
    AlphaNumeric(String),
}

impl PrereleaseId {
    fn parse(s: &str) -> Result<Self, String> {
        if s.is_empty() {
            return Err("empty pre-release identifier".to_string());
        }
        if s.bytes().all(|b| b.is_ascii_digit()) {
            if s.len() > 1 && s.starts_with('0') {
                return Err(format!("numeric identifier '{}' has a leading zero", s));
            }
            let n: u64 = s
                .parse()
                .map_err(|_| format!("numeric identifier '{}' overflows u64", s))?;
            Ok(PrereleaseId::Numeric(n))
        } else {
            if !s
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-')
            {
                return Err(format!("identifier '{}' contains invalid characters", s));
            }
            Ok(PrereleaseId::AlphaNumeric(s.to_string()))
        }
    }
}

impl fmt::Display for PrereleaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrereleaseId::Numeric(n) => write!(f, "{}", n),
            PrereleaseId::AlphaNumeric(s) => write!(f, "{}", s),
        }
    }
}

impl Ord for PrereleaseId {
    fn cmp(&self, other: &Self) -> Ordering {
        use PrereleaseId::*;
        match (self, other) {
            (Numeric(a), Numeric(b)) => a.cmp(b),
            (AlphaNumeric(a), AlphaNumeric(b)) => a.cmp(b),
            // Numeric identifiers always have lower precedence than alphanumeric ones.
            (Numeric(_), AlphaNumeric(_)) => Ordering::Less,
            (AlphaNumeric(_), Numeric(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for PrereleaseId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A semantic version: `major.minor.patch` plus optional pre-release identifiers and build
/// metadata. Build metadata is retained for display but never affects ordering or equality.
#[derive(Clone, Debug)]
pub struct SemanticVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Vec<PrereleaseId>,
    pub build: String,
}

impl SemanticVersion {
    /// Constructs a release version with no pre-release or build metadata.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            prerelease: Vec::new(),
            build: String::new(),
        }
    }

    /// Returns true if this version has pre-release identifiers.
    pub fn is_prerelease(&self) -> bool {
        !self.prerelease.is_empty()
    }

    /// Returns the release triple `(major, minor, patch)`, ignoring pre-release/build.
    fn triple(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }

    /// The smallest version that is not contained in `exact(self)` and compares greater than
    /// `self`: `patch + 1` for release versions, or `self` with a trailing numeric `0`
    /// pre-release identifier appended for pre-release versions.
    ///
    /// This models `1.0.0-beta` < `1.0.0-beta.0` < `1.0.0-beta.1` < ... < `1.0.0`, so that
    /// `exact(v) = range(v, v.next_patch())` always excludes every version strictly greater
    /// than `v`.
    pub fn next_patch(&self) -> SemanticVersion {
        if self.prerelease.is_empty() {
            SemanticVersion {
                major: self.major,
                minor: self.minor,
                patch: self.patch + 1,
                prerelease: Vec::new(),
                build: String::new(),
            }
        } else {
            let mut prerelease = self.prerelease.clone();
            prerelease.push(PrereleaseId::Numeric(0));
            SemanticVersion {
                major: self.major,
                minor: self.minor,
                patch: self.patch,
                prerelease,
                build: String::new(),
            }
        }
    }
}

impl FromStr for SemanticVersion {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let err = |reason: String| Error::InvalidVersion {
            input: input.to_string(),
            reason,
        };

        let (core_and_pre, build) = match input.split_once('+') {
            Some((a, b)) => (a, b.to_string()),
            None => (input, String::new()),
        };
        let (core, prerelease_str) = match core_and_pre.split_once('-') {
            Some((a, b)) => (a, Some(b)),
            None => (core_and_pre, None),
        };

        let mut parts = core.split('.');
        let mut next_numeric = |which: &str| -> Result<u64, Error> {
            let part = parts
                .next()
                .ok_or_else(|| err(format!("missing {} component", which)))?;
            if part.is_empty() || (part.len() > 1 && part.starts_with('0')) {
                return Err(err(format!("{} component '{}' has a leading zero", which, part)));
            }
            part.parse()
                .map_err(|_| err(format!("{} component '{}' is not a number", which, part)))
        };
        let major = next_numeric("major")?;
        let minor = next_numeric("minor")?;
        let patch = next_numeric("patch")?;
        if parts.next().is_some() {
            return Err(err("too many dot-separated components".to_string()));
        }

        let prerelease = match prerelease_str {
            Some(s) => s
                .split('.')
                .map(PrereleaseId::parse)
                .collect::<Result<Vec<_>, _>>()
                .map_err(err)?,
            None => Vec::new(),
        };

        Ok(SemanticVersion {
            major,
            minor,
            patch,
            prerelease,
            build,
        })
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.prerelease.is_empty() {
            write!(f, "-")?;
            for (i, id) in self.prerelease.iter().enumerate() {
                if i > 0 {
                    write!(f, ".")?;
                }
                write!(f, "{}", id)?;
            }
        }
        if !self.build.is_empty() {
            write!(f, "+{}", self.build)?;
        }
        Ok(())
    }
}

impl PartialEq for SemanticVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SemanticVersion {}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.triple().cmp(&other.triple()).then_with(|| {
            match (self.prerelease.is_empty(), other.prerelease.is_empty()) {
                (true, true) => Ordering::Equal,
                // A release version is always greater than any pre-release of the same triple.
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => {
                    let mut a = self.prerelease.iter();
                    let mut b = other.prerelease.iter();
                    loop {
                        match (a.next(), b.next()) {
                            (Some(x), Some(y)) => match x.cmp(y) {
                                Ordering::Equal => continue,
                                other => return other,
                            },
                            // A larger set of pre-release fields has higher precedence than a
                            // smaller set, if all preceding identifiers are equal.
                            (Some(_), None) => return Ordering::Greater,
                            (None, Some(_)) => return Ordering::Less,
                            (None, None) => return Ordering::Equal,
                        }
                    }
                }
            }
        })
    }
}

impl std::hash::Hash for SemanticVersion {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.triple().hash(state);
        self.prerelease.hash(state);
    }
}
