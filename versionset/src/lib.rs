// Copyright (c) The pkggraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A semantic-version ordering and version-set algebra, usable independently of any particular
//! package manifest model.
//!
//! `versionset` has two parts:
//!
//! * [`SemanticVersion`]: parsing and semver 2.0 ordering, including the total order over
//!   pre-release identifier lists.
//! * [`VersionSet`]: a canonical, disjoint union of half-open ranges over versions, with
//!   `union`/`intersection`/`difference` and the `any`/`empty` atoms.
//!
//! This crate is intentionally small and dependency-light so that a version resolver can embed
//! it without pulling in the rest of a package graph model.
//!
//! # Optional features
//!
//! * `proptest1`: `Arbitrary` support for [`SemanticVersion`], for property-based testing of the
//!   algebraic laws in downstream crates.

#![warn(missing_docs)]

pub mod errors;
#[cfg(feature = "proptest1")]
mod proptest_support;
mod set;
mod version;

pub use errors::Error;
pub use set::VersionSet;
pub use version::{PrereleaseId, SemanticVersion};

#[cfg(test)]
mod property_tests {
    use super::*;

    #[test]
    fn laws_hold_on_hand_picked_sets() {
        let a = VersionSet::range("1.0.0".parse().unwrap(), "2.0.0".parse().unwrap());
        let b = VersionSet::range("1.5.0".parse().unwrap(), "3.0.0".parse().unwrap());

        assert_eq!(a.union(&VersionSet::empty()), a);
        assert_eq!(a.intersection(&VersionSet::any()), a);
        assert_eq!(a.difference(&a), VersionSet::empty());

        let u = a.union(&b);
        for raw in ["0.5.0", "1.2.0", "1.7.0", "2.5.0", "3.5.0"] {
            let v: SemanticVersion = raw.parse().unwrap();
            assert_eq!(u.contains(&v), a.contains(&v) || b.contains(&v));
        }
    }
}
