// Copyright (c) The pkggraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The version-set algebra: a disjoint, sorted union of half-open ranges over
//! [`SemanticVersion`], plus the `any` and `empty` atoms.

use crate::version::SemanticVersion;
use std::cmp::Ordering;
use std::fmt;

/// An endpoint of a segment: either a concrete version, or one of the two unbounded sentinels.
///
/// `NegInf` only ever appears as a lower bound and `PosInf` only ever as an upper bound; both
/// only arise internally (e.g. from [`VersionSet::any`] or from a [`VersionSet::difference`]
/// against `any`). User-constructed ranges always have concrete endpoints.
#[derive(Clone, Debug, Eq, PartialEq)]
enum Endpoint {
    NegInf,
    At(SemanticVersion),
    PosInf,
}

impl Endpoint {
    fn is_prerelease(&self) -> bool {
        matches!(self, Endpoint::At(v) if v.is_prerelease())
    }
}

impl Ord for Endpoint {
    fn cmp(&self, other: &Self) -> Ordering {
        use Endpoint::*;
        match (self, other) {
            (NegInf, NegInf) | (PosInf, PosInf) => Ordering::Equal,
            (NegInf, _) => Ordering::Less,
            (_, NegInf) => Ordering::Greater,
            (PosInf, _) => Ordering::Greater,
            (_, PosInf) => Ordering::Less,
            (At(a), At(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for Endpoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A single canonical half-open segment `[lo, hi)`, where `lo < hi` always holds.
#[derive(Clone, Debug, Eq, PartialEq)]
struct Segment {
    lo: Endpoint,
    hi: Endpoint,
}

/// A version set: the canonical, coalesced union of zero or more disjoint half-open ranges.
///
/// Two `VersionSet`s compare equal iff their canonical forms are identical — in particular,
/// `VersionSet::empty()`, `VersionSet::range(v, v)`, and a set built from an empty range list all
/// compare equal.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VersionSet {
    segments: Vec<Segment>,
}

impl VersionSet {
    /// The empty set: contains no versions.
    pub fn empty() -> Self {
        VersionSet { segments: Vec::new() }
    }

    /// The universal set: contains every version.
    pub fn any() -> Self {
        VersionSet {
            segments: vec![Segment {
                lo: Endpoint::NegInf,
                hi: Endpoint::PosInf,
            }],
        }
    }

    /// A half-open range `[lo, hi)`. Collapses to `empty` if `lo >= hi`.
    pub fn range(lo: SemanticVersion, hi: SemanticVersion) -> Self {
        if lo >= hi {
            return Self::empty();
        }
        VersionSet {
            segments: vec![Segment {
                lo: Endpoint::At(lo),
                hi: Endpoint::At(hi),
            }],
        }
    }

    /// The set containing exactly `v`: `range(v, v.next_patch())`.
    pub fn exact(v: SemanticVersion) -> Self {
        let hi = v.next_patch();
        Self::range(v, hi)
    }

    /// Returns true iff this set contains no versions.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns true iff this set is the universal set.
    pub fn is_any(&self) -> bool {
        self.segments.len() == 1
            && self.segments[0].lo == Endpoint::NegInf
            && self.segments[0].hi == Endpoint::PosInf
    }

    /// Returns true iff any bound of this set is a pre-release version. Used to decide whether
    /// resolution for this requirement needs to consider pre-release candidates at all.
    pub fn supports_prerelease(&self) -> bool {
        self.segments
            .iter()
            .any(|s| s.lo.is_prerelease() || s.hi.is_prerelease())
    }

    /// Returns true iff `v` lies in this set.
    pub fn contains(&self, v: &SemanticVersion) -> bool {
        let point = Endpoint::At(v.clone());
        // segments are sorted and disjoint, so a binary search on `lo` suffices.
        match self.segments.binary_search_by(|seg| seg.lo.cmp(&point)) {
            Ok(_) => true,
            Err(idx) => {
                if idx == 0 {
                    false
                } else {
                    let seg = &self.segments[idx - 1];
                    seg.lo <= point && point < seg.hi
                }
            }
        }
    }

    /// The union of a list of sets. `union(a, b) == union_of(&[a, b])`.
    pub fn union_of(sets: &[VersionSet]) -> VersionSet {
        let mut all: Vec<Segment> = sets.iter().flat_map(|s| s.segments.iter().cloned()).collect();
        all.sort_by(|a, b| a.lo.cmp(&b.lo));
        VersionSet {
            segments: coalesce(all),
        }
    }

    /// The union of two sets.
    pub fn union(&self, other: &VersionSet) -> VersionSet {
        Self::union_of(&[self.clone(), other.clone()])
    }

    /// The intersection of two sets.
    pub fn intersection(&self, other: &VersionSet) -> VersionSet {
        VersionSet {
            segments: intersect_segments(&self.segments, &other.segments),
        }
    }

    /// `self` minus `other`: the set of versions in `self` but not in `other`.
    pub fn difference(&self, other: &VersionSet) -> VersionSet {
        let complement = complement_segments(&other.segments);
        VersionSet {
            segments: intersect_segments(&self.segments, &complement),
        }
    }
}

fn coalesce(sorted: Vec<Segment>) -> Vec<Segment> {
    let mut result: Vec<Segment> = Vec::with_capacity(sorted.len());
    for seg in sorted {
        match result.last_mut() {
            // Overlapping or touching (hi == next.lo) segments merge into one.
            Some(last) if seg.lo <= last.hi => {
                if seg.hi > last.hi {
                    last.hi = seg.hi;
                }
            }
            _ => result.push(seg),
        }
    }
    result
}

fn intersect_segments(a: &[Segment], b: &[Segment]) -> Vec<Segment> {
    let mut result = Vec::new();
    let (mut i, mut j) = (0usize, 0usize);
    while i < a.len() && j < b.len() {
        let lo = std::cmp::max(&a[i].lo, &b[j].lo).clone();
        let hi = std::cmp::min(&a[i].hi, &b[j].hi).clone();
        if lo < hi {
            result.push(Segment { lo, hi });
        }
        if a[i].hi <= b[j].hi {
            i += 1;
        } else {
            j += 1;
        }
    }
    result
}

/// The complement of a sorted, disjoint, canonical segment list within the universal set.
fn complement_segments(segs: &[Segment]) -> Vec<Segment> {
    let mut result = Vec::new();
    let mut prev_hi = Endpoint::NegInf;
    for seg in segs {
        if prev_hi < seg.lo {
            result.push(Segment {
                lo: prev_hi,
                hi: seg.lo.clone(),
            });
        }
        prev_hi = seg.hi.clone();
    }
    if prev_hi < Endpoint::PosInf {
        result.push(Segment {
            lo: prev_hi,
            hi: Endpoint::PosInf,
        });
    }
    result
}

impl fmt::Display for VersionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "empty");
        }
        if self.is_any() {
            return write!(f, "any");
        }
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            let lo = match &seg.lo {
                Endpoint::NegInf => "-inf".to_string(),
                Endpoint::At(v) => v.to_string(),
                Endpoint::PosInf => unreachable!("lo is never +inf"),
            };
            let hi = match &seg.hi {
                Endpoint::PosInf => "+inf".to_string(),
                Endpoint::At(v) => v.to_string(),
                Endpoint::NegInf => unreachable!("hi is never -inf"),
            };
            write!(f, "[{}, {})", lo, hi)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn v(s: &str) -> SemanticVersion {
        s.parse().unwrap()
    }

    #[test]
    fn empty_range_and_ranges_all_equal() {
        assert_eq!(VersionSet::empty(), VersionSet::range(v("1.0.0"), v("1.0.0")));
        assert_eq!(VersionSet::empty(), VersionSet::union_of(&[]));
    }

    #[test]
    fn exact_equals_range_to_next_patch() {
        let ver = v("1.2.3");
        assert_eq!(VersionSet::exact(ver.clone()), VersionSet::range(ver, v("1.2.4")));
    }

    #[test]
    fn union_with_empty_is_identity() {
        let a = VersionSet::range(v("1.0.0"), v("2.0.0"));
        assert_eq!(a.union(&VersionSet::empty()), a);
    }

    #[test]
    fn intersection_with_any_is_identity() {
        let a = VersionSet::range(v("1.0.0"), v("2.0.0"));
        assert_eq!(a.intersection(&VersionSet::any()), a);
    }

    #[test]
    fn self_difference_is_empty() {
        let a = VersionSet::range(v("1.0.0"), v("2.0.0"));
        assert_eq!(a.difference(&a), VersionSet::empty());
    }

    #[test]
    fn union_merges_touching_ranges() {
        let a = VersionSet::range(v("1.0.0"), v("2.0.0"));
        let b = VersionSet::range(v("2.0.0"), v("3.0.0"));
        assert_eq!(a.union(&b), VersionSet::range(v("1.0.0"), v("3.0.0")));
    }

    #[test]
    fn difference_preserves_prerelease_semantics() {
        let a = VersionSet::range(v("1.0.0-beta"), v("2.0.0"));
        let b = VersionSet::exact(v("1.0.0-beta"));
        let result = a.difference(&b);
        assert_eq!(result, VersionSet::range(v("1.0.0-beta.0"), v("2.0.0")));
    }

    #[test]
    fn difference_across_midpoint_prerelease() {
        let a = VersionSet::range(v("1.0.0-beta"), v("2.0.0"));
        let b = VersionSet::exact(v("1.0.0-beta.5"));
        let result = a.difference(&b);
        let expected = VersionSet::union_of(&[
            VersionSet::range(v("1.0.0-beta"), v("1.0.0-beta.5")),
            VersionSet::range(v("1.0.0-beta.5.0"), v("2.0.0")),
        ]);
        assert_eq!(result, expected);
    }

    #[test]
    fn any_contains_everything() {
        assert!(VersionSet::any().contains(&v("0.0.1")));
        assert!(VersionSet::any().contains(&v("999.0.0-alpha")));
    }

    #[test]
    fn difference_of_any_minus_range_is_unbounded_complement() {
        let hole = VersionSet::range(v("1.0.0"), v("2.0.0"));
        let result = VersionSet::any().difference(&hole);
        assert!(result.contains(&v("0.5.0")));
        assert!(result.contains(&v("2.0.0")));
        assert!(!result.contains(&v("1.5.0")));
    }

    #[test]
    fn canonicalization_is_idempotent() {
        let a = VersionSet::union_of(&[
            VersionSet::range(v("1.0.0"), v("2.0.0")),
            VersionSet::range(v("1.5.0"), v("3.0.0")),
        ]);
        let b = a.union(&a);
        assert_eq!(a, b);
    }

    #[test]
    fn union_contains_iff_either_contains() {
        let a = VersionSet::range(v("1.0.0"), v("2.0.0"));
        let b = VersionSet::range(v("3.0.0"), v("4.0.0"));
        let u = a.union(&b);
        for s in ["0.9.0", "1.5.0", "2.5.0", "3.5.0", "4.5.0"] {
            let version = v(s);
            assert_eq!(
                u.contains(&version),
                a.contains(&version) || b.contains(&version),
                "mismatch at {}",
                s
            );
        }
    }
}
