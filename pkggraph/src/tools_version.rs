// Copyright (c) The pkggraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The manifest-language "tools version": an ordered pair that gates which resolution rules are
//! active. Every rule that changes behavior at a threshold names that threshold explicitly.

use std::cmp::Ordering;
use std::fmt;

/// An integer `major.minor` pair encoding the manifest-language version a package was written
/// against.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ToolsVersion {
    major: u32,
    minor: u32,
}

impl ToolsVersion {
    /// Package-dependency cycles become legal (provided the module graph stays acyclic).
    pub const PACKAGE_CYCLES_ALLOWED: ToolsVersion = ToolsVersion::new(6, 0);
    /// `byName` references that are ambiguous against declared products must be rejected in
    /// favor of an explicit `.product(name:package:)` declaration.
    pub const EXPLICIT_PRODUCT_DECLARATION_REQUIRED: ToolsVersion = ToolsVersion::new(5, 2);
    /// Deprecated dependency aliases stop being honored when resolving target-dependency
    /// references.
    pub const DEPRECATED_ALIAS_RESOLUTION_REMOVED: ToolsVersion = ToolsVersion::new(5, 4);
    /// Unsafe-flag leakage through product usage stops being a hard error.
    pub const UNSAFE_FLAGS_LEAKAGE_DISABLED: ToolsVersion = ToolsVersion::new(6, 2);

    /// Constructs a tools-version from a `major.minor` pair.
    pub const fn new(major: u32, minor: u32) -> Self {
        ToolsVersion { major, minor }
    }

    /// The major component.
    pub fn major(&self) -> u32 {
        self.major
    }

    /// The minor component.
    pub fn minor(&self) -> u32 {
        self.minor
    }
}

impl PartialOrd for ToolsVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ToolsVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor).cmp(&(other.major, other.minor))
    }
}

impl fmt::Display for ToolsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_major_then_minor() {
        assert!(ToolsVersion::new(5, 10) < ToolsVersion::new(6, 0));
        assert!(ToolsVersion::new(6, 0) < ToolsVersion::new(6, 2));
    }

    #[test]
    fn thresholds_are_well_ordered() {
        assert!(ToolsVersion::EXPLICIT_PRODUCT_DECLARATION_REQUIRED < ToolsVersion::DEPRECATED_ALIAS_RESOLUTION_REMOVED);
        assert!(ToolsVersion::DEPRECATED_ALIAS_RESOLUTION_REMOVED < ToolsVersion::PACKAGE_CYCLES_ALLOWED);
        assert!(ToolsVersion::PACKAGE_CYCLES_ALLOWED < ToolsVersion::UNSAFE_FLAGS_LEAKAGE_DISABLED);
    }
}
