// Copyright (c) The pkggraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The condition engine (component C10): evaluating a dependency `condition` against a build
//! environment.

use crate::platform::PlatformName;
use std::collections::BTreeSet;

/// The build configuration a dependency condition can gate on.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Configuration {
    Debug,
    Release,
}

/// A predicate attached to a target dependency: `{platforms?, configuration?, traits?}`.
///
/// An empty `platforms`/`traits` set means "unconstrained on this axis", matching spec §4.6:
/// "platforms is empty or contains platform ... traits is empty or is a subset of
/// enabledTraits".
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Condition {
    pub platforms: BTreeSet<PlatformName>,
    pub configuration: Option<Configuration>,
    pub traits: BTreeSet<String>,
}

impl Condition {
    /// No condition at all: always satisfied.
    pub fn always() -> Self {
        Condition::default()
    }

    /// Evaluates this condition against a concrete build environment.
    pub fn is_satisfied(&self, env: &BuildEnvironment) -> bool {
        let platform_ok = self.platforms.is_empty() || self.platforms.contains(&env.platform);
        let configuration_ok = match self.configuration {
            None => true,
            Some(c) => c == env.configuration,
        };
        let traits_ok = self.traits.is_subset(&env.enabled_traits);
        platform_ok && configuration_ok && traits_ok
    }
}

/// The concrete environment a condition is evaluated against.
#[derive(Clone, Debug)]
pub struct BuildEnvironment {
    pub platform: PlatformName,
    pub configuration: Configuration,
    pub is_host: bool,
    pub enabled_traits: BTreeSet<String>,
}

impl BuildEnvironment {
    /// An environment with no traits enabled, for platform/configuration-only checks.
    pub fn new(platform: PlatformName, configuration: Configuration) -> Self {
        BuildEnvironment {
            platform,
            configuration,
            is_host: false,
            enabled_traits: BTreeSet::new(),
        }
    }

    /// Returns a copy of this environment with the given traits enabled.
    pub fn with_traits(mut self, traits: impl IntoIterator<Item = String>) -> Self {
        self.enabled_traits = traits.into_iter().collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_condition_always_satisfied() {
        let env = BuildEnvironment::new(PlatformName::Linux, Configuration::Debug);
        assert!(Condition::always().is_satisfied(&env));
    }

    #[test]
    fn platform_gate_excludes_other_platforms() {
        let mut cond = Condition::always();
        cond.platforms.insert(PlatformName::MacOs);
        let linux_env = BuildEnvironment::new(PlatformName::Linux, Configuration::Debug);
        let macos_env = BuildEnvironment::new(PlatformName::MacOs, Configuration::Debug);
        assert!(!cond.is_satisfied(&linux_env));
        assert!(cond.is_satisfied(&macos_env));
    }

    #[test]
    fn traits_must_be_subset_of_enabled() {
        let mut cond = Condition::always();
        cond.traits.insert("fancy".to_string());
        let without = BuildEnvironment::new(PlatformName::Linux, Configuration::Debug);
        let with = without.clone().with_traits(["fancy".to_string()]);
        assert!(!cond.is_satisfied(&without));
        assert!(cond.is_satisfied(&with));
    }
}
