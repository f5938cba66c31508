// Copyright (c) The pkggraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Platform declaration, the default-minima table, and platform derivation (component C9).

use once_cell::sync::Lazy;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A platform a package can declare a deployment minimum for.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum PlatformName {
    MacOs,
    MacCatalyst,
    Ios,
    TvOs,
    WatchOs,
    Linux,
    Windows,
    Android,
    Wasi,
    OpenBsd,
}

impl PlatformName {
    /// All platforms the deriver knows about, in a fixed, stable order.
    pub const ALL: &'static [PlatformName] = &[
        PlatformName::MacOs,
        PlatformName::MacCatalyst,
        PlatformName::Ios,
        PlatformName::TvOs,
        PlatformName::WatchOs,
        PlatformName::Linux,
        PlatformName::Windows,
        PlatformName::Android,
        PlatformName::Wasi,
        PlatformName::OpenBsd,
    ];

    /// Whether this is one of the Apple platforms that has a separately-floored test minimum.
    fn has_test_floor(self) -> bool {
        matches!(
            self,
            PlatformName::MacOs | PlatformName::Ios | PlatformName::TvOs | PlatformName::WatchOs
        )
    }

    fn as_str(self) -> &'static str {
        match self {
            PlatformName::MacOs => "macos",
            PlatformName::MacCatalyst => "maccatalyst",
            PlatformName::Ios => "ios",
            PlatformName::TvOs => "tvos",
            PlatformName::WatchOs => "watchos",
            PlatformName::Linux => "linux",
            PlatformName::Windows => "windows",
            PlatformName::Android => "android",
            PlatformName::Wasi => "wasi",
            PlatformName::OpenBsd => "openbsd",
        }
    }
}

impl fmt::Display for PlatformName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PlatformName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        for p in PlatformName::ALL {
            if p.as_str().eq_ignore_ascii_case(s) {
                return Ok(*p);
            }
        }
        Err(format!("unknown platform '{}'", s))
    }
}

/// A platform's deployment minimum version: `major.minor[.patch]`, compared numerically
/// component-wise (this is deliberately simpler than [`versionset::SemanticVersion`] — platform
/// minima have no pre-release concept).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct PlatformVersion {
    major: u32,
    minor: u32,
    patch: u32,
}

impl PlatformVersion {
    /// Constructs a version from its components.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        PlatformVersion { major, minor, patch }
    }
}

impl Ord for PlatformVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch))
    }
}

impl PartialOrd for PlatformVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PlatformVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.patch == 0 {
            write!(f, "{}.{}", self.major, self.minor)
        } else {
            write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
        }
    }
}

impl FromStr for PlatformVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('.');
        let mut next = || -> Result<u32, String> {
            parts
                .next()
                .ok_or_else(|| format!("platform version '{}' is missing a component", s))?
                .parse()
                .map_err(|_| format!("platform version '{}' has a non-numeric component", s))
        };
        let major = next()?;
        let minor = next().unwrap_or(0);
        let patch = next().unwrap_or(0);
        Ok(PlatformVersion { major, minor, patch })
    }
}

/// A platform minimum as declared in a manifest, or as produced by derivation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlatformSpec {
    pub name: PlatformName,
    pub version: PlatformVersion,
    pub options: Vec<String>,
}

/// The deployment-target minima and per-platform options for a module or product: the subset
/// the manifest actually wrote (`declared`) and the complete table after defaults/MacCatalyst
/// derivation (`derived`).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PlatformTable {
    declared: BTreeMap<PlatformName, PlatformSpec>,
    derived: BTreeMap<PlatformName, PlatformSpec>,
}

impl PlatformTable {
    /// Builds a table from the manifest's declared platforms alone; call
    /// [`derive`](Self::derive) to fill in the derived half.
    pub fn from_declared(declared: impl IntoIterator<Item = PlatformSpec>) -> Self {
        let declared = declared.into_iter().map(|p| (p.name, p)).collect();
        PlatformTable {
            declared,
            derived: BTreeMap::new(),
        }
    }

    /// The platforms the manifest explicitly wrote.
    pub fn declared(&self) -> impl Iterator<Item = &PlatformSpec> {
        self.declared.values()
    }

    /// The complete, post-derivation platform table.
    pub fn derived(&self) -> impl Iterator<Item = &PlatformSpec> {
        self.derived.values()
    }

    /// The derived minimum version for a given platform, if any.
    pub fn derived_version(&self, name: PlatformName) -> Option<PlatformVersion> {
        self.derived.get(&name).map(|p| p.version)
    }

    /// Runs the full derivation algorithm (spec §4.6, steps 1-5):
    ///
    /// 1. Start from `declared`.
    /// 2. Merge with `defaults`, keeping the higher version for each platform key (options
    ///    follow whichever entry's version won; a tie keeps the declared entry's options).
    /// 3. If `is_test_target`, raise the Apple test-floor platforms to `max(value, test_floor)`.
    /// 4. Derive MacCatalyst from iOS if not explicitly declared.
    /// 5. Store the result as `derived`, leaving `declared` untouched.
    pub fn derive(&mut self, defaults: &PlatformDefaults, is_test_target: bool) {
        let mut derived: BTreeMap<PlatformName, PlatformSpec> = BTreeMap::new();

        for name in PlatformName::ALL {
            let declared_entry = self.declared.get(name);
            let default_entry = defaults.get(*name);
            let merged = match (declared_entry, default_entry) {
                (Some(d), Some(def)) if d.version >= def.version => d.clone(),
                (Some(_), Some(def)) => def.clone(),
                (Some(d), None) => d.clone(),
                (None, Some(def)) => def.clone(),
                (None, None) => continue,
            };
            derived.insert(*name, merged);
        }

        if is_test_target {
            for name in PlatformName::ALL {
                if !name.has_test_floor() {
                    continue;
                }
                if let Some(floor) = defaults.test_floor(*name) {
                    let entry = derived.entry(*name).or_insert_with(|| PlatformSpec {
                        name: *name,
                        version: floor,
                        options: Vec::new(),
                    });
                    if entry.version < floor {
                        entry.version = floor;
                    }
                }
            }
        }

        if !self.declared.contains_key(&PlatformName::MacCatalyst) {
            if let Some(ios) = derived.get(&PlatformName::Ios).cloned() {
                derived.insert(
                    PlatformName::MacCatalyst,
                    PlatformSpec {
                        name: PlatformName::MacCatalyst,
                        version: ios.version,
                        options: ios.options,
                    },
                );
            }
        }

        self.derived = derived;
    }
}

/// The static table of default platform minima, plus the separate, higher Apple test-target
/// floors.
#[derive(Clone, Debug)]
pub struct PlatformDefaults {
    defaults: BTreeMap<PlatformName, PlatformVersion>,
    test_floors: BTreeMap<PlatformName, PlatformVersion>,
}

impl PlatformDefaults {
    /// The table shipped by this crate, matching common source-based package manager defaults.
    pub fn standard() -> Self {
        let mut defaults = BTreeMap::new();
        defaults.insert(PlatformName::MacOs, PlatformVersion::new(10, 13, 0));
        defaults.insert(PlatformName::Ios, PlatformVersion::new(11, 0, 0));
        defaults.insert(PlatformName::TvOs, PlatformVersion::new(11, 0, 0));
        defaults.insert(PlatformName::WatchOs, PlatformVersion::new(4, 0, 0));
        defaults.insert(PlatformName::Linux, PlatformVersion::new(0, 0, 0));
        defaults.insert(PlatformName::Windows, PlatformVersion::new(0, 0, 0));
        defaults.insert(PlatformName::Android, PlatformVersion::new(0, 0, 0));
        defaults.insert(PlatformName::Wasi, PlatformVersion::new(0, 0, 0));
        defaults.insert(PlatformName::OpenBsd, PlatformVersion::new(0, 0, 0));

        let mut test_floors = BTreeMap::new();
        test_floors.insert(PlatformName::MacOs, PlatformVersion::new(10, 15, 0));
        test_floors.insert(PlatformName::Ios, PlatformVersion::new(11, 0, 0));
        test_floors.insert(PlatformName::TvOs, PlatformVersion::new(11, 0, 0));
        test_floors.insert(PlatformName::WatchOs, PlatformVersion::new(4, 0, 0));

        PlatformDefaults { defaults, test_floors }
    }

    fn get(&self, name: PlatformName) -> Option<PlatformSpec> {
        self.defaults.get(&name).map(|version| PlatformSpec {
            name,
            version: *version,
            options: Vec::new(),
        })
    }

    fn test_floor(&self, name: PlatformName) -> Option<PlatformVersion> {
        self.test_floors.get(&name).copied()
    }
}

static STANDARD_PLATFORM_DEFAULTS: Lazy<PlatformDefaults> = Lazy::new(PlatformDefaults::standard);

impl PlatformDefaults {
    /// The shared, lazily-built [`standard`](Self::standard) table. Every assembly over the same
    /// process shares one table rather than rebuilding the `BTreeMap`s per call.
    pub fn shared() -> &'static PlatformDefaults {
        &STANDARD_PLATFORM_DEFAULTS
    }
}
