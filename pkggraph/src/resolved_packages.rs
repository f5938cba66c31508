// Copyright (c) The pkggraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The resolved-packages file: persisted upstream by the (external) version resolver, read-only
//! to this core. Spec §6 puts exactly one consistency check here: duplicate pin entries, keyed by
//! normalized identity, are fatal to load.

use crate::errors::Error;
use crate::identity::{Identity, IdentityKind};
use camino::Utf8Path;
use std::collections::HashSet;
use std::fs;

/// One pinned dependency entry, as written by the upstream version resolver.
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct ResolvedPin {
    /// The declared package identity string (not yet normalized).
    pub package: String,
    #[serde(rename = "repositoryURL")]
    /// The URL the pin was fetched from.
    pub repository_url: String,
    /// The pinned revision/version state.
    pub state: PinState,
}

/// The `state` object of a single pin: either a tagged version or a branch, plus the revision.
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct PinState {
    /// The resolved source-control revision.
    pub revision: String,
    /// The resolved semantic version, if the pin was made against a version requirement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// The resolved branch name, if the pin was made against a branch requirement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

/// The `object` wrapper of a resolved-packages document.
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct ResolvedPackagesObject {
    /// The pinned dependencies, in file order.
    pub pins: Vec<ResolvedPin>,
}

/// A parsed resolved-packages file.
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct ResolvedPackagesFile {
    /// The file format version.
    pub version: u32,
    /// The pinned dependencies.
    pub object: ResolvedPackagesObject,
}

impl ResolvedPackagesFile {
    /// Loads and parses a resolved-packages file from `path`, checking for duplicated pin
    /// entries (keyed by normalized identity) along the way.
    ///
    /// Duplicate entries are fatal per spec §6: `"<path> file is corrupted or malformed; fix or
    /// delete the file to continue: duplicated entry for package \"<identity>\""`.
    pub fn load(path: &Utf8Path) -> Result<ResolvedPackagesFile, Error> {
        let contents = fs::read_to_string(path).map_err(Error::ResolvedPackagesIo)?;
        let file: ResolvedPackagesFile =
            serde_json::from_str(&contents).map_err(Error::ResolvedPackagesParse)?;

        let mut seen: HashSet<Identity> = HashSet::new();
        for pin in &file.object.pins {
            let identity = Identity::normalize(&pin.package, IdentityKind::RemoteSourceControl);
            if !seen.insert(identity.clone()) {
                return Err(Error::ResolvedPackagesDuplicateEntry {
                    path: path.to_string(),
                    identity: identity.as_str().to_string(),
                });
            }
        }

        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> camino::Utf8PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("pkggraph-resolved-{}.json", std::process::id()));
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        camino::Utf8PathBuf::from_path_buf(path).unwrap()
    }

    #[test]
    fn loads_well_formed_file() {
        let path = write_temp(
            r#"{
                "version": 1,
                "object": {
                    "pins": [
                        {"package": "Foo", "repositoryURL": "https://example.com/foo.git",
                         "state": {"revision": "abc123", "version": "1.0.0"}}
                    ]
                }
            }"#,
        );
        let file = ResolvedPackagesFile::load(&path).unwrap();
        assert_eq!(file.object.pins.len(), 1);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn rejects_duplicate_identity() {
        let path = write_temp(
            r#"{
                "version": 1,
                "object": {
                    "pins": [
                        {"package": "Foo", "repositoryURL": "https://a.example.com/foo.git",
                         "state": {"revision": "abc", "version": "1.0.0"}},
                        {"package": "foo", "repositoryURL": "https://b.example.com/foo.git",
                         "state": {"revision": "def", "branch": "main"}}
                    ]
                }
            }"#,
        );
        let err = ResolvedPackagesFile::load(&path).unwrap_err();
        assert!(matches!(err, Error::ResolvedPackagesDuplicateEntry { .. }));
        fs::remove_file(&path).ok();
    }
}
