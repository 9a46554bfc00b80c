//! Library Manifest Sources

use std::path::{Path, PathBuf};

use serde::Deserialize;

use devtools_types::{HostError, HostResult, LibraryManifest, ManifestSource};

// ─────────────────────────────────────────────────────────────────────────────
// Cargo.lock
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Lockfile {
    #[serde(default)]
    package: Vec<LockedPackage>,
}

#[derive(Debug, Deserialize)]
struct LockedPackage {
    name: String,
    version: String,
    source: Option<String>,
}

impl LockedPackage {
    /// Cargo package id spec: `<source>#<name>@<version>`, or `<name>@<version>` for path crates
    fn package_id(&self) -> String {
        match &self.source {
            Some(source) => format!("{}#{}@{}", source, self.name, self.version),
            None => format!("{}@{}", self.name, self.version),
        }
    }
}

impl From<LockedPackage> for LibraryManifest {
    fn from(package: LockedPackage) -> Self {
        LibraryManifest::new(package.package_id())
            .with_implementation(package.name, package.version)
    }
}

/// Manifests read from a `Cargo.lock` file
///
/// The file is re-read on every call so the listing reflects the lockfile as
/// it is now.
#[derive(Debug, Clone)]
pub struct CargoLockManifests {
    path: PathBuf,
}

impl CargoLockManifests {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse lockfile contents
    pub fn parse(contents: &str) -> HostResult<Vec<LibraryManifest>> {
        let lockfile: Lockfile =
            toml::from_str(contents).map_err(|e| HostError::Parse(e.to_string()))?;
        Ok(lockfile.package.into_iter().map(LibraryManifest::from).collect())
    }
}

impl ManifestSource for CargoLockManifests {
    fn manifests(&self) -> HostResult<Vec<LibraryManifest>> {
        let contents = std::fs::read_to_string(&self.path)?;
        Self::parse(&contents)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Static
// ─────────────────────────────────────────────────────────────────────────────

/// A fixed list of manifests supplied by the host
#[derive(Debug, Clone, Default)]
pub struct StaticManifests {
    manifests: Vec<LibraryManifest>,
}

impl StaticManifests {
    pub fn new(manifests: Vec<LibraryManifest>) -> Self {
        Self { manifests }
    }
}

impl ManifestSource for StaticManifests {
    fn manifests(&self) -> HostResult<Vec<LibraryManifest>> {
        Ok(self.manifests.clone())
    }
}
