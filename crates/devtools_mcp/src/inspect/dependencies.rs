//! Dependency Lister

use std::sync::Arc;

use serde::Serialize;

use devtools_types::{DependencyDescriptor, LibraryManifest, ManifestSource};

/// One element of a dependency listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DependencyEntry {
    Dependency(DependencyDescriptor),
    Error { error: String },
}

/// Lists dependencies from the host's loaded library manifests
#[derive(Clone)]
pub struct DependencyLister {
    source: Arc<dyn ManifestSource>,
}

impl DependencyLister {
    pub fn new(source: Arc<dyn ManifestSource>) -> Self {
        Self { source }
    }

    /// Enumerate dependencies now
    ///
    /// Never fails: if the host cannot enumerate its manifests the result is a
    /// single entry carrying an `error` field.
    pub fn list_dependencies(&self) -> Vec<DependencyEntry> {
        match self.source.manifests() {
            Ok(manifests) => manifests
                .iter()
                .filter_map(describe_manifest)
                .map(DependencyEntry::Dependency)
                .collect(),
            Err(e) => {
                tracing::warn!("Failed to enumerate library manifests: {}", e);
                vec![DependencyEntry::Error {
                    error: format!("Failed to retrieve dependency information: {}", e),
                }]
            }
        }
    }
}

/// Turn a manifest into a descriptor
///
/// Skipped unless a complete specification or implementation pair is present.
/// Implementation metadata wins over specification metadata.
pub fn describe_manifest(manifest: &LibraryManifest) -> Option<DependencyDescriptor> {
    if !manifest.has_specification() && !manifest.has_implementation() {
        return None;
    }

    let name = manifest
        .implementation_title
        .as_ref()
        .or(manifest.specification_title.as_ref())
        .unwrap_or(&manifest.package);
    let version = manifest
        .implementation_version
        .as_deref()
        .or(manifest.specification_version.as_deref())
        .unwrap_or("unknown");

    Some(DependencyDescriptor {
        name: name.clone(),
        version: version.to_string(),
        package: manifest.package.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use devtools_host::{CargoLockManifests, StaticManifests};
    use devtools_types::{HostError, HostResult};

    struct FailingSource;

    impl ManifestSource for FailingSource {
        fn manifests(&self) -> HostResult<Vec<LibraryManifest>> {
            Err(HostError::Enumeration("class loader closed".into()))
        }
    }

    #[test]
    fn test_implementation_preferred() {
        let manifest = LibraryManifest::new("org.example.core")
            .with_specification("Example API", "2.0")
            .with_implementation("example-core", "2.0.3");

        assert_eq!(
            describe_manifest(&manifest),
            Some(DependencyDescriptor {
                name: "example-core".into(),
                version: "2.0.3".into(),
                package: "org.example.core".into(),
            })
        );
    }

    #[test]
    fn test_specification_fallback() {
        let manifest = LibraryManifest::new("org.example.api").with_specification("Example API", "2.0");
        let desc = describe_manifest(&manifest).unwrap();
        assert_eq!(desc.name, "Example API");
        assert_eq!(desc.version, "2.0");
    }

    #[test]
    fn test_mixed_halves_fall_back_per_field() {
        // Complete specification pair plus a dangling implementation title
        let mut manifest = LibraryManifest::new("org.example.mixed").with_specification("Spec", "1.1");
        manifest.implementation_title = Some("impl".into());

        let desc = describe_manifest(&manifest).unwrap();
        assert_eq!(desc.name, "impl");
        assert_eq!(desc.version, "1.1");
    }

    #[test]
    fn test_incomplete_manifests_skipped() {
        let mut title_only = LibraryManifest::new("org.example.partial");
        title_only.implementation_title = Some("partial".into());
        title_only.specification_version = Some("1.0".into());

        assert_eq!(describe_manifest(&title_only), None);
        assert_eq!(describe_manifest(&LibraryManifest::new("bare")), None);
    }

    #[test]
    fn test_list_from_static_source() {
        let lister = DependencyLister::new(Arc::new(StaticManifests::new(vec![
            LibraryManifest::new("bare"),
            LibraryManifest::new("serde@1.0.210").with_implementation("serde", "1.0.210"),
        ])));

        let json = serde_json::to_value(lister.list_dependencies()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"name": "serde", "version": "1.0.210", "package": "serde@1.0.210"}
            ])
        );
    }

    #[test]
    fn test_enumeration_failure_is_single_error_entry() {
        let lister = DependencyLister::new(Arc::new(FailingSource));
        let entries = lister.list_dependencies();

        assert_eq!(entries.len(), 1);
        let json = serde_json::to_value(&entries[0]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "error": "Failed to retrieve dependency information: Enumeration failed: class loader closed"
            })
        );
    }

    #[test]
    fn test_missing_lockfile_is_error_entry() {
        let dir = tempfile::tempdir().unwrap();
        let lister = DependencyLister::new(Arc::new(CargoLockManifests::new(
            dir.path().join("Cargo.lock"),
        )));

        let entries = lister.list_dependencies();
        assert_eq!(entries.len(), 1);
        assert!(matches!(&entries[0], DependencyEntry::Error { error } if error.starts_with("Failed to retrieve dependency information")));
    }
}
