//! Object and dependency descriptors

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Type Descriptor
// ─────────────────────────────────────────────────────────────────────────────

/// Explicit description of a registered object's concrete type
///
/// Registrations carry one of these instead of relying on reflection. The
/// `name` is the fully-qualified type name reported to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Fully-qualified type name (e.g., "com.example.UtcClock", "my_app::clock::UtcClock")
    pub name: String,
    /// Interfaces (traits) the type declares, in declaration order
    #[serde(default)]
    pub interfaces: Vec<String>,
}

impl TypeDescriptor {
    /// Describe a type by an explicit fully-qualified name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            interfaces: Vec::new(),
        }
    }

    /// Describe a Rust type using its compiler-provided path
    pub fn of<T: ?Sized>() -> Self {
        Self::named(std::any::type_name::<T>())
    }

    /// Declare an implemented interface
    ///
    /// Duplicates are ignored so the interface list behaves like an ordered set.
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        let interface = interface.into();
        if !self.interfaces.contains(&interface) {
            self.interfaces.push(interface);
        }
        self
    }

    /// Last path segment of the type name, generic arguments kept
    ///
    /// Both `.` and `::` are treated as path separators, so
    /// `com.example.UtcClock` and `app::clock::UtcClock` both yield `UtcClock`.
    pub fn simple_name(&self) -> &str {
        let generics_at = self.name.find('<').unwrap_or(self.name.len());
        let base = &self.name[..generics_at];
        let start = base
            .rfind("::")
            .map(|i| i + 2)
            .into_iter()
            .chain(base.rfind('.').map(|i| i + 1))
            .max()
            .unwrap_or(0);
        &self.name[start..]
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Registered Object Descriptor
// ─────────────────────────────────────────────────────────────────────────────

/// Snapshot of a single registered object
///
/// Field names on the wire follow the devtools tool contract: `class` is the
/// fully-qualified type and `type` its simple name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredObjectDescriptor {
    pub name: String,
    #[serde(rename = "class")]
    pub concrete_type: String,
    #[serde(rename = "type")]
    pub simple_type: String,
    #[serde(rename = "interfaces")]
    pub declared_interfaces: Vec<String>,
    #[serde(rename = "singleton")]
    pub is_singleton: bool,
    #[serde(rename = "prototype")]
    pub is_prototype: bool,
}

impl RegisteredObjectDescriptor {
    /// Build a descriptor from a name, its type descriptor and its scope flags
    pub fn new(
        name: impl Into<String>,
        type_descriptor: &TypeDescriptor,
        is_singleton: bool,
        is_prototype: bool,
    ) -> Self {
        Self {
            name: name.into(),
            concrete_type: type_descriptor.name.clone(),
            simple_type: type_descriptor.simple_name().to_string(),
            declared_interfaces: type_descriptor.interfaces.clone(),
            is_singleton,
            is_prototype,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Library Manifests & Dependencies
// ─────────────────────────────────────────────────────────────────────────────

/// Metadata of one library loaded into the host process
///
/// Either title/version pair may be missing; hosts report whatever their
/// packaging metadata carries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryManifest {
    /// Raw package identifier (always present)
    pub package: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specification_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specification_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation_version: Option<String>,
}

impl LibraryManifest {
    /// Create a manifest with only a package identifier
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            ..Default::default()
        }
    }

    /// Set the specification title and version
    pub fn with_specification(mut self, title: impl Into<String>, version: impl Into<String>) -> Self {
        self.specification_title = Some(title.into());
        self.specification_version = Some(version.into());
        self
    }

    /// Set the implementation title and version
    pub fn with_implementation(mut self, title: impl Into<String>, version: impl Into<String>) -> Self {
        self.implementation_title = Some(title.into());
        self.implementation_version = Some(version.into());
        self
    }

    /// Whether the specification title and version are both present
    pub fn has_specification(&self) -> bool {
        self.specification_title.is_some() && self.specification_version.is_some()
    }

    /// Whether the implementation title and version are both present
    pub fn has_implementation(&self) -> bool {
        self.implementation_title.is_some() && self.implementation_version.is_some()
    }
}

/// A dependency as reported to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDescriptor {
    pub name: String,
    pub version: String,
    pub package: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct UtcClock;

    #[test]
    fn test_simple_name_dotted() {
        let desc = TypeDescriptor::named("com.example.UtcClock");
        assert_eq!(desc.simple_name(), "UtcClock");
    }

    #[test]
    fn test_simple_name_rust_path() {
        let desc = TypeDescriptor::of::<UtcClock>();
        assert!(desc.name.ends_with("::UtcClock"));
        assert_eq!(desc.simple_name(), "UtcClock");
    }

    #[test]
    fn test_simple_name_keeps_generics() {
        let desc = TypeDescriptor::named("alloc::vec::Vec<core::option::Option<u8>>");
        assert_eq!(desc.simple_name(), "Vec<core::option::Option<u8>>");

        let bare = TypeDescriptor::named("u64");
        assert_eq!(bare.simple_name(), "u64");
    }

    #[test]
    fn test_implements_is_ordered_set() {
        let desc = TypeDescriptor::named("com.example.UtcClock")
            .implements("java.time.InstantSource")
            .implements("com.example.Clock")
            .implements("java.time.InstantSource");
        assert_eq!(desc.interfaces, vec!["java.time.InstantSource", "com.example.Clock"]);
    }

    #[test]
    fn test_object_descriptor_wire_names() {
        let ty = TypeDescriptor::named("com.example.UtcClock").implements("com.example.Clock");
        let desc = RegisteredObjectDescriptor::new("clock", &ty, true, false);
        let json = serde_json::to_value(&desc).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "name": "clock",
                "class": "com.example.UtcClock",
                "type": "UtcClock",
                "interfaces": ["com.example.Clock"],
                "singleton": true,
                "prototype": false
            })
        );
    }

    #[test]
    fn test_manifest_pairs() {
        let spec_only = LibraryManifest::new("serde").with_specification("serde", "1.0");
        assert!(spec_only.has_specification());
        assert!(!spec_only.has_implementation());

        let mut half = LibraryManifest::new("half");
        half.implementation_title = Some("half".into());
        assert!(!half.has_implementation());
    }
}
