//! Registry Snapshot Reader
//!
//! Reads the host object registry on every call. Fetching an object may make
//! the host instantiate a lazy singleton (or build a prototype), so reading is
//! not free of side effects even though nothing here mutates host state.

use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use devtools_types::{ObjectRegistry, RegisteredObjectDescriptor};

// ─────────────────────────────────────────────────────────────────────────────
// Listing
// ─────────────────────────────────────────────────────────────────────────────

/// Type of one listed object, or why it could not be read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectType {
    Resolved(String),
    Failed(String),
}

impl ObjectType {
    /// Wire form: the type name, or `Error loading bean: <message>`
    pub fn as_wire_string(&self) -> String {
        match self {
            ObjectType::Resolved(name) => name.clone(),
            ObjectType::Failed(message) => format!("Error loading bean: {}", message),
        }
    }
}

impl Serialize for ObjectType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_wire_string())
    }
}

/// Name → type mapping in registry order
///
/// Serializes as a JSON object whose values are strings; failed entries are
/// inlined as error strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectListing {
    entries: Vec<(String, ObjectType)>,
}

impl ObjectListing {
    pub fn get(&self, name: &str) -> Option<&ObjectType> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ObjectListing {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, object_type) in &self.entries {
            map.serialize_entry(name, object_type)?;
        }
        map.end()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Details
// ─────────────────────────────────────────────────────────────────────────────

/// Result of describing one object
///
/// Failures are data: clients check for the `error` field.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum ObjectDetails {
    Found(RegisteredObjectDescriptor),
    NotFound { error: String },
    Failed { error: String },
}

impl ObjectDetails {
    fn not_found(name: &str) -> Self {
        Self::NotFound {
            error: format!("Bean not found: {}", name),
        }
    }

    fn failed(message: impl std::fmt::Display) -> Self {
        Self::Failed {
            error: format!("Error loading bean: {}", message),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Reader
// ─────────────────────────────────────────────────────────────────────────────

/// Snapshot reader over a host object registry
#[derive(Clone)]
pub struct ObjectReader {
    registry: Arc<dyn ObjectRegistry>,
}

impl ObjectReader {
    pub fn new(registry: Arc<dyn ObjectRegistry>) -> Self {
        Self { registry }
    }

    /// List every registered object with its concrete type
    ///
    /// Objects that fail to materialize are reported inline; the listing
    /// itself always succeeds. May instantiate lazy singletons.
    pub fn list_objects(&self) -> ObjectListing {
        let entries = self
            .registry
            .object_names()
            .into_iter()
            .map(|name| {
                let object_type = match self.registry.get_object(&name) {
                    Ok(handle) => ObjectType::Resolved(handle.type_descriptor.name.clone()),
                    Err(e) => {
                        tracing::warn!("Failed to load object {}: {}", name, e);
                        ObjectType::Failed(e.to_string())
                    }
                };
                (name, object_type)
            })
            .collect();

        ObjectListing { entries }
    }

    /// Describe a single object by name
    ///
    /// May instantiate a lazy singleton.
    pub fn describe_object(&self, name: &str) -> ObjectDetails {
        if !self.registry.contains_object(name) {
            return ObjectDetails::not_found(name);
        }

        let described = self.registry.get_object(name).and_then(|handle| {
            let is_singleton = self.registry.is_singleton(name)?;
            let is_prototype = self.registry.is_prototype(name)?;
            Ok(RegisteredObjectDescriptor::new(
                name,
                &handle.type_descriptor,
                is_singleton,
                is_prototype,
            ))
        });

        match described {
            Ok(descriptor) => ObjectDetails::Found(descriptor),
            Err(e) => {
                tracing::warn!("Failed to describe object {}: {}", name, e);
                ObjectDetails::failed(e)
            }
        }
    }
}
