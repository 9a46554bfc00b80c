//! Host collaborator traits
//!
//! A host process hands the devtools server read-only handles implementing
//! these traits. The server never reaches for global state; everything it can
//! see comes through a [`HostContext`].

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::{LibraryManifest, RuntimeCounters, TypeDescriptor};

// ─────────────────────────────────────────────────────────────────────────────
// Host Error
// ─────────────────────────────────────────────────────────────────────────────

/// Errors reported by host collaborators
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("No object named '{0}' is registered")]
    ObjectNotFound(String),

    #[error("{message}")]
    Instantiation { name: String, message: String },

    #[error("Enumeration failed: {0}")]
    Enumeration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl HostError {
    /// Create an instantiation error for a named object
    pub fn instantiation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Instantiation {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Result type for host collaborator calls
pub type HostResult<T> = Result<T, HostError>;

// ─────────────────────────────────────────────────────────────────────────────
// Object Registry
// ─────────────────────────────────────────────────────────────────────────────

/// A live object fetched from the host registry together with its type
#[derive(Clone)]
pub struct ObjectHandle {
    pub instance: Arc<dyn Any + Send + Sync>,
    pub type_descriptor: Arc<TypeDescriptor>,
}

impl ObjectHandle {
    pub fn new(instance: Arc<dyn Any + Send + Sync>, type_descriptor: Arc<TypeDescriptor>) -> Self {
        Self {
            instance,
            type_descriptor,
        }
    }

    /// Downcast the instance to a concrete type
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.instance).downcast::<T>().ok()
    }
}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectHandle")
            .field("type", &self.type_descriptor.name)
            .finish_non_exhaustive()
    }
}

/// Read access to the host's dependency-injection registry
///
/// `get_object` may instantiate a lazily-created singleton or build a fresh
/// prototype instance; callers must not assume it is side-effect free.
pub trait ObjectRegistry: Send + Sync {
    /// Names of every registered object, in registration order
    fn object_names(&self) -> Vec<String>;

    /// Whether an object with this name is registered
    fn contains_object(&self, name: &str) -> bool;

    /// Fetch (and if needed create) the object registered under `name`
    fn get_object(&self, name: &str) -> HostResult<ObjectHandle>;

    /// Whether the object is singleton-scoped
    fn is_singleton(&self, name: &str) -> HostResult<bool>;

    /// Whether the object is prototype-scoped
    fn is_prototype(&self, name: &str) -> HostResult<bool>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Environment
// ─────────────────────────────────────────────────────────────────────────────

/// Read access to the host's configuration environment
pub trait Environment: Send + Sync {
    /// Active profiles in declaration order, duplicates included
    fn active_profiles(&self) -> Vec<String>;

    /// Look up a property by its dotted key
    fn property(&self, key: &str) -> Option<String>;

    /// Look up a property, falling back to `default`
    fn property_or(&self, key: &str, default: &str) -> String {
        self.property(key).unwrap_or_else(|| default.to_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Runtime Probe & Manifests
// ─────────────────────────────────────────────────────────────────────────────

/// Source of process-level runtime counters
pub trait RuntimeProbe: Send + Sync {
    /// Read all counters now. Counter reads cannot fail.
    fn counters(&self) -> RuntimeCounters;
}

/// Enumerates manifests of the libraries loaded into the process
pub trait ManifestSource: Send + Sync {
    fn manifests(&self) -> HostResult<Vec<LibraryManifest>>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Host Context
// ─────────────────────────────────────────────────────────────────────────────

/// Bundle of host handles given to the devtools server at startup
#[derive(Clone)]
pub struct HostContext {
    pub registry: Arc<dyn ObjectRegistry>,
    pub environment: Arc<dyn Environment>,
    pub probe: Arc<dyn RuntimeProbe>,
    pub manifests: Arc<dyn ManifestSource>,
}

impl HostContext {
    pub fn new(
        registry: Arc<dyn ObjectRegistry>,
        environment: Arc<dyn Environment>,
        probe: Arc<dyn RuntimeProbe>,
        manifests: Arc<dyn ManifestSource>,
    ) -> Self {
        Self {
            registry,
            environment,
            probe,
            manifests,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MapEnvironment(Vec<(&'static str, &'static str)>);

    impl Environment for MapEnvironment {
        fn active_profiles(&self) -> Vec<String> {
            Vec::new()
        }

        fn property(&self, key: &str) -> Option<String> {
            self.0
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_property_or_default() {
        let env = MapEnvironment(vec![("devtools.mcp.port", "8080")]);
        assert_eq!(env.property_or("devtools.mcp.port", "9999"), "8080");
        assert_eq!(env.property_or("devtools.mcp.host", "0.0.0.0"), "0.0.0.0");
    }

    #[test]
    fn test_handle_downcast() {
        let handle = ObjectHandle::new(
            Arc::new(42u32),
            Arc::new(TypeDescriptor::of::<u32>()),
        );
        assert_eq!(handle.downcast::<u32>().as_deref(), Some(&42));
        assert!(handle.downcast::<String>().is_none());
    }

    #[test]
    fn test_instantiation_error_message() {
        let err = HostError::instantiation("clock", "no time source");
        assert_eq!(err.to_string(), "no time source");
    }
}
