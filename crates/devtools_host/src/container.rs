//! In-memory Object Container
//!
//! A small dependency-injection registry. Objects are registered under unique
//! names with a factory and a scope:
//! - singleton: created on first retrieval, then shared
//! - prototype: created anew on every retrieval

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use devtools_types::{HostError, HostResult, ObjectHandle, ObjectRegistry, TypeDescriptor};

type Instance = Arc<dyn Any + Send + Sync>;
type Factory = Box<dyn Fn() -> Result<Instance, String> + Send + Sync>;

// ─────────────────────────────────────────────────────────────────────────────
// Scope
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle scope of a registered object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Singleton,
    Prototype,
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Singleton => write!(f, "singleton"),
            Scope::Prototype => write!(f, "prototype"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Container Error
// ─────────────────────────────────────────────────────────────────────────────

/// Errors raised while registering objects
#[derive(Debug, Clone, thiserror::Error)]
pub enum ContainerError {
    #[error("Object already registered: {0}")]
    AlreadyRegistered(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Definitions
// ─────────────────────────────────────────────────────────────────────────────

struct Definition {
    scope: Scope,
    type_descriptor: Arc<TypeDescriptor>,
    factory: Factory,
    /// Cached singleton instance (always `None` for prototypes)
    instance: Mutex<Option<Instance>>,
}

impl Definition {
    fn resolve(&self, name: &str) -> HostResult<Instance> {
        match self.scope {
            Scope::Prototype => (self.factory)().map_err(|e| HostError::instantiation(name, e)),
            Scope::Singleton => {
                // Lock is held across the factory call so only one instance is ever built
                let mut slot = self.instance.lock();
                if let Some(instance) = slot.as_ref() {
                    return Ok(Arc::clone(instance));
                }
                let instance = (self.factory)().map_err(|e| HostError::instantiation(name, e))?;
                tracing::debug!("Instantiated singleton: {}", name);
                *slot = Some(Arc::clone(&instance));
                Ok(instance)
            }
        }
    }
}

#[derive(Default)]
struct Definitions {
    order: Vec<String>,
    by_name: HashMap<String, Arc<Definition>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Container
// ─────────────────────────────────────────────────────────────────────────────

/// Thread-safe object container
///
/// # Example
///
/// ```rust,ignore
/// let container = Container::new();
/// container.register_singleton(
///     "clock",
///     TypeDescriptor::named("com.example.UtcClock"),
///     || Ok(UtcClock::default()),
/// )?;
///
/// let clock = container.get_object("clock")?.downcast::<UtcClock>();
/// ```
#[derive(Default)]
pub struct Container {
    definitions: RwLock<Definitions>,
}

impl Container {
    /// Create an empty container
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty container wrapped in an Arc
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a lazily-created singleton
    pub fn register_singleton<T, F>(
        &self,
        name: impl Into<String>,
        type_descriptor: TypeDescriptor,
        factory: F,
    ) -> Result<(), ContainerError>
    where
        T: Any + Send + Sync,
        F: Fn() -> Result<T, String> + Send + Sync + 'static,
    {
        self.register(name.into(), Scope::Singleton, type_descriptor, erase(factory), None)
    }

    /// Register a prototype; every retrieval calls the factory
    pub fn register_prototype<T, F>(
        &self,
        name: impl Into<String>,
        type_descriptor: TypeDescriptor,
        factory: F,
    ) -> Result<(), ContainerError>
    where
        T: Any + Send + Sync,
        F: Fn() -> Result<T, String> + Send + Sync + 'static,
    {
        self.register(name.into(), Scope::Prototype, type_descriptor, erase(factory), None)
    }

    /// Register an already-built singleton instance
    pub fn register_instance<T>(
        &self,
        name: impl Into<String>,
        type_descriptor: TypeDescriptor,
        instance: T,
    ) -> Result<(), ContainerError>
    where
        T: Any + Send + Sync,
    {
        let instance: Instance = Arc::new(instance);
        let name = name.into();
        let message = format!("instance '{}' was registered pre-built", name);
        self.register(
            name,
            Scope::Singleton,
            type_descriptor,
            Box::new(move || -> Result<Instance, String> { Err(message.clone()) }),
            Some(instance),
        )
    }

    fn register(
        &self,
        name: String,
        scope: Scope,
        type_descriptor: TypeDescriptor,
        factory: Factory,
        instance: Option<Instance>,
    ) -> Result<(), ContainerError> {
        let mut definitions = self.definitions.write();

        if definitions.by_name.contains_key(&name) {
            return Err(ContainerError::AlreadyRegistered(name));
        }

        tracing::debug!("Registered {} object: {} ({})", scope, name, type_descriptor.name);

        definitions.by_name.insert(
            name.clone(),
            Arc::new(Definition {
                scope,
                type_descriptor: Arc::new(type_descriptor),
                factory,
                instance: Mutex::new(instance),
            }),
        );
        definitions.order.push(name);

        Ok(())
    }

    /// Scope of a registered object
    pub fn scope(&self, name: &str) -> Option<Scope> {
        self.definition(name).map(|d| d.scope)
    }

    /// Whether a singleton has already been instantiated
    ///
    /// Always `false` for prototypes and unknown names.
    pub fn is_instantiated(&self, name: &str) -> bool {
        self.definition(name)
            .map(|d| d.instance.lock().is_some())
            .unwrap_or(false)
    }

    /// Number of registered objects
    pub fn len(&self) -> usize {
        self.definitions.read().order.len()
    }

    /// Check if the container is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn definition(&self, name: &str) -> Option<Arc<Definition>> {
        self.definitions.read().by_name.get(name).cloned()
    }

    fn require(&self, name: &str) -> HostResult<Arc<Definition>> {
        self.definition(name)
            .ok_or_else(|| HostError::ObjectNotFound(name.to_string()))
    }
}

fn erase<T, F>(factory: F) -> Factory
where
    T: Any + Send + Sync,
    F: Fn() -> Result<T, String> + Send + Sync + 'static,
{
    Box::new(move || factory().map(|value| Arc::new(value) as Instance))
}

impl ObjectRegistry for Container {
    fn object_names(&self) -> Vec<String> {
        self.definitions.read().order.clone()
    }

    fn contains_object(&self, name: &str) -> bool {
        self.definitions.read().by_name.contains_key(name)
    }

    fn get_object(&self, name: &str) -> HostResult<ObjectHandle> {
        // Resolve outside the registry lock; factories may be slow
        let definition = self.require(name)?;
        let instance = definition.resolve(name)?;
        Ok(ObjectHandle::new(instance, Arc::clone(&definition.type_descriptor)))
    }

    fn is_singleton(&self, name: &str) -> HostResult<bool> {
        Ok(self.require(name)?.scope == Scope::Singleton)
    }

    fn is_prototype(&self, name: &str) -> HostResult<bool> {
        Ok(self.require(name)?.scope == Scope::Prototype)
    }
}
