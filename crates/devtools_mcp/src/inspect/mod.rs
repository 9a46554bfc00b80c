//! Host Introspection
//!
//! Point-in-time readers over the host handles. Nothing is cached; every call
//! reads the host again.

mod dependencies;
mod health;
mod objects;
mod profiles;

pub use dependencies::*;
pub use health::*;
pub use objects::*;
pub use profiles::*;

use devtools_types::HostContext;

/// All readers over one host
#[derive(Clone)]
pub struct Introspector {
    pub objects: ObjectReader,
    pub health: HealthSampler,
    pub dependencies: DependencyLister,
    pub profiles: ProfileReader,
}

impl Introspector {
    pub fn new(host: &HostContext) -> Self {
        Self {
            objects: ObjectReader::new(host.registry.clone()),
            health: HealthSampler::new(host.probe.clone()),
            dependencies: DependencyLister::new(host.manifests.clone()),
            profiles: ProfileReader::new(host.environment.clone()),
        }
    }
}
