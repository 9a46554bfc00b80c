//! Devtools Host - Reference host collaborators
//!
//! Concrete implementations of the `devtools_types` host traits:
//! - [`Container`]: in-memory object registry with singleton/prototype scopes
//! - [`HostEnvironment`]: figment-backed properties and active profiles
//! - [`ProcRuntimeProbe`]: runtime counters read from `/proc`
//! - [`CargoLockManifests`] / [`StaticManifests`]: dependency manifests

mod container;
mod environment;
mod manifest;
mod probe;

pub use container::*;
pub use environment::*;
pub use manifest::*;
pub use probe::*;
