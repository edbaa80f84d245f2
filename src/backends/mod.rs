//! Backend module
//!
//! Defines the Backend trait, the adapters for each archive service and the
//! registry/availability snapshot built from configuration at startup.

mod adql;
mod availability;
mod loader;
mod obscore;
mod registry;
mod spectral;
mod traits;

pub mod columns;

// Backend implementations
pub mod alminer;
pub mod reference;
pub mod simbad;
pub mod tap;

pub use alminer::Alminer;
pub use availability::{Availability, AvailabilityBuilder, BackendStatus};
pub use loader::{BackendLoader, LoadedBackends};
pub use obscore::ArchiveOptions;
pub use reference::Reference;
pub use registry::BackendRegistry;
pub use simbad::Simbad;
pub use tap::Tap;
pub use traits::*;
