//! ALMA-Archive-RS: ALMA archive query tools for agents
//!
//! Accepts search intents, dispatches each to the archive backends that can
//! serve it (ALMA TAP/ObsCore, SIMBAD, built-in reference data) with ordered
//! fallback, and returns every result in one uniform envelope.

pub mod backends;
pub mod config;
pub mod dispatch;
pub mod intents;
pub mod network;
pub mod results;
pub mod web;

pub use config::Settings;
pub use dispatch::{DispatchError, Dispatcher};
pub use intents::{Intent, IntentKind};
pub use results::{ResultEnvelope, ResultSet};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default timeout for backend calls in seconds
pub const DEFAULT_TIMEOUT: u64 = 30;

/// ALMA science archive TAP service
pub const ALMA_TAP_URL: &str = "https://almascience.nrao.edu/tap";

/// SIMBAD TAP service
pub const SIMBAD_TAP_URL: &str = "https://simbad.cds.unistra.fr/simbad/sim-tap";
