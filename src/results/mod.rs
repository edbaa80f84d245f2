//! Result types and the uniform response envelope
//!
//! Backends return [`ResultSet`]s; the dispatcher normalizes the winning one
//! into a [`ResultEnvelope`].

mod envelope;
mod normalize;
mod types;

pub use envelope::ResultEnvelope;
pub use normalize::{normalize, scalar};
pub use types::*;
