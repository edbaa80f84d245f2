//! Query dispatch
//!
//! Validates intents, tries candidate backends strictly in order and turns
//! the first success into a result envelope, or reports every failure.

mod batch;
mod candidates;
mod dispatcher;
mod error;

pub use batch::{BatchReport, SourceOutcome, SourceResult};
pub use candidates::candidates;
pub use dispatcher::{DispatchOutput, Dispatcher};
pub use error::{DispatchError, ErrorRecord, ErrorReport, FailureKind, SkipNote};
