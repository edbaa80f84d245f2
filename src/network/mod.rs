//! Network module for outgoing HTTP requests
//!
//! Provides the shared HTTP client and the TAP query client built on it.

mod client;
mod tap;

pub use client::{HttpClient, HttpResponse};
pub use tap::{parse_tsv, TapError, TapService};
