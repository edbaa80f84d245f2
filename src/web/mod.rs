//! Web server module
//!
//! Exposes every intent as a tool, over REST and over a JSON-RPC endpoint.

mod handlers;
mod mcp;
mod routes;
mod state;

pub use handlers::ApiError;
pub use routes::create_router;
pub use state::AppState;
