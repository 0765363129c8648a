//! HTTP and WebSocket front end for the token aggregator
//!
//! Serves the token listing, single-token lookup and health endpoints, and
//! pushes refresh-loop updates to WebSocket subscribers.

pub mod settings;
pub mod state;
pub mod conversions;
pub mod routes;
pub mod ws;
pub mod server;

pub use conversions::{PushMessage, TokenSnapshot};
pub use routes::router;
pub use server::{ApiServer, ApiServerBuilder};
pub use state::AppState;
