//! HTTP gateway for apirec.
//!
//! Serves recommendations over HTTP with axum:
//! - `POST /recommend` returns recommendations and the joined explanation
//! - `POST /recommend/stream` streams the explanation as server-sent events
//! - `GET /health` reports index reachability

pub mod error;
pub mod routes;
pub mod server;
pub mod state;

#[cfg(test)]
mod test_support;

pub use error::{ServerError, ServerResult};
pub use server::{router, Gateway};
pub use state::AppState;
