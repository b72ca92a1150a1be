//! HTTP API layer for Keygate.
//!
//! Exposes the health probe and a protected route demonstrating the gate.

pub mod handlers;
mod routes;
mod types;

pub use routes::build_router;
