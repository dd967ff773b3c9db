//! Portico Gateway - composition root
//!
//! Wires the core controller to the system adapters and exposes the
//! CLI runner and the HTTP front-end used by the `portico` binary.

pub mod config;
pub mod gateway;
pub mod handlers;
pub mod server;

pub use gateway::Gateway;
