//! Expression orchestrator
//!
//! Compiles arithmetic expressions into dependency graphs and serves their
//! ready nodes, one at a time, to workers polling over HTTP.

pub mod api;
pub mod compiler;
pub mod config;
pub mod error;
pub mod graph;
pub mod scheduler;
pub mod server;
pub mod state;
pub mod telemetry;

pub use error::{CompileError, DispatchError};
pub use state::AppState;
