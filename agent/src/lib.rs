//! Worker agent
//!
//! Runs a pool of pollers against the orchestrator's `/internal/task`
//! endpoint. Each poller claims one node, computes it locally, waits out the
//! simulated operation time and reports the result.

pub mod client;
pub mod compute;
pub mod config;
pub mod telemetry;
pub mod worker;

pub use config::AgentConfig;
pub use worker::Agent;
