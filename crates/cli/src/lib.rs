//! Command-line entry for the consistent-hashing load balancer.
//!
//! Parses configuration, sets up logging and metrics, and runs the
//! gateway until interrupted.

pub mod config;
pub mod logging;

pub use config::{CliConfig, LogFormat, MAX_VNODES};
