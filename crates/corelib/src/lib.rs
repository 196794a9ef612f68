//! Core library for the consistent-hashing load balancer.
//!
//! This crate provides the fundamental abstractions for consistent hashing:
//! - Token types (`HexToken`, a fixed-width SHA-1 hex digest)
//! - Partitioner algorithms (`Sha1Partitioner`, `digest`)
//! - The hash ring with wraparound successor lookup
//! - Backend servers and their virtual nodes
//! - The registry and the `Balancer` that admits and routes
//!
//! Networking stays outside: the balancer reaches candidates only through
//! the [`HealthCheck`] trait.

pub mod balancer;
pub mod error;
pub mod health;
pub mod partitioner;
pub mod registry;
pub mod ring;
pub mod server;
pub mod token;
pub mod vnode;

pub use balancer::{Balancer, BalancerBuilder, BalancerStats};
pub use error::{Error, Result};
pub use health::{HealthCheck, HealthCheckFn};
pub use partitioner::{digest, Partitioner, Sha1Partitioner};
pub use registry::Registry;
pub use ring::HashRing;
pub use server::Server;
pub use token::{HexToken, Token};
pub use vnode::{VirtualNode, DEFAULT_VNODES};
