//! Partitioner abstraction for consistent hashing.
//!
//! Partitioners are responsible for converting keys into tokens
//! that can be placed on the hash ring.

pub mod sha1;
pub mod traits;

pub use self::sha1::{digest, Sha1Partitioner};
pub use traits::Partitioner;
