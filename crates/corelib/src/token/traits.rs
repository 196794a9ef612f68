//! Core token trait definitions.
//!
//! The `Token` trait is minimal so the ring and partitioners work with any
//! ordered key representation.

use std::fmt::Debug;
use std::hash::Hash;

/// Minimal token trait for the hash ring.
///
/// Tokens are immutable, comparable positions. Implementations must be
/// thread-safe and cheap to compare/hash.
pub trait Token: Clone + Ord + Hash + Send + Sync + Debug + 'static {
    /// Minimum token value (start of ring).
    fn zero() -> Self;
    /// Maximum token value (end of ring).
    fn max() -> Self;
    /// True if this token is the minimum.
    fn is_zero(&self) -> bool;
    /// True if this token is the maximum.
    fn is_max(&self) -> bool;
}

impl Token for u64 {
    fn zero() -> Self {
        0
    }

    fn max() -> Self {
        u64::MAX
    }

    fn is_zero(&self) -> bool {
        *self == 0
    }

    fn is_max(&self) -> bool {
        *self == u64::MAX
    }
}
