//! Token abstraction module for consistent hashing.
//!
//! Tokens represent positions on the hash ring and must be comparable,
//! hashable, and thread-safe.

pub mod hex_token;
pub mod traits;

pub use hex_token::HexToken;
pub use traits::Token;
