//! SHA-1 partitioner implementation.

use ::sha1::{Digest, Sha1};

use crate::partitioner::traits::Partitioner;
use crate::token::HexToken;

/// Hashes a string onto the ring.
///
/// SHA-1 over the UTF-8 bytes, hex encoded to 40 characters. The same
/// function derives both virtual-node keys and request keys.
pub fn digest(input: &str) -> HexToken {
    Sha1Partitioner.partition(input.as_bytes())
}

/// SHA-1 partitioner producing [`HexToken`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha1Partitioner;

impl Partitioner for Sha1Partitioner {
    type TokenType = HexToken;

    fn partition(&self, key: &[u8]) -> Self::TokenType {
        let hash: [u8; 20] = Sha1::digest(key).into();
        HexToken::from_digest(&hash)
    }

    fn name(&self) -> &'static str {
        "Sha1Partitioner"
    }
}
