//! Hex-encoded digest token (the ring key used in production).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::token::traits::Token;

/// Width of an encoded key: a 160-bit digest is 40 hex characters.
pub const HEX_TOKEN_LEN: usize = 40;

/// A ring key: the lowercase hex encoding of a SHA-1 digest.
///
/// Every key has the same width, so lexicographic order on the string is
/// the numeric order of the digest and wraparound works on the text form.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexToken(String);

impl HexToken {
    /// Encodes a raw digest.
    pub fn from_digest(digest: &[u8; HEX_TOKEN_LEN / 2]) -> Self {
        HexToken(hex::encode(digest))
    }

    /// Parses an externally supplied key, validating width and alphabet.
    ///
    /// Uppercase input is accepted and folded so it compares equal to the
    /// keys this crate produces.
    pub fn parse(s: &str) -> Result<Self> {
        if s.len() != HEX_TOKEN_LEN {
            return Err(Error::HashEncoding(format!(
                "expected {HEX_TOKEN_LEN} hex characters, got {}",
                s.len()
            )));
        }
        if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::HashEncoding(format!("non-hex character in {s:?}")));
        }
        Ok(HexToken(s.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Token for HexToken {
    fn zero() -> Self {
        HexToken("0".repeat(HEX_TOKEN_LEN))
    }

    fn max() -> Self {
        HexToken("f".repeat(HEX_TOKEN_LEN))
    }

    fn is_zero(&self) -> bool {
        self.0.bytes().all(|b| b == b'0')
    }

    fn is_max(&self) -> bool {
        self.0.bytes().all(|b| b == b'f')
    }
}

impl fmt::Display for HexToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for HexToken {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        HexToken::parse(&value)
    }
}

impl From<HexToken> for String {
    fn from(token: HexToken) -> Self {
        token.0
    }
}
