//! Error types for the core library.

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by balancer and ring operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The candidate address could not be parsed as a backend URL.
    #[error("invalid address {address:?}: {reason}")]
    InvalidAddress {
        /// The address as supplied by the caller.
        address: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The candidate did not answer its health probe with `200 OK`.
    #[error("server {address} failed its health check")]
    Unreachable {
        /// Normalized address of the rejected server.
        address: String,
    },

    /// A route was requested while no servers are registered.
    #[error("no backend servers available")]
    Unavailable,

    /// A ring key was not a well-formed hex digest.
    #[error("malformed ring key: {0}")]
    HashEncoding(String),
}

impl Error {
    /// Machine-readable reason code, stable across releases.
    pub fn reason(&self) -> &'static str {
        match self {
            Error::InvalidAddress { .. } => "invalid-address",
            Error::Unreachable { .. } => "unreachable",
            Error::Unavailable => "unavailable",
            Error::HashEncoding(_) => "hash-encoding",
        }
    }

    pub(crate) fn invalid_address(address: &str, reason: impl Into<String>) -> Self {
        Error::InvalidAddress {
            address: address.to_owned(),
            reason: reason.into(),
        }
    }
}
