//! Backend server addresses.
//!
//! A [`Server`] is identified by its normalized address string: scheme,
//! lower-cased host, the port exactly when one was written, and the path
//! prefix without trailing slashes. `http://10.0.0.1:80/` normalizes to
//! `http://10.0.0.1:80`, and `http://10.0.0.1` stays a separate server.

use std::fmt;

use serde::{Serialize, Serializer};
use url::Url;

use crate::error::{Error, Result};

/// A backend server admitted to the balancer.
///
/// Immutable once constructed; cheap enough to clone per virtual node.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Server {
    /// Normalized address, no trailing slash.
    addr: String,
}

impl Server {
    /// Parse and normalize a candidate address.
    ///
    /// Accepts absolute `http`/`https` URLs with a host. User info, query
    /// strings and fragments are rejected since they cannot be combined
    /// with a request path in a redirect.
    pub fn parse(candidate: &str) -> Result<Self> {
        let trimmed = candidate.trim();
        let url = Url::parse(trimmed)
            .map_err(|e| Error::invalid_address(candidate, e.to_string()))?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(Error::invalid_address(
                    candidate,
                    format!("unsupported scheme {other:?}"),
                ))
            }
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(Error::invalid_address(candidate, "missing host"));
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err(Error::invalid_address(candidate, "credentials are not allowed"));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(Error::invalid_address(
                candidate,
                "query strings and fragments are not allowed",
            ));
        }

        let host = url.host_str().unwrap_or_default();
        let path = url.path().trim_end_matches('/');
        let addr = match explicit_port(trimmed).and(url.port_or_known_default()) {
            Some(port) => format!("{}://{host}:{port}{path}", url.scheme()),
            None => format!("{}://{host}{path}", url.scheme()),
        };
        Ok(Self { addr })
    }

    /// The normalized address string (the server's identity).
    pub fn as_str(&self) -> &str {
        &self.addr
    }

    /// Absolute URL for `path_and_query` on this server.
    ///
    /// `path_and_query` is appended verbatim after the server's own path
    /// prefix; a missing leading `/` is supplied.
    pub fn join(&self, path_and_query: &str) -> String {
        if path_and_query.starts_with('/') {
            format!("{}{}", self.addr, path_and_query)
        } else {
            format!("{}/{}", self.addr, path_and_query)
        }
    }

    /// Address of the health-check endpoint.
    pub fn ping_url(&self) -> String {
        self.join("/ping")
    }
}

/// The port text written in `candidate`'s authority, if any.
///
/// The URL parser drops default ports, but a written `:80` is part of the
/// server's identity and of its ring keys.
fn explicit_port(candidate: &str) -> Option<&str> {
    let rest = candidate.split_once("://").map_or(candidate, |(_, rest)| rest);
    let authority = rest
        .split(|c: char| matches!(c, '/' | '?' | '#' | '\\'))
        .next()
        .unwrap_or_default();
    let (_, port) = authority.rsplit_once(':')?;
    (!port.is_empty() && port.bytes().all(|b| b.is_ascii_digit())).then_some(port)
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.addr)
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Server").field(&self.addr).finish()
    }
}

impl Serialize for Server {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_normalizes() {
        let a = Server::parse("http://10.0.0.1/").unwrap();
        let b = Server::parse("http://10.0.0.1").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "http://10.0.0.1");
    }

    #[test]
    fn test_written_default_port_kept() {
        let s = Server::parse("http://10.0.0.1:80/").unwrap();
        assert_eq!(s.as_str(), "http://10.0.0.1:80");
        assert_ne!(s, Server::parse("http://10.0.0.1").unwrap());

        let s = Server::parse("https://Example.com:443/api/").unwrap();
        assert_eq!(s.as_str(), "https://example.com:443/api");
    }

    #[test]
    fn test_port_digits_normalized() {
        let s = Server::parse("http://10.0.0.1:0080").unwrap();
        assert_eq!(s.as_str(), "http://10.0.0.1:80");
    }

    #[test]
    fn test_ipv6_port() {
        let s = Server::parse("http://[::1]:8080").unwrap();
        assert_eq!(s.as_str(), "http://[::1]:8080");
        let s = Server::parse("http://[::1]").unwrap();
        assert_eq!(s.as_str(), "http://[::1]");
    }

    #[test]
    fn test_explicit_port_detection() {
        assert_eq!(explicit_port("http://h:80/x"), Some("80"));
        assert_eq!(explicit_port("http://h/x:80"), None);
        assert_eq!(explicit_port("http://h:"), None);
        assert_eq!(explicit_port("http://[::1]"), None);
    }

    #[test]
    fn test_host_is_lowercased() {
        let s = Server::parse("  HTTP://Backend.Example:8080/api/ ").unwrap();
        assert_eq!(s.as_str(), "http://backend.example:8080/api");
    }

    #[test]
    fn test_identity_ignores_trailing_slash_in_path() {
        let a = Server::parse("http://10.0.0.1/api/").unwrap();
        let b = Server::parse("http://10.0.0.1/api").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_explicit_port_kept() {
        let s = Server::parse("https://10.0.0.2:8443").unwrap();
        assert_eq!(s.as_str(), "https://10.0.0.2:8443");
    }

    #[test]
    fn test_rejects_garbage() {
        for bad in [
            "not a url",
            "",
            "10.0.0.1:8080",
            "ftp://10.0.0.1",
            "http://user:pw@10.0.0.1",
            "http://10.0.0.1/?a=b",
            "http://10.0.0.1/#frag",
            "mailto:someone@example.com",
        ] {
            let err = Server::parse(bad).unwrap_err();
            assert_eq!(err.reason(), "invalid-address", "accepted {bad:?}");
        }
    }

    #[test]
    fn test_join() {
        let s = Server::parse("http://10.0.0.1:9000/base").unwrap();
        assert_eq!(s.join("/foo?x=1"), "http://10.0.0.1:9000/base/foo?x=1");
        assert_eq!(s.join("foo"), "http://10.0.0.1:9000/base/foo");
        assert_eq!(s.ping_url(), "http://10.0.0.1:9000/base/ping");
    }

    #[test]
    fn test_serializes_as_address() {
        let s = Server::parse("http://10.0.0.1").unwrap();
        assert_eq!(serde_json::to_string(&s).unwrap(), "\"http://10.0.0.1\"");
    }
}
