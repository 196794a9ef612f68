//! Server registry: admitted servers plus the ring that places them.
//!
//! The registry is plain data with no locking of its own. [`Balancer`]
//! keeps it behind a single lock so the server list and ring are always
//! observed together.
//!
//! [`Balancer`]: crate::balancer::Balancer

use tracing::{debug, warn};

use crate::ring::HashRing;
use crate::server::Server;
use crate::token::Token;
use crate::vnode::VirtualNode;

/// Admitted servers in admission order, and their virtual nodes.
///
/// # Invariants
///
/// - every server in `servers` owns all of its virtual nodes on `ring`
/// - every ring entry points at a server in `servers`
#[derive(Debug, Clone)]
pub struct Registry<T: Token> {
    servers: Vec<Server>,
    ring: HashRing<T, Server>,
}

impl<T: Token> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Token> Registry<T> {
    pub fn new() -> Self {
        Self {
            servers: Vec::new(),
            ring: HashRing::new(),
        }
    }

    /// Whether `server` has been registered.
    pub fn contains(&self, server: &Server) -> bool {
        self.servers.iter().any(|s| s == server)
    }

    /// Register `server` with its precomputed virtual nodes.
    ///
    /// Returns `false` and changes nothing if the server is already
    /// registered.
    pub fn register(&mut self, server: Server, vnodes: Vec<VirtualNode<T>>) -> bool {
        if self.contains(&server) {
            return false;
        }

        debug_assert!(vnodes.iter().all(|v| v.server == server));
        let count = vnodes.len();
        for vnode in vnodes {
            let token = vnode.token;
            if let Some(previous) = self.ring.insert(token.clone(), vnode.server) {
                warn!(?token, %previous, %server, "ring key collision, later server wins");
            }
        }
        debug!(%server, vnodes = count, ring_size = self.ring.len(), "registered server");
        self.servers.push(server);
        true
    }

    /// The server owning `token`, with wraparound.
    pub fn lookup(&self, token: &T) -> Option<&Server> {
        self.ring.successor(token)
    }

    /// Servers in admission order.
    pub fn servers(&self) -> &[Server] {
        &self.servers
    }

    pub fn ring(&self) -> &HashRing<T, Server> {
        &self.ring
    }
}
