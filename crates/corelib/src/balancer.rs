//! Consistent-hashing balancer.
//!
//! Owns the [`Registry`] behind one reader-writer lock. Admission probes the
//! candidate first and only then takes the write lock for the in-memory
//! mutation; routing hashes the request key outside the lock and takes the
//! read lock for the successor lookup. A route therefore never observes a
//! server with only some of its virtual nodes placed.

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::health::HealthCheck;
use crate::partitioner::{Partitioner, Sha1Partitioner};
use crate::registry::Registry;
use crate::server::Server;
use crate::vnode::{virtual_nodes, DEFAULT_VNODES};

/// Point-in-time sizes, read under a single guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalancerStats {
    /// Registered servers.
    pub servers: usize,
    /// Ring entries (virtual nodes).
    pub ring_entries: usize,
}

/// Routes request keys to admitted backend servers.
pub struct Balancer<H, P: Partitioner = Sha1Partitioner> {
    registry: RwLock<Registry<P::TokenType>>,
    partitioner: P,
    health: H,
    vnodes_per_server: usize,
}

impl<H: HealthCheck> Balancer<H> {
    /// Balancer with SHA-1 keys and the default virtual-node count.
    pub fn new(health: H) -> Self {
        Self::builder(health).build()
    }

    pub fn builder(health: H) -> BalancerBuilder<H> {
        BalancerBuilder::new(health)
    }
}

impl<H: HealthCheck, P: Partitioner> Balancer<H, P> {
    /// Admit a candidate server.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidAddress`] if `candidate` is not a usable backend URL
    /// - [`Error::Unreachable`] if the single health probe fails
    ///
    /// Either way the registry is left untouched. Admitting an address that
    /// is already registered succeeds without changing anything.
    pub async fn admit(&self, candidate: &str) -> Result<Server> {
        let server = Server::parse(candidate)?;

        if !self.health.check(&server).await {
            warn!(%server, "rejecting server: health check failed");
            return Err(Error::Unreachable {
                address: server.as_str().to_owned(),
            });
        }

        let vnodes = virtual_nodes(&self.partitioner, &server, self.vnodes_per_server);

        let mut registry = self.registry.write();
        if registry.register(server.clone(), vnodes) {
            info!(%server, servers = registry.servers().len(), "admitted server");
        } else {
            debug!(%server, "server already registered");
        }
        Ok(server)
    }

    /// Pick the server for `request_key`.
    ///
    /// # Errors
    ///
    /// [`Error::Unavailable`] while no server has been admitted.
    pub fn route(&self, request_key: &str) -> Result<Server> {
        let token = self.partitioner.partition(request_key.as_bytes());
        let registry = self.registry.read();
        let server = registry.lookup(&token).cloned().ok_or(Error::Unavailable)?;
        debug!(request_key, ?token, %server, "routed request");
        Ok(server)
    }

    /// Admitted servers in admission order.
    pub fn list(&self) -> Vec<Server> {
        self.registry.read().servers().to_vec()
    }

    /// Ring entries in ascending key order.
    pub fn ring_entries(&self) -> Vec<(P::TokenType, Server)> {
        self.registry
            .read()
            .ring()
            .iter()
            .map(|(token, server)| (token.clone(), server.clone()))
            .collect()
    }

    pub fn stats(&self) -> BalancerStats {
        let registry = self.registry.read();
        BalancerStats {
            servers: registry.servers().len(),
            ring_entries: registry.ring().len(),
        }
    }

    /// Whether `address` (in any spelling that normalizes the same) is
    /// registered. Unparsable addresses are never registered.
    pub fn contains(&self, address: &str) -> bool {
        Server::parse(address)
            .map(|server| self.registry.read().contains(&server))
            .unwrap_or(false)
    }

    pub fn vnodes_per_server(&self) -> usize {
        self.vnodes_per_server
    }
}

impl<H, P: Partitioner> std::fmt::Debug for Balancer<H, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry.read();
        f.debug_struct("Balancer")
            .field("partitioner", &self.partitioner.name())
            .field("vnodes_per_server", &self.vnodes_per_server)
            .field("servers", &registry.servers())
            .finish()
    }
}

/// Builder for [`Balancer`].
///
/// ```rust
/// use corelib::{Balancer, HealthCheckFn, Server};
///
/// let balancer = Balancer::builder(HealthCheckFn(|_: &Server| true))
///     .with_vnodes(8)
///     .build();
/// assert_eq!(balancer.vnodes_per_server(), 8);
/// ```
#[derive(Debug)]
pub struct BalancerBuilder<H, P = Sha1Partitioner> {
    health: H,
    partitioner: P,
    vnodes_per_server: usize,
}

impl<H: HealthCheck> BalancerBuilder<H> {
    pub fn new(health: H) -> Self {
        Self {
            health,
            partitioner: Sha1Partitioner,
            vnodes_per_server: DEFAULT_VNODES,
        }
    }
}

impl<H: HealthCheck, P: Partitioner> BalancerBuilder<H, P> {
    /// Virtual nodes per server. Clamped to at least one so every admitted
    /// server is reachable.
    pub fn with_vnodes(mut self, vnodes: usize) -> Self {
        self.vnodes_per_server = vnodes.max(1);
        self
    }

    /// Replace the partitioner (and with it the token type).
    pub fn with_partitioner<Q: Partitioner>(self, partitioner: Q) -> BalancerBuilder<H, Q> {
        BalancerBuilder {
            health: self.health,
            partitioner,
            vnodes_per_server: self.vnodes_per_server,
        }
    }

    pub fn build(self) -> Balancer<H, P> {
        Balancer {
            registry: RwLock::new(Registry::new()),
            partitioner: self.partitioner,
            health: self.health,
            vnodes_per_server: self.vnodes_per_server,
        }
    }
}
