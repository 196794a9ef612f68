//! Health-check seam used by admission.
//!
//! The balancer never talks to the network itself. It asks a
//! [`HealthCheck`] whether a candidate is reachable before registering it.
//! The HTTP implementation lives in the gateway crate.

use std::sync::Arc;

use async_trait::async_trait;

use crate::server::Server;

/// Reachability probe for candidate servers.
///
/// A single attempt: implementations own their timeout and must not retry.
#[async_trait]
pub trait HealthCheck: Send + Sync + 'static {
    /// `true` if `server` is healthy enough to receive traffic.
    async fn check(&self, server: &Server) -> bool;
}

#[async_trait]
impl<H: HealthCheck + ?Sized> HealthCheck for Arc<H> {
    async fn check(&self, server: &Server) -> bool {
        (**self).check(server).await
    }
}

#[async_trait]
impl<H: HealthCheck + ?Sized> HealthCheck for Box<H> {
    async fn check(&self, server: &Server) -> bool {
        (**self).check(server).await
    }
}

/// Adapts a synchronous predicate into a [`HealthCheck`].
///
/// ```rust
/// use corelib::{Balancer, HealthCheckFn};
///
/// let balancer = Balancer::new(HealthCheckFn(|_: &corelib::Server| true));
/// assert!(balancer.list().is_empty());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct HealthCheckFn<F>(pub F);

#[async_trait]
impl<F> HealthCheck for HealthCheckFn<F>
where
    F: Fn(&Server) -> bool + Send + Sync + 'static,
{
    async fn check(&self, server: &Server) -> bool {
        (self.0)(server)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fn_adapter() {
        let check = HealthCheckFn(|s: &Server| s.as_str().contains("good"));
        assert!(check.check(&Server::parse("http://good").unwrap()).await);
        assert!(!check.check(&Server::parse("http://bad").unwrap()).await);
    }

    #[tokio::test]
    async fn test_trait_object_through_arc() {
        let check: Arc<dyn HealthCheck> = Arc::new(HealthCheckFn(|_: &Server| true));
        assert!(check.check(&Server::parse("http://x").unwrap()).await);
    }
}
