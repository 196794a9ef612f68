//! HTTP front end for the consistent-hashing balancer.
//!
//! Provides a [`GatewayServer`] that exposes an axum router over a shared
//! [`Balancer`]. Supported endpoints:
//!
//! - `GET /ping` returns `pong`, so one balancer can sit behind another
//! - `GET /servers` lists admitted servers in admission order
//! - `POST /servers` admits the server named by the form field `addr`
//! - `GET /ring` dumps the ring in ascending key order
//! - `GET /metrics` renders Prometheus metrics (when a recorder is installed)
//!
//! Every other request is routed: the key is the client IP followed by the
//! request path, and the response is a `307` redirect to the owning server.
//!
//! ## Rate limiting
//!
//! The management endpoints (`/ping`, `/servers`, `/ring`) are limited per
//! client IP. Routed requests are not.

mod error;
mod handlers;
pub mod health;
pub mod metrics;
pub mod rate_limit;


use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::middleware;
use axum::routing::get;
use axum::Router;
use corelib::{Balancer, HealthCheck};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::ApiError;
pub use health::HttpHealthCheck;
pub use rate_limit::RateLimiter;

/// Balancer type served by the gateway.
pub type SharedBalancer = Arc<Balancer<Arc<dyn HealthCheck>>>;

/// Shared application state for all handlers.
#[derive(Clone)]
pub(crate) struct AppState {
    pub balancer: SharedBalancer,
}

/// Configuration for creating a [`GatewayServer`].
pub struct GatewayConfig {
    /// The balancer to serve.
    pub balancer: SharedBalancer,
    /// Management requests allowed per client per minute. `0` disables
    /// limiting.
    pub requests_per_minute: u32,
    /// Handle of the installed Prometheus recorder, if any.
    pub metrics: Option<PrometheusHandle>,
}

/// HTTP server wrapping a [`Balancer`].
pub struct GatewayServer {
    router: Router,
}

impl GatewayServer {
    pub fn new(config: GatewayConfig) -> Self {
        let limiter = RateLimiter::per_minute(config.requests_per_minute).map(Arc::new);
        let state = AppState {
            balancer: config.balancer,
        };
        Self {
            router: Self::build_router(state, limiter, config.metrics),
        }
    }

    fn build_router(
        state: AppState,
        limiter: Option<Arc<RateLimiter>>,
        metrics: Option<PrometheusHandle>,
    ) -> Router {
        let mut router = Router::new()
            .route("/ping", get(handlers::ping))
            .route(
                "/servers",
                get(handlers::list_servers).post(handlers::admit_server),
            )
            .route("/ring", get(handlers::ring_snapshot));

        // route_layer only wraps the routes registered above.
        if let Some(limiter) = limiter {
            router = router.route_layer(middleware::from_fn_with_state(
                limiter,
                rate_limit::limit_by_client,
            ));
        }

        if let Some(handle) = metrics {
            router = router.route(
                "/metrics",
                get(move || handlers::render_metrics(handle.clone())),
            );
        }

        router
            .fallback(handlers::route_request)
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Consume the server and return the router, for embedding or tests.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Serve on `listener` until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Ok(addr) = listener.local_addr() {
            info!(%addr, "gateway listening");
        }
        axum::serve(
            listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
    }
}
