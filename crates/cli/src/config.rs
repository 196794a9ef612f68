//! Command-line configuration and startup.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::builder::TypedValueParser;
use clap::{Parser, ValueEnum};
use corelib::{Balancer, HealthCheck, DEFAULT_VNODES};
use gateway::{GatewayConfig, GatewayServer, HttpHealthCheck, SharedBalancer};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use crate::logging;

/// Upper bound for `--vnodes`. Every admission inserts this many entries
/// under the registry write lock.
pub const MAX_VNODES: usize = 1024;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Consistent-hashing load balancer that redirects each request to a
/// registered backend.
#[derive(Debug, Clone, Parser)]
#[command(name = "hashring-lb", version, about)]
pub struct CliConfig {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:8118")]
    pub listen: SocketAddr,

    /// Management requests allowed per client per minute (0 disables).
    #[arg(long, default_value_t = 100)]
    pub requests_per_minute: u32,

    /// Virtual nodes placed on the ring for each server.
    #[arg(
        long,
        default_value_t = DEFAULT_VNODES,
        value_parser = clap::value_parser!(u64)
            .range(1..=MAX_VNODES as u64)
            .try_map(usize::try_from)
    )]
    pub vnodes: usize,

    /// Timeout for the admission health probe, in seconds.
    #[arg(long, default_value_t = 5)]
    pub probe_timeout_secs: u64,

    /// Log level used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Do not install the Prometheus recorder or serve /metrics.
    #[arg(long)]
    pub no_metrics: bool,
}

impl CliConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    /// Build the balancer with the HTTP health probe.
    pub fn build_balancer(&self) -> anyhow::Result<SharedBalancer> {
        let health: Arc<dyn HealthCheck> = Arc::new(
            HttpHealthCheck::new(self.probe_timeout()).context("failed to build probe client")?,
        );
        Ok(Arc::new(
            Balancer::builder(health).with_vnodes(self.vnodes).build(),
        ))
    }

    fn install_metrics(&self) -> anyhow::Result<Option<PrometheusHandle>> {
        if self.no_metrics {
            return Ok(None);
        }
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("failed to install Prometheus recorder")?;
        gateway::metrics::init_metrics();
        Ok(Some(handle))
    }

    /// Run the balancer until Ctrl+C or SIGTERM.
    pub async fn run(self) -> anyhow::Result<()> {
        logging::init_logging(&self.log_level, self.log_format)?;

        let metrics = self.install_metrics()?;
        let balancer = self.build_balancer()?;
        info!(
            listen = %self.listen,
            vnodes = self.vnodes,
            requests_per_minute = self.requests_per_minute,
            metrics = metrics.is_some(),
            "starting load balancer"
        );

        let server = GatewayServer::new(GatewayConfig {
            balancer,
            requests_per_minute: self.requests_per_minute,
            metrics,
        });

        let listener = TcpListener::bind(self.listen)
            .await
            .with_context(|| format!("failed to bind {}", self.listen))?;
        server
            .serve(listener, shutdown_signal())
            .await
            .context("server error")?;

        info!("shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
