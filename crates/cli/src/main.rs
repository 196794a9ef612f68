//! `hashring-lb` binary.

use clap::Parser;
use hashring_lb::CliConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();
    config.run().await
}
