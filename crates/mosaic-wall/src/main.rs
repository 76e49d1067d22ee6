//! Wall Node binary
//!
//! Keeps a donor wall in sync with its crowdfunding campaign: polls the
//! pledge export, re-allocates cells when it changes, and serves the
//! resulting wall data.

use mosaic_wall::{WallConfig, WallNode};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wall_node=info,mosaic_wall=info,mosaic_sync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Wall Node");

    let config = WallConfig::from_env();

    let node = WallNode::new(config)?;
    node.run().await?;

    Ok(())
}
