//! Wall Node - the main application entry point.
//!
//! Architecture:
//! - Periodic pipeline: fetch -> parse -> allocate -> audit -> export
//! - HTTP responder serving the latest snapshot
//! - The two share only the atomically swapped snapshot reference; the
//!   persisted artifact is replaced by rename so a concurrent reader
//!   never sees a partial file.

use crate::api::{self, SharedSnapshot};
use crate::error::{Error, Result};
use crate::export::{self, WallSnapshot, SNAPSHOT_BASENAME};
use mosaic_allocation::allocate;
use mosaic_patron::{PatronRoster, DEFAULT_CELL_PRICE};
use mosaic_sync::{parse_records, Fetcher};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Configuration for a wall node.
#[derive(Debug, Clone)]
pub struct WallConfig {
    /// Web URL of the pledge export.
    pub source_url: String,

    /// Data directory for the snapshot cache and the served artifact.
    pub data_dir: PathBuf,

    /// HTTP listen address.
    pub listen_addr: SocketAddr,

    /// Delay between polls of the export.
    pub poll_interval: Duration,

    /// Price of one cell, in whole currency units.
    pub cell_price: u64,

    /// Clear the download cache on startup, forcing a full refresh.
    pub clean_run: bool,
}

impl Default for WallConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl WallConfig {
    /// Create config from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        let source_url = std::env::var("WALL_SOURCE_URL").unwrap_or_default();

        let data_dir = PathBuf::from(
            std::env::var("WALL_DATA_DIR").unwrap_or_else(|_| "./wall-data".to_string()),
        );

        let listen_addr = std::env::var("WALL_LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .expect("Invalid WALL_LISTEN_ADDR");

        let poll_interval = std::env::var("WALL_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(900));

        let cell_price = std::env::var("WALL_CELL_PRICE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CELL_PRICE);

        let clean_run = std::env::var("WALL_CLEAN_RUN")
            .map(|s| s == "1" || s.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            source_url,
            data_dir,
            listen_addr,
            poll_interval,
            cell_price,
            clean_run,
        }
    }

    /// Path of the served artifact.
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_BASENAME)
    }
}

/// A wall node instance.
pub struct WallNode {
    config: WallConfig,
    fetcher: Fetcher,
    state: SharedSnapshot,
}

impl WallNode {
    /// Create a new wall node, rehydrating the last persisted snapshot if
    /// one exists.
    pub fn new(config: WallConfig) -> Result<Self> {
        if config.source_url.is_empty() {
            return Err(Error::Config(
                "a source URL must be provided (WALL_SOURCE_URL)".into(),
            ));
        }
        if config.cell_price == 0 {
            return Err(Error::Config("cell price must be positive".into()));
        }

        std::fs::create_dir_all(&config.data_dir)?;
        let fetcher = Fetcher::new(&config.data_dir)?;
        if config.clean_run {
            fetcher.clean()?;
        }

        let previous = export::read(&config.snapshot_path())?;
        if previous.is_some() {
            tracing::info!("rehydrated previous wall snapshot");
        }
        let state = Arc::new(RwLock::new(previous));

        Ok(Self {
            config,
            fetcher,
            state,
        })
    }

    /// Get the shared snapshot handle (for the API and tests).
    pub fn state(&self) -> SharedSnapshot {
        Arc::clone(&self.state)
    }

    /// Run the node: poll loop plus HTTP responder.
    ///
    /// Returns only on a fatal error; a conservation audit failure is
    /// fatal, transient fetch/parse failures are not.
    pub async fn run(self) -> Result<()> {
        tracing::info!("Wall node starting");
        tracing::info!("  Source: {}", self.config.source_url);
        tracing::info!("  API: http://{}", self.config.listen_addr);
        tracing::info!("  Data: {:?}", self.config.data_dir);
        tracing::info!("  Poll every: {:?}", self.config.poll_interval);
        tracing::info!("  Cell price: {}", self.config.cell_price);

        let app = api::build_router(self.state());
        let listener = tokio::net::TcpListener::bind(self.config.listen_addr).await?;
        tracing::info!("HTTP server listening on {}", self.config.listen_addr);

        let server = axum::serve(listener, app).into_future();
        tokio::select! {
            result = server => result.map_err(Error::from),
            result = self.poll_loop() => result,
        }
    }

    async fn poll_loop(&self) -> Result<()> {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match self.refresh().await {
                Ok(true) => {}
                Ok(false) => tracing::debug!("pledge export unchanged"),
                Err(Error::Allocation(e)) => {
                    tracing::error!(error = %e, "allocation audit failed, aborting run");
                    return Err(Error::Allocation(e));
                }
                Err(e) => tracing::warn!(error = %e, "refresh failed"),
            }
        }
    }

    /// One pipeline pass. Returns whether a new snapshot was published.
    async fn refresh(&self) -> Result<bool> {
        let Some(payload) = self.fetcher.poll(&self.config.source_url).await? else {
            return Ok(false);
        };

        let records = parse_records(&payload)?;
        let roster = PatronRoster::build(records, self.config.cell_price)?;
        let result = allocate(&roster);
        result.verify_conservation(roster.total_cell_units())?;

        let snapshot = WallSnapshot::build(&roster, &result);
        export::write_atomic(&self.config.snapshot_path(), &snapshot)?;

        let totals = roster.snapshot();
        tracing::info!(
            patrons = totals.count,
            raised = totals.total_pledged,
            cells = snapshot.adopted_cells.len(),
            pending = snapshot.remaining_patrons.len(),
            "published new wall snapshot"
        );

        *self.state.write().await = Some(snapshot);
        Ok(true)
    }
}
