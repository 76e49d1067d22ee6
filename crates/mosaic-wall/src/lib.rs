//! Mosaic Wall - Donor Wall Daemon
//!
//! Periodically pulls the crowdfunding pledge export, re-allocates the
//! donor wall's cells when it changes, and serves the result to the wall
//! front end.
//!
//! # Architecture
//!
//! - **Sync**: download + change detection + parsing (`mosaic-sync`)
//! - **Allocation**: the pure cell allocation engine (`mosaic-allocation`)
//! - **Export**: the persisted snapshot, replaced atomically
//! - **API**: one read-only HTTP endpoint serving the latest snapshot
//!
//! # Example
//!
//! ```no_run
//! use mosaic_wall::{WallConfig, WallNode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = WallConfig::from_env();
//!     let node = WallNode::new(config)?;
//!     node.run().await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod error;
pub mod export;
pub mod node;

pub use api::SharedSnapshot;
pub use error::{Error, Result};
pub use export::{write_atomic, AdoptedCell, PatronList, RemainingPatron, WallSnapshot};
pub use node::{WallConfig, WallNode};
