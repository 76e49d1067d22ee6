//! Download of the pledge export with snapshot-based change detection.
//!
//! The crowdfunding page exports a script file in which a single line,
//! the `var data` assignment, carries the pledge rows. Only that line is
//! kept: everything else on the page changes between identical exports
//! and would defeat the content hash.
//!
//! The cleaned payload is cached under the data directory. On each poll
//! the fresh payload's hash is compared with the cached snapshot; when
//! they differ, the snapshot is rotated (current becomes `.old`) and the
//! new payload is persisted and returned.

use crate::error::{Result, SyncError};
use std::path::PathBuf;
use std::time::Duration;

/// Cached copy of the most recent payload.
pub const SNAPSHOT_FILE: &str = "patrons_raw.txt";

/// Previous payload, kept one generation for inspection.
pub const PREVIOUS_SNAPSHOT_FILE: &str = "patrons_raw.old.txt";

/// The marker identifying the payload line in the export body.
const DATA_MARKER: &str = "var data";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Downloads the pledge export and detects changes against the cached
/// snapshot.
pub struct Fetcher {
    client: reqwest::Client,
    cache_dir: PathBuf,
}

impl Fetcher {
    /// Create a fetcher caching under `cache_dir` (created if missing).
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self> {
        let cache_dir = cache_dir.into();
        std::fs::create_dir_all(&cache_dir)?;

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { client, cache_dir })
    }

    /// Remove both cached snapshots, forcing the next poll to report a
    /// change.
    pub fn clean(&self) -> Result<()> {
        for name in [SNAPSHOT_FILE, PREVIOUS_SNAPSHOT_FILE] {
            let path = self.cache_dir.join(name);
            match std::fs::remove_file(&path) {
                Ok(()) => tracing::info!(path = %path.display(), "removed cached snapshot"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Fetch the export and return its payload line if it differs from
    /// the cached snapshot, `None` if nothing changed.
    pub async fn poll(&self, url: &str) -> Result<Option<String>> {
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let payload = extract_data_line(&body)
            .ok_or_else(|| SyncError::Payload("export contains no data line".into()))?;

        if !self.differs_from_snapshot(&payload)? {
            return Ok(None);
        }

        self.rotate_snapshot(&payload)?;
        tracing::info!(
            bytes = payload.len(),
            hash = %content_hash(&payload),
            "pledge export changed"
        );
        Ok(Some(payload))
    }

    fn differs_from_snapshot(&self, payload: &str) -> Result<bool> {
        let snapshot = self.cache_dir.join(SNAPSHOT_FILE);
        match std::fs::read_to_string(&snapshot) {
            Ok(previous) => Ok(content_hash(&previous) != content_hash(payload)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
            Err(e) => Err(e.into()),
        }
    }

    fn rotate_snapshot(&self, payload: &str) -> Result<()> {
        let current = self.cache_dir.join(SNAPSHOT_FILE);
        let previous = self.cache_dir.join(PREVIOUS_SNAPSHOT_FILE);

        match std::fs::rename(&current, &previous) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        std::fs::write(&current, payload)?;
        Ok(())
    }
}

/// Hash of a payload, hex encoded.
pub fn content_hash(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

/// Reduce an export body to its payload line.
///
/// Keeps the last line containing the data marker; the export is a
/// script file and later assignments shadow earlier ones.
pub fn extract_data_line(body: &str) -> Option<String> {
    body.lines()
        .filter(|line| line.contains(DATA_MARKER))
        .last()
        .map(|line| line.trim().to_string())
}
