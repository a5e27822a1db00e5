//! JSON archive of each run's digest.
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     └── digest.json
//! ```
//!
//! A later run on the same day overwrites the file.

use crate::models::SummaryRecord;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

/// A digest stamped with the local time it was produced.
#[derive(Debug, Deserialize, Serialize)]
pub struct DigestArchive {
    /// The date of the run in `YYYY-MM-DD` format.
    pub local_date: String,
    /// The local time of the run in `HH:MM:SS` format.
    pub local_time: String,
    pub articles: Vec<SummaryRecord>,
}

impl DigestArchive {
    pub fn new(at: DateTime<Local>, articles: &[SummaryRecord]) -> Self {
        Self {
            local_date: at.format("%Y-%m-%d").to_string(),
            local_time: at.format("%H:%M:%S").to_string(),
            articles: articles.to_vec(),
        }
    }

    /// Where this archive lives under `json_output_dir`.
    pub fn path_in(&self, json_output_dir: &str) -> PathBuf {
        PathBuf::from(json_output_dir)
            .join(&self.local_date)
            .join("digest.json")
    }
}

/// Write a [`DigestArchive`] under `json_output_dir`, returning its path.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_digest(
    archive: &DigestArchive,
    json_output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(archive)?;
    let path = archive.path_in(json_output_dir);

    if let Some(dir) = path.parent() {
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create JSON dir");
            return Err(e.into());
        }
    }

    fs::write(&path, json).await?;
    info!(path = %path.display(), articles = archive.articles.len(), "Wrote digest archive");
    Ok(path)
}
