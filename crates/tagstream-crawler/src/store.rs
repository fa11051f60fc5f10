//! Run-artifact persistence.
//!
//! Each finished run is written to the output directory as pretty-printed
//! JSON: one `crawl_<ts>.json` with the whole summary, plus one
//! `<platform>_<ts>.json` per platform that succeeded. Artifacts are
//! write-once; republishing reads the newest `crawl_*.json` back.

use std::path::{Path, PathBuf};

use tagstream_core::RunSummary;

use crate::error::StoreError;

/// Filename-safe timestamp, second resolution.
const TS_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";

pub struct RunStore {
    output_dir: PathBuf,
}

impl RunStore {
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Persist one run: the full summary plus a per-platform file for each
    /// platform that succeeded. Returns the path of the summary artifact.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory or a file cannot be
    /// written, or [`StoreError::Serialize`] if encoding fails.
    pub async fn save(&self, summary: &RunSummary) -> Result<PathBuf, StoreError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let ts = summary.timestamp.format(TS_FORMAT);

        let summary_path = self.output_dir.join(format!("crawl_{ts}.json"));
        let body = serde_json::to_vec_pretty(summary)?;
        tokio::fs::write(&summary_path, body).await?;

        for (key, outcome) in &summary.platforms {
            if !outcome.success {
                continue;
            }
            let platform_path = self.output_dir.join(format!("{key}_{ts}.json"));
            let body = serde_json::to_vec_pretty(outcome)?;
            tokio::fs::write(&platform_path, body).await?;
        }

        tracing::info!(path = %summary_path.display(), "run artifacts saved");
        Ok(summary_path)
    }

    /// Load the most recent run summary, or `None` when no run has been
    /// persisted yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] on directory or file read failure, or
    /// [`StoreError::Serialize`] if the newest artifact does not parse.
    pub async fn load_latest(&self) -> Result<Option<RunSummary>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.output_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        // Timestamps in the name sort lexicographically, so the max name is
        // the newest run.
        let mut latest: Option<PathBuf> = None;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_summary = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("crawl_") && name.ends_with(".json"));
            if is_summary && latest.as_ref().is_none_or(|cur| path > *cur) {
                latest = Some(path);
            }
        }

        let Some(path) = latest else {
            return Ok(None);
        };
        let body = tokio::fs::read(&path).await?;
        let summary = serde_json::from_slice(&body)?;
        Ok(Some(summary))
    }
}
