//! Timestamped dataset persistence.
//!
//! Artifacts live under a deterministic layout:
//!
//! ```text
//! {root}/{cik}/{kind}/{Category_}/{cik}_{Category_}_{timestamp}.csv
//! ```
//!
//! Writes are at-most-once per (entity, kind, category, timestamp): an
//! existing file short-circuits to returning its name unmodified. The
//! newest artifact is resolved by filesystem modification time.

use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;

use chrono::Utc;
use polars::prelude::{CsvWriter, DataFrame, SerWriter};
use tracing::{debug, info};

use filings_core::{Cik, PipelineError, Result, StorageKind};

/// Timestamp format used in artifact names. Deliberately underscore-free so
/// the version label can be recovered from a file name's last `_` segment.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

fn dir_form(category: &str) -> String {
    category.replace(' ', "_")
}

/// Writes and resolves one entity's dataset artifacts.
#[derive(Debug)]
pub struct ArtifactStore {
    root: PathBuf,
    cik: Cik,
}

impl ArtifactStore {
    /// Creates a store rooted at `root` for one entity, creating the
    /// entity's directory if absent.
    pub fn new(root: impl Into<PathBuf>, cik: Cik) -> Result<Self> {
        let store = Self {
            root: root.into(),
            cik,
        };
        fs::create_dir_all(store.entity_dir())?;
        Ok(store)
    }

    /// The entity this store writes for.
    #[must_use]
    pub const fn cik(&self) -> &Cik {
        &self.cik
    }

    fn entity_dir(&self) -> PathBuf {
        self.root.join(self.cik.as_str())
    }

    fn category_dir(&self, kind: StorageKind, category: &str) -> PathBuf {
        self.entity_dir()
            .join(kind.as_str())
            .join(dir_form(category))
    }

    /// Persists a dataset stamped with the current time.
    pub fn store(
        &self,
        data: &mut DataFrame,
        kind: StorageKind,
        category: &str,
    ) -> Result<String> {
        let timestamp = Utc::now().format(TIMESTAMP_FORMAT).to_string();
        self.store_at(data, kind, category, &timestamp)
    }

    /// Persists a dataset under an explicit timestamp.
    ///
    /// If the computed file already exists the write is skipped and the
    /// existing name returned; content is never overwritten.
    pub fn store_at(
        &self,
        data: &mut DataFrame,
        kind: StorageKind,
        category: &str,
        timestamp: &str,
    ) -> Result<String> {
        let dir = self.category_dir(kind, category);
        fs::create_dir_all(&dir)?;

        let file_name = format!("{}_{}_{}.csv", self.cik, dir_form(category), timestamp);
        let path = dir.join(&file_name);
        if path.exists() {
            debug!(file = %path.display(), "artifact already exists, skipping write");
            return Ok(file_name);
        }

        let file = fs::File::create(&path)?;
        CsvWriter::new(file)
            .include_header(true)
            .finish(data)
            .map_err(|e| PipelineError::Storage(e.to_string()))?;
        info!(file = %path.display(), rows = data.height(), "stored artifact");
        Ok(file_name)
    }

    /// Persists chart data for the presentation collaborator, namespaced by
    /// chart type under the category directory.
    pub fn store_chart_json(
        &self,
        value: &serde_json::Value,
        kind: StorageKind,
        category: &str,
        chart_type: &str,
        timestamp: &str,
    ) -> Result<String> {
        let dir = self
            .category_dir(kind, category)
            .join(dir_form(chart_type));
        fs::create_dir_all(&dir)?;

        let file_name = format!(
            "{}_{}_{}_{}.json",
            self.cik,
            dir_form(category),
            dir_form(chart_type),
            timestamp
        );
        let path = dir.join(&file_name);
        if path.exists() {
            debug!(file = %path.display(), "chart data already exists, skipping write");
            return Ok(file_name);
        }

        let json =
            serde_json::to_string_pretty(value).map_err(|e| PipelineError::Storage(e.to_string()))?;
        fs::write(&path, json)?;
        debug!(file = %path.display(), "stored chart data");
        Ok(file_name)
    }

    /// Every artifact for a (kind, category), ordered oldest to newest by
    /// modification time.
    ///
    /// # Errors
    /// [`PipelineError::NotFound`] when the category directory is absent or
    /// holds no artifacts; an expected outcome before the first run.
    pub fn history(&self, kind: StorageKind, category: &str) -> Result<Vec<PathBuf>> {
        let dir = self.category_dir(kind, category);
        if !dir.is_dir() {
            return Err(PipelineError::NotFound(format!(
                "no {kind} artifacts for category {category:?}"
            )));
        }

        let mut entries: Vec<(SystemTime, PathBuf)> = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            // Chart-type subdirectories are not dataset artifacts.
            if !path.is_file() {
                continue;
            }
            let modified = entry.metadata()?.modified()?;
            entries.push((modified, path));
        }
        if entries.is_empty() {
            return Err(PipelineError::NotFound(format!(
                "no {kind} artifacts for category {category:?}"
            )));
        }

        entries.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        Ok(entries.into_iter().map(|(_, path)| path).collect())
    }

    /// Path of the newest artifact for a (kind, category).
    pub fn latest(&self, kind: StorageKind, category: &str) -> Result<PathBuf> {
        let mut history = self.history(kind, category)?;
        history.pop().ok_or_else(|| {
            PipelineError::NotFound(format!(
                "no {kind} artifacts for category {category:?}"
            ))
        })
    }
}
