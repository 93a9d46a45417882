//! Per-entity artifact index.
//!
//! Each (entity, storage kind) pair has one `index.md`: a front-matter
//! header followed by a `### {Category}` section per category with one link
//! line per artifact. Updates are read-recompute-rewrite of the whole file
//! and serialize under a per-manager mutex; concurrent writers for the same
//! entity must share one manager.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use filings_core::{Cik, PipelineError, Result, StorageKind};

const INDEX_FILE: &str = "index.md";

type Section = (String, Vec<String>);

/// Maintains the append-only artifact index for entities under one root.
#[derive(Debug)]
pub struct IndexManager {
    root: PathBuf,
    lock: Mutex<()>,
}

impl IndexManager {
    /// Creates a manager for indexes under `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock: Mutex::new(()),
        }
    }

    fn index_path(&self, cik: &Cik, kind: StorageKind) -> PathBuf {
        self.root
            .join(cik.as_str())
            .join(kind.as_str())
            .join(INDEX_FILE)
    }

    /// Appends one artifact entry, creating the category section if absent.
    pub fn append(
        &self,
        cik: &Cik,
        kind: StorageKind,
        category: &str,
        file_name: &str,
    ) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| PipelineError::Storage("index lock poisoned".to_string()))?;

        let path = self.index_path(cik, kind);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut sections = read_sections(&path)?;
        let heading = format!("### {category}");
        let line = format!(
            "- [{category} {version}]({cik}/{kind}/{dir}/{file_name})\n",
            version = version_label(file_name),
            kind = kind.as_str(),
            dir = category.replace(' ', "_"),
        );

        match sections.iter_mut().find(|(h, _)| *h == heading) {
            Some((_, lines)) => lines.push(line),
            None => sections.push((heading, vec![line])),
        }

        write_sections(&path, cik, kind, &sections)?;
        debug!(cik = %cik, kind = %kind, category, file_name, "updated index");
        Ok(())
    }

    /// The raw index document for an entity and kind.
    pub fn document(&self, cik: &Cik, kind: StorageKind) -> Result<String> {
        let path = self.index_path(cik, kind);
        fs::read_to_string(&path)
            .map_err(|_| PipelineError::NotFound(format!("no index for {cik}/{kind}")))
    }

    /// Categories with at least one indexed artifact, in section order.
    pub fn categories(&self, cik: &Cik, kind: StorageKind) -> Result<Vec<String>> {
        let document = self.document(cik, kind)?;
        Ok(document
            .lines()
            .filter_map(|line| line.strip_prefix("### "))
            .map(|heading| heading.trim().to_string())
            .collect())
    }
}

/// The version label shown in index links: the trailing `_` segment of the
/// artifact name, extension stripped.
fn version_label(file_name: &str) -> &str {
    let tail = file_name.rsplit('_').next().unwrap_or(file_name);
    tail.split('.').next().unwrap_or(tail)
}

fn read_sections(path: &Path) -> Result<Vec<Section>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)?;

    let mut sections: Vec<Section> = Vec::new();
    let mut current: Option<Section> = None;
    for line in content.lines() {
        if let Some(heading) = line.strip_prefix("### ") {
            if let Some(section) = current.take() {
                sections.push(section);
            }
            current = Some((format!("### {}", heading.trim()), Vec::new()));
        } else if let Some((_, lines)) = current.as_mut()
            && !line.trim().is_empty()
        {
            lines.push(format!("{line}\n"));
        }
    }
    if let Some(section) = current.take() {
        sections.push(section);
    }
    Ok(sections)
}

fn write_sections(path: &Path, cik: &Cik, kind: StorageKind, sections: &[Section]) -> Result<()> {
    let mut content = format!(
        "---\ntitle: CIK {cik} Data\nslug: /data/{cik}/{}/\n---\n\n",
        kind.as_str()
    );
    for (heading, lines) in sections {
        content.push_str(heading);
        content.push('\n');
        for line in lines {
            content.push_str(line);
        }
        content.push('\n');
    }
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cik() -> Cik {
        Cik::new("12927").unwrap()
    }

    #[test]
    fn first_append_creates_document_and_section() {
        let dir = tempfile::tempdir().unwrap();
        let index = IndexManager::new(dir.path());

        index
            .append(
                &cik(),
                StorageKind::Processed,
                "Liquidity",
                "0000012927_Liquidity_20240101000000.csv",
            )
            .unwrap();

        let document = index.document(&cik(), StorageKind::Processed).unwrap();
        assert!(document.starts_with("---\ntitle: CIK 0000012927 Data\n"));
        assert!(document.contains("slug: /data/0000012927/processed/"));
        assert!(document.contains("### Liquidity"));
        assert!(document.contains(
            "- [Liquidity 20240101000000](0000012927/processed/Liquidity/0000012927_Liquidity_20240101000000.csv)"
        ));
    }

    #[test]
    fn appends_accumulate_within_a_section() {
        let dir = tempfile::tempdir().unwrap();
        let index = IndexManager::new(dir.path());
        let cik = cik();

        for timestamp in ["20240101000000", "20240102000000"] {
            index
                .append(
                    &cik,
                    StorageKind::Processed,
                    "Liquidity",
                    &format!("0000012927_Liquidity_{timestamp}.csv"),
                )
                .unwrap();
        }

        let document = index.document(&cik, StorageKind::Processed).unwrap();
        assert_eq!(document.matches("### Liquidity").count(), 1);
        assert_eq!(document.matches("- [Liquidity ").count(), 2);
        assert!(document.contains("20240101000000"));
        assert!(document.contains("20240102000000"));
    }

    #[test]
    fn new_categories_get_their_own_sections() {
        let dir = tempfile::tempdir().unwrap();
        let index = IndexManager::new(dir.path());
        let cik = cik();

        index
            .append(
                &cik,
                StorageKind::Processed,
                "Liquidity",
                "0000012927_Liquidity_20240101000000.csv",
            )
            .unwrap();
        index
            .append(
                &cik,
                StorageKind::Processed,
                "Cash Flow",
                "0000012927_Cash_Flow_20240101000000.csv",
            )
            .unwrap();

        let categories = index.categories(&cik, StorageKind::Processed).unwrap();
        assert_eq!(categories, vec!["Liquidity", "Cash Flow"]);
    }

    #[test]
    fn missing_index_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let index = IndexManager::new(dir.path());

        let err = index.document(&cik(), StorageKind::Raw).unwrap_err();
        assert!(err.is_not_found());
    }
}
