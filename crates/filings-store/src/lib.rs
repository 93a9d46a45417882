#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/filingsworks/filings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Storage and versioning for pipeline artifacts.
//!
//! - [`ArtifactStore`] - timestamped CSV/JSON persistence with at-most-once
//!   writes and newest-by-modification-time lookup
//! - [`IndexManager`] - the per-entity, section-per-category `index.md`
//!   catalog of produced artifacts

/// Timestamped dataset persistence.
pub mod artifact;
/// Per-entity artifact index.
pub mod index;

pub use artifact::{ArtifactStore, TIMESTAMP_FORMAT};
pub use index::IndexManager;
