//! The per-entity processing pipeline.
//!
//! One flow per entity: fetch facts, persist the raw table, then per
//! category build the normalized view, derive ratios, persist both, update
//! the index, write chart data and optionally upload to the configured
//! sink. Entities run as independent flows over one shared client.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{error, info, warn};

use filings_core::{
    Category, Cik, DatasetSink, FactTable, PipelineConfig, PipelineError, RAW_FACTS_CATEGORY,
    Result, StockPriceProvider, StockPrices, StorageKind,
};
use filings_edgar::{EdgarClient, EndpointReport};
use filings_normalize::{MetricSelection, NormalizedFacts, PeriodNormalizer, normalizer_for};
use filings_ratios::RatioEngine;
use filings_store::{ArtifactStore, IndexManager, TIMESTAMP_FORMAT};

use crate::charts;

/// Outcome of one category within an entity run.
#[derive(Debug)]
pub struct CategoryOutcome {
    /// The category processed.
    pub category: Category,
    /// Rows in the processed dataset.
    pub rows: usize,
    /// File name of the processed artifact, when one was written.
    pub artifact: Option<String>,
    /// Whether the dataset reached the configured sink.
    pub uploaded: bool,
    /// The failure that stopped this category, if any.
    pub error: Option<String>,
}

impl CategoryOutcome {
    fn failed(category: Category, err: &PipelineError) -> Self {
        Self {
            category,
            rows: 0,
            artifact: None,
            uploaded: false,
            error: Some(err.to_string()),
        }
    }

    /// Returns true when the category produced an artifact.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary of one entity's pipeline run.
#[derive(Debug)]
pub struct EntityReport {
    /// The entity processed.
    pub cik: Cik,
    /// Display name from the facts payload.
    pub entity_name: String,
    /// Timestamp of the underlying API response; also the artifact version.
    pub fetched_at: DateTime<Utc>,
    /// Facts flattened from the payload.
    pub fact_count: usize,
    /// File name of the raw fact-table artifact.
    pub raw_artifact: String,
    /// Per-category outcomes, one per [`Category`].
    pub categories: Vec<CategoryOutcome>,
}

impl EntityReport {
    /// Categories that failed in this run.
    #[must_use]
    pub fn failed_categories(&self) -> Vec<Category> {
        self.categories
            .iter()
            .filter(|outcome| !outcome.is_ok())
            .map(|outcome| outcome.category)
            .collect()
    }
}

/// The ingestion-normalization-aggregation-persistence pipeline.
///
/// # Example
/// ```no_run
/// use filings::{Cik, FilingsPipeline, PipelineConfig};
///
/// # async fn example() -> filings::Result<()> {
/// let config = PipelineConfig::new("data", "MyApp/1.0 (contact@example.com)");
/// let pipeline = FilingsPipeline::new(config);
///
/// let cik = Cik::new("12927")?;
/// let report = pipeline.process_entity(&cik).await?;
/// println!("{}: {} facts", report.entity_name, report.fact_count);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FilingsPipeline {
    config: PipelineConfig,
    client: EdgarClient,
    sink: Option<Arc<dyn DatasetSink>>,
    price_provider: Option<Arc<dyn StockPriceProvider>>,
}

impl FilingsPipeline {
    /// Creates a pipeline from its configuration.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        let client = EdgarClient::with_options(
            &config.user_agent,
            config.cache_ttl,
            config.cooldown_buffer,
        );
        Self {
            config,
            client,
            sink: None,
            price_provider: None,
        }
    }

    /// Attaches a warehouse sink; every processed dataset is uploaded to it.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn DatasetSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Attaches an external stock price source for the market-valuation
    /// category.
    #[must_use]
    pub fn with_price_provider(mut self, provider: Arc<dyn StockPriceProvider>) -> Self {
        self.price_provider = Some(provider);
        self
    }

    /// The underlying API client.
    #[must_use]
    pub const fn client(&self) -> &EdgarClient {
        &self.client
    }

    /// The configuration this pipeline runs with.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Probes the API endpoints for an entity without erroring.
    pub async fn preflight(&self, cik: &Cik) -> EndpointReport {
        self.client.preflight(cik).await
    }

    /// Runs the full flow for one entity: fetch, store raw, then normalize
    /// and aggregate every category.
    pub async fn process_entity(&self, cik: &Cik) -> Result<EntityReport> {
        info!(cik = %cik, "processing entity");
        let table = self.client.fetch_company_facts(cik).await?;
        self.process_table(&table).await
    }

    /// Runs several entities as independent concurrent flows over the
    /// shared client.
    pub async fn process_entities(&self, ciks: &[Cik]) -> Vec<Result<EntityReport>> {
        join_all(ciks.iter().map(|cik| self.process_entity(cik))).await
    }

    /// Runs the storage-and-aggregation flow for an already-fetched fact
    /// table.
    ///
    /// Artifacts are stamped with the table's fetch timestamp, so
    /// re-processing the same fetch resolves to the same file names and the
    /// at-most-once write semantics make it idempotent. Per-category
    /// failures are collected into the report; only fatal (configuration)
    /// errors abort the run.
    pub async fn process_table(&self, table: &FactTable) -> Result<EntityReport> {
        let cik = &table.cik;
        let timestamp = table.fetched_at.format(TIMESTAMP_FORMAT).to_string();

        let store = ArtifactStore::new(&self.config.storage_root, cik.clone())?;
        let index = IndexManager::new(&self.config.storage_root);

        let mut raw = table.to_dataframe()?;
        let raw_artifact = store.store_at(&mut raw, StorageKind::Raw, RAW_FACTS_CATEGORY, &timestamp)?;
        index.append(cik, StorageKind::Raw, RAW_FACTS_CATEGORY, &raw_artifact)?;

        let normalizer = normalizer_for(self.config.period_type);
        let mut categories = Vec::with_capacity(Category::ALL.len());
        for category in Category::ALL {
            match self
                .run_category(category, table, normalizer.as_ref(), &store, &index, &timestamp)
                .await
            {
                Ok(outcome) => categories.push(outcome),
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    error!(
                        cik = %cik,
                        category = %category,
                        timestamp = %timestamp,
                        error = %err,
                        "category failed"
                    );
                    categories.push(CategoryOutcome::failed(category, &err));
                }
            }
        }

        Ok(EntityReport {
            cik: cik.clone(),
            entity_name: table.entity_name.clone(),
            fetched_at: table.fetched_at,
            fact_count: table.len(),
            raw_artifact,
            categories,
        })
    }

    async fn run_category(
        &self,
        category: Category,
        table: &FactTable,
        normalizer: &dyn PeriodNormalizer,
        store: &ArtifactStore,
        index: &IndexManager,
        timestamp: &str,
    ) -> Result<CategoryOutcome> {
        let selection = MetricSelection::from(category.required_metrics());
        let view = normalizer.normalize(&table.facts, &selection)?;

        let mut preprocessed = view.to_dataframe()?;
        let pre_name =
            store.store_at(&mut preprocessed, StorageKind::Preprocessed, category.name(), timestamp)?;
        index.append(&table.cik, StorageKind::Preprocessed, category.name(), &pre_name)?;

        let engine = self.engine_for(category, &view).await;
        let mut output = engine.compute(category, &view)?;
        let artifact =
            store.store_at(&mut output, StorageKind::Processed, category.name(), timestamp)?;
        index.append(&table.cik, StorageKind::Processed, category.name(), &artifact)?;

        for (chart_type, value) in charts::category_charts(&output)? {
            store.store_chart_json(
                &value,
                StorageKind::Processed,
                category.name(),
                chart_type,
                timestamp,
            )?;
        }

        let mut uploaded = false;
        if let Some(sink) = &self.sink {
            match sink.upload(&output, category).await {
                Ok(()) => uploaded = true,
                Err(err) => {
                    warn!(
                        cik = %table.cik,
                        category = %category,
                        sink = sink.name(),
                        error = %err,
                        "sink upload failed"
                    );
                }
            }
        }

        Ok(CategoryOutcome {
            category,
            rows: output.height(),
            artifact: Some(artifact),
            uploaded,
            error: None,
        })
    }

    /// Builds the engine for one category, prefetching prices for the
    /// market-valuation join when a provider is attached. A failed price
    /// lookup degrades to absence, never to a category failure.
    async fn engine_for(&self, category: Category, view: &NormalizedFacts) -> RatioEngine {
        if category != Category::MarketValuation {
            return RatioEngine::new();
        }
        let Some(provider) = &self.price_provider else {
            return RatioEngine::new();
        };

        let mut prices = StockPrices::new();
        let mut seen = BTreeSet::new();
        for row in view.rows() {
            if !seen.insert((row.fact.cik.clone(), row.fact.end)) {
                continue;
            }
            match provider.price_on(&row.fact.cik, row.fact.end).await {
                Ok(Some(price)) => prices.insert(row.fact.cik.clone(), row.fact.end, price),
                Ok(None) => {}
                Err(err) => {
                    warn!(
                        cik = %row.fact.cik,
                        date = %row.fact.end,
                        error = %err,
                        "price lookup failed"
                    );
                }
            }
        }
        RatioEngine::new().with_prices(prices)
    }

    /// Path of the newest artifact for a (kind, category).
    pub fn latest(&self, cik: &Cik, kind: StorageKind, category: &str) -> Result<PathBuf> {
        ArtifactStore::new(&self.config.storage_root, cik.clone())?.latest(kind, category)
    }

    /// Every artifact for a (kind, category), oldest to newest.
    pub fn history(&self, cik: &Cik, kind: StorageKind, category: &str) -> Result<Vec<PathBuf>> {
        ArtifactStore::new(&self.config.storage_root, cik.clone())?.history(kind, category)
    }

    /// The raw index document for an entity and kind.
    pub fn index_document(&self, cik: &Cik, kind: StorageKind) -> Result<String> {
        IndexManager::new(&self.config.storage_root).document(cik, kind)
    }

    /// Categories with indexed artifacts for an entity and kind.
    pub fn categories(&self, cik: &Cik, kind: StorageKind) -> Result<Vec<String>> {
        IndexManager::new(&self.config.storage_root).categories(cik, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use filings_core::Fact;
    use std::sync::Mutex;

    const ENTITY: &str = "Caterpillar Inc.";

    fn cik() -> Cik {
        Cik::new("12927").unwrap()
    }

    fn fact(metric: &str, value: f64) -> Fact {
        let end = NaiveDate::from_ymd_opt(2022, 12, 31).unwrap();
        Fact::new(ENTITY, cik(), metric, end, value)
            .with_form("10-K")
            .with_frame("CY2022Q4I")
    }

    fn table() -> FactTable {
        FactTable::new(
            ENTITY,
            cik(),
            vec![
                fact("AssetsCurrent", 500_000_000.0),
                fact("LiabilitiesCurrent", 250_000_000.0),
                fact("NetIncomeLoss", 10_000_000.0),
                fact("Revenues", 0.0),
            ],
        )
    }

    fn pipeline(root: &std::path::Path) -> FilingsPipeline {
        FilingsPipeline::new(PipelineConfig::new(root, "Test/1.0 (test@example.com)"))
    }

    #[derive(Debug, Default)]
    struct RecordingSink {
        uploads: Mutex<Vec<Category>>,
    }

    #[async_trait]
    impl DatasetSink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        async fn upload(
            &self,
            _dataset: &polars::prelude::DataFrame,
            category: Category,
        ) -> Result<()> {
            self.uploads.lock().unwrap().push(category);
            Ok(())
        }
    }

    #[tokio::test]
    async fn process_table_persists_every_storage_kind() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path());

        let report = pipeline.process_table(&table()).await.unwrap();

        assert_eq!(report.fact_count, 4);
        assert_eq!(report.categories.len(), Category::ALL.len());
        assert!(report.failed_categories().is_empty());

        let raw = pipeline
            .latest(&cik(), StorageKind::Raw, RAW_FACTS_CATEGORY)
            .unwrap();
        assert!(raw.is_file());

        let processed = pipeline
            .latest(&cik(), StorageKind::Processed, "Liquidity")
            .unwrap();
        let content = std::fs::read_to_string(processed).unwrap();
        assert!(content.contains("CurrentRatio"));
        assert!(content.contains("Q4-2022"));
    }

    #[tokio::test]
    async fn reprocessing_the_same_fetch_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path());
        let table = table();

        let first = pipeline.process_table(&table).await.unwrap();
        let second = pipeline.process_table(&table).await.unwrap();
        assert_eq!(first.raw_artifact, second.raw_artifact);

        let history = pipeline
            .history(&cik(), StorageKind::Processed, "Liquidity")
            .unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn index_discovers_processed_categories() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path());

        pipeline.process_table(&table()).await.unwrap();

        let categories = pipeline.categories(&cik(), StorageKind::Processed).unwrap();
        assert_eq!(categories.len(), Category::ALL.len());
        assert!(categories.iter().any(|c| c == "Liquidity"));

        let document = pipeline.index_document(&cik(), StorageKind::Raw).unwrap();
        assert!(document.contains("### Company Facts"));
    }

    #[tokio::test]
    async fn every_processed_dataset_reaches_the_sink() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(RecordingSink::default());
        let pipeline = pipeline(dir.path()).with_sink(sink.clone());

        let report = pipeline.process_table(&table()).await.unwrap();

        assert!(report.categories.iter().all(|outcome| outcome.uploaded));
        assert_eq!(sink.uploads.lock().unwrap().len(), Category::ALL.len());
    }

    #[tokio::test]
    async fn first_run_lookups_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path());

        let err = pipeline
            .latest(&cik(), StorageKind::Processed, "Liquidity")
            .unwrap_err();
        assert!(err.is_not_found());

        let err = pipeline.index_document(&cik(), StorageKind::Raw).unwrap_err();
        assert!(err.is_not_found());
    }
}
