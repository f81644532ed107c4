//! Multi-source aggregation.
//!
//! `fetch_aggregated` fans out to every registered adapter on the rayon pool,
//! waits for all of them to settle, substitutes mock records for failures when
//! asked to, enforces the minimum-sources threshold, then merges.

use chrono::Utc;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

use marketlens_core::error::ErrorKind;
use marketlens_core::{
    mock, validate_zip, DataSource, DataSourceAdapter, DataSourceError, DataSourceMetadata,
    FetchOptions, StandardMarketData,
};

use crate::cache::ResponseCache;
use crate::merge::{merge_priority, merge_weighted, Contribution, MergeStrategy, QualityScore};

/// Errors from the aggregator.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AggregateError {
    #[error(
        "insufficient data sources for ZIP {zip_code}: {succeeded} of {required} required succeeded \
         (attempted: {}; failed: {})",
        join_sources(.attempted),
        join_sources(.failed)
    )]
    InsufficientSources {
        zip_code: String,
        required: usize,
        succeeded: usize,
        attempted: Vec<DataSource>,
        failed: Vec<DataSource>,
    },

    #[error("invalid ZIP code '{0}': expected exactly 5 digits")]
    InvalidZip(String),

    #[error("no adapters registered")]
    NoAdapters,
}

fn join_sources(sources: &[DataSource]) -> String {
    if sources.is_empty() {
        return "none".to_string();
    }
    sources
        .iter()
        .map(DataSource::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AggregatorConfig {
    pub strategy: MergeStrategy,
    pub minimum_sources: usize,
    /// Replace a failed source with its deterministic mock record.
    pub mock_fallback: bool,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            strategy: MergeStrategy::Priority,
            minimum_sources: 1,
            mock_fallback: false,
        }
    }
}

/// One adapter that did not produce a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFailure {
    pub source: DataSource,
    pub kind: String,
    pub retryable: bool,
    pub message: String,
}

impl SourceFailure {
    fn from_error(source: DataSource, err: &DataSourceError) -> Self {
        Self {
            source,
            kind: err.kind().as_str().to_string(),
            retryable: err.is_retryable(),
            message: err.to_string(),
        }
    }
}

/// Merged record plus provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedMarketData {
    pub data: StandardMarketData,
    /// Contributing sources in registration order. A mock stand-in is listed
    /// under the adapter it replaced.
    pub sources: Vec<DataSource>,
    pub quality_scores: BTreeMap<DataSource, QualityScore>,
    pub failures: Vec<SourceFailure>,
}

impl AggregatedMarketData {
    /// Quality of the source whose values won the merge. Merged and mock
    /// records are scored on the spot.
    pub fn winning_quality(&self) -> QualityScore {
        self.quality_scores
            .get(&self.data.data_source)
            .copied()
            .unwrap_or_else(|| QualityScore::of(&self.data))
    }
}

/// Owns the adapters and the response cache.
pub struct Aggregator {
    adapters: Vec<Box<dyn DataSourceAdapter>>,
    config: AggregatorConfig,
    cache: ResponseCache,
}

impl Aggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        Self {
            adapters: Vec::new(),
            config,
            cache: ResponseCache::new(),
        }
    }

    pub fn with_adapters(config: AggregatorConfig, adapters: Vec<Box<dyn DataSourceAdapter>>) -> Self {
        let mut aggregator = Self::new(config);
        for adapter in adapters {
            aggregator.register(adapter);
        }
        aggregator
    }

    /// Append an adapter. Registration order breaks priority ties.
    pub fn register(&mut self, adapter: Box<dyn DataSourceAdapter>) {
        self.adapters.push(adapter);
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn sources(&self) -> Vec<DataSource> {
        self.adapters.iter().map(|a| a.source()).collect()
    }

    fn fetch_one(
        &self,
        adapter: &dyn DataSourceAdapter,
        zip: &str,
        options: &FetchOptions,
    ) -> Result<StandardMarketData, DataSourceError> {
        let source = adapter.source();
        if !options.bypass_cache {
            if let Some(hit) = self.cache.get(source, zip) {
                tracing::debug!(source = %source, zip, "cache hit");
                return Ok(hit);
            }
        }

        let record = adapter.fetch_data(zip, options)?;
        self.cache.insert(
            source,
            zip,
            record.clone(),
            Duration::from_millis(adapter.config().cache_ttl_ms),
        );
        Ok(record)
    }

    /// Fetch from every adapter and merge.
    pub fn fetch_aggregated(
        &self,
        zip: &str,
        options: &FetchOptions,
    ) -> Result<AggregatedMarketData, AggregateError> {
        let zip = validate_zip(zip).map_err(|_| AggregateError::InvalidZip(zip.to_string()))?;
        if self.adapters.is_empty() {
            return Err(AggregateError::NoAdapters);
        }

        // Collects in registration order regardless of completion order.
        let results: Vec<(DataSource, u32, Result<StandardMarketData, DataSourceError>)> = self
            .adapters
            .par_iter()
            .map(|adapter| {
                let adapter = adapter.as_ref();
                (
                    adapter.source(),
                    adapter.config().priority,
                    self.fetch_one(adapter, zip, options),
                )
            })
            .collect();

        let attempted: Vec<DataSource> = results.iter().map(|(s, _, _)| *s).collect();
        let mut contributions = Vec::new();
        let mut failures = Vec::new();

        for (source, priority, result) in results {
            match result {
                Ok(record) => contributions.push(Contribution::new(source, priority, record)),
                Err(err) => {
                    tracing::warn!(
                        source = %source,
                        zip,
                        kind = err.kind().as_str(),
                        retryable = err.is_retryable(),
                        error = %err,
                        "adapter failed"
                    );
                    failures.push(SourceFailure::from_error(source, &err));

                    if self.config.mock_fallback && err.kind() != ErrorKind::InvalidInput {
                        if let Some(mut record) = mock::mock_standard(source, zip, Utc::now()) {
                            record.data_source = DataSource::Mock;
                            contributions.push(Contribution::fallback(source, priority, record));
                        }
                    }
                }
            }
        }

        if contributions.len() < self.config.minimum_sources {
            return Err(AggregateError::InsufficientSources {
                zip_code: zip.to_string(),
                required: self.config.minimum_sources,
                succeeded: contributions.len(),
                attempted,
                failed: failures.iter().map(|f| f.source).collect(),
            });
        }

        let merged = match self.config.strategy {
            MergeStrategy::Priority => merge_priority(&contributions),
            MergeStrategy::WeightedAverage => merge_weighted(zip, &contributions),
        };
        let data = merged.ok_or_else(|| AggregateError::InsufficientSources {
            zip_code: zip.to_string(),
            required: self.config.minimum_sources.max(1),
            succeeded: 0,
            attempted: attempted.clone(),
            failed: failures.iter().map(|f| f.source).collect(),
        })?;

        let quality_scores: BTreeMap<DataSource, QualityScore> = contributions
            .iter()
            .map(|c| (c.source, QualityScore::of(&c.record)))
            .collect();

        tracing::info!(
            zip,
            strategy = %self.config.strategy,
            succeeded = contributions.len(),
            failed = failures.len(),
            "aggregation complete"
        );

        Ok(AggregatedMarketData {
            data,
            sources: contributions.iter().map(|c| c.source).collect(),
            quality_scores,
            failures,
        })
    }

    /// Metadata and live availability for every adapter, in registration order.
    pub fn probe_all(&self) -> Vec<(DataSourceMetadata, bool)> {
        self.adapters
            .par_iter()
            .map(|a| (a.metadata(), a.is_available()))
            .collect()
    }
}
