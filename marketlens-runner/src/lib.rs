//! MarketLens Runner: multi-source aggregation, caching, configuration, export.
//!
//! This crate builds on `marketlens-core` to provide:
//! - Parallel fan-out to every adapter with failure isolation
//! - Priority and confidence-weighted merge strategies
//! - Per-source quality scoring
//! - An in-memory response cache honoring per-source TTLs
//! - TOML sources file layered over defaults and environment
//! - JSON and CSV export

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod export;
pub mod merge;

pub use aggregator::{
    AggregateError, AggregatedMarketData, Aggregator, AggregatorConfig, SourceFailure,
};
pub use cache::ResponseCache;
pub use config::{ConfigError, SourceOverrides, SourcesFile};
pub use export::{export_csv, export_json, write_export, ExportFormat};
pub use merge::{MergeStrategy, QualityScore};
