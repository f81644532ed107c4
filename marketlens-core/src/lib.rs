//! MarketLens Core: per-ZIP housing market data model, adapters, and mock providers.
//!
//! This crate holds everything below the aggregator:
//! - `StandardMarketData`, source tags, per-source configuration
//! - Error taxonomy for adapters and the HTTP layer
//! - ZIP validation and the deterministic seeding utilities
//! - Mock provider shapes and their converters
//! - The `HttpTransport` seam and its `reqwest` implementation
//! - Census, County Assessor, and listing-style adapters plus the factory

pub mod adapter;
pub mod env;
pub mod error;
pub mod mock;
pub mod model;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
pub mod transport;
pub mod zip;

pub use adapter::{create_adapter, default_adapters, DataSourceAdapter};
pub use error::{DataSourceError, ErrorKind, TransportError};
pub use model::{
    DataSource, DataSourceConfig, DataSourceMetadata, FetchOptions, StandardMarketData,
};
pub use zip::validate_zip;
