//! Adapter capability contract and the source-tag factory.
//!
//! Every provider (Census, County Assessor, listing-style mocks) implements
//! `DataSourceAdapter`. The aggregator only sees trait objects, so providers
//! can be swapped or stubbed without touching the merge logic.

pub mod census;
pub mod county;
pub mod listing;

use crate::error::DataSourceError;
use crate::model::{DataSource, DataSourceConfig, DataSourceMetadata, FetchOptions, StandardMarketData};
use crate::transport::HttpTransport;
use std::sync::Arc;
use std::time::Duration;

pub use census::{CensusAdapter, CensusData};
pub use county::{
    calculate_appreciation_rate, county_to_standard, CountyApiConfig, CountyAssessorAdapter,
    CountyAssessorData, CountyEndpoints, CountyRegistry, PermitRecord, SaleRecord,
    ViolationRecord,
};
pub use listing::{ListingAdapter, ListingProvider};

/// Timeout for connectivity probes, independent of the fetch timeout.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

pub trait DataSourceAdapter: Send + Sync {
    fn source(&self) -> DataSource;

    fn config(&self) -> &DataSourceConfig;

    /// Fetch and normalize one ZIP code.
    ///
    /// Disabled adapters fail with `Disabled` before any I/O.
    fn fetch_data(
        &self,
        zip: &str,
        options: &FetchOptions,
    ) -> Result<StandardMarketData, DataSourceError>;

    /// Lightweight reachability check. Never fails; errors read as `false`.
    fn test_connection(&self) -> bool;

    fn metadata(&self) -> DataSourceMetadata;

    /// Enabled and reachable.
    fn is_available(&self) -> bool {
        self.config().enabled && self.test_connection()
    }
}

/// Fails with `Disabled` unless the config is enabled.
pub(crate) fn ensure_enabled(
    source: DataSource,
    config: &DataSourceConfig,
) -> Result<(), DataSourceError> {
    if config.enabled {
        Ok(())
    } else {
        Err(DataSourceError::Disabled { provider: source })
    }
}

/// Build the adapter for `source`.
pub fn create_adapter(
    source: DataSource,
    config: DataSourceConfig,
    transport: Arc<dyn HttpTransport>,
) -> Result<Box<dyn DataSourceAdapter>, DataSourceError> {
    match source {
        DataSource::Census => Ok(Box::new(CensusAdapter::new(config, transport))),
        DataSource::CountyAssessor => Ok(Box::new(CountyAssessorAdapter::new(
            config,
            CountyRegistry::builtin(),
            transport,
        ))),
        DataSource::Zillow => Ok(Box::new(ListingAdapter::new(ListingProvider::Zillow, config))),
        DataSource::Realtor => Ok(Box::new(ListingAdapter::new(ListingProvider::Realtor, config))),
        DataSource::Mls => Ok(Box::new(ListingAdapter::new(ListingProvider::Mls, config))),
        DataSource::Mock | DataSource::Aggregated => {
            Err(DataSourceError::NotAnAdapter { source_tag: source })
        }
    }
}

/// All five adapters in registration order, each with its config from `config_for`.
pub fn default_adapters(
    transport: Arc<dyn HttpTransport>,
    mut config_for: impl FnMut(DataSource) -> DataSourceConfig,
) -> Vec<Box<dyn DataSourceAdapter>> {
    DataSource::ADAPTERS
        .iter()
        .filter_map(|&source| create_adapter(source, config_for(source), transport.clone()).ok())
        .collect()
}
