//! Listing-style providers: Zillow-like, Realtor-like and MLS-like feeds.
//!
//! None of them has a production endpoint wired in, so each serves its own
//! deterministic mock shape through the matching converter.

use super::{ensure_enabled, DataSourceAdapter};
use crate::error::DataSourceError;
use crate::mock;
use crate::model::{DataSource, DataSourceConfig, DataSourceMetadata, FetchOptions, StandardMarketData};
use crate::zip::validate_zip;
use chrono::Utc;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListingProvider {
    Zillow,
    Realtor,
    Mls,
}

impl ListingProvider {
    pub const ALL: [ListingProvider; 3] = [Self::Zillow, Self::Realtor, Self::Mls];

    pub fn source(&self) -> DataSource {
        match self {
            Self::Zillow => DataSource::Zillow,
            Self::Realtor => DataSource::Realtor,
            Self::Mls => DataSource::Mls,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Zillow => "Zillow",
            Self::Realtor => "Realtor.com",
            Self::Mls => "Multiple Listing Service",
        }
    }

    fn api_version(&self) -> &'static str {
        match self {
            Self::Zillow => "v2",
            Self::Realtor | Self::Mls => "v1",
        }
    }
}

impl fmt::Display for ListingProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

pub struct ListingAdapter {
    provider: ListingProvider,
    config: DataSourceConfig,
}

impl ListingAdapter {
    pub fn new(provider: ListingProvider, config: DataSourceConfig) -> Self {
        Self { provider, config }
    }

    pub fn provider(&self) -> ListingProvider {
        self.provider
    }
}

impl DataSourceAdapter for ListingAdapter {
    fn source(&self) -> DataSource {
        self.provider.source()
    }

    fn config(&self) -> &DataSourceConfig {
        &self.config
    }

    fn fetch_data(
        &self,
        zip: &str,
        _options: &FetchOptions,
    ) -> Result<StandardMarketData, DataSourceError> {
        ensure_enabled(self.source(), &self.config)?;
        let zip = validate_zip(zip)?;

        let now = Utc::now();
        Ok(match self.provider {
            ListingProvider::Zillow => mock::zillow_to_standard(&mock::zillow(zip), zip, now),
            ListingProvider::Realtor => mock::realtor_to_standard(&mock::realtor(zip), zip, now),
            ListingProvider::Mls => mock::mls_to_standard(&mock::mls(zip), zip, now),
        })
    }

    fn test_connection(&self) -> bool {
        true
    }

    fn metadata(&self) -> DataSourceMetadata {
        DataSourceMetadata {
            name: self.provider.display_name().to_string(),
            source: self.source(),
            is_available: self.config.enabled,
            api_version: self.provider.api_version().to_string(),
        }
    }
}
