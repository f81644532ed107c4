//! Shared market data record, source tags, and per-adapter configuration.
//!
//! Every adapter normalizes its provider's payload into `StandardMarketData`.
//! All fields are non-optional: a provider that lacks a datum fills it with a
//! documented default (0, `"Unknown"`, or a seeded filler) so downstream
//! consumers never see a hole.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Placeholder used for city/state when a provider has no geocoding.
pub const UNKNOWN: &str = "Unknown";

/// Where a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Census,
    CountyAssessor,
    Zillow,
    Realtor,
    Mls,
    /// Synthetic stand-in produced by the aggregator's mock fallback.
    Mock,
    /// Result of merging several sources.
    Aggregated,
}

impl DataSource {
    /// Adapter-backed sources, in default registration order.
    pub const ADAPTERS: [DataSource; 5] = [
        DataSource::Census,
        DataSource::CountyAssessor,
        DataSource::Zillow,
        DataSource::Realtor,
        DataSource::Mls,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Census => "census",
            DataSource::CountyAssessor => "county_assessor",
            DataSource::Zillow => "zillow",
            DataSource::Realtor => "realtor",
            DataSource::Mls => "mls",
            DataSource::Mock => "mock",
            DataSource::Aggregated => "aggregated",
        }
    }

    /// Upper-case tag used in environment variable names (`MARKETLENS_<TAG>_...`).
    pub fn env_tag(&self) -> String {
        self.as_str().to_ascii_uppercase()
    }

    pub fn is_adapter(&self) -> bool {
        Self::ADAPTERS.contains(self)
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "census" => Ok(DataSource::Census),
            "county_assessor" | "county" => Ok(DataSource::CountyAssessor),
            "zillow" => Ok(DataSource::Zillow),
            "realtor" => Ok(DataSource::Realtor),
            "mls" => Ok(DataSource::Mls),
            "mock" => Ok(DataSource::Mock),
            "aggregated" => Ok(DataSource::Aggregated),
            other => Err(format!(
                "unknown data source '{other}'. Valid: census, county_assessor, zillow, realtor, mls"
            )),
        }
    }
}

/// The normalized per-ZIP housing record shared by every adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardMarketData {
    pub zip_code: String,
    pub city: String,
    pub state: String,

    pub median_rent: f64,
    pub median_price: f64,
    /// Percent change over the trailing 12 months.
    pub rent_growth_12mo: f64,
    /// Percent change over the trailing 12 months.
    pub appreciation_rate_12mo: f64,

    /// Percent of housing units vacant.
    pub vacancy_rate: f64,
    pub days_on_market: f64,
    /// Percent.
    pub foreclosure_rate: f64,

    pub economic_diversity_index: f64,
    pub crime_safety_score: f64,
    pub school_rating: f64,

    pub date_updated: DateTime<Utc>,
    pub data_source: DataSource,
    /// Provider reliability, 0–100. Fixed per provider, not computed.
    pub confidence: u8,
}

impl StandardMarketData {
    /// Number of content fields considered by quality scoring
    /// (the numeric metrics plus city and state). Confidence is scored
    /// separately and is not a content field.
    pub const CONTENT_FIELDS: usize = 12;

    /// The ten numeric metrics as `(name, value)` pairs.
    pub fn numeric_fields(&self) -> [(&'static str, f64); 10] {
        [
            ("median_rent", self.median_rent),
            ("median_price", self.median_price),
            ("rent_growth_12mo", self.rent_growth_12mo),
            ("appreciation_rate_12mo", self.appreciation_rate_12mo),
            ("vacancy_rate", self.vacancy_rate),
            ("days_on_market", self.days_on_market),
            ("foreclosure_rate", self.foreclosure_rate),
            ("economic_diversity_index", self.economic_diversity_index),
            ("crime_safety_score", self.crime_safety_score),
            ("school_rating", self.school_rating),
        ]
    }

    /// Mutable access to a numeric metric by name.
    pub fn metric_mut(&mut self, name: &str) -> Option<&mut f64> {
        match name {
            "median_rent" => Some(&mut self.median_rent),
            "median_price" => Some(&mut self.median_price),
            "rent_growth_12mo" => Some(&mut self.rent_growth_12mo),
            "appreciation_rate_12mo" => Some(&mut self.appreciation_rate_12mo),
            "vacancy_rate" => Some(&mut self.vacancy_rate),
            "days_on_market" => Some(&mut self.days_on_market),
            "foreclosure_rate" => Some(&mut self.foreclosure_rate),
            "economic_diversity_index" => Some(&mut self.economic_diversity_index),
            "crime_safety_score" => Some(&mut self.crime_safety_score),
            "school_rating" => Some(&mut self.school_rating),
            _ => None,
        }
    }

    /// Count of content fields holding a non-default value.
    pub fn populated_fields(&self) -> usize {
        let numeric = self
            .numeric_fields()
            .iter()
            .filter(|(_, v)| *v != 0.0 && v.is_finite())
            .count();
        let city = usize::from(has_place(&self.city));
        let state = usize::from(has_place(&self.state));
        numeric + city + state
    }

    /// True if every field carries a usable value (finite numbers, non-empty
    /// identifiers, confidence within 0–100).
    pub fn is_complete(&self) -> bool {
        self.numeric_fields().iter().all(|(_, v)| v.is_finite())
            && !self.zip_code.is_empty()
            && !self.city.is_empty()
            && !self.state.is_empty()
            && self.confidence <= 100
    }
}

/// True if a city/state value is an actual place rather than a placeholder.
pub fn has_place(value: &str) -> bool {
    !value.is_empty() && value != UNKNOWN
}

fn default_enabled() -> bool {
    true
}

/// Per-adapter settings. Built once per adapter; use the `with_*` builders to
/// derive a reconfigured copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourceConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: String,
    pub timeout_ms: u64,
    pub retry_attempts: u32,
    pub cache_ttl_ms: u64,
    /// Lower is more authoritative.
    pub priority: u32,
}

const HOUR_MS: u64 = 60 * 60 * 1000;
const DAY_MS: u64 = 24 * HOUR_MS;

impl DataSourceConfig {
    /// Built-in defaults for an adapter-backed source.
    pub fn defaults_for(source: DataSource) -> Self {
        let (base_url, timeout_ms, retry_attempts, cache_ttl_ms, priority) = match source {
            DataSource::Census => ("https://api.census.gov/data", 15_000, 3, 7 * DAY_MS, 3),
            DataSource::CountyAssessor => ("", 20_000, 3, DAY_MS, 2),
            DataSource::Zillow => ("", 10_000, 2, HOUR_MS, 4),
            DataSource::Mls => ("", 10_000, 2, HOUR_MS, 5),
            DataSource::Realtor => ("", 10_000, 2, HOUR_MS, 6),
            DataSource::Mock | DataSource::Aggregated => ("", 10_000, 0, 0, u32::MAX),
        };
        Self {
            enabled: true,
            api_key: None,
            base_url: base_url.to_string(),
            timeout_ms,
            retry_attempts,
            cache_ttl_ms,
            priority,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    pub fn with_cache_ttl_ms(mut self, ttl_ms: u64) -> Self {
        self.cache_ttl_ms = ttl_ms;
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }
}

/// Descriptive, read-only information about an adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceMetadata {
    pub name: String,
    pub source: DataSource,
    /// Mirrors the adapter's `enabled` flag; this is not a live probe.
    pub is_available: bool,
    pub api_version: String,
}

/// Per-call options for a fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Replaces the adapter's configured timeout for this call only.
    pub timeout_override: Option<Duration>,
    /// Skip the aggregator's response cache and always hit the adapter.
    pub bypass_cache: bool,
}

impl FetchOptions {
    pub fn effective_timeout(&self, config: &DataSourceConfig) -> Duration {
        self.timeout_override.unwrap_or_else(|| config.timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> StandardMarketData {
        StandardMarketData {
            zip_code: "90210".into(),
            city: UNKNOWN.into(),
            state: UNKNOWN.into(),
            median_rent: 2500.0,
            median_price: 0.0,
            rent_growth_12mo: 1.5,
            appreciation_rate_12mo: 0.0,
            vacancy_rate: 4.0,
            days_on_market: 0.0,
            foreclosure_rate: 0.0,
            economic_diversity_index: 50.0,
            crime_safety_score: 0.0,
            school_rating: 0.0,
            date_updated: Utc::now(),
            data_source: DataSource::Census,
            confidence: 95,
        }
    }

    #[test]
    fn source_tags_round_trip_through_from_str() {
        for source in DataSource::ADAPTERS {
            assert_eq!(source.as_str().parse::<DataSource>().unwrap(), source);
        }
        assert_eq!("county".parse::<DataSource>().unwrap(), DataSource::CountyAssessor);
        assert_eq!("County-Assessor".parse::<DataSource>().unwrap(), DataSource::CountyAssessor);
        assert!("redfin".parse::<DataSource>().is_err());
    }

    #[test]
    fn populated_fields_ignores_zeros_and_placeholders() {
        let r = record();
        // rent, growth, vacancy, diversity
        assert_eq!(r.populated_fields(), 4);
    }

    #[test]
    fn confidence_is_not_a_content_field() {
        let mut r = record();
        let before = r.populated_fields();
        r.confidence = 0;
        assert_eq!(r.populated_fields(), before);
        assert!(r.numeric_fields().iter().all(|(name, _)| *name != "confidence"));
        assert_eq!(
            StandardMarketData::CONTENT_FIELDS,
            r.numeric_fields().len() + 2
        );
    }

    #[test]
    fn record_serializes_with_camel_case_keys() {
        let json = serde_json::to_value(record()).unwrap();
        assert!(json.get("zipCode").is_some());
        assert!(json.get("appreciationRate12mo").is_some());
        assert_eq!(json["dataSource"], "census");
    }

    #[test]
    fn defaults_follow_source_priorities() {
        let county = DataSourceConfig::defaults_for(DataSource::CountyAssessor);
        let census = DataSourceConfig::defaults_for(DataSource::Census);
        assert!(county.priority < census.priority);
        assert_eq!(census.timeout(), Duration::from_secs(15));
        assert_eq!(census.cache_ttl(), Duration::from_secs(7 * 24 * 60 * 60));
    }

    #[test]
    fn partial_toml_fields_fall_back_on_serde_defaults() {
        let cfg: DataSourceConfig = serde_json::from_str(
            r#"{"timeout_ms": 5000, "retry_attempts": 1, "cache_ttl_ms": 0, "priority": 9}"#,
        )
        .unwrap();
        assert!(cfg.enabled);
        assert!(cfg.api_key.is_none());
        assert!(cfg.base_url.is_empty());
    }

    #[test]
    fn timeout_override_wins() {
        let cfg = DataSourceConfig::defaults_for(DataSource::Census);
        let opts = FetchOptions {
            timeout_override: Some(Duration::from_millis(250)),
            bypass_cache: false,
        };
        assert_eq!(opts.effective_timeout(&cfg), Duration::from_millis(250));
        assert_eq!(FetchOptions::default().effective_timeout(&cfg), cfg.timeout());
    }
}
