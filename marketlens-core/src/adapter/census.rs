//! US Census Bureau adapter (ACS 5-year estimates by ZCTA).
//!
//! One request per ZIP asks for a fixed list of ACS variables. The response
//! is a two-row array of arrays: a header row of variable codes and a value
//! row. Vacancy, unemployment, and degree counts are derived from it; the
//! diversity and safety blends below are heuristic constants and must stay
//! literal. Fields ACS does not carry are filled from the seeded sine filler.
//!
//! This adapter never falls back to mock data; failures surface to the caller.

use super::{ensure_enabled, DataSourceAdapter, PROBE_TIMEOUT};
use crate::error::{DataSourceError, TransportError};
use crate::mock::seed::{filler, zip_to_seed};
use crate::model::{
    DataSource, DataSourceConfig, DataSourceMetadata, FetchOptions, StandardMarketData, UNKNOWN,
};
use crate::transport::{HttpRequest, HttpTransport};
use crate::zip::validate_zip;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub const CENSUS_CONFIDENCE: u8 = 95;
const ACS_YEAR: i32 = 2021;
const PROBE_ZIP: &str = "90210";
/// Ceiling on a single backoff sleep, before jitter.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// ACS variables requested in one call.
pub const ACS_VARIABLES: [&str; 14] = [
    "NAME",
    "B01003_001E", // total population
    "B19013_001E", // median household income
    "B25077_001E", // median home value
    "B25064_001E", // median gross rent
    "B25003_001E", // housing units
    "B25003_002E", // owner occupied
    "B25003_003E", // renter occupied
    "B23025_005E", // unemployed
    "B23025_003E", // civilian labor force
    "B15003_022E", // bachelor's
    "B15003_023E", // master's
    "B15003_024E", // professional
    "B15003_025E", // doctorate
];

/// Parsed ACS response for one ZCTA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CensusData {
    pub geoid: String,
    pub name: String,
    pub population: i64,
    /// Not requested; always 0.
    pub median_age: f64,
    pub median_income: i64,
    pub total_housing_units: i64,
    pub occupied_housing_units: i64,
    /// Percent.
    pub vacancy_rate: f64,
    pub median_home_value: i64,
    pub median_gross_rent: i64,
    /// Percent.
    pub unemployment_rate: f64,
    /// Not requested; always 0.
    pub poverty_rate: f64,
    /// Count of residents holding a bachelor's degree or higher.
    pub bachelors_or_higher: i64,
    pub year: i32,
}

/// `min(100, (100 - unemployment*8)*0.5 + bachelors_or_higher*0.5)`.
pub fn economic_diversity_index(unemployment_rate: f64, bachelors_or_higher: f64) -> f64 {
    ((100.0 - unemployment_rate * 8.0) * 0.5 + bachelors_or_higher * 0.5).min(100.0)
}

/// `clamp(100 - poverty*3 - unemployment*5, 0, 100)`.
pub fn safety_score(poverty_rate: f64, unemployment_rate: f64) -> f64 {
    (100.0 - poverty_rate * 3.0 - unemployment_rate * 5.0).clamp(0.0, 100.0)
}

/// Leading-integer parse: optional sign then digits, anything else is 0.
fn parse_leading_int(raw: &str) -> i64 {
    let s = raw.trim_start();
    let (sign, digits) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().map(|v| sign * v).unwrap_or(0)
}

fn cell_to_string(cell: Option<&Value>) -> String {
    match cell {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "0".to_string(),
    }
}

/// `base * 2^(attempt-1)`, saturating and capped at `MAX_RETRY_DELAY`.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.checked_pow(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
    base.saturating_mul(factor).min(MAX_RETRY_DELAY)
}

pub struct CensusAdapter {
    config: DataSourceConfig,
    transport: Arc<dyn HttpTransport>,
    base_delay: Duration,
}

impl CensusAdapter {
    pub fn new(config: DataSourceConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            config,
            transport,
            base_delay: Duration::from_millis(500),
        }
    }

    /// Override the retry backoff base (tests use zero).
    pub fn with_retry_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    fn acs_request(&self, zip: &str, timeout: Duration) -> HttpRequest {
        HttpRequest::get(
            format!("{}/{ACS_YEAR}/acs/acs5", self.config.base_url.trim_end_matches('/')),
            timeout,
        )
        .query("get", ACS_VARIABLES.join(","))
        .query("for", format!("zip code tabulation area:{zip}"))
        .query("key", self.config.api_key.clone().unwrap_or_default())
    }

    /// One ACS call, no retries.
    fn fetch_acs(&self, zip: &str, timeout: Duration) -> Result<Value, TransportError> {
        let body = self.transport.get_json(&self.acs_request(zip, timeout))?;
        match body.as_array() {
            Some(rows) if rows.len() >= 2 => Ok(body),
            _ => Err(TransportError::Body(
                "expected header row and value row".into(),
            )),
        }
    }

    /// ACS call with exponential backoff on transient transport failures.
    fn fetch_with_retry(&self, zip: &str, timeout: Duration) -> Result<Value, DataSourceError> {
        let mut last_error = None;

        for attempt in 0..=self.config.retry_attempts {
            if attempt > 0 {
                let delay = backoff_delay(self.base_delay, attempt);
                let jitter_ms = rand::thread_rng().gen_range(0..=delay.as_millis() as u64 / 4);
                tracing::debug!(zip, attempt, delay_ms = delay.as_millis() as u64, "retrying census request");
                std::thread::sleep(delay + Duration::from_millis(jitter_ms));
            }

            match self.fetch_acs(zip, timeout) {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() => {
                    last_error = Some(e);
                    continue;
                }
                Err(e) => {
                    return Err(DataSourceError::from_transport(
                        DataSource::Census,
                        &format!("ZIP {zip}"),
                        e,
                    ))
                }
            }
        }

        let err = last_error.unwrap_or_else(|| TransportError::Connect("max retries exceeded".into()));
        Err(DataSourceError::from_transport(DataSource::Census, &format!("ZIP {zip}"), err))
    }

    /// Parse the two-row ACS payload.
    pub fn parse_response(zip: &str, body: &Value) -> Result<CensusData, DataSourceError> {
        let parse_err = |message: &str| DataSourceError::Parse {
            provider: DataSource::Census,
            message: message.to_string(),
        };

        let rows = body
            .as_array()
            .filter(|rows| rows.len() >= 2)
            .ok_or_else(|| parse_err("expected at least two rows"))?;
        let headers = rows[0]
            .as_array()
            .ok_or_else(|| parse_err("header row is not an array"))?;
        let values = rows[1]
            .as_array()
            .ok_or_else(|| parse_err("value row is not an array"))?;

        let fields: HashMap<&str, String> = headers
            .iter()
            .enumerate()
            .filter_map(|(i, h)| h.as_str().map(|name| (name, cell_to_string(values.get(i)))))
            .collect();
        let num = |code: &str| fields.get(code).map(|v| parse_leading_int(v)).unwrap_or(0);

        let total_housing_units = num("B25003_001E");
        let owner_occupied = num("B25003_002E");
        let renter_occupied = num("B25003_003E");
        let vacant_units = total_housing_units - owner_occupied - renter_occupied;

        let unemployed = num("B23025_005E");
        let labor_force = num("B23025_003E");
        let unemployment_rate = if labor_force > 0 {
            unemployed as f64 / labor_force as f64 * 100.0
        } else {
            0.0
        };

        let bachelors_or_higher =
            num("B15003_022E") + num("B15003_023E") + num("B15003_024E") + num("B15003_025E");

        let name = fields
            .get("NAME")
            .filter(|n| n.as_str() != "0")
            .cloned()
            .unwrap_or_else(|| format!("ZIP Code {zip}"));

        Ok(CensusData {
            geoid: zip.to_string(),
            name,
            population: num("B01003_001E"),
            median_age: 0.0,
            median_income: num("B19013_001E"),
            total_housing_units,
            occupied_housing_units: owner_occupied + renter_occupied,
            vacancy_rate: if total_housing_units > 0 {
                vacant_units as f64 / total_housing_units as f64 * 100.0
            } else {
                0.0
            },
            median_home_value: num("B25077_001E"),
            median_gross_rent: num("B25064_001E"),
            unemployment_rate,
            poverty_rate: 0.0,
            bachelors_or_higher,
            year: ACS_YEAR,
        })
    }

    pub fn to_standard(census: &CensusData, zip: &str, as_of: DateTime<Utc>) -> StandardMarketData {
        let seed = zip_to_seed(zip);
        StandardMarketData {
            zip_code: zip.to_string(),
            city: UNKNOWN.to_string(),
            state: UNKNOWN.to_string(),
            median_rent: census.median_gross_rent as f64,
            median_price: census.median_home_value as f64,
            rent_growth_12mo: filler(seed, 220, -2.0, 8.0),
            appreciation_rate_12mo: filler(seed, 221, -5.0, 15.0),
            vacancy_rate: census.vacancy_rate,
            days_on_market: filler(seed, 222, 15.0, 90.0),
            foreclosure_rate: filler(seed, 223, 0.5, 3.0),
            economic_diversity_index: economic_diversity_index(
                census.unemployment_rate,
                census.bachelors_or_higher as f64,
            ),
            crime_safety_score: safety_score(census.poverty_rate, census.unemployment_rate),
            school_rating: filler(seed, 224, 5.0, 10.0),
            date_updated: as_of,
            data_source: DataSource::Census,
            confidence: CENSUS_CONFIDENCE,
        }
    }
}

impl DataSourceAdapter for CensusAdapter {
    fn source(&self) -> DataSource {
        DataSource::Census
    }

    fn config(&self) -> &DataSourceConfig {
        &self.config
    }

    fn fetch_data(
        &self,
        zip: &str,
        options: &FetchOptions,
    ) -> Result<StandardMarketData, DataSourceError> {
        ensure_enabled(DataSource::Census, &self.config)?;
        let zip = validate_zip(zip)?;

        let body = self.fetch_with_retry(zip, options.effective_timeout(&self.config))?;
        let census = Self::parse_response(zip, &body)?;
        Ok(Self::to_standard(&census, zip, Utc::now()))
    }

    fn test_connection(&self) -> bool {
        match self.fetch_acs(PROBE_ZIP, PROBE_TIMEOUT) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(source = "census", error = %e, "connection test failed");
                false
            }
        }
    }

    fn metadata(&self) -> DataSourceMetadata {
        DataSourceMetadata {
            name: "US Census Bureau".to_string(),
            source: DataSource::Census,
            is_available: self.config.enabled,
            api_version: ACS_YEAR.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_helpers::StubTransport;
    use serde_json::json;

    fn acs_body() -> Value {
        json!([
            ACS_VARIABLES.to_vec(),
            [
                "ZCTA5 90210", "21000", "150000", "2000001", "3000",
                "10000", "6000", "3000",
                "500", "10000",
                "4000", "2000", "500", "300",
                "90210"
            ]
        ])
    }

    fn adapter(transport: Arc<StubTransport>) -> CensusAdapter {
        CensusAdapter::new(DataSourceConfig::defaults_for(DataSource::Census), transport)
            .with_retry_delay(Duration::ZERO)
    }

    #[test]
    fn diversity_blend_matches_documented_constants() {
        // (100 - 5*8)*0.5 + 40*0.5
        assert_eq!(economic_diversity_index(5.0, 40.0), 50.0);
        assert_eq!(economic_diversity_index(0.0, 1_000.0), 100.0);
    }

    #[test]
    fn safety_blend_is_clamped() {
        assert_eq!(safety_score(0.0, 5.0), 75.0);
        assert_eq!(safety_score(10.0, 5.0), 45.0);
        assert_eq!(safety_score(40.0, 10.0), 0.0);
    }

    #[test]
    fn leading_int_parse_is_lenient() {
        assert_eq!(parse_leading_int("123"), 123);
        assert_eq!(parse_leading_int("  42abc"), 42);
        assert_eq!(parse_leading_int("-666666666"), -666666666);
        assert_eq!(parse_leading_int("12.9"), 12);
        assert_eq!(parse_leading_int("null"), 0);
        assert_eq!(parse_leading_int(""), 0);
    }

    #[test]
    fn parses_acs_rows_and_derives_rates() {
        let data = CensusAdapter::parse_response("90210", &acs_body()).unwrap();
        assert_eq!(data.name, "ZCTA5 90210");
        assert_eq!(data.population, 21_000);
        assert_eq!(data.occupied_housing_units, 9_000);
        assert!((data.vacancy_rate - 10.0).abs() < 1e-9);
        assert!((data.unemployment_rate - 5.0).abs() < 1e-9);
        assert_eq!(data.bachelors_or_higher, 6_800);
        assert_eq!(data.year, 2021);
    }

    #[test]
    fn missing_cells_read_as_zero() {
        let body = json!([["NAME", "B25003_001E", "B25064_001E"], [null, ""]]);
        let data = CensusAdapter::parse_response("10001", &body).unwrap();
        assert_eq!(data.name, "ZIP Code 10001");
        assert_eq!(data.total_housing_units, 0);
        assert_eq!(data.median_gross_rent, 0);
        assert_eq!(data.vacancy_rate, 0.0);
    }

    #[test]
    fn malformed_payloads_are_parse_errors() {
        for body in [json!([]), json!([["NAME"]]), json!({"error": "x"}), json!([1, 2])] {
            let err = CensusAdapter::parse_response("10001", &body).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Parse);
        }
    }

    #[test]
    fn fetch_builds_acs_request_and_tags_record() {
        let transport = Arc::new(StubTransport::new().route("/2021/acs/acs5", Ok(acs_body())));
        let record = adapter(transport.clone())
            .fetch_data("90210", &FetchOptions::default())
            .unwrap();

        assert_eq!(record.data_source, DataSource::Census);
        assert_eq!(record.confidence, 95);
        assert_eq!(record.median_rent, 3000.0);
        assert_eq!(record.median_price, 2_000_001.0);
        assert!(record.is_complete());

        let req = &transport.requests()[0];
        assert_eq!(req.url, "https://api.census.gov/data/2021/acs/acs5");
        assert!(req
            .query
            .contains(&("for".to_string(), "zip code tabulation area:90210".to_string())));
        assert_eq!(req.timeout, Duration::from_millis(15_000));
    }

    #[test]
    fn fillers_are_stable_for_a_zip() {
        let data = CensusAdapter::parse_response("90210", &acs_body()).unwrap();
        let as_of = Utc::now();
        let a = CensusAdapter::to_standard(&data, "90210", as_of);
        let b = CensusAdapter::to_standard(&data, "90210", as_of);
        assert_eq!(a, b);
        assert!((-2.0..=8.0).contains(&a.rent_growth_12mo));
        assert!((5.0..=10.0).contains(&a.school_rating));
    }

    #[test]
    fn disabled_adapter_never_touches_network() {
        let transport = Arc::new(StubTransport::new().route("", Ok(acs_body())));
        let adapter = CensusAdapter::new(
            DataSourceConfig::defaults_for(DataSource::Census).with_enabled(false),
            transport.clone(),
        );
        for _ in 0..3 {
            let err = adapter.fetch_data("90210", &FetchOptions::default()).unwrap_err();
            assert_eq!(err, DataSourceError::Disabled { provider: DataSource::Census });
            assert!(!err.is_retryable());
        }
        assert!(!adapter.is_available());
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn transient_failures_are_retried() {
        let transport = Arc::new(StubTransport::new().route_sequence(
            "acs5",
            vec![
                Err(TransportError::Timeout { timeout_ms: 15_000 }),
                Err(TransportError::Status { status: 503, reason: "Service Unavailable".into() }),
                Ok(acs_body()),
            ],
        ));
        let record = adapter(transport.clone()).fetch_data("90210", &FetchOptions::default());
        assert!(record.is_ok());
        assert_eq!(transport.get_calls(), 3);
    }

    #[test]
    fn exhausted_retries_surface_retryable_error() {
        let transport = Arc::new(StubTransport::failing(TransportError::Timeout { timeout_ms: 50 }));
        let err = adapter(transport.clone())
            .fetch_data("90210", &FetchOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(err.is_retryable());
        // one attempt plus three retries
        assert_eq!(transport.get_calls(), 4);
    }

    #[test]
    fn backoff_doubles_then_caps() {
        let base = Duration::from_millis(500);
        assert_eq!(backoff_delay(base, 1), base);
        assert_eq!(backoff_delay(base, 3), Duration::from_millis(2_000));
        assert_eq!(backoff_delay(base, 40), MAX_RETRY_DELAY);
        assert_eq!(backoff_delay(base, u32::MAX), MAX_RETRY_DELAY);
    }

    #[test]
    fn large_retry_budget_does_not_overflow() {
        let transport = Arc::new(StubTransport::failing(TransportError::Connect("refused".into())));
        let adapter = CensusAdapter::new(
            DataSourceConfig::defaults_for(DataSource::Census).with_retry_attempts(40),
            transport.clone(),
        )
        .with_retry_delay(Duration::ZERO);

        let err = adapter.fetch_data("90210", &FetchOptions::default()).unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(transport.get_calls(), 41);
    }

    #[test]
    fn client_errors_are_not_retried() {
        let transport = Arc::new(StubTransport::failing(TransportError::Status {
            status: 400,
            reason: "Bad Request".into(),
        }));
        let err = adapter(transport.clone())
            .fetch_data("90210", &FetchOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert_eq!(transport.get_calls(), 1);
    }

    #[test]
    fn probe_swallows_errors() {
        let down = Arc::new(StubTransport::failing(TransportError::Connect("refused".into())));
        assert!(!adapter(down).test_connection());

        let up = Arc::new(StubTransport::new().route("acs5", Ok(acs_body())));
        let a = adapter(up.clone());
        assert!(a.test_connection());
        assert!(a.is_available());
        assert_eq!(up.requests()[0].timeout, PROBE_TIMEOUT);
    }

    #[test]
    fn invalid_zip_is_rejected_before_io() {
        let transport = Arc::new(StubTransport::new());
        let err = adapter(transport.clone())
            .fetch_data("9021", &FetchOptions::default())
            .unwrap_err();
        assert_eq!(err, DataSourceError::InvalidZip("9021".into()));
        assert_eq!(transport.calls(), 0);
    }
}
