//! County assessor/recorder offices.
//!
//! Most counties publish no usable API, so `fetch_data` serves the county mock.
//! The per-parcel path (`fetch_property_data`) is real: three concurrent GETs
//! against the county's endpoints, merged with defaults.

use super::{ensure_enabled, DataSourceAdapter, PROBE_TIMEOUT};
use crate::error::{DataSourceError, TransportError};
use crate::mock;
use crate::model::{
    DataSource, DataSourceConfig, DataSourceMetadata, FetchOptions, StandardMarketData, UNKNOWN,
};
use crate::transport::{HttpRequest, HttpTransport};
use crate::zip::validate_zip;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub const COUNTY_CONFIDENCE: u8 = 90;
const PLACEHOLDERS: [&str; 3] = ["{apn}", "{pin}", "{acct}"];
const MS_PER_YEAR: f64 = 1000.0 * 60.0 * 60.0 * 24.0 * 365.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountyEndpoints {
    pub property: String,
    pub assessment: String,
    pub sales: String,
}

impl CountyEndpoints {
    /// `/property/{p}`, `/assessment/{p}`, `/sales/{p}` for one placeholder.
    fn standard(placeholder: &str) -> Self {
        Self {
            property: format!("/property/{placeholder}"),
            assessment: format!("/assessment/{placeholder}"),
            sales: format!("/sales/{placeholder}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountyApiConfig {
    pub key: String,
    pub name: String,
    pub base_url: String,
    pub endpoints: CountyEndpoints,
    pub requires_auth: bool,
    /// Requests per minute. Informational only.
    pub rate_limit: u32,
}

impl CountyApiConfig {
    /// Expand an endpoint template with the parcel identifier.
    pub fn url_for(&self, template: &str, apn: &str) -> String {
        let path = PLACEHOLDERS
            .iter()
            .fold(template.to_string(), |path, p| path.replace(p, apn));
        format!("{}{}", self.base_url, path)
    }
}

/// Immutable table of supported counties, keyed by county key.
#[derive(Debug, Clone, Default)]
pub struct CountyRegistry {
    counties: BTreeMap<String, CountyApiConfig>,
}

impl CountyRegistry {
    pub fn new(counties: impl IntoIterator<Item = CountyApiConfig>) -> Self {
        Self {
            counties: counties.into_iter().map(|c| (c.key.clone(), c)).collect(),
        }
    }

    pub fn builtin() -> Self {
        let county = |key: &str, name: &str, base_url: &str, placeholder: &str, rate_limit| {
            CountyApiConfig {
                key: key.to_string(),
                name: name.to_string(),
                base_url: base_url.to_string(),
                endpoints: CountyEndpoints::standard(placeholder),
                requires_auth: false,
                rate_limit,
            }
        };
        Self::new([
            county("los_angeles", "Los Angeles County", "https://assessor.lacounty.gov/api", "{apn}", 100),
            county("cook", "Cook County (Chicago)", "https://www.cookcountyassessor.com/api", "{pin}", 60),
            county("maricopa", "Maricopa County (Phoenix)", "https://mcassessor.maricopa.gov/api", "{apn}", 80),
            county("harris", "Harris County (Houston)", "https://hcad.org/api", "{acct}", 60),
        ])
    }

    /// County keys, sorted.
    pub fn supported_counties(&self) -> Vec<&str> {
        self.counties.keys().map(String::as_str).collect()
    }

    pub fn county_config(&self, key: &str) -> Option<&CountyApiConfig> {
        self.counties.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CountyApiConfig> {
        self.counties.values()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaleRecord {
    pub sale_date: String,
    pub sale_price: f64,
    /// Arm's length or not.
    pub sale_type: String,
    pub buyer: String,
    pub seller: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PermitRecord {
    pub permit_number: String,
    #[serde(rename = "type")]
    pub permit_type: String,
    pub issue_date: String,
    pub status: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViolationRecord {
    pub violation_type: String,
    pub date: String,
    pub status: String,
    pub fine: f64,
    pub description: String,
}

/// One parcel as merged from the property, assessment and sales endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountyAssessorData {
    pub apn: String,
    pub parcel_id: String,
    pub legal_description: String,

    pub current_owner: String,
    pub mailing_address: String,
    pub ownership_type: String,

    pub land_use: String,
    pub zoning: String,
    /// Square feet.
    pub lot_size: f64,
    pub year_built: i32,
    pub bedrooms: u32,
    pub bathrooms: f64,
    pub square_feet: f64,

    pub assessed_value: f64,
    pub land_value: f64,
    pub improvement_value: f64,
    pub assessment_year: i32,

    pub annual_tax_amount: f64,
    pub tax_delinquent: bool,
    pub tax_lien_amount: f64,
    pub tax_exemptions: Vec<String>,

    pub sales_history: Vec<SaleRecord>,
    pub permits: Vec<PermitRecord>,
    pub violations: Vec<ViolationRecord>,
}

// Endpoint bodies are read field by field. A field that is absent, null, or of
// an unexpected type takes its default; a body that is not an object is empty.

struct Fields<'a>(Option<&'a Map<String, Value>>);

impl<'a> Fields<'a> {
    fn of(body: &'a Value) -> Self {
        Fields(body.as_object())
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.0.and_then(|m| m.get(key))
    }

    fn string(&self, key: &str) -> String {
        match self.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }

    fn number(&self, key: &str) -> Option<f64> {
        let n = match self.get(key)? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse().ok()?,
            _ => return None,
        };
        n.is_finite().then_some(n)
    }

    fn float(&self, key: &str) -> f64 {
        self.number(key).unwrap_or_default()
    }

    fn int<T: TryFrom<i64> + Default>(&self, key: &str) -> T {
        self.number(key)
            .filter(|n| n.fract() == 0.0)
            .and_then(|n| T::try_from(n as i64).ok())
            .unwrap_or_default()
    }

    fn flag(&self, key: &str) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or_default()
    }

    fn list(&self, key: &str) -> &'a [Value] {
        self.get(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn strings(&self, key: &str) -> Vec<String> {
        self.list(key)
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    }
}

fn sale_record(value: &Value) -> SaleRecord {
    let f = Fields::of(value);
    SaleRecord {
        sale_date: f.string("saleDate"),
        sale_price: f.float("salePrice"),
        sale_type: f.string("saleType"),
        buyer: f.string("buyer"),
        seller: f.string("seller"),
    }
}

fn permit_record(value: &Value) -> PermitRecord {
    let f = Fields::of(value);
    PermitRecord {
        permit_number: f.string("permitNumber"),
        permit_type: f.string("type"),
        issue_date: f.string("issueDate"),
        status: f.string("status"),
        description: f.string("description"),
    }
}

fn violation_record(value: &Value) -> ViolationRecord {
    let f = Fields::of(value);
    ViolationRecord {
        violation_type: f.string("violationType"),
        date: f.string("date"),
        status: f.string("status"),
        fine: f.float("fine"),
        description: f.string("description"),
    }
}

fn combine(property: &Value, assessment: &Value, sales: &Value) -> CountyAssessorData {
    let p = Fields::of(property);
    let a = Fields::of(assessment);
    let s = Fields::of(sales);
    CountyAssessorData {
        apn: p.string("apn"),
        parcel_id: p.string("parcelId"),
        legal_description: p.string("legalDescription"),
        current_owner: p.string("currentOwner"),
        mailing_address: p.string("mailingAddress"),
        ownership_type: p.string("ownershipType"),
        land_use: p.string("landUse"),
        zoning: p.string("zoning"),
        lot_size: p.float("lotSize"),
        year_built: p.int("yearBuilt"),
        bedrooms: p.int("bedrooms"),
        bathrooms: p.float("bathrooms"),
        square_feet: p.float("squareFeet"),
        assessed_value: a.float("assessedValue"),
        land_value: a.float("landValue"),
        improvement_value: a.float("improvementValue"),
        assessment_year: match a.int::<i32>("assessmentYear") {
            0 => Utc::now().year(),
            year => year,
        },
        annual_tax_amount: a.float("annualTaxAmount"),
        tax_delinquent: a.flag("taxDelinquent"),
        tax_lien_amount: a.float("taxLienAmount"),
        tax_exemptions: a.strings("taxExemptions"),
        sales_history: s.list("history").iter().map(sale_record).collect(),
        permits: p.list("permits").iter().map(permit_record).collect(),
        violations: p.list("violations").iter().map(violation_record).collect(),
    }
}

/// RFC 3339 timestamp or a bare `YYYY-MM-DD` (midnight UTC).
fn parse_sale_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|d| d.and_utc())
        })
}

/// Annualized appreciation between the oldest and newest dated sale, percent.
///
/// Sales with unparseable dates are skipped. Fewer than two dated sales, a
/// zero time span, or a zero oldest price all yield 0.
pub fn calculate_appreciation_rate(sales: &[SaleRecord]) -> f64 {
    let mut dated: Vec<(DateTime<Utc>, f64)> = sales
        .iter()
        .filter_map(|s| parse_sale_date(&s.sale_date).map(|d| (d, s.sale_price)))
        .collect();
    if dated.len() < 2 {
        return 0.0;
    }
    dated.sort_by_key(|(date, _)| *date);

    let (oldest_date, oldest_price) = dated[0];
    let (newest_date, newest_price) = dated[dated.len() - 1];
    let years = (newest_date - oldest_date).num_milliseconds() as f64 / MS_PER_YEAR;
    if years == 0.0 || oldest_price == 0.0 {
        return 0.0;
    }

    (newest_price - oldest_price) / oldest_price / years * 100.0
}

/// Standard view of one parcel. Only price, appreciation and foreclosure are known.
pub fn county_to_standard(
    county: &CountyAssessorData,
    zip: &str,
    as_of: DateTime<Utc>,
) -> StandardMarketData {
    StandardMarketData {
        zip_code: zip.to_string(),
        city: UNKNOWN.to_string(),
        state: UNKNOWN.to_string(),
        median_rent: 0.0,
        median_price: county.assessed_value,
        rent_growth_12mo: 0.0,
        appreciation_rate_12mo: calculate_appreciation_rate(&county.sales_history),
        vacancy_rate: 0.0,
        days_on_market: 0.0,
        foreclosure_rate: if county.tax_delinquent { 1.0 } else { 0.0 },
        economic_diversity_index: 0.0,
        crime_safety_score: 0.0,
        school_rating: 0.0,
        date_updated: as_of,
        data_source: DataSource::CountyAssessor,
        confidence: COUNTY_CONFIDENCE,
    }
}

pub struct CountyAssessorAdapter {
    config: DataSourceConfig,
    registry: CountyRegistry,
    transport: Arc<dyn HttpTransport>,
}

impl CountyAssessorAdapter {
    pub fn new(
        config: DataSourceConfig,
        registry: CountyRegistry,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            config,
            registry,
            transport,
        }
    }

    pub fn registry(&self) -> &CountyRegistry {
        &self.registry
    }

    fn get_body(&self, url: String, timeout: Duration) -> Result<Value, TransportError> {
        let request = HttpRequest::get(url, timeout).bearer(self.config.api_key.as_deref());
        self.transport.get_json(&request)
    }

    /// Fetch one parcel from a county's property, assessment and sales endpoints.
    pub fn fetch_property_data(
        &self,
        apn: &str,
        county: &str,
        options: &FetchOptions,
    ) -> Result<CountyAssessorData, DataSourceError> {
        let api = self
            .registry
            .county_config(county)
            .ok_or_else(|| DataSourceError::UnsupportedCounty {
                county: county.to_string(),
            })?;
        let timeout = options.effective_timeout(&self.config);
        tracing::debug!(apn, county, "fetching county parcel");

        let (property, (assessment, sales)) = rayon::join(
            || self.get_body(api.url_for(&api.endpoints.property, apn), timeout),
            || {
                rayon::join(
                    || self.get_body(api.url_for(&api.endpoints.assessment, apn), timeout),
                    || self.get_body(api.url_for(&api.endpoints.sales, apn), timeout),
                )
            },
        );

        let context = format!("APN {apn}");
        let wrap = |e| DataSourceError::from_transport(DataSource::CountyAssessor, &context, e);
        Ok(combine(
            &property.map_err(wrap)?,
            &assessment.map_err(wrap)?,
            &sales.map_err(wrap)?,
        ))
    }
}

impl DataSourceAdapter for CountyAssessorAdapter {
    fn source(&self) -> DataSource {
        DataSource::CountyAssessor
    }

    fn config(&self) -> &DataSourceConfig {
        &self.config
    }

    fn fetch_data(
        &self,
        zip: &str,
        _options: &FetchOptions,
    ) -> Result<StandardMarketData, DataSourceError> {
        ensure_enabled(DataSource::CountyAssessor, &self.config)?;
        let zip = validate_zip(zip)?;

        // No county exposes ZIP-level aggregates.
        let data = mock::county_assessor(zip);
        Ok(mock::county_assessor_to_standard(&data, zip, Utc::now()))
    }

    fn test_connection(&self) -> bool {
        let Some(la) = self.registry.county_config("los_angeles") else {
            return false;
        };
        match self.transport.head(&format!("{}/health", la.base_url), PROBE_TIMEOUT) {
            Ok(status) => (200..300).contains(&status),
            Err(e) => {
                tracing::warn!(source = "county_assessor", error = %e, "connection test failed");
                false
            }
        }
    }

    fn metadata(&self) -> DataSourceMetadata {
        DataSourceMetadata {
            name: "County Assessor Offices".to_string(),
            source: DataSource::CountyAssessor,
            is_available: self.config.enabled,
            api_version: "v1".to_string(),
        }
    }
}
