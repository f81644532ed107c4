//! Conversion of mock provider shapes into `StandardMarketData`.
//!
//! Fields a shape does not carry are filled from the sine filler with an
//! offset block per provider (Zillow 300s, Realtor 400s, Census 500s,
//! MLS 600s, County 700s). Fractions in the raw shapes become percentages.
//! The timestamp is supplied by the caller so output is a pure function of
//! `(data, zip, as_of)`.

use super::providers::{
    MockCensusData, MockCountyAssessorData, MockMlsData, MockRealtorData, MockZillowData,
};
use super::seed::{filler, zip_to_seed};
use crate::model::{DataSource, StandardMarketData, UNKNOWN};
use chrono::{DateTime, Utc};

pub const ZILLOW_MOCK_CONFIDENCE: u8 = 60;
pub const REALTOR_MOCK_CONFIDENCE: u8 = 50;
pub const CENSUS_MOCK_CONFIDENCE: u8 = 50;
pub const MLS_MOCK_CONFIDENCE: u8 = 55;
pub const COUNTY_MOCK_CONFIDENCE: u8 = 60;

/// Rough monthly rent as a share of price, used where a shape has no rent.
const RENT_TO_PRICE: f64 = 0.005;

struct Filler(u32);

impl Filler {
    fn for_zip(zip: &str) -> Self {
        Self(zip_to_seed(zip))
    }

    fn at(&self, offset: u32, min: f64, max: f64) -> f64 {
        filler(self.0, offset, min, max)
    }
}

fn skeleton(zip: &str, source: DataSource, confidence: u8, as_of: DateTime<Utc>) -> StandardMarketData {
    StandardMarketData {
        zip_code: zip.to_string(),
        city: UNKNOWN.to_string(),
        state: UNKNOWN.to_string(),
        median_rent: 0.0,
        median_price: 0.0,
        rent_growth_12mo: 0.0,
        appreciation_rate_12mo: 0.0,
        vacancy_rate: 0.0,
        days_on_market: 0.0,
        foreclosure_rate: 0.0,
        economic_diversity_index: 0.0,
        crime_safety_score: 0.0,
        school_rating: 0.0,
        date_updated: as_of,
        data_source: source,
        confidence,
    }
}

pub fn zillow_to_standard(
    data: &MockZillowData,
    zip: &str,
    as_of: DateTime<Utc>,
) -> StandardMarketData {
    let f = Filler::for_zip(zip);
    StandardMarketData {
        median_rent: data.median_rent,
        median_price: data.median_home_value,
        rent_growth_12mo: f.at(300, -2.0, 8.0),
        appreciation_rate_12mo: data.appreciation_rate * 100.0,
        vacancy_rate: f.at(301, 2.0, 10.0),
        days_on_market: data.days_on_market,
        foreclosure_rate: data.foreclosure_rate * 100.0,
        economic_diversity_index: f.at(302, 30.0, 90.0),
        crime_safety_score: f.at(303, 40.0, 95.0),
        school_rating: f.at(304, 5.0, 10.0),
        ..skeleton(zip, DataSource::Zillow, ZILLOW_MOCK_CONFIDENCE, as_of)
    }
}

pub fn realtor_to_standard(
    data: &MockRealtorData,
    zip: &str,
    as_of: DateTime<Utc>,
) -> StandardMarketData {
    let f = Filler::for_zip(zip);
    StandardMarketData {
        median_rent: (data.median_sold_price * RENT_TO_PRICE).round(),
        median_price: data.median_sold_price,
        rent_growth_12mo: f.at(400, -2.0, 8.0),
        appreciation_rate_12mo: f.at(401, 2.0, 8.0),
        vacancy_rate: f.at(402, 2.0, 10.0),
        days_on_market: data.average_days_on_market,
        foreclosure_rate: f.at(403, 0.0, 3.0),
        economic_diversity_index: f.at(404, 30.0, 90.0),
        crime_safety_score: f.at(405, 40.0, 95.0),
        school_rating: f.at(406, 5.0, 10.0),
        ..skeleton(zip, DataSource::Realtor, REALTOR_MOCK_CONFIDENCE, as_of)
    }
}

/// Share of adults with a bachelor's degree or higher implied by the mock
/// education level, in percent.
fn education_share(level: &str) -> f64 {
    match level {
        "Graduate" => 40.0,
        "Bachelor" => 30.0,
        _ => 15.0,
    }
}

/// Census-shaped mock. Its diversity and safety blends are this generator's
/// own and differ from the live Census adapter's.
pub fn census_to_standard(
    data: &MockCensusData,
    zip: &str,
    as_of: DateTime<Utc>,
) -> StandardMarketData {
    let f = Filler::for_zip(zip);
    let unemployment_pct = data.unemployment_rate * 100.0;
    let poverty_pct = data.poverty_rate * 100.0;
    let vacancy = (1.0 - data.owner_occupied_rate - data.renter_occupied_rate).max(0.0) * 100.0;
    StandardMarketData {
        median_rent: (data.median_household_income * 0.3 / 12.0).round(),
        median_price: (data.median_household_income * 4.0).round(),
        rent_growth_12mo: f.at(502, -2.0, 8.0),
        appreciation_rate_12mo: f.at(503, -5.0, 15.0),
        vacancy_rate: vacancy,
        days_on_market: f.at(504, 15.0, 90.0),
        foreclosure_rate: f.at(505, 0.5, 3.0),
        economic_diversity_index: ((100.0 - unemployment_pct * 8.0) * 0.5
            + education_share(&data.education_level) * 0.5)
            .min(100.0),
        crime_safety_score: (100.0 - poverty_pct * 2.0 - unemployment_pct * 4.0).clamp(0.0, 100.0),
        school_rating: f.at(506, 5.0, 10.0),
        ..skeleton(zip, DataSource::Census, CENSUS_MOCK_CONFIDENCE, as_of)
    }
}

pub fn mls_to_standard(data: &MockMlsData, zip: &str, as_of: DateTime<Utc>) -> StandardMarketData {
    let f = Filler::for_zip(zip);
    StandardMarketData {
        median_rent: (data.average_price * RENT_TO_PRICE).round(),
        median_price: data.average_price,
        rent_growth_12mo: f.at(600, -2.0, 8.0),
        appreciation_rate_12mo: f.at(601, -5.0, 15.0),
        vacancy_rate: f.at(602, 2.0, 10.0),
        days_on_market: data.average_days_on_market,
        foreclosure_rate: f.at(603, 0.5, 3.0),
        economic_diversity_index: f.at(604, 30.0, 90.0),
        crime_safety_score: f.at(605, 40.0, 95.0),
        school_rating: f.at(606, 5.0, 10.0),
        ..skeleton(zip, DataSource::Mls, MLS_MOCK_CONFIDENCE, as_of)
    }
}

pub fn county_assessor_to_standard(
    data: &MockCountyAssessorData,
    zip: &str,
    as_of: DateTime<Utc>,
) -> StandardMarketData {
    let f = Filler::for_zip(zip);
    StandardMarketData {
        median_rent: (data.market_value * RENT_TO_PRICE).round(),
        median_price: data.market_value,
        rent_growth_12mo: f.at(700, -2.0, 8.0),
        appreciation_rate_12mo: f.at(701, -5.0, 15.0),
        vacancy_rate: f.at(702, 2.0, 10.0),
        days_on_market: f.at(703, 15.0, 90.0),
        foreclosure_rate: f.at(704, 0.5, 3.0),
        economic_diversity_index: f.at(705, 30.0, 90.0),
        crime_safety_score: f.at(706, 40.0, 95.0),
        school_rating: f.at(707, 5.0, 10.0),
        ..skeleton(zip, DataSource::CountyAssessor, COUNTY_MOCK_CONFIDENCE, as_of)
    }
}

/// Mock standard record for an adapter-backed source. `None` for `Mock` and
/// `Aggregated`, which have no provider shape.
pub fn mock_standard(
    source: DataSource,
    zip: &str,
    as_of: DateTime<Utc>,
) -> Option<StandardMarketData> {
    let record = match source {
        DataSource::Census => census_to_standard(&super::census(zip), zip, as_of),
        DataSource::CountyAssessor => {
            county_assessor_to_standard(&super::county_assessor(zip), zip, as_of)
        }
        DataSource::Zillow => zillow_to_standard(&super::zillow(zip), zip, as_of),
        DataSource::Realtor => realtor_to_standard(&super::realtor(zip), zip, as_of),
        DataSource::Mls => mls_to_standard(&super::mls(zip), zip, as_of),
        DataSource::Mock | DataSource::Aggregated => return None,
    };
    Some(record)
}

/// Raw mock shape for a source as JSON, for display.
pub fn mock_raw_json(source: DataSource, zip: &str) -> Option<serde_json::Value> {
    let value = match source {
        DataSource::Census => serde_json::to_value(super::census(zip)),
        DataSource::CountyAssessor => serde_json::to_value(super::county_assessor(zip)),
        DataSource::Zillow => serde_json::to_value(super::zillow(zip)),
        DataSource::Realtor => serde_json::to_value(super::realtor(zip)),
        DataSource::Mls => serde_json::to_value(super::mls(zip)),
        DataSource::Mock | DataSource::Aggregated => return None,
    };
    value.ok()
}
