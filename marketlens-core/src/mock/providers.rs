//! Provider-shaped mock records.
//!
//! Each generator draws its fields from one [`Lcg`] stream seeded by the ZIP,
//! in declaration order. Reordering fields changes every value after the
//! moved one, so keep the draw order stable.

use super::seed::{filler, zip_to_seed, Lcg};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockZillowData {
    pub median_home_value: f64,
    pub median_rent: f64,
    pub price_per_sqft: f64,
    pub home_value_index: f64,
    pub rent_index: f64,
    pub price_to_rent_ratio: f64,
    pub inventory: f64,
    pub days_on_market: f64,
    /// Fraction, not percent.
    pub foreclosure_rate: f64,
    /// Fraction, not percent.
    pub appreciation_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockRealtorData {
    pub median_listing_price: f64,
    pub median_sold_price: f64,
    pub average_days_on_market: f64,
    pub inventory_count: f64,
    pub new_listings_count: f64,
    pub price_reductions_count: f64,
    pub median_price_per_sqft: f64,
    pub active_listing_count: f64,
    pub pending_listing_count: f64,
    pub sold_listing_count: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockCensusData {
    pub population: f64,
    pub median_household_income: f64,
    /// Fraction, not percent.
    pub unemployment_rate: f64,
    /// Fraction, not percent.
    pub poverty_rate: f64,
    pub median_age: f64,
    pub education_level: String,
    pub housing_units: f64,
    pub owner_occupied_rate: f64,
    pub renter_occupied_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockMlsData {
    pub total_listings: f64,
    pub average_price: f64,
    pub average_days_on_market: f64,
    pub price_per_sqft: f64,
    pub inventory_months: f64,
    pub sales_volume: f64,
    pub new_listings: f64,
    pub pending_sales: f64,
    pub closed_sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockCountyAssessorData {
    pub assessed_value: f64,
    pub market_value: f64,
    pub land_value: f64,
    pub improvement_value: f64,
    pub tax_amount: f64,
    pub tax_rate: f64,
    /// Whole days between the last recorded sale and the reference date.
    pub last_sale_days_ago: u32,
    pub last_sale_price: f64,
    pub property_type: String,
    pub year_built: f64,
}

/// Offset of the sine filler used for the county's last-sale age.
const COUNTY_SALE_AGE_OFFSET: u32 = 790;

pub fn zillow(zip: &str) -> MockZillowData {
    let mut r = Lcg::for_zip(zip);
    MockZillowData {
        median_home_value: r.rounded(400_000.0, 600_000.0),
        median_rent: r.rounded(2_000.0, 3_000.0),
        price_per_sqft: r.rounded(200.0, 400.0),
        home_value_index: r.rounded(100.0, 50.0),
        rent_index: r.rounded(100.0, 30.0),
        price_to_rent_ratio: r.rounded(15.0, 10.0),
        inventory: r.rounded(50.0, 100.0),
        days_on_market: r.rounded(20.0, 40.0),
        foreclosure_rate: r.range(0.0, 0.05),
        appreciation_rate: r.range(-0.02, 0.08),
    }
}

pub fn realtor(zip: &str) -> MockRealtorData {
    let mut r = Lcg::for_zip(zip);
    MockRealtorData {
        median_listing_price: r.rounded(350_000.0, 500_000.0),
        median_sold_price: r.rounded(340_000.0, 480_000.0),
        average_days_on_market: r.rounded(25.0, 35.0),
        inventory_count: r.rounded(40.0, 80.0),
        new_listings_count: r.rounded(10.0, 20.0),
        price_reductions_count: r.rounded(5.0, 15.0),
        median_price_per_sqft: r.rounded(180.0, 350.0),
        active_listing_count: r.rounded(35.0, 65.0),
        pending_listing_count: r.rounded(8.0, 12.0),
        sold_listing_count: r.rounded(15.0, 25.0),
    }
}

pub fn census(zip: &str) -> MockCensusData {
    let mut r = Lcg::for_zip(zip);
    MockCensusData {
        population: r.rounded(10_000.0, 50_000.0),
        median_household_income: r.rounded(50_000.0, 100_000.0),
        unemployment_rate: r.range(0.0, 0.1),
        poverty_rate: r.range(0.0, 0.2),
        median_age: r.rounded(30.0, 20.0),
        education_level: r.pick(&["High School", "Bachelor", "Graduate"]).to_string(),
        housing_units: r.rounded(5_000.0, 20_000.0),
        owner_occupied_rate: r.range(0.5, 0.4),
        renter_occupied_rate: r.range(0.2, 0.3),
    }
}

pub fn mls(zip: &str) -> MockMlsData {
    let mut r = Lcg::for_zip(zip);
    MockMlsData {
        total_listings: r.rounded(30.0, 70.0),
        average_price: r.rounded(300_000.0, 400_000.0),
        average_days_on_market: r.rounded(20.0, 40.0),
        price_per_sqft: r.rounded(150.0, 300.0),
        inventory_months: r.range(0.0, 6.0),
        sales_volume: r.rounded(20.0, 50.0),
        new_listings: r.rounded(8.0, 15.0),
        pending_sales: r.rounded(5.0, 10.0),
        closed_sales: r.rounded(10.0, 20.0),
    }
}

pub fn county_assessor(zip: &str) -> MockCountyAssessorData {
    let seed = zip_to_seed(zip);
    let mut r = Lcg::new(seed);
    let assessed_value = r.rounded(250_000.0, 350_000.0);
    let market_value = r.rounded(300_000.0, 400_000.0);
    let land_value = r.rounded(80_000.0, 120_000.0);
    let improvement_value = r.rounded(200_000.0, 300_000.0);
    let tax_amount = r.rounded(3_000.0, 5_000.0);
    let tax_rate = r.range(0.01, 0.02);
    // Not part of the stream; drawn from the filler so the stream order is untouched.
    let last_sale_days_ago = filler(seed, COUNTY_SALE_AGE_OFFSET, 0.0, 365.0).floor() as u32;
    MockCountyAssessorData {
        assessed_value,
        market_value,
        land_value,
        improvement_value,
        tax_amount,
        tax_rate,
        last_sale_days_ago,
        last_sale_price: r.rounded(280_000.0, 380_000.0),
        property_type: r
            .pick(&["Single Family", "Condo", "Townhouse"])
            .to_string(),
        year_built: r.rounded(1950.0, 70.0),
    }
}
