//! Deterministic synthetic market data, keyed by ZIP code. No I/O.

pub mod providers;
pub mod seed;
pub mod standard;

pub use providers::{
    census, county_assessor, mls, realtor, zillow, MockCensusData, MockCountyAssessorData,
    MockMlsData, MockRealtorData, MockZillowData,
};
pub use seed::{filler, seeded_random, zip_to_seed, Lcg};
pub use standard::{
    census_to_standard, county_assessor_to_standard, mls_to_standard, mock_raw_json,
    mock_standard, realtor_to_standard, zillow_to_standard,
};
