//! ZIP code validation.

use crate::error::DataSourceError;

/// Accepts exactly five ASCII digits; anything else is `InvalidZip`.
pub fn validate_zip(zip: &str) -> Result<&str, DataSourceError> {
    if zip.len() == 5 && zip.bytes().all(|b| b.is_ascii_digit()) {
        Ok(zip)
    } else {
        Err(DataSourceError::InvalidZip(zip.to_string()))
    }
}
