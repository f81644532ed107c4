//! JSON and CSV export of aggregated results.

use anyhow::{Context, Result};
use std::path::Path;

use crate::aggregator::AggregatedMarketData;

/// CSV column order.
pub const CSV_HEADER: [&str; 17] = [
    "zip_code",
    "city",
    "state",
    "median_rent",
    "median_price",
    "rent_growth_12mo",
    "appreciation_rate_12mo",
    "vacancy_rate",
    "days_on_market",
    "foreclosure_rate",
    "economic_diversity_index",
    "crime_safety_score",
    "school_rating",
    "data_source",
    "confidence",
    "sources",
    "quality",
];

/// Serialize one aggregated result to pretty JSON.
pub fn export_json(result: &AggregatedMarketData) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize AggregatedMarketData to JSON")
}

/// Serialize several results as a pretty JSON array.
pub fn export_json_many(results: &[AggregatedMarketData]) -> Result<String> {
    serde_json::to_string_pretty(results).context("failed to serialize results to JSON")
}

/// One row per ZIP. Source lists are `;`-joined; `quality` is the winning
/// source's overall score.
pub fn export_csv(results: &[AggregatedMarketData]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(CSV_HEADER)?;

    for r in results {
        let d = &r.data;
        let sources = r
            .sources
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(";");

        wtr.write_record([
            d.zip_code.clone(),
            d.city.clone(),
            d.state.clone(),
            format!("{:.2}", d.median_rent),
            format!("{:.2}", d.median_price),
            format!("{:.4}", d.rent_growth_12mo),
            format!("{:.4}", d.appreciation_rate_12mo),
            format!("{:.4}", d.vacancy_rate),
            format!("{:.1}", d.days_on_market),
            format!("{:.4}", d.foreclosure_rate),
            format!("{:.2}", d.economic_diversity_index),
            format!("{:.2}", d.crime_safety_score),
            format!("{:.2}", d.school_rating),
            d.data_source.to_string(),
            d.confidence.to_string(),
            sources,
            r.winning_quality().overall.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Output format for `write_export`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!("unknown export format '{other}'. Valid: csv, json")),
        }
    }
}

/// Write results to `path`, creating parent directories.
pub fn write_export(results: &[AggregatedMarketData], path: &Path, format: ExportFormat) -> Result<()> {
    let body = match format {
        ExportFormat::Csv => export_csv(results)?,
        ExportFormat::Json => export_json_many(results)?,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create export dir: {}", parent.display()))?;
    }
    std::fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::QualityScore;
    use chrono::Utc;
    use marketlens_core::{mock, DataSource};
    use std::collections::BTreeMap;

    fn result(zip: &str) -> AggregatedMarketData {
        let data = mock::mock_standard(DataSource::Zillow, zip, Utc::now()).unwrap();
        let mut quality_scores = BTreeMap::new();
        quality_scores.insert(DataSource::Zillow, QualityScore::of(&data));
        AggregatedMarketData {
            data,
            sources: vec![DataSource::Zillow, DataSource::Mls],
            quality_scores,
            failures: vec![],
        }
    }

    #[test]
    fn csv_has_header_and_one_row_per_zip() {
        let csv = export_csv(&[result("10001"), result("94105")]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("zip_code,city,state,median_rent"));
        assert!(lines[1].starts_with("10001,Unknown,Unknown,"));
        assert!(lines[1].contains(",zillow,60,zillow;mls,"));
    }

    #[test]
    fn json_round_trips_provenance() {
        let json = export_json(&result("10001")).unwrap();
        let back: AggregatedMarketData = serde_json::from_str(&json).unwrap();
        assert_eq!(back.sources, vec![DataSource::Zillow, DataSource::Mls]);
        assert!(json.contains("\"zipCode\": \"10001\""));
    }

    #[test]
    fn format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!("xlsx".parse::<ExportFormat>().is_err());
    }
}
