//! Merge strategies and per-source quality scoring.

use marketlens_core::model::has_place;
use marketlens_core::{DataSource, StandardMarketData};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How successful records are combined into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Take the record from the most authoritative source.
    #[default]
    Priority,
    /// Confidence-weighted mean of every reported metric.
    #[serde(alias = "weighted-average")]
    WeightedAverage,
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeStrategy::Priority => write!(f, "priority"),
            MergeStrategy::WeightedAverage => write!(f, "weighted_average"),
        }
    }
}

impl FromStr for MergeStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "priority" => Ok(MergeStrategy::Priority),
            "weighted_average" | "weighted" => Ok(MergeStrategy::WeightedAverage),
            other => Err(format!(
                "unknown merge strategy '{other}'. Valid: priority, weighted-average"
            )),
        }
    }
}

/// How much of a record is filled in, blended with its source's confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityScore {
    /// Percent of content fields holding a non-default value.
    pub completeness: f64,
    pub confidence: u8,
    /// `round(0.6 * completeness + 0.4 * confidence)`, 0–100.
    pub overall: u8,
}

impl QualityScore {
    pub fn of(record: &StandardMarketData) -> Self {
        let completeness = record.populated_fields() as f64
            / StandardMarketData::CONTENT_FIELDS as f64
            * 100.0;
        let overall = (0.6 * completeness + 0.4 * record.confidence as f64)
            .round()
            .clamp(0.0, 100.0) as u8;
        Self {
            completeness,
            confidence: record.confidence,
            overall,
        }
    }
}

/// One successful (or mock-substituted) record with its adapter's ranking.
#[derive(Debug, Clone)]
pub struct Contribution {
    /// The adapter the record stands for, even when the record is a mock.
    pub source: DataSource,
    pub priority: u32,
    pub record: StandardMarketData,
    /// Mock stand-in for an adapter that failed.
    pub fallback: bool,
}

impl Contribution {
    pub fn new(source: DataSource, priority: u32, record: StandardMarketData) -> Self {
        Self {
            source,
            priority,
            record,
            fallback: false,
        }
    }

    pub fn fallback(source: DataSource, priority: u32, record: StandardMarketData) -> Self {
        Self {
            fallback: true,
            ..Self::new(source, priority, record)
        }
    }
}

/// Contributions ordered by priority, with every fallback behind every real
/// success; ties keep registration order.
pub fn by_priority(contributions: &[Contribution]) -> Vec<&Contribution> {
    let mut ordered: Vec<&Contribution> = contributions.iter().collect();
    ordered.sort_by_key(|c| (c.fallback, c.priority));
    ordered
}

/// Record from the lowest priority number among real successes, else from the
/// best-ranked fallback. `None` for no contributions.
pub fn merge_priority(contributions: &[Contribution]) -> Option<StandardMarketData> {
    by_priority(contributions)
        .first()
        .map(|c| c.record.clone())
}

/// Confidence-weighted merge of every contribution.
///
/// A metric averages only the records that report it (non-zero). Zero-
/// confidence records count with weight 1 so they are never silently dropped.
pub fn merge_weighted(zip: &str, contributions: &[Contribution]) -> Option<StandardMarketData> {
    let ordered = by_priority(contributions);
    let first = ordered.first()?;
    let mut merged = first.record.clone();
    merged.zip_code = zip.to_string();
    merged.data_source = DataSource::Aggregated;

    let place = |pick: fn(&StandardMarketData) -> &str| {
        ordered
            .iter()
            .map(|c| pick(&c.record))
            .find(|v| has_place(v))
            .unwrap_or(marketlens_core::model::UNKNOWN)
            .to_string()
    };
    merged.city = place(|r| r.city.as_str());
    merged.state = place(|r| r.state.as_str());

    for (name, _) in first.record.numeric_fields() {
        let (weighted_sum, total_weight) = ordered
            .iter()
            .filter_map(|c| {
                let value = c
                    .record
                    .numeric_fields()
                    .iter()
                    .find(|(n, _)| *n == name)
                    .map(|(_, v)| *v)?;
                (value != 0.0 && value.is_finite()).then_some((value, c.record.confidence.max(1) as f64))
            })
            .fold((0.0, 0.0), |(s, w), (v, weight)| (s + v * weight, w + weight));

        if let Some(slot) = merged.metric_mut(name) {
            *slot = if total_weight > 0.0 {
                weighted_sum / total_weight
            } else {
                0.0
            };
        }
    }

    let confidence_sum: u32 = ordered.iter().map(|c| c.record.confidence as u32).sum();
    merged.confidence = (confidence_sum as f64 / ordered.len() as f64).round() as u8;
    merged.date_updated = ordered
        .iter()
        .map(|c| c.record.date_updated)
        .max()
        .unwrap_or(merged.date_updated);

    Some(merged)
}
