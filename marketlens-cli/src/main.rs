//! MarketLens CLI: per-ZIP housing market lookups.
//!
//! Commands:
//! - `lookup`: aggregate every source for one or more ZIP codes
//! - `fetch`: query a single adapter
//! - `mock`: print a provider's raw mock shape
//! - `probe`: adapter metadata and live availability
//! - `property`: fetch one parcel from a county assessor
//! - `counties`: list supported county assessor offices
//! - `export`: aggregate ZIP codes and write CSV or JSON

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use marketlens_core::adapter::{county_to_standard, CountyAssessorAdapter, CountyRegistry};
use marketlens_core::transport::{HttpTransport, ReqwestTransport};
use marketlens_core::{mock, validate_zip, DataSource, FetchOptions, StandardMarketData};
use marketlens_runner::{
    export_csv, write_export, AggregatedMarketData, Aggregator, ExportFormat, MergeStrategy,
    SourcesFile,
};

#[derive(Parser)]
#[command(
    name = "marketlens",
    about = "MarketLens CLI: housing market data aggregated per ZIP code"
)]
struct Cli {
    /// Log adapter activity (debug level) to stderr.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate every configured source for the given ZIP codes.
    Lookup {
        /// ZIP codes (5 digits).
        #[arg(required = true)]
        zips: Vec<String>,

        /// Sources file (TOML).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Merge strategy: priority or weighted-average. Overrides the sources file.
        #[arg(long)]
        strategy: Option<MergeStrategy>,

        /// Minimum number of sources that must succeed. Overrides the sources file.
        #[arg(long)]
        min_sources: Option<usize>,

        /// Substitute mock data for failed sources.
        #[arg(long, default_value_t = false)]
        mock_fallback: bool,

        /// Print the full result as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Query a single adapter.
    Fetch {
        /// Source tag: census, county_assessor, zillow, realtor, mls.
        source: DataSource,

        /// ZIP code (5 digits).
        zip: String,

        /// Sources file (TOML).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the record as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print a provider's raw mock shape as JSON.
    Mock {
        /// Source tag: census, county_assessor, zillow, realtor, mls.
        source: DataSource,

        /// ZIP code (5 digits).
        zip: String,
    },
    /// Show metadata and live availability for every adapter.
    Probe {
        /// Sources file (TOML).
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Fetch one parcel from a county assessor office.
    Property {
        /// Assessor's parcel number (or PIN / account number).
        #[arg(long)]
        apn: String,

        /// County key, e.g. los_angeles. See `counties`.
        #[arg(long)]
        county: String,

        /// ZIP code used for the standard view.
        #[arg(long, default_value = "00000")]
        zip: String,

        /// Sources file (TOML).
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List supported county assessor offices.
    Counties,
    /// Aggregate ZIP codes and write the results to a file.
    Export {
        /// ZIP codes (5 digits).
        #[arg(required = true)]
        zips: Vec<String>,

        /// Output path.
        #[arg(long)]
        out: PathBuf,

        /// Output format: csv or json.
        #[arg(long, default_value = "csv")]
        format: ExportFormat,

        /// Sources file (TOML).
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Lookup {
            zips,
            config,
            strategy,
            min_sources,
            mock_fallback,
            json,
        } => run_lookup(&zips, config.as_deref(), strategy, min_sources, mock_fallback, json),
        Commands::Fetch {
            source,
            zip,
            config,
            json,
        } => run_fetch(source, &zip, config.as_deref(), json),
        Commands::Mock { source, zip } => run_mock(source, &zip),
        Commands::Probe { config } => run_probe(config.as_deref()),
        Commands::Property {
            apn,
            county,
            zip,
            config,
        } => run_property(&apn, &county, &zip, config.as_deref()),
        Commands::Counties => run_counties(),
        Commands::Export {
            zips,
            out,
            format,
            config,
        } => run_export(&zips, &out, format, config.as_deref()),
    }
}

/// `RUST_LOG` wins; otherwise warn, or debug with `-v`.
fn init_tracing(verbose: bool) {
    let default = if verbose { Level::DEBUG } else { Level::WARN };
    let filter = EnvFilter::builder()
        .with_default_directive(default.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn transport() -> Result<Arc<dyn HttpTransport>> {
    Ok(Arc::new(ReqwestTransport::new()?))
}

fn build_aggregator(sources: &SourcesFile) -> Result<Aggregator> {
    Ok(sources.build_aggregator(transport()?))
}

fn run_lookup(
    zips: &[String],
    config: Option<&Path>,
    strategy: Option<MergeStrategy>,
    min_sources: Option<usize>,
    mock_fallback: bool,
    json: bool,
) -> Result<()> {
    let mut sources = SourcesFile::load_optional(config)?;
    if let Some(strategy) = strategy {
        sources.aggregator.strategy = strategy;
    }
    if let Some(n) = min_sources {
        sources.aggregator.minimum_sources = n;
    }
    sources.aggregator.mock_fallback |= mock_fallback;

    let aggregator = build_aggregator(&sources)?;
    let mut failed = 0;

    for zip in zips {
        match aggregator.fetch_aggregated(zip, &FetchOptions::default()) {
            Ok(result) if json => println!("{}", serde_json::to_string_pretty(&result)?),
            Ok(result) => print_aggregated(&result),
            Err(e) => {
                eprintln!("Error for {zip}: {e}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} lookups failed", zips.len());
    }
    Ok(())
}

fn run_fetch(source: DataSource, zip: &str, config: Option<&Path>, json: bool) -> Result<()> {
    if !source.is_adapter() {
        bail!("'{source}' is not an adapter. Valid: census, county_assessor, zillow, realtor, mls");
    }
    let sources = SourcesFile::load_optional(config)?;
    let adapter = marketlens_core::create_adapter(source, sources.config_for(source), transport()?)?;

    let record = adapter
        .fetch_data(zip, &FetchOptions::default())
        .with_context(|| format!("{source} fetch failed for {zip}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print_record(&record);
    }
    Ok(())
}

fn run_mock(source: DataSource, zip: &str) -> Result<()> {
    let zip = validate_zip(zip)?;
    let Some(raw) = mock::mock_raw_json(source, zip) else {
        bail!("no mock shape for '{source}'. Valid: census, county_assessor, zillow, realtor, mls");
    };
    println!("{}", serde_json::to_string_pretty(&raw)?);
    Ok(())
}

fn run_probe(config: Option<&Path>) -> Result<()> {
    let sources = SourcesFile::load_optional(config)?;
    let aggregator = build_aggregator(&sources)?;

    println!(
        "{:<16} {:<28} {:>8} {:>8} {:>10}",
        "Source", "Name", "API", "Enabled", "Available"
    );
    println!("{}", "-".repeat(74));
    for (meta, available) in aggregator.probe_all() {
        println!(
            "{:<16} {:<28} {:>8} {:>8} {:>10}",
            meta.source.as_str(),
            meta.name,
            meta.api_version,
            if meta.is_available { "yes" } else { "no" },
            if available { "yes" } else { "no" },
        );
    }
    Ok(())
}

fn run_property(apn: &str, county: &str, zip: &str, config: Option<&Path>) -> Result<()> {
    let zip = validate_zip(zip)?;
    let sources = SourcesFile::load_optional(config)?;
    let adapter = CountyAssessorAdapter::new(
        sources.config_for(DataSource::CountyAssessor),
        CountyRegistry::builtin(),
        transport()?,
    );

    let data = adapter.fetch_property_data(apn, county, &FetchOptions::default())?;
    println!("{}", serde_json::to_string_pretty(&data)?);
    println!();
    print_record(&county_to_standard(&data, zip, Utc::now()));
    Ok(())
}

fn run_counties() -> Result<()> {
    let registry = CountyRegistry::builtin();
    println!("{:<12} {:<28} {:<40} {:>10}", "Key", "Name", "Base URL", "Rate/min");
    println!("{}", "-".repeat(93));
    for county in registry.iter() {
        println!(
            "{:<12} {:<28} {:<40} {:>10}",
            county.key, county.name, county.base_url, county.rate_limit
        );
    }
    Ok(())
}

fn run_export(zips: &[String], out: &Path, format: ExportFormat, config: Option<&Path>) -> Result<()> {
    let sources = SourcesFile::load_optional(config)?;
    let aggregator = build_aggregator(&sources)?;

    let mut results = Vec::with_capacity(zips.len());
    for zip in zips {
        match aggregator.fetch_aggregated(zip, &FetchOptions::default()) {
            Ok(result) => results.push(result),
            Err(e) => eprintln!("Skipping {zip}: {e}"),
        }
    }
    if results.is_empty() {
        bail!("no ZIP code could be aggregated; nothing written");
    }

    write_export(&results, out, format)?;
    println!("Wrote {} of {} ZIP codes to {}", results.len(), zips.len(), out.display());
    if format == ExportFormat::Csv && results.len() <= 3 {
        print!("{}", export_csv(&results)?);
    }
    Ok(())
}

fn print_record(r: &StandardMarketData) {
    println!("=== {} ({}) ===", r.zip_code, r.data_source);
    if r.city != marketlens_core::model::UNKNOWN {
        println!("  Location:           {}, {}", r.city, r.state);
    }
    println!("  Median Rent:        ${:.0}", r.median_rent);
    println!("  Median Price:       ${:.0}", r.median_price);
    println!("  Rent Growth (12mo): {:.2}%", r.rent_growth_12mo);
    println!("  Appreciation (12mo):{:.2}%", r.appreciation_rate_12mo);
    println!("  Vacancy Rate:       {:.2}%", r.vacancy_rate);
    println!("  Days on Market:     {:.0}", r.days_on_market);
    println!("  Foreclosure Rate:   {:.2}%", r.foreclosure_rate);
    println!("  Economic Diversity: {:.1}", r.economic_diversity_index);
    println!("  Safety Score:       {:.1}", r.crime_safety_score);
    println!("  School Rating:      {:.1}", r.school_rating);
    println!("  Confidence:         {}", r.confidence);
    println!("  Updated:            {}", r.date_updated.format("%Y-%m-%d %H:%M:%S UTC"));
}

fn print_aggregated(result: &AggregatedMarketData) {
    print_record(&result.data);
    let sources: Vec<&str> = result.sources.iter().map(|s| s.as_str()).collect();
    println!("  Sources:            {}", sources.join(", "));
    for (source, q) in &result.quality_scores {
        println!(
            "    {:<16} completeness {:>5.1}%  confidence {:>3}  overall {:>3}",
            source.as_str(),
            q.completeness,
            q.confidence,
            q.overall
        );
    }
    for f in &result.failures {
        println!("  Failed: {} ({}): {}", f.source, f.kind, f.message);
    }
    println!();
}
