#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI for querying climate risk datasets.
//!
//! ```text
//! climate_risk [--manifest datasets.toml] assess --threshold 25 --period 2081-2100
//! climate_risk climate --lat 40.7 --lng -74.0 --period 2041-2060
//! climate_risk change --lat 40.7 --lng -74.0 --to 2081-2100
//! climate_risk anomaly --lat 40.7 --lng -74.0 --period 2061-2080
//! climate_risk coast --lat 40.7 --lng -74.0
//! climate_risk emissions --year 2022 --top 10
//! ```
//!
//! Every command loads the manifest's datasets first, showing an overall
//! progress bar. Uses `indicatif-log-bridge` (via
//! [`climate_risk_cli_utils::init_logger`]) so that log lines and the
//! progress bar never fight for the terminal.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use climate_risk_cli_utils::IndicatifProgress;
use climate_risk_loader::{DatasetLoader, DatasetManifest, EngineContext};
use climate_risk_models::{Coordinate, Period};

#[derive(Parser)]
#[command(
    name = "climate_risk",
    about = "Query climate projections, coastline risk, and emissions"
)]
struct Cli {
    /// Dataset manifest (TOML)
    #[arg(long, default_value = "datasets.toml")]
    manifest: PathBuf,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every city by distance to the coast
    Assess {
        /// Submerged threshold in miles (twice this is "at risk")
        #[arg(long, default_value = "25")]
        threshold: f64,
        /// Projection period label, e.g. 2081-2100
        #[arg(long, default_value = "2081-2100", value_parser = Period::from_label)]
        period: Period,
    },
    /// Projected temperature of the nearest climate sample
    Climate {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        #[arg(long, default_value = "2021-2040", value_parser = Period::from_label)]
        period: Period,
    },
    /// Temperature change between two periods
    Change {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        #[arg(long, default_value = "2021-2040", value_parser = Period::from_label)]
        from: Period,
        /// Target period; every projection period when omitted
        #[arg(long, value_parser = Period::from_label)]
        to: Option<Period>,
    },
    /// Precomputed anomaly of the nearest anomaly cell
    Anomaly {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        #[arg(long, default_value = "2081-2100", value_parser = Period::from_label)]
        period: Period,
    },
    /// Distance in miles to the nearest coastline vertex
    Coast {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
    },
    /// Emissions by country and year
    Emissions {
        #[arg(long)]
        year: Option<u16>,
        /// ISO alpha-3 country code
        #[arg(long)]
        country: Option<String>,
        /// Number of top emitters to list for a year
        #[arg(long, default_value = "10")]
        top: usize,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = climate_risk_cli_utils::init_logger();
    let cli = Cli::parse();

    let manifest = DatasetManifest::load(&cli.manifest).await?;
    let loader = DatasetLoader::new(manifest)?
        .with_progress(IndicatifProgress::load_bar(&multi, "Loading datasets"));
    let ctx = loader.load().await?;

    match cli.command {
        Commands::Assess { threshold, period } => assess(&ctx, threshold, period, cli.json)?,
        Commands::Climate { lat, lng, period } => {
            let value = ctx.nearest_value(&Coordinate::new(lat, lng), period);
            if cli.json {
                println!("{}", serde_json::json!({ "period": period, "value": value }));
            } else {
                println!("{period}: {}", format_temp(value));
            }
        }
        Commands::Change { lat, lng, from, to } => {
            let point = Coordinate::new(lat, lng);
            let series = match to {
                Some(to) => vec![(to, ctx.change(&point, from, to))],
                None => ctx.comparator().change_series(&point, from),
            };
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&series)?);
            } else {
                for (to, change) in series {
                    println!("{from} -> {to}: {}", format_delta(change));
                }
            }
        }
        Commands::Anomaly { lat, lng, period } => {
            let diff = ctx.anomaly_diff(&Coordinate::new(lat, lng), period);
            if cli.json {
                println!("{}", serde_json::json!({ "period": period, "diff": diff }));
            } else {
                println!("{period} vs baseline: {}", format_delta(diff));
            }
        }
        Commands::Coast { lat, lng } => {
            let miles = ctx.min_distance_to_coastline(&Coordinate::new(lat, lng));
            if !ctx.geometry().has_coastline_data() {
                log::warn!("No coastline data loaded; distance is a placeholder");
            }
            if cli.json {
                println!("{}", serde_json::json!({ "miles": miles }));
            } else {
                println!("{miles:.1} mi");
            }
        }
        Commands::Emissions { year, country, top } => {
            emissions(&ctx, year, country.as_deref(), top, cli.json)?;
        }
    }

    Ok(())
}

fn assess(
    ctx: &EngineContext,
    threshold: f64,
    period: Period,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let assessments = ctx.assess_cities(threshold, period);

    if json {
        println!("{}", serde_json::to_string_pretty(&assessments)?);
        return Ok(());
    }

    println!(
        "{:<28} {:>10} {:<10} {:>9} {:>9}",
        "CITY", "COAST MI", "RISK", "TEMP", "CHANGE"
    );
    println!("{}", "-".repeat(70));
    for a in &assessments {
        println!(
            "{:<28} {:>10.1} {:<10} {:>9} {:>9}",
            a.name,
            a.distance_to_coast,
            a.risk.as_ref(),
            format_temp(a.real_temp),
            format_delta(a.temp_change)
        );
    }

    println!();
    for (risk, count) in ctx.risk_counts(threshold) {
        println!("{risk}: {count}");
    }

    Ok(())
}

fn emissions(
    ctx: &EngineContext,
    year: Option<u16>,
    country: Option<&str>,
    top: usize,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let agg = ctx.emissions();

    if agg.is_empty() {
        eprintln!("No emissions dataset loaded.");
        std::process::exit(1);
    }

    match (country, year) {
        (Some(country), Some(year)) => {
            let Some(detail) = agg.country_detail(country, year) else {
                eprintln!("No emissions for {country} in {year}");
                std::process::exit(1);
            };
            if json {
                println!("{}", serde_json::to_string_pretty(detail)?);
            } else {
                println!("{} ({}) {year}: {:.3}", detail.country_name, detail.country_code, detail.total);
                for (sector, value) in &detail.sectors {
                    println!("  {sector:<40} {value:>14.3}");
                }
            }
        }
        (Some(country), None) => {
            let series = agg.country_series(country);
            if json {
                println!("{}", serde_json::to_string_pretty(&series)?);
            } else {
                for (year, total) in series {
                    println!("{year}  {total:>14.3}");
                }
            }
        }
        (None, Some(year)) => {
            let emitters = agg.top_emitters(year, top);
            let global = agg.global_total_for_year(year);
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "year": year,
                        "globalTotal": global,
                        "top": emitters,
                    }))?
                );
            } else {
                println!("Global total {year}: {global:.3}");
                for (rank, record) in emitters.iter().enumerate() {
                    println!(
                        "{:>3}. {:<5} {:<32} {:>14.3}",
                        rank + 1,
                        record.country_code,
                        record.country_name,
                        record.total
                    );
                }
            }
        }
        (None, None) => {
            let years = agg.years();
            if json {
                println!(
                    "{}",
                    serde_json::json!({ "countries": agg.country_count(), "years": years })
                );
            } else {
                println!("{} countries", agg.country_count());
                if let (Some(first), Some(last)) = (years.first(), years.last()) {
                    println!("Years {first}-{last}");
                }
            }
        }
    }

    Ok(())
}

fn format_temp(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}°C"))
}

fn format_delta(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:+.2}°C"))
}
