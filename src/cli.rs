//! CLI commands for f1-standings.
//!
//! Supports API server mode, one-shot standings queries and the OpenF1
//! import jobs that fill the local database.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::cache::{CacheKey, StandingsCache};
use crate::config::AppConfig;
use crate::openf1::{import, ImportSummary, OpenF1Client};
use crate::standings::{compute_standings, SeasonStanding, StandingsFilter};
use crate::storage::StandingsRepository;
use crate::types::StandingsResponse;

#[derive(Parser)]
#[command(name = "f1-standings")]
#[command(version, about = "F1 championship standings from OpenF1 data", long_about = None)]
pub struct Cli {
    /// SQLite database path (overrides config)
    #[arg(long, global = true, value_name = "PATH")]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Compute the championship table
    Standings {
        /// Season year (defaults to the latest imported season)
        #[arg(short, long)]
        season: Option<i32>,

        /// Team name fragments to exclude, case-insensitive
        #[arg(long = "exclude-team", value_delimiter = ',')]
        exclude_teams: Vec<String>,

        /// Car numbers to exclude
        #[arg(long = "exclude-driver", value_delimiter = ',')]
        exclude_drivers: Vec<u32>,

        /// Output format (json, table)
        #[arg(short, long, default_value = "table", value_parser = ["json", "table"])]
        format: String,

        /// Bypass the standings cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Import race and sprint sessions of a year from OpenF1
    ImportSessions {
        #[arg(short, long)]
        year: i32,
    },

    /// Import results for stored sessions from OpenF1
    ImportResults {
        /// Limit to sessions of this year
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Import driver snapshots from OpenF1
    ImportDrivers {
        /// Single session to import
        #[arg(long, required_unless_present = "all", conflicts_with = "all")]
        session_key: Option<i64>,

        /// Every stored session
        #[arg(long)]
        all: bool,

        /// With --all, limit to sessions of this year
        #[arg(short, long, requires = "all")]
        year: Option<i32>,
    },

    /// Remove every cached standings table
    InvalidateCache,
}

/// Which import job to run
pub enum ImportJob {
    Sessions { year: i32 },
    Results { year: Option<i32> },
    Drivers { session_key: i64 },
    DriversForSeason { year: Option<i32> },
}

pub fn open_repository(config: &AppConfig) -> anyhow::Result<StandingsRepository> {
    StandingsRepository::new(Path::new(&config.database.path))
        .with_context(|| format!("Failed to open database {}", config.database.path))
}

/// Compute and print standings.
pub fn run_standings(
    config: &AppConfig,
    filter: StandingsFilter,
    format: &str,
    no_cache: bool,
) -> anyhow::Result<()> {
    let repo = open_repository(config)?;
    let cache = if no_cache {
        StandingsCache::disabled()
    } else {
        StandingsCache::from_config(&config.cache)
    };

    let standings = cache.get_or_compute(&CacheKey::for_filter(&filter), || {
        compute_standings(&repo, &filter)
    })?;

    match format {
        "json" => {
            let response = StandingsResponse::new(&filter, standings);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        _ => print_table(standings.season, &standings.rows),
    }

    Ok(())
}

/// Run an import job and drop cached tables if anything changed.
pub async fn run_import(config: &AppConfig, job: ImportJob) -> anyhow::Result<()> {
    let repo = open_repository(config)?;
    let client = OpenF1Client::new(&config.openf1)?;

    let summary = match job {
        ImportJob::Sessions { year } => import::import_sessions(&client, &repo, year).await?,
        ImportJob::Results { year } => import::import_session_results(&client, &repo, year).await?,
        ImportJob::Drivers { session_key } => {
            import::import_drivers(&client, &repo, session_key).await?
        }
        ImportJob::DriversForSeason { year } => {
            import::import_drivers_for_season(&client, &repo, year).await?
        }
    };

    if summary.upserted > 0 {
        let removed = StandingsCache::from_config(&config.cache).invalidate()?;
        tracing::info!(removed, "Standings cache invalidated after import");
    }

    print_summary(&summary)?;
    Ok(())
}

/// Drop every cached standings table.
pub fn run_invalidate_cache(config: &AppConfig) -> anyhow::Result<()> {
    let cache = StandingsCache::from_config(&config.cache);
    let removed = cache.invalidate()?;
    eprintln!(
        "Removed {} cached standings from {}",
        removed,
        cache.base_dir().display()
    );
    Ok(())
}

fn print_summary(summary: &ImportSummary) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}

/// Print standings in table format.
fn print_table(season: i32, rows: &[SeasonStanding]) {
    println!("=== {} Drivers' Championship ===", season);
    if rows.is_empty() {
        println!("  (no drivers left after exclusions)");
        return;
    }

    println!(
        "  {:>3}  {:>3}  {:<24} {:<4} {:<26} {:>5} {:>4} {:>4} {:>4}",
        "Pos", "No", "Driver", "Nat", "Team", "Pts", "Win", "SWin", "Pod"
    );
    for r in rows {
        println!(
            "  {:>3}  {:>3}  {:<24} {:<4} {:<26} {:>5} {:>4} {:>4} {:>4}",
            r.position,
            r.driver_number,
            r.driver,
            r.nationality,
            r.team,
            r.points,
            r.wins,
            r.sprint_wins,
            r.podiums
        );
    }
}
