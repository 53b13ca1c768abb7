//! F1 Standings
//!
//! REST API and CLI for drivers' championship tables built from OpenF1 data,
//! with team and driver exclusion filters.

mod cache;
mod cli;
mod config;
mod openf1;
mod retry;
mod routes;
mod standings;
mod storage;
mod types;

use axum::{routing::get, routing::post, Router};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cache::StandingsCache;
use crate::cli::{Cli, Commands, ImportJob};
use crate::config::AppConfig;
use crate::routes::AppState;
use crate::standings::StandingsFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for command output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "f1_standings=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = AppConfig::load()?;
    if let Some(path) = cli.database {
        config.database.path = path.to_string_lossy().to_string();
    }

    match cli.command {
        Commands::Serve { host, port } => run_server(config, host, port).await,
        Commands::Standings {
            season,
            exclude_teams,
            exclude_drivers,
            format,
            no_cache,
        } => {
            let filter = StandingsFilter {
                exclude_teams,
                exclude_driver_numbers: exclude_drivers,
                season,
            };
            cli::run_standings(&config, filter, &format, no_cache)
        }
        Commands::ImportSessions { year } => {
            cli::run_import(&config, ImportJob::Sessions { year }).await
        }
        Commands::ImportResults { year } => {
            cli::run_import(&config, ImportJob::Results { year }).await
        }
        Commands::ImportDrivers {
            session_key,
            all,
            year,
        } => {
            let job = match session_key {
                Some(session_key) if !all => ImportJob::Drivers { session_key },
                _ => ImportJob::DriversForSeason { year },
            };
            cli::run_import(&config, job).await
        }
        Commands::InvalidateCache => cli::run_invalidate_cache(&config),
    }
}

/// Run the API server.
async fn run_server(
    mut config: AppConfig,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    // Override with CLI args
    if let Some(h) = host {
        config.server.host = h;
    }
    if let Some(p) = port {
        config.server.port = p;
    }

    tracing::info!("Configuration loaded");
    tracing::info!("Database path: {}", config.database.path);

    let repo = cli::open_repository(&config)?;
    tracing::info!("Database ready with {} sessions", repo.session_count()?);

    let cache = StandingsCache::from_config(&config.cache);
    if cache.is_enabled() {
        tracing::info!(
            "Standings cache at {} (ttl {}s)",
            cache.base_dir().display(),
            config.cache.ttl_secs
        );
    } else {
        tracing::info!("Standings cache disabled");
    }

    // Create application state
    let state = Arc::new(AppState {
        repo: Mutex::new(repo),
        cache,
    });

    // Build router
    let app = Router::new()
        .route("/health", get(routes::health))
        .route("/standings", get(routes::standings))
        .route("/standings/revalidate", post(routes::revalidate))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Start server
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
