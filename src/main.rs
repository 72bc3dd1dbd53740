use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use landtrade_profile_api::config::config;
use landtrade_profile_api::database::DatabaseManager;
use landtrade_profile_api::state::AppState;
use landtrade_profile_api::uploads::LocalUploadBackend;
use landtrade_profile_api::{app, is_production};

/// Account profile API server
#[derive(Debug, Parser)]
#[command(name = "landtrade-profile-api", version, about)]
struct Args {
    /// Port to listen on (overrides PROFILE_API_PORT / PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind (overrides SERVER_BIND_ADDRESS)
    #[arg(short, long)]
    bind: Option<String>,

    /// Apply database migrations on startup regardless of environment
    #[arg(long)]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SESSION_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let args = Args::parse();

    // Initialize configuration (this loads the config singleton)
    let config = config();
    tracing::info!("Starting profile API in {:?} mode", config.environment);

    if config.security.session_secret.is_empty() {
        if is_production!() {
            anyhow::bail!("SESSION_SECRET must be set in production");
        }
        tracing::warn!("SESSION_SECRET is empty; every authenticated request will be rejected");
    }

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    DatabaseManager::health_check(&pool)
        .await
        .context("database health check failed")?;

    if args.migrate || config.database.run_migrations {
        DatabaseManager::migrate(&pool)
            .await
            .context("failed to apply migrations")?;
    }

    let uploads = LocalUploadBackend::new(&config.uploads.root_dir, config.uploads.public_prefix.clone());
    uploads
        .initialize()
        .await
        .with_context(|| format!("failed to create upload directories under {:?}", uploads.root()))?;

    let state = AppState::postgres(pool, config, Arc::new(uploads));
    let app = app(state);

    let bind_address = args.bind.unwrap_or_else(|| config.server.bind_address.clone());
    let port = args.port.unwrap_or(config.server.port);
    let bind_addr = format!("{}:{}", bind_address, port);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Profile API listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Profile API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
