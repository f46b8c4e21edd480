//! canopy-server - Rainforest explorer content service
//!
//! Single-binary HTTP service over SQLite: explorer points, category
//! records with researcher gating, sessions, and admin schema repair.

use anyhow::Result;
use canopy_server::{build_router, AppState};
use canopy_common::api::auth::load_shared_secret;
use canopy_common::config;
use canopy_common::db::init_database;
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "canopy-server", version, about = "Rainforest explorer content service")]
struct Args {
    /// Root folder holding the database (overrides CANOPY_ROOT and config file)
    #[arg(long)]
    root_folder: Option<String>,

    /// Bind host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Bind port
    #[arg(long, default_value_t = 5730)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting Canopy server v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let root_folder = config::resolve_root_folder(args.root_folder.as_deref(), "CANOPY_ROOT");
    config::ensure_root_folder(&root_folder)?;

    let db_path = config::database_path(&root_folder);
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path).await?;
    info!("Database initialized");

    // Shared secret for admin endpoints (generated on first run; 0 disables)
    let admin_secret = load_shared_secret(&pool).await?;
    if admin_secret == 0 {
        info!("Admin API authentication disabled (admin_shared_secret = 0)");
    } else {
        info!("Loaded admin shared secret");
    }

    let state = AppState::new(pool, admin_secret);
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("canopy-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
