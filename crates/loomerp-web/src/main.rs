//! LoomERP web server
//!
//! Run with: cargo run -p loomerp-web

use anyhow::Context;
use loomerp_config::Config;
use loomerp_db::Database;
use loomerp_web::auth::ensure_bootstrap_admin;
use loomerp_web::router::build_router;
use loomerp_web::state::AppState;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting LoomERP web server...");

    let db = Database::connect(&config.database)
        .await
        .context("connecting to MySQL")?;
    if config.database.initialize_schema {
        db.initialize().await.context("initializing schema")?;
    }
    ensure_bootstrap_admin(&db, &config.auth).await?;

    let bind = config.server.bind.clone();
    let app = build_router(AppState::new(db, config));

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("binding {}", bind))?;
    info!("Server listening on http://{}", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
