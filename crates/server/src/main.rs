use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use seasongate_metadata::fetcher::HttpPageFetcher;
use seasongate_metadata::metrics::Metrics;
use seasongate_server::config::ServerConfig;
use seasongate_server::state::AppState;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ServerConfig::from_env();
    info!(db_path = %config.db_path, upstream = %config.upstream_host, "opening store");

    let pool = seasongate_db::open(&config.db_path)
        .await
        .context("failed to open store")?;

    let metrics = Metrics::new().context("failed to register metrics")?;
    let pages = Arc::new(HttpPageFetcher::new(reqwest::Client::new()));
    let bind_addr = config.bind.clone();

    let app_state = AppState::new(pool.clone(), config, pages, metrics)
        .context("failed to build http clients")?;
    let app = seasongate_server::routes::build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .context("failed to bind")?;
    info!(addr = %bind_addr, "server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown requested");
    })
    .await?;

    pool.close().await;
    info!("store closed");
    Ok(())
}
