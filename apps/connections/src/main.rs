use anyhow::Result;
use std::net::SocketAddr;
use tracing::info;

use connections::config::Config;
use connections::db::create_pool;
use connections::routes::build_router;
use connections::state::AppState;
use connections::telemetry::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config.rust_log);

    info!("Starting Connections API v{}", env!("CARGO_PKG_VERSION"));

    let db = create_pool(config.connect_options()).await?;

    let app = build_router(AppState { db });

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
