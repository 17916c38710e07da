use std::{net::SocketAddr, sync::Arc};

use aroyyo_gateway::{routes, AppState, Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置
    dotenv::dotenv().ok();
    let config = Config::from_env()?;

    // 初始化日志
    let registry = tracing_subscriber::registry().with(EnvFilter::new(&config.log_level));
    if config.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    info!("Starting Aroyyo gateway ({})...", config.environment);
    info!("Backend: {}", config.backend_url);

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port).parse()?;
    let app_state = Arc::new(AppState::new(config)?);
    let app = routes::app(app_state);

    info!("Starting server on http://{}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
