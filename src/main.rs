//! Countdown Timer - a tick-driven countdown engine with an HTTP front
//! 
//! This is the main entry point for the countdown-timer server.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use countdown_timer::{
    config::Config,
    state::{AppState, TimerEngine},
    api::create_router,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("countdown_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting countdown-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, duration={}s, tick={}ms",
          config.host, config.port, config.duration, config.tick_ms);

    let engine = TimerEngine::with_tick_period(config.duration, config.tick_period());
    let state = Arc::new(AppState::new(config.port, config.host.clone(), engine));

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /duration - Set countdown length ({{\"input\": \"<seconds>\"}})");
    info!("  POST /start    - Start or resume the countdown");
    info!("  POST /pause    - Pause the countdown");
    info!("  POST /restart  - Restart the countdown from zero");
    info!("  GET  /status   - Current timer and server status");
    info!("  GET  /events   - Server-sent timer updates");
    info!("  GET  /health   - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    state.engine.dispose();
    info!("Server shutdown complete");
    Ok(())
}
