//! Server entry point.

use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use autolot_config::{load_settings, Settings};
use autolot_server::{create_router, init_metrics, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env = std::env::var("AUTOLOT_ENV").ok();
    let settings = match load_settings(env.as_deref()) {
        Ok(settings) => {
            eprintln!("loaded configuration (env: {})", env.as_deref().unwrap_or("default"));
            settings
        }
        Err(e) => {
            eprintln!("warning: failed to load config: {e}. Using defaults.");
            Settings::default()
        }
    };

    init_tracing(&settings);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting autolot-server");
    tracing::info!(environment = ?settings.environment, config = env.as_deref().unwrap_or("default"), "configuration loaded");

    init_metrics();
    tracing::info!("Prometheus metrics initialized at /metrics");

    let port = settings.server.port;
    let state = AppState::with_env(settings, env);
    state.spawn_session_sweeper();

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}

fn init_tracing(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("autolot={},tower_http=debug", settings.observability.log_level).into());

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer =
        if settings.observability.log_json { tracing_subscriber::fmt::layer().json().boxed() } else { tracing_subscriber::fmt::layer().boxed() };
    subscriber.with(fmt_layer).init();
}
