use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use alteryx_sql_backend::{build_app, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is normal in containers
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("alteryx_sql_backend=debug,tower_http=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let (mut config, loaded_path) = Config::discover()?;
    info!("Loaded configuration from: {}", loaded_path.display());

    config.apply_env_overrides(|name| std::env::var(name).ok());
    config.validate()?;

    let addr = config.system_config.socket_addr();
    let app_state = AppState::new(config)?;
    let app = build_app(app_state);

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
