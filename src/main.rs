// src/main.rs
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use poll_backend::{build_state, config::Config, routes};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("poll_backend=info,tower_http=info")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let state = match build_state(&config).await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("failed to initialize storage: {e}");
            std::process::exit(1);
        }
    };

    let app = routes::create_routes(state, config.cors_origin.as_deref());

    // Stop accepting connections on Ctrl-C and give in-flight requests time to finish
    let handle = axum_server::Handle::new();
    let shutdown = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutting down");
            shutdown.graceful_shutdown(Some(Duration::from_secs(10)));
        }
    });

    let addr = config.bind_addr();
    tracing::info!("server running at http://{addr}");

    if let Err(e) = axum_server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service())
        .await
    {
        tracing::error!("server error: {e}");
        std::process::exit(1);
    }
}
