use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use quasar_client::{GitHubClient, GitHubConfig};
use quasar_core::maintenance::TracingMaintenanceReporter;
use quasar_db::{Database, DatabaseConfig};
use quasar_server::config::ServerConfig;
use quasar_server::routes;
use quasar_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("quasar=info".parse()?))
        .with_target(false)
        .init();

    let config = ServerConfig::from_env()?;
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    let db = Database::connect(&DatabaseConfig::from_env()?).await?;
    db.migrate().await?;

    let github = match GitHubConfig::from_env()? {
        Some(github_config) => Some(GitHubClient::new(github_config)?),
        None => {
            tracing::info!("GitHub login disabled: GITHUB_CLIENT_ID not set");
            None
        }
    };

    let cors = cors_layer(&config.allowed_origins)?;
    let state = Arc::new(AppState::new(db, config, github));

    let cancel_token = CancellationToken::new();
    let maintenance = state.maintenance();
    let sweeper_token = cancel_token.clone();
    let sweeper = tokio::spawn(async move {
        maintenance
            .run(sweeper_token, &TracingMaintenanceReporter)
            .await;
    });

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    tracing::info!("Starting server on {addr}");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(cancel_token.clone()))
    .await?;

    cancel_token.cancel();
    if let Err(e) = sweeper.await {
        tracing::warn!(error = %e, "Maintenance task ended abnormally");
    }
    Ok(())
}

fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|origin| HeaderValue::from_str(origin))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true))
}

async fn shutdown_signal(cancel_token: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for CTRL+C");
    }
    tracing::info!("Shutdown signal received");
    cancel_token.cancel();
}
