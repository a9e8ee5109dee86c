use std::net::SocketAddr;

use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use facepet_backend::{AppState, CsvConnection};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides; default to info. The tracing-log bridge picks up
    // the log-macro records emitted by the domain and storage layers.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // FACEPET_DATA_DIR selects the data directory (default ./facepet-data).
    let connection = CsvConnection::new_default()?;
    info!("Data directory: {}", connection.base_directory().display());

    let state = AppState::new(connection);

    // CORS open for the app frontends; auth sits in front of this service.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let app = facepet_backend::rest::create_router(state).layer(cors);

    let addr: SocketAddr = std::env::var("FACEPET_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
        .parse()?;
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
