use std::net::SocketAddr;

use crate::{
    rest, session::CookieStore, settings::Settings, store::sqlstore::SqlStore, AppState,
};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Connects the database, then serves the API on `settings.bind_addr` until
/// Ctrl+C or SIGTERM.
pub async fn start(settings: Settings) -> Result<(), BoxError> {
    let store = SqlStore::connect(&settings.database_url).await?;
    store.ensure_schema().await?;
    let sessions = CookieStore::new(settings.session_key.as_bytes());

    let state = AppState::new(store, sessions);
    let app = rest::router(state);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("starting server on {}", settings.bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("failed to install signal handler: {}", e);
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
}
