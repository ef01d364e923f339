use anyhow::Result;
use operator_console::{
    config::ConsoleConfig,
    routes,
    state::AppState,
    stream::{HttpStreamControl, StreamControl},
};
use overlay_session::{AssetUploader, HttpAssetUploader, HttpOverlayStore, OverlayStore, SessionManager};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_with_service("operator-console");

    let config = ConsoleConfig::from_env()?;
    let store: Arc<dyn OverlayStore> =
        Arc::new(HttpOverlayStore::new(config.api_base_url.clone())?);
    let uploader: Arc<dyn AssetUploader> =
        Arc::new(HttpAssetUploader::new(config.api_base_url.clone())?);
    let stream: Arc<dyn StreamControl> =
        Arc::new(HttpStreamControl::new(config.api_base_url.clone())?);

    let session = Arc::new(SessionManager::new(store, uploader));

    // Seed the mirror; a dead backend must not keep the console from coming up.
    if let Err(err) = session.refresh().await {
        warn!(error = %err, "initial overlay fetch failed; starting with an empty list");
    }

    let state = AppState::new(config.clone(), session, stream);
    let app = routes::router(state);
    let listener = TcpListener::bind(config.bind_addr).await?;

    info!(
        addr = %config.bind_addr,
        api = %config.api_base_url,
        frontend = %config.frontend_dir.display(),
        "operator-console listening"
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
            let _ = sigterm.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
