pub mod auth;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::build_app;
pub use state::AppState;

use crate::utils::error::Result;
use axum::Router;
use tokio::net::TcpListener;

/// 在已綁定的 listener 上提供服務，直到 ctrl-c
pub async fn serve(listener: TcpListener, app: Router) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("🚀 Listening on http://{}", addr);
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("❌ Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
