/**
 * Taskboard Server Entry Point
 *
 * Loads `.env`, initializes tracing, builds the app and serves it until
 * Ctrl-C, then closes every WebSocket before exiting.
 */

use taskboard::backend::server::{create_app, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    tracing::info!("[Startup] Server initialization started");

    let config = ServerConfig::from_env();
    let port = config.port;
    let (app, state) = create_app(config).await;

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("[Startup] Listening on {}", addr);

    let hub = state.hub.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("[Shutdown] Failed to listen for Ctrl-C: {}", e);
                return;
            }
            tracing::info!("[Shutdown] Signal received, closing connections");
            hub.disconnect_all();
        })
        .await?;

    Ok(())
}
