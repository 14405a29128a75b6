/**
 * Main Router Configuration
 *
 * Assembles the application router:
 *
 * 1. **Public routes**: `GET /health`, `GET /ws` (the socket authenticates
 *    during its own handshake)
 * 2. **API routes**: authenticated REST under `/api`
 * 3. **Layers**: request tracing and CORS
 * 4. **Fallback**: JSON 404
 */

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::backend::error::BackendError;
use crate::backend::handlers::health;
use crate::backend::realtime::ws_handler;
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::server::state::AppState;

pub fn create_router(app_state: AppState) -> Router<()> {
    let router = Router::new()
        .route("/health", get(health))
        .route("/ws", get(ws_handler));

    let router = configure_api_routes(router, app_state.clone());

    router
        .fallback(|| async { BackendError::not_found("Route not found") })
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
