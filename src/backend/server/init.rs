/**
 * Server Initialization
 *
 * Builds the application state and the router.
 *
 * # Initialization Flow
 *
 * 1. **Store selection**: PostgreSQL when `DATABASE_URL` is reachable,
 *    otherwise the in-memory store
 * 2. **State creation**: presence registry, connection hub, broadcaster
 * 3. **Router creation**: REST routes, `/ws`, `/health`, middleware
 *
 * The state is returned next to the router so the binary can close every
 * socket on shutdown.
 */

use std::sync::Arc;

use axum::Router;

use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_store, ServerConfig};
use crate::backend::server::state::AppState;
use crate::backend::store::BoardStore;

pub async fn create_app(config: ServerConfig) -> (Router, AppState) {
    tracing::info!("Initializing taskboard server");
    let store = load_store(&config).await;
    create_app_with_store(store, config)
}

/// Same as `create_app` with a caller-provided store
pub fn create_app_with_store(store: Arc<dyn BoardStore>, config: ServerConfig) -> (Router, AppState) {
    let state = AppState::new(store, config);
    let app = create_router(state.clone());
    tracing::info!("Router configured");
    (app, state)
}
