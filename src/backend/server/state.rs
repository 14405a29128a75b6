/**
 * Application State Management
 *
 * `AppState` is the single state container handed to every Axum handler.
 * Everything in it is cheap to clone (`Arc`s and the `Broadcaster` handle).
 *
 * # Contents
 *
 * - `store` - board persistence (PostgreSQL or in-memory)
 * - `registry` - board room presence
 * - `hub` - outbound queue per live socket
 * - `broadcaster` - fans events out to rooms; attached to `hub` on creation
 * - `config` - server settings
 *
 * The `FromRef` implementations let handlers extract just the part they use.
 */

use std::sync::Arc;

use axum::extract::FromRef;

use crate::backend::realtime::{Broadcaster, ConnectionHub, PresenceRegistry};
use crate::backend::server::config::ServerConfig;
use crate::backend::store::BoardStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BoardStore>,
    pub registry: Arc<PresenceRegistry>,
    pub hub: Arc<ConnectionHub>,
    pub broadcaster: Broadcaster,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Builds the realtime core around a store and wires the transport
    pub fn new(store: Arc<dyn BoardStore>, config: ServerConfig) -> Self {
        let registry = Arc::new(PresenceRegistry::new());
        let hub = Arc::new(ConnectionHub::with_capacity(config.ws_queue_capacity));
        let broadcaster = Broadcaster::new(registry.clone());
        broadcaster.attach_transport(hub.clone());

        Self {
            store,
            registry,
            hub,
            broadcaster,
            config: Arc::new(config),
        }
    }
}

impl FromRef<AppState> for Arc<dyn BoardStore> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Broadcaster {
    fn from_ref(state: &AppState) -> Self {
        state.broadcaster.clone()
    }
}

impl FromRef<AppState> for Arc<ServerConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::store::MemoryStore;

    #[test]
    fn test_new_attaches_transport() {
        let state = AppState::new(Arc::new(MemoryStore::new()), ServerConfig::default());
        assert!(state.broadcaster.has_transport());
        assert_eq!(state.hub.connection_count(), 0);
        assert_eq!(state.registry.room_count(), 0);
    }
}
