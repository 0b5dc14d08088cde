use std::sync::Arc;

use crate::{
    config::Config,
    platform::{AuthApi, ForumStore, PresenceStore, StorageApi, Supabase},
    services::{presence::PresenceHub, session::SessionManager},
};

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<dyn AuthApi>,
    pub store: Arc<dyn ForumStore>,
    pub presence: Arc<dyn PresenceStore>,
    pub storage: Arc<dyn StorageApi>,
    pub hub: PresenceHub,
    pub config: Config,
}

impl AppState {
    pub fn new(
        auth: Arc<dyn AuthApi>,
        store: Arc<dyn ForumStore>,
        presence: Arc<dyn PresenceStore>,
        storage: Arc<dyn StorageApi>,
        config: Config,
    ) -> Self {
        Self {
            auth,
            store,
            presence,
            storage,
            hub: PresenceHub::new(),
            config,
        }
    }

    /// Wires every platform trait to one shared REST client.
    pub fn from_supabase(client: Supabase, config: Config) -> Self {
        let client = Arc::new(client);
        Self::new(
            client.clone(),
            client.clone(),
            client.clone(),
            client,
            config,
        )
    }

    pub fn sessions(&self) -> SessionManager {
        SessionManager::new(self.auth.clone(), self.store.clone())
    }
}
