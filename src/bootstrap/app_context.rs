use std::sync::Arc;

use tokio::sync::broadcast;

use crate::application::ports::api_keys_port::ApiKeysPort;
use crate::application::ports::auth_port::AuthPort;
use crate::application::ports::items_port::ItemsPort;
use crate::application::ports::notifier::Notifier;
use crate::application::ports::session_store::{SessionEvent, SessionStore};
use crate::bootstrap::config::Config;
use crate::infrastructure::http::HttpVaultClient;
use crate::infrastructure::memory::InMemoryVault;
use crate::infrastructure::notify::TracingNotifier;
use crate::infrastructure::session::{FileSessionStore, MemorySessionStore};

#[derive(Clone)]
pub struct AppContext {
    pub cfg: Config,
    services: Arc<AppServices>,
}

#[derive(Clone)]
pub struct AppServices {
    items: Arc<dyn ItemsPort>,
    auth: Arc<dyn AuthPort>,
    api_keys: Arc<dyn ApiKeysPort>,
    sessions: Arc<dyn SessionStore>,
    notifier: Arc<dyn Notifier>,
    session_events: broadcast::Sender<SessionEvent>,
}

impl AppServices {
    pub fn new(
        items: Arc<dyn ItemsPort>,
        auth: Arc<dyn AuthPort>,
        api_keys: Arc<dyn ApiKeysPort>,
        sessions: Arc<dyn SessionStore>,
        notifier: Arc<dyn Notifier>,
        session_events: broadcast::Sender<SessionEvent>,
    ) -> Self {
        Self {
            items,
            auth,
            api_keys,
            sessions,
            notifier,
            session_events,
        }
    }

    /// Talks to the vault API; the session survives between invocations.
    pub fn remote(cfg: &Config) -> anyhow::Result<Self> {
        let (session_events, _) = broadcast::channel(16);
        let sessions: Arc<dyn SessionStore> =
            Arc::new(FileSessionStore::new(cfg.session_file.clone()));
        let client = Arc::new(HttpVaultClient::new(
            &cfg.api_url,
            cfg.request_timeout(),
            sessions.clone(),
            session_events.clone(),
        )?);
        Ok(Self::new(
            client.clone(),
            client.clone(),
            client,
            sessions,
            Arc::new(TracingNotifier),
            session_events,
        ))
    }

    /// Process-local vault, nothing leaves memory.
    pub fn memory(vault: Arc<InMemoryVault>) -> Self {
        let (session_events, _) = broadcast::channel(16);
        Self::new(
            vault.clone(),
            vault.clone(),
            vault,
            Arc::new(MemorySessionStore::default()),
            Arc::new(TracingNotifier),
            session_events,
        )
    }
}

impl AppContext {
    pub fn new(cfg: Config, services: AppServices) -> Self {
        Self {
            cfg,
            services: Arc::new(services),
        }
    }

    pub fn items(&self) -> Arc<dyn ItemsPort> {
        self.services.items.clone()
    }

    pub fn auth(&self) -> Arc<dyn AuthPort> {
        self.services.auth.clone()
    }

    pub fn api_keys(&self) -> Arc<dyn ApiKeysPort> {
        self.services.api_keys.clone()
    }

    pub fn sessions(&self) -> Arc<dyn SessionStore> {
        self.services.sessions.clone()
    }

    pub fn notifier(&self) -> Arc<dyn Notifier> {
        self.services.notifier.clone()
    }

    pub fn subscribe_session_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.services.session_events.subscribe()
    }
}
