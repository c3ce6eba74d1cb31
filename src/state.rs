use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::auth::{AccountService, PgUserStore, UserStore};
use crate::config::{AppConfig, StoreBackend};
use crate::db;
use crate::memory::MemoryStore;
use crate::session::{PgSessionStore, SessionService, SessionStore};
use crate::snippets::repo::{PgSnippetStore, SnippetStore};
use crate::snippets::SnippetService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub accounts: AccountService,
    pub sessions: SessionService,
    pub snippets: SnippetService,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        let state = match config.backend {
            StoreBackend::Postgres => {
                let url = config
                    .database_url
                    .clone()
                    .context("DATABASE_URL must be set")?;
                let pool = db::connect(&config, &url).await?;
                info!(max_connections = config.max_connections, "using postgres store");
                Self::from_parts(
                    config,
                    Arc::new(PgUserStore::new(pool.clone())),
                    Arc::new(PgSnippetStore::new(pool.clone())),
                    Arc::new(PgSessionStore::new(pool)),
                )
            }
            StoreBackend::Memory => {
                warn!("using in-memory store; data is lost on restart");
                Self::with_memory_store(config)
            }
        };

        state.sessions.purge_expired().await?;
        Ok(state)
    }

    pub fn from_parts(
        config: AppConfig,
        users: Arc<dyn UserStore>,
        snippets: Arc<dyn SnippetStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        let ttl = time::Duration::minutes(config.session.ttl_minutes);
        Self {
            accounts: AccountService::new(users.clone()),
            sessions: SessionService::new(sessions, users, ttl),
            snippets: SnippetService::new(snippets),
            config: Arc::new(config),
        }
    }

    pub fn with_memory_store(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::from_parts(config, store.clone(), store.clone(), store)
    }

    /// Default config over a fresh in-memory store.
    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self::with_memory_store(AppConfig::default())
    }
}
