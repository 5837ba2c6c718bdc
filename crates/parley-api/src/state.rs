//! Application state wiring all services together.
//!
//! `AppState` holds the concrete service instances used by the CLI. The
//! model backend is only constructed for commands that talk to it (`serve`),
//! so session management works without an API key.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use parley_core::chat::engine::StreamingChatEngine;
use parley_core::chat::service::ChatService;
use parley_core::llm::box_provider::BoxLlmProvider;
use parley_infra::llm::create_provider;
use parley_infra::sqlite::pool::{DatabasePool, database_url};
use parley_infra::sqlite::session::SqliteSessionStore;
use parley_types::config::ParleyConfig;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteChatService = ChatService<SqliteSessionStore>;

pub type ConcreteChatEngine = StreamingChatEngine<SqliteSessionStore, BoxLlmProvider>;

/// Shared application state for CLI commands.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: ConcreteChatService,
    pub store: Arc<SqliteSessionStore>,
    pub config: ParleyConfig,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize from the process environment: resolve the data directory,
    /// load the config, open the database.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = parley_infra::config::data_dir();
        let config = parley_infra::config::load(&data_dir).await;
        Self::open(data_dir, config).await
    }

    /// Open the database under `data_dir` and wire the session service.
    pub async fn open(data_dir: PathBuf, config: ParleyConfig) -> anyhow::Result<Self> {
        config
            .chat
            .validate()
            .map_err(anyhow::Error::msg)
            .context("Invalid chat configuration")?;

        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        let db_pool = DatabasePool::new(&database_url(&data_dir))
            .await
            .context("Failed to open the session database")?;
        let store = Arc::new(SqliteSessionStore::bootstrap(db_pool).await?);

        Ok(Self {
            chat_service: ChatService::new(Arc::clone(&store)),
            store,
            config,
            data_dir,
        })
    }

    /// Build the HTTP state, constructing the streaming engine for the
    /// configured model backend.
    ///
    /// Fails when the real backend is selected without an API key.
    pub fn api_state(&self) -> anyhow::Result<ApiState> {
        let provider = create_provider(&self.config.llm).context(
            "Failed to initialize the model backend (set ANTHROPIC_API_KEY or PARLEY_MOCK=1)",
        )?;
        let engine = StreamingChatEngine::new(
            Arc::clone(&self.store),
            Arc::new(provider),
            self.config.chat.clone(),
            self.config.llm.model.clone(),
        );
        Ok(ApiState {
            chat_service: self.chat_service.clone(),
            engine: Arc::new(engine),
        })
    }
}

/// State shared by the REST/SSE handlers.
#[derive(Clone)]
pub struct ApiState {
    pub chat_service: ConcreteChatService,
    pub engine: Arc<ConcreteChatEngine>,
}
