// src/state.rs
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;

use crate::config::Config;
use crate::services::knowledge_store::KnowledgeStore;
use crate::services::llm::LlmClient;
use crate::services::metrics_manager::MetricsManager;
use crate::services::session_manager::SessionManager;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub sessions: SessionManager,
    pub metrics: MetricsManager,
    pub llm: LlmClient,
    pub knowledge: KnowledgeStore,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(300))
            .build()?;

        Ok(Self {
            sessions: SessionManager::new(config.session_ttl, config.system_prompt.clone()),
            metrics: MetricsManager::new(),
            llm: LlmClient::new(
                client.clone(),
                config.llm_base_url.clone(),
                config.api_key.clone(),
                config.chat_model.clone(),
                config.vision_model.clone(),
                config.transcription_model.clone(),
            ),
            knowledge: KnowledgeStore::new(
                client,
                config.vector_store_url.clone(),
                config.collection_name.clone(),
            ),
            config,
        })
    }
}
