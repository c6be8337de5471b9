use crate::adapters::agent::{AgentClient, AgentEndpoint};
use crate::adapters::{HostedIdentity, HostedStore, JsonFileStore, LocalStorage, StaticIdentity};
use crate::config::toml_config::{AppConfig, AuthProvider, StoreBackend};
use crate::domain::ports::{FoodStore, IdentityProvider};
use crate::utils::error::Result;
use crate::utils::validation::validate_required_field;
use chrono::{DateTime, FixedOffset, Utc};
use std::sync::Arc;
use std::time::Duration;

const DATA_TIMEOUT_SECONDS: u64 = 30;

/// 所有處理器共用的依賴
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn FoodStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub agent: Arc<AgentClient>,
    pub utc_offset: FixedOffset,
}

impl AppState {
    pub fn new(
        store: Arc<dyn FoodStore>,
        identity: Arc<dyn IdentityProvider>,
        agent: AgentClient,
        utc_offset: FixedOffset,
    ) -> Self {
        Self {
            store,
            identity,
            agent: Arc::new(agent),
            utc_offset,
        }
    }

    /// 依設定組裝資料庫、身分提供者與代理客戶端
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let data_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DATA_TIMEOUT_SECONDS))
            .build()?;

        let store: Arc<dyn FoodStore> = match config.store.backend {
            StoreBackend::File => {
                tracing::info!("📁 Using JSON file store at {}", config.store.data_dir);
                Arc::new(JsonFileStore::new(LocalStorage::new(&config.store.data_dir)))
            }
            StoreBackend::Hosted => {
                let hosted = validate_required_field("hosted", &config.hosted)?;
                tracing::info!("☁️ Using hosted store at {}", hosted.url);
                Arc::new(HostedStore::new(
                    data_client.clone(),
                    &hosted.url,
                    hosted.data_key(),
                ))
            }
        };

        let identity: Arc<dyn IdentityProvider> = match config.auth.provider {
            AuthProvider::Hosted => {
                let hosted = validate_required_field("hosted", &config.hosted)?;
                Arc::new(HostedIdentity::new(
                    data_client,
                    &hosted.url,
                    &hosted.anon_key,
                ))
            }
            AuthProvider::Static => Arc::new(StaticIdentity::new(config.auth.tokens.clone())),
        };

        let agent_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.agents.timeout_seconds))
            .build()?;
        let agents = &config.agents;
        let agent = AgentClient::new(
            agent_client,
            agents
                .recipe_url
                .as_ref()
                .map(|url| AgentEndpoint::new(url, agents.recipe_key())),
            agents
                .ingredient_url
                .as_ref()
                .map(|url| AgentEndpoint::new(url, agents.ingredient_key())),
        );
        if agents.recipe_url.is_none() {
            tracing::warn!("⚠️ agents.recipe_url is not set; agent endpoints will fail");
        } else if agents.recipe_api_key.is_some() && agents.recipe_key().is_none() {
            tracing::warn!("⚠️ agents.recipe_api_key references an unset variable; calling without it");
        }

        Ok(Self::new(store, identity, agent, config.utc_offset()?))
    }

    /// 以設定的時區表示的目前時間
    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.utc_offset)
    }
}
