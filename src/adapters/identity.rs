use crate::domain::model::{AuthUser, UserId};
use crate::domain::ports::IdentityProvider;
use crate::utils::error::{FoodError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;

/// 託管身分服務：以呼叫者的 token 查詢 `/auth/v1/user`
#[derive(Debug, Clone)]
pub struct HostedIdentity {
    client: Client,
    base_url: String,
    anon_key: String,
}

#[derive(Debug, Deserialize)]
struct HostedUser {
    id: UserId,
    #[serde(default)]
    email: Option<String>,
}

impl HostedIdentity {
    pub fn new(client: Client, base_url: &str, anon_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        }
    }
}

#[async_trait]
impl IdentityProvider for HostedIdentity {
    async fn resolve(&self, token: &str) -> Result<Option<AuthUser>> {
        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let user: HostedUser = response.json().await?;
                Ok(Some(AuthUser {
                    id: user.id,
                    email: user.email,
                }))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status => {
                let details = response.text().await.unwrap_or_default();
                Err(FoodError::UpstreamError {
                    status: status.as_u16(),
                    message: "Identity provider request failed".to_string(),
                    details,
                })
            }
        }
    }
}

/// 設定檔中的 token → 使用者 id 對照表
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    tokens: HashMap<String, UserId>,
}

impl StaticIdentity {
    pub fn new(tokens: HashMap<String, UserId>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn resolve(&self, token: &str) -> Result<Option<AuthUser>> {
        Ok(self.tokens.get(token).map(|id| AuthUser {
            id: id.clone(),
            email: None,
        }))
    }
}
