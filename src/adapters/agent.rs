use crate::utils::error::{FoodError, Result};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

pub const PLACEHOLDER_API_KEY: &str = "YOUR_TOOLHOUSE_API_KEY";
pub const RUN_ID_HEADER: &str = "X-Toolhouse-Run-ID";

/// 預設的七日餐點請求 (僅午餐與晚餐)
pub const WEEKLY_PLAN_PROMPT: &str = "Generate exactly 7 day meal plans (lunch + dinner only). \
Return as JSON array format: [{day: 1, lunch: {id, name, calories, time_minutes, ingredients, url}, \
dinner: {same format}}]. Keep responses concise.";

#[derive(Debug, Clone, PartialEq)]
pub struct AgentEndpoint {
    pub url: String,
    pub api_key: Option<String>,
}

impl AgentEndpoint {
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// 未設定或仍為範例佔位字串時不送 Authorization
    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.api_key.as_deref() {
            Some(key) if !key.is_empty() && key != PLACEHOLDER_API_KEY => builder.bearer_auth(key),
            _ => builder,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentReply {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngredientRequest {
    pub location: String,
    pub ingredients: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngredientInfo {
    pub ingredient: String,
    pub available: bool,
    pub price: f64,
    pub quantity: f64,
    pub unit: String,
    pub url: String,
    pub product_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreInfo {
    pub store: String,
    pub address: String,
    pub ingredient_info: Vec<IngredientInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngredientReport {
    pub info: Vec<StoreInfo>,
}

#[derive(Serialize)]
struct MessageBody<'a> {
    message: &'a str,
}

/// 把使用者檔案嵌入訊息前綴
pub fn format_profile_message<P: Serialize>(message: &str, profile: &P) -> Result<String> {
    let profile_json = serde_json::to_string(profile)?;
    Ok(format!(
        "Generate a meal plan for this user profile: {}. {}",
        profile_json, message
    ))
}

/// 託管代理平台的 HTTP 客戶端
#[derive(Debug, Clone)]
pub struct AgentClient {
    client: Client,
    recipe: Option<AgentEndpoint>,
    ingredient: Option<AgentEndpoint>,
}

impl AgentClient {
    pub fn new(
        client: Client,
        recipe: Option<AgentEndpoint>,
        ingredient: Option<AgentEndpoint>,
    ) -> Self {
        Self {
            client,
            recipe,
            ingredient,
        }
    }

    fn endpoint<'a>(endpoint: &'a Option<AgentEndpoint>, field: &str) -> Result<&'a AgentEndpoint> {
        endpoint.as_ref().ok_or_else(|| FoodError::MissingConfigError {
            field: field.to_string(),
        })
    }

    /// 有 run id 時以 PUT 延續對話，否則 POST 開新對話
    pub async fn call_recipe_agent(&self, message: &str, run_id: Option<&str>) -> Result<AgentReply> {
        let endpoint = Self::endpoint(&self.recipe, "agents.recipe_url")?;
        let request = match run_id {
            Some(run_id) => self.client.put(format!("{}/{}", endpoint.url, run_id)),
            None => self.client.post(&endpoint.url),
        };

        tracing::info!(
            "🤖 Calling recipe agent ({})",
            if run_id.is_some() { "continue" } else { "new run" }
        );
        let response = endpoint
            .authorize(request)
            .json(&MessageBody { message })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            tracing::error!("❌ Recipe agent returned {}: {}", status, details);
            return Err(FoodError::UpstreamError {
                status: status.as_u16(),
                message: format!(
                    "Toolhouse API error: {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or_default()
                ),
                details,
            });
        }

        let run_id = response
            .headers()
            .get(RUN_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let content = response.text().await?;
        tracing::debug!("Recipe agent replied with {} bytes", content.len());

        Ok(AgentReply { content, run_id })
    }

    pub async fn check_ingredients(&self, request: &IngredientRequest) -> Result<IngredientReport> {
        let endpoint = Self::endpoint(&self.ingredient, "agents.ingredient_url")?;
        tracing::info!(
            "🛒 Checking {} ingredients near {}",
            request.ingredients.len(),
            request.location
        );

        let response = endpoint
            .authorize(self.client.post(&endpoint.url))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            tracing::error!("❌ Ingredient agent returned {}: {}", status, details);
            return Err(FoodError::UpstreamError {
                status: status.as_u16(),
                message: "Failed to fetch ingredient information".to_string(),
                details,
            });
        }

        Ok(response.json().await?)
    }
}
