use crate::adapters::agent::{
    format_profile_message, AgentReply, IngredientReport, IngredientRequest, WEEKLY_PLAN_PROMPT,
};
use crate::app::auth::Caller;
use crate::app::state::AppState;
use crate::core::meal_plan::build_plan;
use crate::core::plan_parser::{parse_weekly_plan, WeeklyPlan};
use crate::utils::error::{FoodError, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecipeAgentRequest {
    pub message: Option<String>,
    pub run_id: Option<String>,
    pub user_profile: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct RecipeAgentResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<AgentReply>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 代理端點的錯誤以 `{success: false, error}` 回傳
pub struct AgentFailure(FoodError);

impl From<FoodError> for AgentFailure {
    fn from(err: FoodError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for AgentFailure {
    fn from(rejection: JsonRejection) -> Self {
        Self(FoodError::BadRequest(rejection.body_text()))
    }
}

impl IntoResponse for AgentFailure {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let error = match &self.0 {
            FoodError::UpstreamError { message, details, .. } => {
                tracing::error!("❌ Error calling recipe agent: {} {}", message, details);
                message.clone()
            }
            err if err.is_internal() => {
                tracing::error!("❌ Error calling recipe agent: {}", err);
                err.user_friendly_message()
            }
            err => err.to_string(),
        };

        (
            status,
            Json(RecipeAgentResponse {
                success: false,
                data: None,
                error: Some(error),
            }),
        )
            .into_response()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn succeeded(reply: AgentReply) -> Json<RecipeAgentResponse> {
    Json(RecipeAgentResponse {
        success: true,
        data: Some(reply),
        error: None,
    })
}

/// POST /api/toolhouse/recipe-agent：開始新對話
pub async fn start_recipe_agent(
    State(state): State<AppState>,
    body: std::result::Result<Json<RecipeAgentRequest>, JsonRejection>,
) -> std::result::Result<Json<RecipeAgentResponse>, AgentFailure> {
    let Json(body) = body?;
    let Some(message) = non_empty(body.message) else {
        return Err(FoodError::BadRequest("Message is required".to_string()).into());
    };

    let message = match &body.user_profile {
        Some(profile) => format_profile_message(&message, profile)?,
        None => message,
    };
    let reply = state.agent.call_recipe_agent(&message, None).await?;
    Ok(succeeded(reply))
}

/// PUT /api/toolhouse/recipe-agent：以 runId 延續對話
pub async fn continue_recipe_agent(
    State(state): State<AppState>,
    body: std::result::Result<Json<RecipeAgentRequest>, JsonRejection>,
) -> std::result::Result<Json<RecipeAgentResponse>, AgentFailure> {
    let Json(body) = body?;
    let (Some(message), Some(run_id)) = (non_empty(body.message), non_empty(body.run_id)) else {
        return Err(FoodError::BadRequest(
            "Message and runId are required for conversation continuation".to_string(),
        )
        .into());
    };

    let reply = state
        .agent
        .call_recipe_agent(&message, Some(run_id.trim()))
        .await?;
    Ok(succeeded(reply))
}

/// POST /api/toolhouse/ingredient-agent
pub async fn ingredient_agent(
    State(state): State<AppState>,
    Json(body): Json<IngredientRequest>,
) -> Result<Json<IngredientReport>> {
    if body.ingredients.iter().all(|i| i.trim().is_empty()) {
        return Err(FoodError::BadRequest(
            "At least one ingredient is required".to_string(),
        ));
    }
    Ok(Json(state.agent.check_ingredients(&body).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MealPlanRequest {
    pub message: Option<String>,
    /// 解析成功後直接取代使用者的餐點計畫
    pub save: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanResponse {
    pub plan: WeeklyPlan,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    pub saved: bool,
}

/// POST /api/agent/meal-plan：以呼叫者的檔案請代理產生一週餐點並解析
pub async fn generate_meal_plan(
    State(state): State<AppState>,
    caller: Caller,
    Json(body): Json<MealPlanRequest>,
) -> Result<Json<MealPlanResponse>> {
    let user = state
        .store
        .get_user(caller.id())
        .await?
        .ok_or_else(|| FoodError::NotFound("Profile not found".to_string()))?;

    let request = non_empty(body.message).unwrap_or_else(|| WEEKLY_PLAN_PROMPT.to_string());
    let message = format_profile_message(&request, &user)?;
    let reply = state.agent.call_recipe_agent(&message, None).await?;

    let plan = parse_weekly_plan(&reply.content)?;
    tracing::info!(
        "📅 Agent drafted {} days / {} recipes for user {}",
        plan.days.len(),
        plan.recipe_count(),
        user.id
    );

    if body.save {
        let entries = build_plan(plan.to_entries())?;
        state.store.put_meal_plan(&user.id, entries).await?;
    }

    Ok(Json(MealPlanResponse {
        plan,
        content: reply.content,
        run_id: reply.run_id,
        saved: body.save,
    }))
}
