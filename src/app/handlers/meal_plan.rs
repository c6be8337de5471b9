use crate::app::auth::Caller;
use crate::app::state::AppState;
use crate::core::meal_plan::{self, PlanSummary};
use crate::domain::model::{GroceryItem, MealPlanEntry};
use crate::utils::error::{FoodError, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ServingsUpdate {
    pub servings: f64,
}

/// GET /api/users/{id}/meal-plan
pub async fn get_meal_plan(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<MealPlanEntry>>> {
    caller.require_self(&user_id)?;
    Ok(Json(state.store.get_meal_plan(&user_id).await?))
}

/// PUT /api/users/{id}/meal-plan；整份取代，id 不得重複
pub async fn put_meal_plan(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<String>,
    Json(entries): Json<Vec<MealPlanEntry>>,
) -> Result<Json<Vec<MealPlanEntry>>> {
    caller.require_self(&user_id)?;
    let plan = meal_plan::build_plan(entries)?;
    state.store.put_meal_plan(&user_id, plan.clone()).await?;
    tracing::info!("📅 Saved meal plan for user {} ({} entries)", user_id, plan.len());
    Ok(Json(plan))
}

/// POST /api/users/{id}/meal-plan/entries
pub async fn add_entry(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<String>,
    Json(entry): Json<MealPlanEntry>,
) -> Result<(StatusCode, Json<MealPlanEntry>)> {
    caller.require_self(&user_id)?;
    let added = entry.clone();
    state
        .store
        .update_meal_plan(
            &user_id,
            Box::new(move |plan: &mut Vec<MealPlanEntry>| meal_plan::add_entry(plan, added)),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// PATCH /api/users/{id}/meal-plan/entries/{entry_id}
pub async fn update_entry(
    State(state): State<AppState>,
    caller: Caller,
    Path((user_id, entry_id)): Path<(String, String)>,
    Json(body): Json<ServingsUpdate>,
) -> Result<Json<Vec<MealPlanEntry>>> {
    caller.require_self(&user_id)?;
    let plan = state
        .store
        .update_meal_plan(
            &user_id,
            Box::new(|plan: &mut Vec<MealPlanEntry>| {
                meal_plan::update_servings(plan, &entry_id, body.servings)
            }),
        )
        .await?;
    Ok(Json(plan))
}

/// DELETE /api/users/{id}/meal-plan/entries/{entry_id}
pub async fn remove_entry(
    State(state): State<AppState>,
    caller: Caller,
    Path((user_id, entry_id)): Path<(String, String)>,
) -> Result<StatusCode> {
    caller.require_self(&user_id)?;
    state
        .store
        .update_meal_plan(
            &user_id,
            Box::new(|plan: &mut Vec<MealPlanEntry>| {
                if !meal_plan::remove_entry(plan, &entry_id) {
                    return Err(FoodError::NotFound(format!(
                        "Meal plan entry {} not found",
                        entry_id
                    )));
                }
                Ok(())
            }),
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/users/{id}/meal-plan/summary
pub async fn summary(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<String>,
) -> Result<Json<PlanSummary>> {
    caller.require_self(&user_id)?;
    let user = state
        .store
        .get_user(&user_id)
        .await?
        .ok_or_else(|| FoodError::NotFound("Profile not found".to_string()))?;
    let plan = state.store.get_meal_plan(&user_id).await?;
    Ok(Json(meal_plan::summarize(&plan, &user.macro_targets)))
}

/// GET /api/users/{id}/grocery-list
pub async fn get_grocery_list(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<GroceryItem>>> {
    caller.require_self(&user_id)?;
    Ok(Json(state.store.get_grocery_list(&user_id).await?))
}

/// POST /api/users/{id}/grocery-list/generate
pub async fn generate_grocery_list(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<GroceryItem>>> {
    caller.require_self(&user_id)?;
    let plan = state.store.get_meal_plan(&user_id).await?;
    let fridge = state.store.get_fridge(&user_id).await?;

    let items = meal_plan::generate_grocery_list(&plan, fridge.as_ref());
    state.store.put_grocery_list(&user_id, items.clone()).await?;
    tracing::info!(
        "🛒 Generated grocery list for user {}: {} items, {} needed",
        user_id,
        items.len(),
        items.iter().filter(|i| i.needed).count()
    );
    Ok(Json(items))
}
