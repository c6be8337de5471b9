use crate::app::auth::Caller;
use crate::app::state::AppState;
use crate::core::collections;
use crate::core::recommend::{recommend, Recommendation};
use crate::domain::model::{Recipe, RecipeId, RecipeList, UserRecipeData};
use crate::utils::error::{FoodError, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct UserRecipesView {
    #[serde(flatten)]
    pub data: UserRecipeData,
    pub favorite_recipes: Vec<Recipe>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteToggled {
    pub recipe_id: RecipeId,
    pub favorite: bool,
}

#[derive(Debug, Deserialize)]
pub struct NewList {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub recipe_ids: Vec<RecipeId>,
}

#[derive(Debug, Serialize)]
pub struct ListView {
    #[serde(flatten)]
    pub list: RecipeList,
    pub recipes: Vec<Recipe>,
}

async fn require_recipe(state: &AppState, recipe_id: RecipeId) -> Result<()> {
    match state.store.get_recipe(recipe_id).await? {
        Some(_) => Ok(()),
        None => Err(FoodError::NotFound(format!("Recipe {} not found", recipe_id))),
    }
}

/// GET /api/users/{id}/recipes
pub async fn get_user_recipes(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<String>,
) -> Result<Json<UserRecipesView>> {
    caller.require_self(&user_id)?;
    let data = state.store.get_user_recipes(&user_id).await?;
    let recipes = state.store.list_recipes().await?;
    let favorite_recipes = collections::favorite_recipes(&data, &recipes)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(UserRecipesView {
        data,
        favorite_recipes,
    }))
}

/// PUT /api/users/{id}/recipes
pub async fn put_user_recipes(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<String>,
    Json(mut data): Json<UserRecipeData>,
) -> Result<Json<UserRecipeData>> {
    caller.require_self(&user_id)?;
    data.user_id = user_id;
    Ok(Json(state.store.put_user_recipes(data).await?))
}

/// POST /api/users/{id}/recipes/favorites/{recipe_id}
pub async fn toggle_favorite(
    State(state): State<AppState>,
    caller: Caller,
    Path((user_id, recipe_id)): Path<(String, RecipeId)>,
) -> Result<Json<FavoriteToggled>> {
    caller.require_self(&user_id)?;
    require_recipe(&state, recipe_id).await?;

    let stored = state
        .store
        .update_user_recipes(
            &user_id,
            Box::new(move |data: &mut UserRecipeData| {
                collections::toggle_favorite(data, recipe_id);
                Ok(())
            }),
        )
        .await?;
    let favorite = collections::is_favorite(&stored, recipe_id);
    Ok(Json(FavoriteToggled {
        recipe_id,
        favorite,
    }))
}

/// POST /api/users/{id}/recipes/lists
pub async fn create_list(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<String>,
    Json(body): Json<NewList>,
) -> Result<(StatusCode, Json<RecipeList>)> {
    caller.require_self(&user_id)?;
    for recipe_id in &body.recipe_ids {
        require_recipe(&state, *recipe_id).await?;
    }

    let now = Utc::now();
    let mut created_id = None;
    let stored = state
        .store
        .update_user_recipes(
            &user_id,
            Box::new(|data: &mut UserRecipeData| {
                let list =
                    collections::create_list(data, &body.name, body.description.as_deref(), now)?;
                for recipe_id in &body.recipe_ids {
                    collections::add_to_list(data, &list.id, *recipe_id)?;
                }
                created_id = Some(list.id);
                Ok(())
            }),
        )
        .await?;

    let created = created_id
        .and_then(|id| stored.custom_lists.into_iter().find(|l| l.id == id))
        .ok_or_else(|| FoodError::StoreError {
            message: "Created recipe list was not stored".to_string(),
        })?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/users/{id}/recipes/lists/{list_id}
pub async fn get_list(
    State(state): State<AppState>,
    caller: Caller,
    Path((user_id, list_id)): Path<(String, String)>,
) -> Result<Json<ListView>> {
    caller.require_self(&user_id)?;
    let data = state.store.get_user_recipes(&user_id).await?;
    let list = data
        .custom_lists
        .iter()
        .find(|l| l.id == list_id)
        .cloned()
        .ok_or_else(|| FoodError::NotFound(format!("Recipe list {} not found", list_id)))?;

    let recipes = state.store.list_recipes().await?;
    let recipes = collections::recipes_in_list(&data, &list_id, &recipes)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(ListView { list, recipes }))
}

/// DELETE /api/users/{id}/recipes/lists/{list_id}
pub async fn delete_list(
    State(state): State<AppState>,
    caller: Caller,
    Path((user_id, list_id)): Path<(String, String)>,
) -> Result<StatusCode> {
    caller.require_self(&user_id)?;
    state
        .store
        .update_user_recipes(
            &user_id,
            Box::new(|data: &mut UserRecipeData| {
                if !collections::delete_list(data, &list_id) {
                    return Err(FoodError::NotFound(format!(
                        "Recipe list {} not found",
                        list_id
                    )));
                }
                Ok(())
            }),
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/users/{id}/recipes/lists/{list_id}/recipes/{recipe_id}
pub async fn add_list_recipe(
    State(state): State<AppState>,
    caller: Caller,
    Path((user_id, list_id, recipe_id)): Path<(String, String, RecipeId)>,
) -> Result<Json<UserRecipeData>> {
    caller.require_self(&user_id)?;
    require_recipe(&state, recipe_id).await?;
    let stored = state
        .store
        .update_user_recipes(
            &user_id,
            Box::new(|data: &mut UserRecipeData| {
                collections::add_to_list(data, &list_id, recipe_id)
            }),
        )
        .await?;
    Ok(Json(stored))
}

/// DELETE /api/users/{id}/recipes/lists/{list_id}/recipes/{recipe_id}
pub async fn remove_list_recipe(
    State(state): State<AppState>,
    caller: Caller,
    Path((user_id, list_id, recipe_id)): Path<(String, String, RecipeId)>,
) -> Result<Json<UserRecipeData>> {
    caller.require_self(&user_id)?;
    let stored = state
        .store
        .update_user_recipes(
            &user_id,
            Box::new(|data: &mut UserRecipeData| {
                collections::remove_from_list(data, &list_id, recipe_id)
            }),
        )
        .await?;
    Ok(Json(stored))
}

/// GET /api/users/{id}/recommendations
pub async fn recommendations(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Recommendation>>> {
    caller.require_self(&user_id)?;
    let user = state
        .store
        .get_user(&user_id)
        .await?
        .ok_or_else(|| FoodError::NotFound("Profile not found".to_string()))?;
    let recipes = state.store.list_recipes().await?;

    let results = recommend(&user, &recipes);
    tracing::info!(
        "🍽️ {} of {} recipes recommended for user {}",
        results.len(),
        recipes.len(),
        user_id
    );
    Ok(Json(results))
}
