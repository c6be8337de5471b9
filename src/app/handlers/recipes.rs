use crate::app::state::AppState;
use crate::domain::model::{Recipe, RecipeId};
use crate::utils::error::{FoodError, Result};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct RecipeQuery {
    pub search: Option<String>,
    pub cuisine: Option<String>,
}

fn matches_query(recipe: &Recipe, query: &RecipeQuery) -> bool {
    let name_ok = query.search.as_deref().map_or(true, |s| {
        recipe.name.to_lowercase().contains(&s.trim().to_lowercase())
    });
    let cuisine_ok = query.cuisine.as_deref().map_or(true, |c| {
        recipe
            .tags
            .cuisine_region
            .iter()
            .any(|r| r.eq_ignore_ascii_case(c.trim()))
    });
    name_ok && cuisine_ok
}

/// GET /api/recipes
pub async fn list_recipes(
    State(state): State<AppState>,
    Query(query): Query<RecipeQuery>,
) -> Result<Json<Vec<Recipe>>> {
    let recipes = state.store.list_recipes().await?;
    Ok(Json(
        recipes
            .into_iter()
            .filter(|r| matches_query(r, &query))
            .collect(),
    ))
}

/// GET /api/recipes/{id}
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<RecipeId>,
) -> Result<Json<Recipe>> {
    state
        .store
        .get_recipe(id)
        .await?
        .map(Json)
        .ok_or_else(|| FoodError::NotFound(format!("Recipe {} not found", id)))
}
