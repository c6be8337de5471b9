use crate::domain::model::{Recipe, RecipeId, RecipeList, UserRecipeData};
use crate::utils::error::{FoodError, Result};
use chrono::{DateTime, Utc};

/// 切換收藏狀態，回傳切換後是否為收藏
pub fn toggle_favorite(data: &mut UserRecipeData, recipe_id: RecipeId) -> bool {
    if let Some(pos) = data.favorites.iter().position(|id| *id == recipe_id) {
        data.favorites.remove(pos);
        false
    } else {
        data.favorites.push(recipe_id);
        true
    }
}

pub fn is_favorite(data: &UserRecipeData, recipe_id: RecipeId) -> bool {
    data.favorites.contains(&recipe_id)
}

pub fn create_list(
    data: &mut UserRecipeData,
    name: &str,
    description: Option<&str>,
    now: DateTime<Utc>,
) -> Result<RecipeList> {
    let name = name.trim();
    if name.is_empty() {
        return Err(FoodError::BadRequest("List name cannot be empty".to_string()));
    }

    let mut id = format!("list-{}", now.timestamp_millis());
    let mut suffix = 1;
    while data.custom_lists.iter().any(|l| l.id == id) {
        suffix += 1;
        id = format!("list-{}-{}", now.timestamp_millis(), suffix);
    }

    let list = RecipeList {
        id,
        name: name.to_string(),
        description: description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string),
        recipe_ids: Vec::new(),
        created_at: now,
    };
    data.custom_lists.push(list.clone());
    Ok(list)
}

fn list_mut<'a>(data: &'a mut UserRecipeData, list_id: &str) -> Result<&'a mut RecipeList> {
    data.custom_lists
        .iter_mut()
        .find(|l| l.id == list_id)
        .ok_or_else(|| FoodError::NotFound(format!("Recipe list {} not found", list_id)))
}

pub fn add_to_list(data: &mut UserRecipeData, list_id: &str, recipe_id: RecipeId) -> Result<()> {
    let list = list_mut(data, list_id)?;
    if !list.recipe_ids.contains(&recipe_id) {
        list.recipe_ids.push(recipe_id);
    }
    Ok(())
}

pub fn remove_from_list(data: &mut UserRecipeData, list_id: &str, recipe_id: RecipeId) -> Result<()> {
    let list = list_mut(data, list_id)?;
    list.recipe_ids.retain(|id| *id != recipe_id);
    Ok(())
}

pub fn delete_list(data: &mut UserRecipeData, list_id: &str) -> bool {
    let before = data.custom_lists.len();
    data.custom_lists.retain(|l| l.id != list_id);
    data.custom_lists.len() != before
}

pub fn recipes_in_list<'a>(
    data: &UserRecipeData,
    list_id: &str,
    recipes: &'a [Recipe],
) -> Vec<&'a Recipe> {
    match data.custom_lists.iter().find(|l| l.id == list_id) {
        Some(list) => recipes
            .iter()
            .filter(|r| list.recipe_ids.contains(&r.id))
            .collect(),
        None => Vec::new(),
    }
}

pub fn favorite_recipes<'a>(data: &UserRecipeData, recipes: &'a [Recipe]) -> Vec<&'a Recipe> {
    recipes
        .iter()
        .filter(|r| data.favorites.contains(&r.id))
        .collect()
}
