use crate::app::auth::Caller;
use crate::app::state::AppState;
use crate::core::fridge;
use crate::domain::model::{Fridge, FridgeItem};
use crate::utils::error::{FoodError, Result};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct FridgeQuery {
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FridgeItems {
    pub items: Vec<FridgeItem>,
}

async fn load_fridge(state: &AppState, user_id: &str) -> Result<Fridge> {
    Ok(state
        .store
        .get_fridge(user_id)
        .await?
        .unwrap_or_else(|| Fridge {
            user_id: user_id.to_string(),
            items: Vec::new(),
        }))
}

/// GET /api/fridge/{user_id}；尚未建立時回傳空冰箱
pub async fn get_fridge(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<String>,
    Query(query): Query<FridgeQuery>,
) -> Result<Json<Fridge>> {
    caller.require_self(&user_id)?;
    let mut fridge = load_fridge(&state, &user_id).await?;
    if let Some(search) = query.search.as_deref() {
        fridge.items = fridge::search(&fridge.items, search)
            .into_iter()
            .cloned()
            .collect();
    }
    Ok(Json(fridge))
}

/// PUT /api/fridge/{user_id}
pub async fn put_fridge(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<String>,
    Json(body): Json<FridgeItems>,
) -> Result<Json<Fridge>> {
    caller.require_self(&user_id)?;
    fridge::validate_items(&body.items)?;
    let stored = state.store.put_fridge_items(&user_id, body.items).await?;
    tracing::info!("🧊 Replaced fridge of user {} ({} items)", user_id, stored.items.len());
    Ok(Json(stored))
}

/// POST /api/fridge/{user_id}/items
pub async fn add_item(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<String>,
    Json(item): Json<FridgeItem>,
) -> Result<Json<Fridge>> {
    caller.require_self(&user_id)?;
    let stored = state
        .store
        .update_fridge(
            &user_id,
            Box::new(move |items: &mut Vec<FridgeItem>| fridge::add_item(items, item)),
        )
        .await?;
    Ok(Json(stored))
}

/// DELETE /api/fridge/{user_id}/items/{name}
pub async fn remove_item(
    State(state): State<AppState>,
    caller: Caller,
    Path((user_id, name)): Path<(String, String)>,
) -> Result<Json<Fridge>> {
    caller.require_self(&user_id)?;
    let stored = state
        .store
        .update_fridge(
            &user_id,
            Box::new(|items: &mut Vec<FridgeItem>| {
                if fridge::remove_item(items, &name) == 0 {
                    return Err(FoodError::NotFound(format!("{} is not in the fridge", name)));
                }
                Ok(())
            }),
        )
        .await?;
    Ok(Json(stored))
}
