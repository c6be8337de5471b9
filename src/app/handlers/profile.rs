use crate::app::auth::Caller;
use crate::app::state::AppState;
use crate::domain::model::{User, UserUpdate};
use crate::utils::error::{FoodError, Result};
use axum::{extract::State, http::StatusCode, Json};

fn profile_not_found() -> FoodError {
    FoodError::NotFound("Profile not found".to_string())
}

/// GET /api/profile
pub async fn get_profile(State(state): State<AppState>, caller: Caller) -> Result<Json<User>> {
    state
        .store
        .get_user(caller.id())
        .await?
        .map(Json)
        .ok_or_else(profile_not_found)
}

/// POST /api/profile；id 一律取自呼叫者
pub async fn create_profile(
    State(state): State<AppState>,
    caller: Caller,
    Json(mut user): Json<User>,
) -> Result<(StatusCode, Json<User>)> {
    user.id = caller.id().to_string();
    let created = state.store.create_user(user).await?;
    tracing::info!("👤 Created profile for user {}", created.id);
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/profile
pub async fn update_profile(
    State(state): State<AppState>,
    caller: Caller,
    Json(update): Json<UserUpdate>,
) -> Result<Json<User>> {
    state
        .store
        .update_user(caller.id(), update)
        .await?
        .map(Json)
        .ok_or_else(profile_not_found)
}
