pub mod agent;
pub mod delivery;
pub mod fridge;
pub mod meal_plan;
pub mod profile;
pub mod recipes;
pub mod users;

use axum::Json;
use serde_json::{json, Value};

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}
