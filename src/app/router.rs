use crate::app::handlers::{
    agent, delivery, fridge, health, meal_plan, profile, recipes, users,
};
use crate::app::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/recipes", get(recipes::list_recipes))
        .route("/api/recipes/{id}", get(recipes::get_recipe))
        .route(
            "/api/profile",
            get(profile::get_profile)
                .post(profile::create_profile)
                .put(profile::update_profile),
        )
        .merge(fridge_routes())
        .merge(user_routes())
        .merge(delivery_routes())
        .merge(agent_routes())
}

fn fridge_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/fridge/{user_id}",
            get(fridge::get_fridge).put(fridge::put_fridge),
        )
        .route("/api/fridge/{user_id}/items", post(fridge::add_item))
        .route(
            "/api/fridge/{user_id}/items/{name}",
            delete(fridge::remove_item),
        )
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/users/{id}/recipes",
            get(users::get_user_recipes).put(users::put_user_recipes),
        )
        .route(
            "/api/users/{id}/recipes/favorites/{recipe_id}",
            post(users::toggle_favorite),
        )
        .route("/api/users/{id}/recipes/lists", post(users::create_list))
        .route(
            "/api/users/{id}/recipes/lists/{list_id}",
            get(users::get_list).delete(users::delete_list),
        )
        .route(
            "/api/users/{id}/recipes/lists/{list_id}/recipes/{recipe_id}",
            post(users::add_list_recipe).delete(users::remove_list_recipe),
        )
        .route(
            "/api/users/{id}/recommendations",
            get(users::recommendations),
        )
        .route(
            "/api/users/{id}/meal-plan",
            get(meal_plan::get_meal_plan).put(meal_plan::put_meal_plan),
        )
        .route(
            "/api/users/{id}/meal-plan/entries",
            post(meal_plan::add_entry),
        )
        .route(
            "/api/users/{id}/meal-plan/entries/{entry_id}",
            patch(meal_plan::update_entry).delete(meal_plan::remove_entry),
        )
        .route("/api/users/{id}/meal-plan/summary", get(meal_plan::summary))
        .route(
            "/api/users/{id}/grocery-list",
            get(meal_plan::get_grocery_list),
        )
        .route(
            "/api/users/{id}/grocery-list/generate",
            post(meal_plan::generate_grocery_list),
        )
}

fn delivery_routes() -> Router<AppState> {
    Router::new()
        .route("/api/delivery/earnings", get(delivery::earnings))
        .route(
            "/api/delivery/earnings/stats",
            get(delivery::earnings_statistics),
        )
        .route("/api/delivery/history", get(delivery::history))
        .route(
            "/api/delivery/profile",
            get(delivery::get_profile).put(delivery::update_profile),
        )
        .route("/api/delivery/profile/stats", get(delivery::profile_stats))
        .route(
            "/api/delivery/profile/availability",
            get(delivery::get_availability).post(delivery::set_availability),
        )
}

fn agent_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/toolhouse/recipe-agent",
            post(agent::start_recipe_agent).put(agent::continue_recipe_agent),
        )
        .route(
            "/api/toolhouse/ingredient-agent",
            post(agent::ingredient_agent),
        )
        .route("/api/agent/meal-plan", post(agent::generate_meal_plan))
}

/// 未設定來源時允許任意來源
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(Any);

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter(|o| o.as_str() != "*")
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    if parsed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(parsed))
    }
}

/// 完整的應用程式：路由、狀態、CORS 與請求追蹤
pub fn build_app(state: AppState, cors_origins: &[String]) -> Router {
    router()
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
