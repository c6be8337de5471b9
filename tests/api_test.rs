use chrono::FixedOffset;
use foodwell::adapters::agent::{AgentClient, AgentEndpoint};
use foodwell::adapters::{JsonFileStore, LocalStorage, StaticIdentity};
use foodwell::{build_app, AppState};
use httpmock::prelude::*;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

const SHOPPER: &str = "shopper-token";
const DRIVER: &str = "driver-token";

struct TestApp {
    base: String,
    client: reqwest::Client,
    _dir: TempDir,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    async fn send_json(
        &self,
        method: reqwest::Method,
        path: &str,
        token: &str,
        body: Value,
    ) -> reqwest::Response {
        self.client
            .request(method, self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }
}

fn seed(dir: &TempDir) {
    let users = json!([
        {
            "id": "u1",
            "name": "Sam",
            "role": "shopper",
            "dietary_restrictions": ["vegetarian"],
            "macro_targets": {"calories": 2000, "protein_g": 100, "carbs_g": 250, "fat_g": 70, "fiber_g": 30}
        },
        {"id": "d1", "name": "Dana", "role": "deliverer"}
    ]);
    let recipes = json!([
        {
            "id": 1,
            "name": "Chicken Curry",
            "num_servings": 2,
            "ingredients": [
                {"name": "chicken breast", "quantity": 500, "unit": "g"},
                {"name": "onion", "quantity": 1, "unit": "piece"}
            ],
            "tags": {"cuisine_region": ["Indian"]},
            "macros": {"calories": 1200, "protein_g": 90, "carbs_g": 40, "fat_g": 50, "fiber_g": 6}
        },
        {
            "id": 2,
            "name": "Veggie Stir Fry",
            "num_servings": 2,
            "ingredients": [
                {"name": "broccoli", "quantity": 300, "unit": "g"},
                {"name": "onion", "quantity": 1, "unit": "piece"}
            ],
            "tags": {"cuisine_region": ["Chinese"]},
            "macros": {"calories": 700, "protein_g": 20, "carbs_g": 90, "fat_g": 25, "fiber_g": 14}
        }
    ]);
    let orders = json!([
        {
            "id": "o1", "shopper_id": "u1", "deliverer_id": "d1",
            "total_cost": 40.0, "delivery_fee": 5.0, "status": "delivered",
            "created_at": "2024-05-01T10:00:00Z",
            "assigned_at": "2024-05-01T10:00:00Z",
            "delivered_at": "2024-05-01T10:30:00Z",
            "delivery_address": "1 Main St"
        },
        {
            "id": "o2", "shopper_id": "ghost", "deliverer_id": "d1",
            "total_cost": 60.0, "delivery_fee": 7.0, "status": "delivered",
            "created_at": "2024-05-02T12:00:00Z"
        },
        {
            "id": "o3", "deliverer_id": "d1", "total_cost": 99.0,
            "delivery_fee": 9.0, "status": "assigned",
            "created_at": "2024-05-03T12:00:00Z"
        },
        {
            "id": "o4", "deliverer_id": "d2", "total_cost": 10.0,
            "delivery_fee": 2.0, "status": "delivered",
            "created_at": "2024-05-03T12:00:00Z"
        }
    ]);

    for (file, value) in [
        ("users.json", users),
        ("recipes.json", recipes),
        ("orders.json", orders),
    ] {
        std::fs::write(
            dir.path().join(file),
            serde_json::to_vec_pretty(&value).unwrap(),
        )
        .unwrap();
    }
}

async fn spawn_app(agent_url: Option<String>) -> TestApp {
    let dir = TempDir::new().unwrap();
    seed(&dir);

    let store = Arc::new(JsonFileStore::new(LocalStorage::new(dir.path())));
    let identity = Arc::new(StaticIdentity::new(HashMap::from([
        (SHOPPER.to_string(), "u1".to_string()),
        (DRIVER.to_string(), "d1".to_string()),
    ])));
    let agent = AgentClient::new(
        reqwest::Client::new(),
        agent_url
            .as_ref()
            .map(|url| AgentEndpoint::new(format!("{}/recipe", url), Some("agent-key".into()))),
        agent_url.map(|url| AgentEndpoint::new(format!("{}/ingredients", url), None)),
    );
    let state = AppState::new(store, identity, agent, FixedOffset::east_opt(0).unwrap());
    let app = build_app(state, &[]);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        base: format!("http://{}", addr),
        client: reqwest::Client::new(),
        _dir: dir,
    }
}

#[tokio::test]
async fn test_health_and_public_recipes() {
    let app = spawn_app(None).await;

    let health: Value = app
        .client
        .get(app.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");

    let recipes: Value = app
        .client
        .get(app.url("/api/recipes?cuisine=chinese"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(recipes.as_array().unwrap().len(), 1);
    assert_eq!(recipes[0]["name"], "Veggie Stir Fry");

    let missing = app.client.get(app.url("/api/recipes/99")).send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_authentication_is_required() {
    let app = spawn_app(None).await;

    let response = app.client.get(app.url("/api/profile")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Unauthorized");

    let response = app.get("/api/profile", "wrong-token").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let profile: Value = app.get("/api/profile", SHOPPER).await.json().await.unwrap();
    assert_eq!(profile["name"], "Sam");
}

#[tokio::test]
async fn test_delivery_routes_require_deliverer_role() {
    let app = spawn_app(None).await;

    let response = app.get("/api/delivery/earnings", SHOPPER).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_earnings_and_stats() {
    let app = spawn_app(None).await;

    let report: Value = app
        .get("/api/delivery/earnings?period=all", DRIVER)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(report["summary"]["totalEarnings"], 12.0);
    assert_eq!(report["summary"]["totalOrders"], 2);
    assert_eq!(report["summary"]["averageEarningsPerOrder"], 6.0);
    assert_eq!(report["dailyBreakdown"][0]["date"], "2024-05-01");

    let stats: Value = app
        .get("/api/delivery/earnings/stats", DRIVER)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(stats["periods"]["allTime"]["earnings"], 12.0);
    assert_eq!(stats["periods"]["allTime"]["orders"], 2);

    let performance: Value = app
        .get("/api/delivery/profile/stats", DRIVER)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(performance["overview"]["totalDeliveries"], 2);
    assert_eq!(performance["overview"]["averageDeliveryTime"], 30.0);
}

#[tokio::test]
async fn test_history_json_and_csv() {
    let app = spawn_app(None).await;

    let history: Value = app
        .get("/api/delivery/history", DRIVER)
        .await
        .json()
        .await
        .unwrap();
    let orders = history["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["id"], "o2");
    assert_eq!(orders[0]["customer_name"], "Unknown Customer");
    assert_eq!(orders[1]["customer_name"], "Sam");
    assert_eq!(history["summary"]["averageOrderValue"], 50.0);

    let response = app.get("/api/delivery/history?format=csv", DRIVER).await;
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/csv"));
    let csv = response.text().await.unwrap();
    assert!(csv.starts_with("id,delivered_at,customer_name"));
    assert!(csv.contains("o1,2024-05-01T10:30:00Z,Sam,1 Main St"));
}

#[tokio::test]
async fn test_deliverer_profile_and_availability() {
    let app = spawn_app(None).await;

    let profile: Value = app.get("/api/delivery/profile", DRIVER).await.json().await.unwrap();
    assert_eq!(profile["full_name"], "Dana");
    assert_eq!(profile["delivery_radius"], 10.0);
    assert_eq!(profile["preferred_hours_start"], "09:00");
    assert_eq!(profile["total_earnings"], 12.0);

    let updated: Value = app
        .send_json(
            reqwest::Method::PUT,
            "/api/delivery/profile",
            DRIVER,
            json!({"full_name": "Dana R.", "vehicle_type": "bike", "delivery_radius": 4}),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(updated["name"], "Dana R.");
    assert_eq!(updated["vehicle_type"], "bike");
    assert_eq!(updated["delivery_radius"], 4.0);

    let bad = app
        .send_json(
            reqwest::Method::POST,
            "/api/delivery/profile/availability",
            DRIVER,
            json!({"availability_status": "yes"}),
        )
        .await;
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

    let changed: Value = app
        .send_json(
            reqwest::Method::POST,
            "/api/delivery/profile/availability",
            DRIVER,
            json!({"availability_status": false}),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(changed["message"], "You are now offline");

    let current: Value = app
        .get("/api/delivery/profile/availability", DRIVER)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(current["availability_status"], false);
    assert!(current["last_availability_change"].is_string());
}

#[tokio::test]
async fn test_fridge_is_private_and_merges_items() {
    let app = spawn_app(None).await;

    let response = app.get("/api/fridge/d1", SHOPPER).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let fridge: Value = app.get("/api/fridge/u1", SHOPPER).await.json().await.unwrap();
    assert_eq!(fridge["items"].as_array().unwrap().len(), 0);

    app.send_json(
        reqwest::Method::PUT,
        "/api/fridge/u1",
        SHOPPER,
        json!({"items": [{"name": "Broccoli", "quantity": 100, "unit": "g"}]}),
    )
    .await;
    let fridge: Value = app
        .send_json(
            reqwest::Method::POST,
            "/api/fridge/u1/items",
            SHOPPER,
            json!({"name": "broccoli", "quantity": 250, "unit": "g"}),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(fridge["items"][0]["quantity"], 350.0);

    let response = app
        .client
        .delete(app.url("/api/fridge/u1/items/tofu"))
        .bearer_auth(SHOPPER)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recommendations_meal_plan_and_grocery_list() {
    let app = spawn_app(None).await;

    let recommendations: Value = app
        .get("/api/users/u1/recommendations", SHOPPER)
        .await
        .json()
        .await
        .unwrap();
    let ids: Vec<i64> = recommendations
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["recipe"]["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![2]);

    let recipe: Value = app.get("/api/recipes/2", SHOPPER).await.json().await.unwrap();
    let response = app
        .send_json(
            reqwest::Method::PUT,
            "/api/users/u1/meal-plan",
            SHOPPER,
            json!([{"id": "e1", "recipe": recipe, "day": "Monday", "meal_type": "dinner", "servings": 2}]),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    app.send_json(
        reqwest::Method::PUT,
        "/api/fridge/u1",
        SHOPPER,
        json!({"items": [{"name": "onion", "quantity": 3, "unit": "piece"}]}),
    )
    .await;

    let groceries: Value = app
        .send_json(
            reqwest::Method::POST,
            "/api/users/u1/grocery-list/generate",
            SHOPPER,
            json!({}),
        )
        .await
        .json()
        .await
        .unwrap();
    let items = groceries.as_array().unwrap();
    let broccoli = items.iter().find(|i| i["name"] == "broccoli").unwrap();
    assert_eq!(broccoli["quantity"], 300.0);
    assert_eq!(broccoli["needed"], true);
    let onion = items.iter().find(|i| i["name"] == "onion").unwrap();
    assert_eq!(onion["needed"], false);

    let stored: Value = app
        .get("/api/users/u1/grocery-list", SHOPPER)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(stored.as_array().unwrap().len(), 2);

    let summary: Value = app
        .get("/api/users/u1/meal-plan/summary", SHOPPER)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(summary["total"]["calories"], 700.0);
    assert_eq!(summary["dailyAverage"]["calories"], 100.0);
    assert_eq!(summary["targetPercentage"]["calories"], 5.0);
}

#[tokio::test]
async fn test_favorites_and_lists() {
    let app = spawn_app(None).await;

    let toggled: Value = app
        .send_json(
            reqwest::Method::POST,
            "/api/users/u1/recipes/favorites/2",
            SHOPPER,
            json!({}),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(toggled["favorite"], true);

    let response = app
        .send_json(
            reqwest::Method::POST,
            "/api/users/u1/recipes/lists",
            SHOPPER,
            json!({"name": "Weeknight", "recipe_ids": [1, 2]}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let list: Value = response.json().await.unwrap();
    assert_eq!(list["recipe_ids"], json!([1, 2]));

    let data: Value = app
        .get("/api/users/u1/recipes", SHOPPER)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(data["favorites"], json!([2]));
    assert_eq!(data["favorite_recipes"][0]["name"], "Veggie Stir Fry");
    assert_eq!(data["custom_lists"][0]["name"], "Weeknight");

    let missing = app
        .send_json(
            reqwest::Method::POST,
            "/api/users/u1/recipes/favorites/42",
            SHOPPER,
            json!({}),
        )
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let untoggled: Value = app
        .send_json(
            reqwest::Method::POST,
            "/api/users/u1/recipes/favorites/2",
            SHOPPER,
            json!({}),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(untoggled["favorite"], false);
}

#[tokio::test]
async fn test_recipe_agent_round_trip() {
    let server = MockServer::start_async().await;
    let start = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/recipe")
                .header("Authorization", "Bearer agent-key")
                .json_body(json!({"message": "Plan dinner"}));
            then.status(200)
                .header("X-Toolhouse-Run-ID", "run-42")
                .body("Here is dinner");
        })
        .await;
    let resume = server
        .mock_async(|when, then| {
            when.method(PUT).path("/recipe/run-42");
            then.status(200).body("Sure, swapped it");
        })
        .await;
    let app = spawn_app(Some(server.base_url())).await;

    let empty = app
        .send_json(
            reqwest::Method::POST,
            "/api/toolhouse/recipe-agent",
            SHOPPER,
            json!({"message": "  "}),
        )
        .await;
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
    let body: Value = empty.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Message is required");

    let reply: Value = app
        .send_json(
            reqwest::Method::POST,
            "/api/toolhouse/recipe-agent",
            SHOPPER,
            json!({"message": "Plan dinner"}),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(reply["success"], true);
    assert_eq!(reply["data"]["content"], "Here is dinner");
    assert_eq!(reply["data"]["runId"], "run-42");

    let missing_run = app
        .send_json(
            reqwest::Method::PUT,
            "/api/toolhouse/recipe-agent",
            SHOPPER,
            json!({"message": "Swap it"}),
        )
        .await;
    assert_eq!(missing_run.status(), StatusCode::BAD_REQUEST);

    let continued: Value = app
        .send_json(
            reqwest::Method::PUT,
            "/api/toolhouse/recipe-agent",
            SHOPPER,
            json!({"message": "Swap it", "runId": "run-42"}),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(continued["data"]["content"], "Sure, swapped it");

    start.assert_async().await;
    resume.assert_async().await;
}

#[tokio::test]
async fn test_recipe_agent_rejects_bad_json_with_failure_body() {
    let app = spawn_app(None).await;

    for method in [reqwest::Method::POST, reqwest::Method::PUT] {
        let response = app
            .client
            .request(method, app.url("/api/toolhouse/recipe-agent"))
            .bearer_auth(SHOPPER)
            .header("Content-Type", "application/json")
            .body("{\"message\": ")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert!(!body["error"].as_str().unwrap().is_empty());
    }

    let untyped = app
        .client
        .post(app.url("/api/toolhouse/recipe-agent"))
        .bearer_auth(SHOPPER)
        .body("message=hi")
        .send()
        .await
        .unwrap();
    assert_eq!(untyped.status(), StatusCode::BAD_REQUEST);
    let body: Value = untyped.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_agent_meal_plan_is_parsed_and_saved() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/recipe");
            then.status(200).body(
                "Here you go:\n```json\n[{\"day\": 1, \"lunch\": {\"name\": \"Lentil Soup\", \"calories\": 450}, \
                 \"dinner\": {\"name\": \"Tofu Bowl\", \"calories\": 600}}]\n```",
            );
        })
        .await;
    let app = spawn_app(Some(server.base_url())).await;

    let response: Value = app
        .send_json(
            reqwest::Method::POST,
            "/api/agent/meal-plan",
            SHOPPER,
            json!({"save": true}),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(response["plan"]["days"][0]["label"], "Monday");
    assert_eq!(response["plan"]["days"][0]["meals"]["dinner"]["name"], "Tofu Bowl");
    assert_eq!(response["saved"], true);

    let plan: Value = app
        .get("/api/users/u1/meal-plan", SHOPPER)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(plan.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_upstream_agent_failure_is_reported() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/ingredients");
            then.status(503).body("maintenance");
        })
        .await;
    let app = spawn_app(Some(server.base_url())).await;

    let response = app
        .send_json(
            reqwest::Method::POST,
            "/api/toolhouse/ingredient-agent",
            SHOPPER,
            json!({"location": "02139", "ingredients": ["basil"]}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Failed to fetch ingredient information");
    assert_eq!(body["details"], "maintenance");
}
