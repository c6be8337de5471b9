use foodwell::adapters::identity::HostedIdentity;
use foodwell::domain::model::{FridgeItem, MealPlanEntry, MealType, Recipe, UserUpdate};
use foodwell::domain::ports::{FoodStore, IdentityProvider};
use foodwell::{FoodError, HostedStore};
use httpmock::prelude::*;
use httpmock::Method::PATCH;
use serde_json::json;

fn store(server: &MockServer) -> HostedStore {
    HostedStore::new(reqwest::Client::new(), &server.base_url(), "service-key")
}

#[tokio::test]
async fn test_get_user_filters_by_id_and_sends_keys() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/rest/v1/profiles")
                .query_param("id", "eq.u1")
                .header("apikey", "service-key")
                .header("Authorization", "Bearer service-key");
            then.status(200)
                .json_body(json!([{"id": "u1", "name": "Sam", "allergies": ["peanut"]}]));
        })
        .await;

    let user = store(&server).get_user("u1").await.unwrap().unwrap();
    assert_eq!(user.name, "Sam");
    assert_eq!(user.allergies, vec!["peanut".to_string()]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_missing_rows_read_as_none_or_defaults() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET);
            then.status(200).json_body(json!([]));
        })
        .await;
    let store = store(&server);

    assert!(store.get_user("nobody").await.unwrap().is_none());
    assert!(store.get_fridge("nobody").await.unwrap().is_none());
    assert!(store.get_grocery_list("nobody").await.unwrap().is_empty());
    assert!(store.get_user_recipes("nobody").await.unwrap().favorites.is_empty());

    let details = store.get_deliverer_details("d1").await.unwrap();
    assert_eq!(details.user_id, "d1");
    assert!(details.availability_status);
}

#[tokio::test]
async fn test_create_user_conflict() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/rest/v1/profiles");
            then.status(200).json_body(json!([{"id": "u1", "name": "Sam"}]));
        })
        .await;
    let insert = server
        .mock_async(|when, then| {
            when.method(POST).path("/rest/v1/profiles");
            then.status(201).json_body(json!([]));
        })
        .await;

    let user = serde_json::from_value(json!({"id": "u1", "name": "Other"})).unwrap();
    let result = store(&server).create_user(user).await;
    assert!(matches!(result, Err(FoodError::Conflict(_))));
    assert_eq!(insert.hits_async().await, 0);
}

#[tokio::test]
async fn test_update_user_patches_merged_row() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/rest/v1/profiles")
                .query_param("id", "eq.u1");
            then.status(200)
                .json_body(json!([{"id": "u1", "name": "Sam", "city": "Boston"}]));
        })
        .await;
    let patch = server
        .mock_async(|when, then| {
            when.method(PATCH)
                .path("/rest/v1/profiles")
                .query_param("id", "eq.u1")
                .header("Prefer", "return=representation")
                .body_includes("\"name\":\"Samira\"")
                .body_includes("\"city\":\"Boston\"");
            then.status(200)
                .json_body(json!([{"id": "u1", "name": "Samira", "city": "Boston"}]));
        })
        .await;

    let update = UserUpdate {
        name: Some("Samira".into()),
        ..Default::default()
    };
    let user = store(&server).update_user("u1", update).await.unwrap().unwrap();
    assert_eq!(user.name, "Samira");
    patch.assert_async().await;
}

#[tokio::test]
async fn test_fridge_upsert_uses_on_conflict() {
    let server = MockServer::start_async().await;
    let upsert = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/rest/v1/fridges")
                .query_param("on_conflict", "user_id")
                .header("Prefer", "resolution=merge-duplicates,return=representation")
                .body_includes("\"user_id\":\"u1\"");
            then.status(201).json_body(json!([
                {"user_id": "u1", "items": [{"name": "milk", "quantity": 1, "unit": "l"}]}
            ]));
        })
        .await;

    let fridge = store(&server)
        .put_fridge_items(
            "u1",
            vec![FridgeItem {
                name: "milk".into(),
                quantity: 1.0,
                unit: "l".into(),
            }],
        )
        .await
        .unwrap();
    assert_eq!(fridge.items.len(), 1);
    upsert.assert_async().await;
}

fn lunch(id: &str) -> MealPlanEntry {
    MealPlanEntry {
        id: id.into(),
        recipe: Recipe {
            id: 3,
            name: "Soup".into(),
            num_servings: 1.0,
            ..Default::default()
        },
        day: "Monday".into(),
        meal_type: MealType::Lunch,
        servings: 1.0,
    }
}

#[tokio::test]
async fn test_meal_plan_replace_upserts_then_prunes_stale_entries() {
    let server = MockServer::start_async().await;
    let upsert = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/rest/v1/meal_plans")
                .query_param("on_conflict", "user_id,id")
                .body_includes("\"user_id\":\"u1\"")
                .body_includes("\"meal_type\":\"lunch\"");
            then.status(201).json_body(json!([]));
        })
        .await;
    let prune = server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path("/rest/v1/meal_plans")
                .query_param("user_id", "eq.u1")
                .query_param("id", "not.in.(\"e1\",\"e2\")");
            then.status(204);
        })
        .await;

    store(&server)
        .put_meal_plan("u1", vec![lunch("e1"), lunch("e2")])
        .await
        .unwrap();
    upsert.assert_async().await;
    prune.assert_async().await;
}

#[tokio::test]
async fn test_failed_meal_plan_upsert_keeps_old_plan() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/rest/v1/meal_plans");
            then.status(500).body("boom");
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/rest/v1/meal_plans");
            then.status(204);
        })
        .await;

    let err = store(&server)
        .put_meal_plan("u1", vec![lunch("e1")])
        .await
        .unwrap_err();
    assert!(matches!(err, FoodError::StoreError { .. }));
    assert_eq!(delete.hits_async().await, 0);
}

#[tokio::test]
async fn test_update_meal_plan_reads_edits_and_saves() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/rest/v1/meal_plans")
                .query_param("user_id", "eq.u1");
            then.status(200).json_body(json!([
                {"user_id": "u1", "id": "e1", "recipe": {"id": 3, "name": "Soup"},
                 "day": "Monday", "meal_type": "lunch", "servings": 1}
            ]));
        })
        .await;
    let upsert = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/rest/v1/meal_plans")
                .body_includes("\"servings\":3.0");
            then.status(201).json_body(json!([]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path("/rest/v1/meal_plans");
            then.status(204);
        })
        .await;

    let plan = store(&server)
        .update_meal_plan(
            "u1",
            Box::new(|entries: &mut Vec<MealPlanEntry>| {
                entries[0].servings = 3.0;
                Ok(())
            }),
        )
        .await
        .unwrap();
    assert_eq!(plan[0].servings, 3.0);
    upsert.assert_async().await;
}

#[tokio::test]
async fn test_clearing_meal_plan_skips_insert() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path("/rest/v1/meal_plans");
            then.status(204);
        })
        .await;
    let insert = server
        .mock_async(|when, then| {
            when.method(POST).path("/rest/v1/meal_plans");
            then.status(201).json_body(json!([]));
        })
        .await;

    store(&server).put_meal_plan("u1", Vec::new()).await.unwrap();
    assert_eq!(insert.hits_async().await, 0);
}

#[tokio::test]
async fn test_delivered_orders_query() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/rest/v1/orders")
                .query_param("deliverer_id", "eq.d1")
                .query_param("status", "eq.delivered")
                .query_param("order", "created_at.desc");
            then.status(200).json_body(json!([
                {
                    "id": "o1",
                    "deliverer_id": "d1",
                    "total_cost": 25.0,
                    "delivery_fee": 4.5,
                    "status": "delivered",
                    "created_at": "2024-05-01T10:00:00Z",
                    "order_items": [{"id": "i1", "name": "milk", "quantity": 2, "unit": "l", "price_per_unit": 1.5}]
                }
            ]));
        })
        .await;

    let orders = store(&server).delivered_orders("d1").await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].earnings(), 4.5);
    assert_eq!(orders[0].order_items[0].name, "milk");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_error_status_is_store_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/rest/v1/recipes");
            then.status(500).body("relation does not exist");
        })
        .await;

    let result = store(&server).list_recipes().await;
    match result {
        Err(FoodError::StoreError { message }) => {
            assert!(message.contains("relation does not exist"))
        }
        other => panic!("expected store error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_hosted_identity_resolves_token() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/auth/v1/user")
                .header("apikey", "anon")
                .header("Authorization", "Bearer good");
            then.status(200)
                .json_body(json!({"id": "u1", "email": "sam@example.com", "aud": "authenticated"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/auth/v1/user")
                .header("Authorization", "Bearer expired");
            then.status(401).json_body(json!({"msg": "invalid JWT"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/auth/v1/user")
                .header("Authorization", "Bearer flaky");
            then.status(503).body("down");
        })
        .await;

    let identity = HostedIdentity::new(reqwest::Client::new(), &server.base_url(), "anon");

    let user = identity.resolve("good").await.unwrap().unwrap();
    assert_eq!(user.id, "u1");
    assert_eq!(user.email.as_deref(), Some("sam@example.com"));

    assert!(identity.resolve("expired").await.unwrap().is_none());

    let err = identity.resolve("flaky").await.unwrap_err();
    assert_eq!(err.status_code(), 503);
}
