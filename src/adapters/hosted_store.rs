use crate::adapters::records::{GroceryListRow, MealPlanRow};
use crate::domain::model::{
    DelivererDetails, Fridge, FridgeItem, GroceryItem, MealPlanEntry, Order, Recipe, RecipeId,
    User, UserRecipeData, UserUpdate,
};
use crate::domain::ports::{Edit, FoodStore};
use crate::utils::error::{FoodError, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const PROFILES_TABLE: &str = "profiles";
pub const RECIPES_TABLE: &str = "recipes";
pub const FRIDGES_TABLE: &str = "fridges";
pub const MEAL_PLANS_TABLE: &str = "meal_plans";
pub const GROCERY_LISTS_TABLE: &str = "grocery_lists";
pub const USER_RECIPES_TABLE: &str = "user_recipes";
pub const ORDERS_TABLE: &str = "orders";
pub const DELIVERER_DETAILS_TABLE: &str = "deliverer_details";

type Query = Vec<(&'static str, String)>;

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

/// `id=not.in.(...)` 的值，每個 id 以雙引號包住
fn not_in(ids: &[&str]) -> String {
    let quoted: Vec<String> = ids
        .iter()
        .map(|id| format!("\"{}\"", id.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect();
    format!("not.in.({})", quoted.join(","))
}

/// PostgREST 風格的託管資料庫
#[derive(Debug, Clone)]
pub struct HostedStore {
    client: Client,
    base_url: String,
    api_key: String,
    // 只串行本行程內的讀-改-寫
    write_lock: Arc<Mutex<()>>,
}

impl HostedStore {
    /// `api_key` 應為伺服器端金鑰；使用者過濾由查詢條件負責
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn check(table: &str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::warn!("⚠️ {} request failed with {}: {}", table, status, body);
        Err(FoodError::StoreError {
            message: format!("{} request failed with {}: {}", table, status, body),
        })
    }

    async fn select<T: DeserializeOwned + Send>(&self, table: &str, query: Query) -> Result<Vec<T>> {
        let request = self
            .authorized(self.client.get(self.table_url(table)))
            .query(&query);
        let response = Self::check(table, request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn select_one<T: DeserializeOwned + Send>(&self, table: &str, query: Query) -> Result<Option<T>> {
        let rows: Vec<T> = self.select(table, query).await?;
        Ok(rows.into_iter().next())
    }

    /// `on_conflict` 為 Some 時以該欄位做 upsert
    async fn insert<B, T>(&self, table: &str, rows: &B, on_conflict: Option<&str>) -> Result<Vec<T>>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned + Send,
    {
        let mut request = self
            .authorized(self.client.post(self.table_url(table)))
            .json(rows);
        request = match on_conflict {
            Some(column) => request
                .query(&[("on_conflict", column)])
                .header("Prefer", "resolution=merge-duplicates,return=representation"),
            None => request.header("Prefer", "return=representation"),
        };
        let response = Self::check(table, request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn upsert_one<T>(&self, table: &str, row: &T, on_conflict: &str) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync,
    {
        let stored: Vec<T> = self
            .insert(table, std::slice::from_ref(row), Some(on_conflict))
            .await?;
        Ok(stored.into_iter().next().unwrap_or_else(|| row.clone()))
    }

    async fn delete(&self, table: &str, query: Query) -> Result<()> {
        let request = self
            .authorized(self.client.delete(self.table_url(table)))
            .query(&query);
        Self::check(table, request.send().await?).await?;
        Ok(())
    }
}

#[async_trait]
impl FoodStore for HostedStore {
    async fn list_users(&self) -> Result<Vec<User>> {
        self.select(PROFILES_TABLE, vec![("order", "id.asc".to_string())])
            .await
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.select_one(PROFILES_TABLE, vec![("id", eq(id))]).await
    }

    async fn create_user(&self, mut user: User) -> Result<User> {
        if self.get_user(&user.id).await?.is_some() {
            return Err(FoodError::Conflict(format!("User {} already exists", user.id)));
        }
        let now = Utc::now();
        user.created_at.get_or_insert(now);
        user.updated_at = Some(now);

        let stored: Vec<User> = self
            .insert(PROFILES_TABLE, std::slice::from_ref(&user), None)
            .await?;
        Ok(stored.into_iter().next().unwrap_or(user))
    }

    async fn update_user(&self, id: &str, update: UserUpdate) -> Result<Option<User>> {
        let Some(mut user) = self.get_user(id).await? else {
            return Ok(None);
        };
        update.apply(&mut user);
        user.updated_at = Some(Utc::now());

        let request = self
            .authorized(self.client.patch(self.table_url(PROFILES_TABLE)))
            .query(&[("id", eq(id))])
            .header("Prefer", "return=representation")
            .json(&user);
        let response = Self::check(PROFILES_TABLE, request.send().await?).await?;
        let stored: Vec<User> = response.json().await?;
        Ok(Some(stored.into_iter().next().unwrap_or(user)))
    }

    async fn list_recipes(&self) -> Result<Vec<Recipe>> {
        self.select(RECIPES_TABLE, vec![("order", "id.asc".to_string())])
            .await
    }

    async fn get_recipe(&self, id: RecipeId) -> Result<Option<Recipe>> {
        self.select_one(RECIPES_TABLE, vec![("id", eq(&id.to_string()))])
            .await
    }

    async fn get_fridge(&self, user_id: &str) -> Result<Option<Fridge>> {
        self.select_one(FRIDGES_TABLE, vec![("user_id", eq(user_id))])
            .await
    }

    async fn put_fridge_items(&self, user_id: &str, items: Vec<FridgeItem>) -> Result<Fridge> {
        let fridge = Fridge {
            user_id: user_id.to_string(),
            items,
        };
        self.upsert_one(FRIDGES_TABLE, &fridge, "user_id").await
    }

    async fn update_fridge(&self, user_id: &str, edit: Edit<'_, Vec<FridgeItem>>) -> Result<Fridge> {
        let _guard = self.write_lock.lock().await;
        let mut items = self
            .get_fridge(user_id)
            .await?
            .map(|f| f.items)
            .unwrap_or_default();
        edit(&mut items)?;
        self.put_fridge_items(user_id, items).await
    }

    async fn get_meal_plan(&self, user_id: &str) -> Result<Vec<MealPlanEntry>> {
        let rows: Vec<MealPlanRow> = self
            .select(MEAL_PLANS_TABLE, vec![("user_id", eq(user_id))])
            .await?;
        Ok(rows.into_iter().map(|r| r.entry).collect())
    }

    /// 先 upsert 新項目再刪除其餘舊項目；upsert 失敗時舊計畫不受影響
    async fn put_meal_plan(&self, user_id: &str, entries: Vec<MealPlanEntry>) -> Result<()> {
        if entries.is_empty() {
            return self
                .delete(MEAL_PLANS_TABLE, vec![("user_id", eq(user_id))])
                .await;
        }

        let rows: Vec<MealPlanRow> = entries
            .into_iter()
            .map(|entry| MealPlanRow {
                user_id: user_id.to_string(),
                entry,
            })
            .collect();
        let _: Vec<MealPlanRow> = self
            .insert(MEAL_PLANS_TABLE, &rows, Some("user_id,id"))
            .await?;

        let ids: Vec<&str> = rows.iter().map(|r| r.entry.id.as_str()).collect();
        let stale = vec![("user_id", eq(user_id)), ("id", not_in(&ids))];
        if let Err(e) = self.delete(MEAL_PLANS_TABLE, stale).await {
            tracing::error!(
                "❌ Saved {} meal plan entries for user {} but stale entries remain: {}",
                rows.len(),
                user_id,
                e
            );
            return Err(e);
        }
        Ok(())
    }

    async fn update_meal_plan(
        &self,
        user_id: &str,
        edit: Edit<'_, Vec<MealPlanEntry>>,
    ) -> Result<Vec<MealPlanEntry>> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.get_meal_plan(user_id).await?;
        edit(&mut entries)?;
        self.put_meal_plan(user_id, entries.clone()).await?;
        Ok(entries)
    }

    async fn get_grocery_list(&self, user_id: &str) -> Result<Vec<GroceryItem>> {
        let row: Option<GroceryListRow> = self
            .select_one(GROCERY_LISTS_TABLE, vec![("user_id", eq(user_id))])
            .await?;
        Ok(row.map(|r| r.items).unwrap_or_default())
    }

    async fn put_grocery_list(&self, user_id: &str, items: Vec<GroceryItem>) -> Result<()> {
        let row = GroceryListRow {
            user_id: user_id.to_string(),
            items,
        };
        self.upsert_one(GROCERY_LISTS_TABLE, &row, "user_id").await?;
        Ok(())
    }

    async fn get_user_recipes(&self, user_id: &str) -> Result<UserRecipeData> {
        let row: Option<UserRecipeData> = self
            .select_one(USER_RECIPES_TABLE, vec![("user_id", eq(user_id))])
            .await?;
        Ok(row.unwrap_or_else(|| UserRecipeData::empty(user_id)))
    }

    async fn put_user_recipes(&self, data: UserRecipeData) -> Result<UserRecipeData> {
        self.upsert_one(USER_RECIPES_TABLE, &data, "user_id").await
    }

    async fn update_user_recipes(
        &self,
        user_id: &str,
        edit: Edit<'_, UserRecipeData>,
    ) -> Result<UserRecipeData> {
        let _guard = self.write_lock.lock().await;
        let mut data = self.get_user_recipes(user_id).await?;
        edit(&mut data)?;
        data.user_id = user_id.to_string();
        self.put_user_recipes(data).await
    }

    async fn delivered_orders(&self, deliverer_id: &str) -> Result<Vec<Order>> {
        self.select(
            ORDERS_TABLE,
            vec![
                ("select", "*,order_items(*)".to_string()),
                ("deliverer_id", eq(deliverer_id)),
                ("status", eq("delivered")),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn get_deliverer_details(&self, user_id: &str) -> Result<DelivererDetails> {
        let row: Option<DelivererDetails> = self
            .select_one(DELIVERER_DETAILS_TABLE, vec![("user_id", eq(user_id))])
            .await?;
        Ok(row.unwrap_or_else(|| DelivererDetails::for_user(user_id)))
    }

    async fn put_deliverer_details(&self, details: DelivererDetails) -> Result<DelivererDetails> {
        self.upsert_one(DELIVERER_DETAILS_TABLE, &details, "user_id")
            .await
    }
}
