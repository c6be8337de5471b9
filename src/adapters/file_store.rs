use crate::adapters::records::{GroceryListRow, MealPlanRow};
use crate::domain::model::{
    DelivererDetails, Fridge, FridgeItem, GroceryItem, MealPlanEntry, Order, OrderStatus, Recipe,
    RecipeId, User, UserRecipeData, UserUpdate,
};
use crate::domain::ports::{Edit, FoodStore, Storage};
use crate::utils::error::{FoodError, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

pub const USERS_FILE: &str = "users.json";
pub const RECIPES_FILE: &str = "recipes.json";
pub const FRIDGES_FILE: &str = "fridges.json";
pub const MEAL_PLANS_FILE: &str = "meal-plans.json";
pub const GROCERY_LISTS_FILE: &str = "grocery-lists.json";
pub const USER_RECIPES_FILE: &str = "user-recipes.json";
pub const ORDERS_FILE: &str = "orders.json";
pub const DELIVERERS_FILE: &str = "deliverers.json";

/// 每個集合一個 JSON 陣列檔案
pub struct JsonFileStore<S: Storage> {
    storage: S,
    // 讀-改-寫必須串行，否則並發請求會互相覆蓋
    write_lock: Mutex<()>,
}

impl<S: Storage> JsonFileStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            write_lock: Mutex::new(()),
        }
    }

    async fn read_collection<T: DeserializeOwned + Send>(&self, file: &str) -> Result<Vec<T>> {
        match self.storage.read_file(file).await? {
            Some(bytes) if !bytes.iter().all(u8::is_ascii_whitespace) => {
                serde_json::from_slice(&bytes).map_err(|e| FoodError::StoreError {
                    message: format!("{} is not a valid JSON array: {}", file, e),
                })
            }
            _ => Ok(Vec::new()),
        }
    }

    async fn write_collection<T: Serialize + Sync>(&self, file: &str, rows: &[T]) -> Result<()> {
        let data = serde_json::to_vec_pretty(rows)?;
        self.storage.write_file(file, &data).await?;
        tracing::debug!("💾 Wrote {} rows to {}", rows.len(), file);
        Ok(())
    }
}

#[async_trait]
impl<S: Storage> FoodStore for JsonFileStore<S> {
    async fn list_users(&self) -> Result<Vec<User>> {
        self.read_collection(USERS_FILE).await
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        let users: Vec<User> = self.read_collection(USERS_FILE).await?;
        Ok(users.into_iter().find(|u| u.id == id))
    }

    async fn create_user(&self, mut user: User) -> Result<User> {
        let _guard = self.write_lock.lock().await;
        let mut users: Vec<User> = self.read_collection(USERS_FILE).await?;
        if users.iter().any(|u| u.id == user.id) {
            return Err(FoodError::Conflict(format!("User {} already exists", user.id)));
        }

        let now = Utc::now();
        user.created_at.get_or_insert(now);
        user.updated_at = Some(now);
        users.push(user.clone());
        self.write_collection(USERS_FILE, &users).await?;
        Ok(user)
    }

    async fn update_user(&self, id: &str, update: UserUpdate) -> Result<Option<User>> {
        let _guard = self.write_lock.lock().await;
        let mut users: Vec<User> = self.read_collection(USERS_FILE).await?;
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };

        update.apply(user);
        user.updated_at = Some(Utc::now());
        let updated = user.clone();
        self.write_collection(USERS_FILE, &users).await?;
        Ok(Some(updated))
    }

    async fn list_recipes(&self) -> Result<Vec<Recipe>> {
        let mut recipes: Vec<Recipe> = self.read_collection(RECIPES_FILE).await?;
        recipes.sort_by_key(|r| r.id);
        Ok(recipes)
    }

    async fn get_recipe(&self, id: RecipeId) -> Result<Option<Recipe>> {
        let recipes: Vec<Recipe> = self.read_collection(RECIPES_FILE).await?;
        Ok(recipes.into_iter().find(|r| r.id == id))
    }

    async fn get_fridge(&self, user_id: &str) -> Result<Option<Fridge>> {
        let fridges: Vec<Fridge> = self.read_collection(FRIDGES_FILE).await?;
        Ok(fridges.into_iter().find(|f| f.user_id == user_id))
    }

    async fn put_fridge_items(&self, user_id: &str, items: Vec<FridgeItem>) -> Result<Fridge> {
        self.update_fridge(
            user_id,
            Box::new(move |current: &mut Vec<FridgeItem>| {
                *current = items;
                Ok(())
            }),
        )
        .await
    }

    async fn update_fridge(&self, user_id: &str, edit: Edit<'_, Vec<FridgeItem>>) -> Result<Fridge> {
        let _guard = self.write_lock.lock().await;
        let mut fridges: Vec<Fridge> = self.read_collection(FRIDGES_FILE).await?;
        let index = match fridges.iter().position(|f| f.user_id == user_id) {
            Some(index) => index,
            None => {
                fridges.push(Fridge {
                    user_id: user_id.to_string(),
                    items: Vec::new(),
                });
                fridges.len() - 1
            }
        };

        edit(&mut fridges[index].items)?;
        let fridge = fridges[index].clone();
        self.write_collection(FRIDGES_FILE, &fridges).await?;
        Ok(fridge)
    }

    async fn get_meal_plan(&self, user_id: &str) -> Result<Vec<MealPlanEntry>> {
        let rows: Vec<MealPlanRow> = self.read_collection(MEAL_PLANS_FILE).await?;
        Ok(rows
            .into_iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.entry)
            .collect())
    }

    async fn put_meal_plan(&self, user_id: &str, entries: Vec<MealPlanEntry>) -> Result<()> {
        self.update_meal_plan(
            user_id,
            Box::new(move |current: &mut Vec<MealPlanEntry>| {
                *current = entries;
                Ok(())
            }),
        )
        .await?;
        Ok(())
    }

    async fn update_meal_plan(
        &self,
        user_id: &str,
        edit: Edit<'_, Vec<MealPlanEntry>>,
    ) -> Result<Vec<MealPlanEntry>> {
        let _guard = self.write_lock.lock().await;
        let rows: Vec<MealPlanRow> = self.read_collection(MEAL_PLANS_FILE).await?;
        let (plan, mut rows): (Vec<MealPlanRow>, Vec<MealPlanRow>) =
            rows.into_iter().partition(|r| r.user_id == user_id);
        let mut entries: Vec<MealPlanEntry> = plan.into_iter().map(|r| r.entry).collect();

        edit(&mut entries)?;
        rows.extend(entries.iter().cloned().map(|entry| MealPlanRow {
            user_id: user_id.to_string(),
            entry,
        }));
        self.write_collection(MEAL_PLANS_FILE, &rows).await?;
        Ok(entries)
    }

    async fn get_grocery_list(&self, user_id: &str) -> Result<Vec<GroceryItem>> {
        let rows: Vec<GroceryListRow> = self.read_collection(GROCERY_LISTS_FILE).await?;
        Ok(rows
            .into_iter()
            .find(|r| r.user_id == user_id)
            .map(|r| r.items)
            .unwrap_or_default())
    }

    async fn put_grocery_list(&self, user_id: &str, items: Vec<GroceryItem>) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut rows: Vec<GroceryListRow> = self.read_collection(GROCERY_LISTS_FILE).await?;
        match rows.iter_mut().find(|r| r.user_id == user_id) {
            Some(row) => row.items = items,
            None => rows.push(GroceryListRow {
                user_id: user_id.to_string(),
                items,
            }),
        }
        self.write_collection(GROCERY_LISTS_FILE, &rows).await
    }

    async fn get_user_recipes(&self, user_id: &str) -> Result<UserRecipeData> {
        let rows: Vec<UserRecipeData> = self.read_collection(USER_RECIPES_FILE).await?;
        Ok(rows
            .into_iter()
            .find(|r| r.user_id == user_id)
            .unwrap_or_else(|| UserRecipeData::empty(user_id)))
    }

    async fn put_user_recipes(&self, data: UserRecipeData) -> Result<UserRecipeData> {
        let user_id = data.user_id.clone();
        self.update_user_recipes(
            &user_id,
            Box::new(move |current: &mut UserRecipeData| {
                *current = data;
                Ok(())
            }),
        )
        .await
    }

    async fn update_user_recipes(
        &self,
        user_id: &str,
        edit: Edit<'_, UserRecipeData>,
    ) -> Result<UserRecipeData> {
        let _guard = self.write_lock.lock().await;
        let mut rows: Vec<UserRecipeData> = self.read_collection(USER_RECIPES_FILE).await?;
        let index = match rows.iter().position(|r| r.user_id == user_id) {
            Some(index) => index,
            None => {
                rows.push(UserRecipeData::empty(user_id));
                rows.len() - 1
            }
        };

        edit(&mut rows[index])?;
        rows[index].user_id = user_id.to_string();
        let data = rows[index].clone();
        self.write_collection(USER_RECIPES_FILE, &rows).await?;
        Ok(data)
    }

    async fn delivered_orders(&self, deliverer_id: &str) -> Result<Vec<Order>> {
        let orders: Vec<Order> = self.read_collection(ORDERS_FILE).await?;
        let mut delivered: Vec<Order> = orders
            .into_iter()
            .filter(|o| {
                o.status == OrderStatus::Delivered && o.deliverer_id.as_deref() == Some(deliverer_id)
            })
            .collect();
        delivered.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(delivered)
    }

    async fn get_deliverer_details(&self, user_id: &str) -> Result<DelivererDetails> {
        let rows: Vec<DelivererDetails> = self.read_collection(DELIVERERS_FILE).await?;
        Ok(rows
            .into_iter()
            .find(|d| d.user_id == user_id)
            .unwrap_or_else(|| DelivererDetails::for_user(user_id)))
    }

    async fn put_deliverer_details(&self, details: DelivererDetails) -> Result<DelivererDetails> {
        let _guard = self.write_lock.lock().await;
        let mut rows: Vec<DelivererDetails> = self.read_collection(DELIVERERS_FILE).await?;
        match rows.iter_mut().find(|d| d.user_id == details.user_id) {
            Some(row) => *row = details.clone(),
            None => rows.push(details.clone()),
        }
        self.write_collection(DELIVERERS_FILE, &rows).await?;
        Ok(details)
    }
}
