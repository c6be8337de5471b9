use crate::domain::model::{
    AuthUser, DelivererDetails, Fridge, FridgeItem, GroceryItem, MealPlanEntry, Order, Recipe,
    RecipeId, User, UserRecipeData, UserUpdate,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 原始位元組儲存 (本機目錄或測試用記憶體)
pub trait Storage: Send + Sync {
    /// 檔案不存在時回傳 `Ok(None)`
    fn read_file(
        &self,
        path: &str,
    ) -> impl std::future::Future<Output = Result<Option<Vec<u8>>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 在儲存層鎖定期間就地修改資料；回傳錯誤時不寫回
pub type Edit<'a, T> = Box<dyn FnOnce(&mut T) -> Result<()> + Send + 'a>;

#[async_trait]
pub trait FoodStore: Send + Sync {
    async fn list_users(&self) -> Result<Vec<User>>;
    async fn get_user(&self, id: &str) -> Result<Option<User>>;
    async fn create_user(&self, user: User) -> Result<User>;
    async fn update_user(&self, id: &str, update: UserUpdate) -> Result<Option<User>>;

    async fn list_recipes(&self) -> Result<Vec<Recipe>>;
    async fn get_recipe(&self, id: RecipeId) -> Result<Option<Recipe>>;

    async fn get_fridge(&self, user_id: &str) -> Result<Option<Fridge>>;
    async fn put_fridge_items(&self, user_id: &str, items: Vec<FridgeItem>) -> Result<Fridge>;
    /// 讀-改-寫不會與其他寫入交錯；尚無冰箱時從空清單開始
    async fn update_fridge(&self, user_id: &str, edit: Edit<'_, Vec<FridgeItem>>) -> Result<Fridge>;

    async fn get_meal_plan(&self, user_id: &str) -> Result<Vec<MealPlanEntry>>;
    async fn put_meal_plan(&self, user_id: &str, entries: Vec<MealPlanEntry>) -> Result<()>;
    async fn update_meal_plan(
        &self,
        user_id: &str,
        edit: Edit<'_, Vec<MealPlanEntry>>,
    ) -> Result<Vec<MealPlanEntry>>;

    async fn get_grocery_list(&self, user_id: &str) -> Result<Vec<GroceryItem>>;
    async fn put_grocery_list(&self, user_id: &str, items: Vec<GroceryItem>) -> Result<()>;

    async fn get_user_recipes(&self, user_id: &str) -> Result<UserRecipeData>;
    async fn put_user_recipes(&self, data: UserRecipeData) -> Result<UserRecipeData>;
    async fn update_user_recipes(
        &self,
        user_id: &str,
        edit: Edit<'_, UserRecipeData>,
    ) -> Result<UserRecipeData>;

    /// 僅回傳已送達的訂單，依 created_at 由新到舊
    async fn delivered_orders(&self, deliverer_id: &str) -> Result<Vec<Order>>;

    async fn get_deliverer_details(&self, user_id: &str) -> Result<DelivererDetails>;
    async fn put_deliverer_details(&self, details: DelivererDetails) -> Result<DelivererDetails>;
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// 無效的 token 回傳 `Ok(None)`
    async fn resolve(&self, token: &str) -> Result<Option<AuthUser>>;
}
