use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = String;
pub type RecipeId = i64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Macros {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub fiber_g: f64,
}

impl Macros {
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            calories: self.calories * factor,
            protein_g: self.protein_g * factor,
            carbs_g: self.carbs_g * factor,
            fat_g: self.fat_g * factor,
            fiber_g: self.fiber_g * factor,
        }
    }

    pub fn add(&self, other: &Macros) -> Self {
        Self {
            calories: self.calories + other.calories,
            protein_g: self.protein_g + other.protein_g,
            carbs_g: self.carbs_g + other.carbs_g,
            fat_g: self.fat_g + other.fat_g,
            fiber_g: self.fiber_g + other.fiber_g,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityLevel {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Priorities {
    pub budget: PriorityLevel,
    pub health: PriorityLevel,
    pub convenience: PriorityLevel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Shopper,
    Deliverer,
}

/// 使用者檔案，包含飲食偏好與地址
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub role: Role,
    pub dietary_restrictions: Vec<String>,
    pub allergies: Vec<String>,
    pub macro_targets: Macros,
    pub liked_cuisines: Vec<String>,
    pub liked_ingredients: Vec<String>,
    pub disliked_cuisines: Vec<String>,
    pub disliked_ingredients: Vec<String>,
    pub liked_flavor_profile: Vec<String>,
    pub priorities: Priorities,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// 部分更新；`None` 欄位保持原值
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dietary_restrictions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergies: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macro_targets: Option<Macros>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liked_cuisines: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liked_ingredients: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disliked_cuisines: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disliked_ingredients: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liked_flavor_profile: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priorities: Option<Priorities>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
}

impl UserUpdate {
    pub fn apply(self, user: &mut User) {
        if let Some(v) = self.name {
            user.name = v;
        }
        if let Some(v) = self.dietary_restrictions {
            user.dietary_restrictions = v;
        }
        if let Some(v) = self.allergies {
            user.allergies = v;
        }
        if let Some(v) = self.macro_targets {
            user.macro_targets = v;
        }
        if let Some(v) = self.liked_cuisines {
            user.liked_cuisines = v;
        }
        if let Some(v) = self.liked_ingredients {
            user.liked_ingredients = v;
        }
        if let Some(v) = self.disliked_cuisines {
            user.disliked_cuisines = v;
        }
        if let Some(v) = self.disliked_ingredients {
            user.disliked_ingredients = v;
        }
        if let Some(v) = self.liked_flavor_profile {
            user.liked_flavor_profile = v;
        }
        if let Some(v) = self.priorities {
            user.priorities = v;
        }
        if let Some(v) = self.address {
            user.address = v;
        }
        if let Some(v) = self.city {
            user.city = v;
        }
        if let Some(v) = self.state {
            user.state = v;
        }
        if let Some(v) = self.zip {
            user.zip = v;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FridgeItem {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fridge {
    #[serde(alias = "id")]
    pub user_id: UserId,
    #[serde(default)]
    pub items: Vec<FridgeItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ingredient {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipeTags {
    pub meal_type: Vec<String>,
    pub cuisine_region: Vec<String>,
    pub dietary_preferences: Vec<String>,
    pub difficulty_level: Vec<String>,
}

fn one() -> f64 {
    1.0
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    #[serde(default = "one")]
    pub num_servings: f64,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub tags: RecipeTags,
    #[serde(default)]
    pub cooking_method: Vec<String>,
    #[serde(default)]
    pub equipment_needed: Vec<String>,
    #[serde(default)]
    pub flavor_profile: Vec<String>,
    #[serde(default)]
    pub macros: Macros,
    #[serde(default)]
    pub time_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlanEntry {
    pub id: String,
    pub recipe: Recipe,
    pub day: String,
    pub meal_type: MealType,
    #[serde(default = "one")]
    pub servings: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroceryItem {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub needed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeList {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub recipe_ids: Vec<RecipeId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserRecipeData {
    pub user_id: UserId,
    pub favorites: Vec<RecipeId>,
    pub custom_lists: Vec<RecipeList>,
}

impl UserRecipeData {
    pub fn empty(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Assigned,
    PickedUp,
    Delivered,
    Cancelled,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderItem {
    pub id: String,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub price_per_unit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    #[serde(default)]
    pub shopper_id: Option<UserId>,
    #[serde(default)]
    pub deliverer_id: Option<UserId>,
    #[serde(default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub delivery_instructions: Option<String>,
    #[serde(default)]
    pub total_cost: f64,
    #[serde(default)]
    pub delivery_fee: Option<f64>,
    #[serde(default)]
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub assigned_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
}

impl Order {
    /// 缺少配送費時視為 0
    pub fn earnings(&self) -> f64 {
        self.delivery_fee.unwrap_or(0.0)
    }

    pub fn delivery_minutes(&self) -> Option<f64> {
        match (self.assigned_at, self.delivered_at) {
            (Some(assigned), Some(delivered)) => {
                Some((delivered - assigned).num_milliseconds() as f64 / 60_000.0)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelivererDetails {
    pub user_id: UserId,
    pub phone: Option<String>,
    pub vehicle_type: Option<String>,
    pub license_plate: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub delivery_radius: f64,
    pub preferred_hours_start: String,
    pub preferred_hours_end: String,
    pub accepts_cash: bool,
    pub accepts_card: bool,
    pub availability_status: bool,
    pub last_availability_change: Option<DateTime<Utc>>,
}

impl Default for DelivererDetails {
    fn default() -> Self {
        Self {
            user_id: String::new(),
            phone: None,
            vehicle_type: None,
            license_plate: None,
            emergency_contact_name: None,
            emergency_contact_phone: None,
            delivery_radius: 10.0,
            preferred_hours_start: "09:00".to_string(),
            preferred_hours_end: "21:00".to_string(),
            accepts_cash: true,
            accepts_card: true,
            availability_status: true,
            last_availability_change: None,
        }
    }
}

impl DelivererDetails {
    pub fn for_user(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            ..Default::default()
        }
    }
}

/// 由身分提供者解析出的呼叫者
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
}
