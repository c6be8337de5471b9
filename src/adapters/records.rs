//! Row shapes shared by the file and hosted stores.

use crate::domain::model::{GroceryItem, MealPlanEntry, UserId};
use serde::{Deserialize, Serialize};

/// meal-plans.json / meal_plans 的一列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlanRow {
    pub user_id: UserId,
    #[serde(flatten)]
    pub entry: MealPlanEntry,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroceryListRow {
    pub user_id: UserId,
    #[serde(default)]
    pub items: Vec<GroceryItem>,
}
