pub mod collections;
pub mod earnings;
pub mod fridge;
pub mod meal_plan;
pub mod plan_parser;
pub mod recommend;

pub use crate::domain::model::{Order, Recipe, User};
pub use crate::domain::ports::{FoodStore, IdentityProvider, Storage};
pub use crate::utils::error::Result;
