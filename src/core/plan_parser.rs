//! Turns free-form agent output into a structured weekly meal plan.
//!
//! The agent is asked for JSON but usually wraps it in prose or code fences,
//! nests it under an arbitrary key, and is inconsistent about recipe shape
//! (nested `macros` vs. flat `calories`, ingredient objects vs. strings).

use crate::domain::model::{Ingredient, Macros, MealPlanEntry, MealType, Recipe, RecipeTags};
use crate::utils::error::{FoodError, Result};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

pub const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const PLAN_KEYS: [&str; 3] = ["mealPlan", "days", "meals"];

fn parse_error(message: impl Into<String>) -> FoodError {
    FoodError::PlanParseError {
        message: message.into(),
    }
}

/// 取出文字中最外層的 JSON 陣列或物件；找不到時嘗試整段解析
pub fn extract_json(text: &str) -> Result<Value> {
    let re = Regex::new(r"(?s)\[.*\]|\{.*\}").map_err(|e| parse_error(e.to_string()))?;

    let first_attempt = match re.find(text) {
        Some(m) => match serde_json::from_str::<Value>(m.as_str()) {
            Ok(value) => return Ok(value),
            Err(e) => Some(e),
        },
        None => None,
    };

    serde_json::from_str::<Value>(text.trim()).map_err(|e| {
        let cause = first_attempt.unwrap_or(e);
        tracing::debug!("Agent content is not JSON: {}", cause);
        parse_error(format!("no JSON meal plan found in agent response ({})", cause))
    })
}

/// 陣列直接使用；物件則取 mealPlan / days / meals，否則包成單一元素
pub fn normalize_plan(value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut obj) => {
            for key in PLAN_KEYS {
                if let Some(inner) = obj.remove(key) {
                    return Ok(match inner {
                        Value::Array(items) => items,
                        other => vec![other],
                    });
                }
            }
            Ok(vec![Value::Object(obj)])
        }
        other => Err(parse_error(format!(
            "expected a JSON array or object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedDay {
    pub day: u32,
    pub label: String,
    pub meals: BTreeMap<String, Recipe>,
}

impl PlannedDay {
    pub fn total_calories(&self) -> f64 {
        self.meals.values().map(|r| r.macros.calories).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeeklyPlan {
    pub days: Vec<PlannedDay>,
}

impl WeeklyPlan {
    pub fn recipe_count(&self) -> usize {
        self.days.iter().map(|d| d.meals.len()).sum()
    }

    /// 轉成可儲存的餐點計畫；無法辨識的餐別會被略過，重複的 id 加上序號
    pub fn to_entries(&self) -> Vec<MealPlanEntry> {
        let mut entries = Vec::new();
        let mut used = HashSet::new();
        for day in &self.days {
            for (slot, recipe) in &day.meals {
                let meal_type = match slot.to_lowercase().as_str() {
                    "breakfast" => MealType::Breakfast,
                    "lunch" => MealType::Lunch,
                    "dinner" => MealType::Dinner,
                    "snack" | "snacks" => MealType::Snack,
                    _ => continue,
                };
                let base = format!("agent-{}-{}", day.day, slot.to_lowercase());
                let mut id = base.clone();
                let mut n = 1;
                while !used.insert(id.clone()) {
                    n += 1;
                    id = format!("{}-{}", base, n);
                }
                let servings = if recipe.num_servings > 0.0 {
                    recipe.num_servings
                } else {
                    1.0
                };
                entries.push(MealPlanEntry {
                    id,
                    recipe: recipe.clone(),
                    day: day.label.clone(),
                    meal_type,
                    servings,
                });
            }
        }
        entries
    }
}

pub fn day_label(day: u32) -> String {
    match day {
        1..=7 => WEEKDAYS[(day - 1) as usize].to_string(),
        n => format!("Day {}", n),
    }
}

fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn strings(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn ingredient(value: &Value) -> Option<Ingredient> {
    match value {
        Value::String(name) => Some(Ingredient {
            name: name.clone(),
            quantity: 0.0,
            unit: String::new(),
        }),
        Value::Object(obj) => Some(Ingredient {
            name: obj.get("name")?.as_str()?.to_string(),
            quantity: number(obj.get("quantity")).unwrap_or(0.0),
            unit: obj
                .get("unit")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        }),
        _ => None,
    }
}

fn macros(obj: &Map<String, Value>) -> Macros {
    // 巢狀 macros 優先，缺漏時退回平鋪欄位
    let nested = obj.get("macros").and_then(Value::as_object);
    let field = |key: &str| {
        nested
            .and_then(|m| number(m.get(key)))
            .or_else(|| number(obj.get(key)))
            .unwrap_or(0.0)
    };
    Macros {
        calories: field("calories"),
        protein_g: field("protein_g"),
        carbs_g: field("carbs_g"),
        fat_g: field("fat_g"),
        fiber_g: field("fiber_g"),
    }
}

fn recipe(obj: &Map<String, Value>) -> Option<Recipe> {
    let name = obj.get("name")?.as_str()?.to_string();
    let tags = obj
        .get("tags")
        .and_then(|t| serde_json::from_value::<RecipeTags>(t.clone()).ok())
        .unwrap_or_default();

    Some(Recipe {
        id: number(obj.get("id")).map(|n| n as i64).unwrap_or(0),
        name,
        num_servings: number(obj.get("num_servings"))
            .filter(|n| *n > 0.0)
            .unwrap_or(1.0),
        ingredients: match obj.get("ingredients") {
            Some(Value::Array(items)) => items.iter().filter_map(ingredient).collect(),
            _ => Vec::new(),
        },
        tags,
        cooking_method: strings(obj.get("cooking_method")),
        equipment_needed: strings(obj.get("equipment_needed")),
        flavor_profile: strings(obj.get("flavor_profile")),
        macros: macros(obj),
        time_minutes: number(obj.get("time_minutes"))
            .map(|n| n.max(0.0).round() as u32)
            .unwrap_or(0),
        url: obj.get("url").and_then(Value::as_str).map(str::to_string),
        thumbnail: obj
            .get("thumbnail")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

fn planned_day(index: usize, value: &Value) -> PlannedDay {
    let obj = value.as_object();
    let day = obj
        .and_then(|o| number(o.get("day")))
        .filter(|d| *d >= 1.0)
        .map(|d| d as u32)
        .unwrap_or(index as u32 + 1);

    let meals: BTreeMap<String, Recipe> = obj
        .map(|o| {
            o.iter()
                .filter_map(|(slot, v)| Some((slot.clone(), recipe(v.as_object()?)?)))
                .collect()
        })
        .unwrap_or_default();

    PlannedDay {
        day,
        label: day_label(day),
        meals,
    }
}

pub fn parse_weekly_plan(text: &str) -> Result<WeeklyPlan> {
    let days = normalize_plan(extract_json(text)?)?;
    let plan = WeeklyPlan {
        days: days
            .iter()
            .enumerate()
            .map(|(i, v)| planned_day(i, v))
            .collect(),
    };

    if plan.recipe_count() == 0 {
        return Err(parse_error("agent response contained no recipes"));
    }

    tracing::debug!(
        "Parsed meal plan: {} days, {} recipes",
        plan.days.len(),
        plan.recipe_count()
    );
    Ok(plan)
}
