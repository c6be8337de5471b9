use crate::domain::model::{Fridge, GroceryItem, Macros, MealPlanEntry};
use crate::utils::error::{FoodError, Result};
use serde::Serialize;
use std::collections::BTreeMap;

pub const DAYS_PER_PLAN: f64 = 7.0;

fn serving_factor(entry: &MealPlanEntry) -> f64 {
    if entry.recipe.num_servings > 0.0 {
        entry.servings / entry.recipe.num_servings
    } else {
        entry.servings
    }
}

pub fn total_macros(entries: &[MealPlanEntry]) -> Macros {
    entries.iter().fold(Macros::default(), |totals, entry| {
        totals.add(&entry.recipe.macros.scaled(serving_factor(entry)))
    })
}

pub fn daily_averages(totals: &Macros, days: f64) -> Macros {
    if days <= 0.0 {
        return Macros::default();
    }
    Macros {
        calories: (totals.calories / days).round(),
        protein_g: (totals.protein_g / days).round(),
        carbs_g: (totals.carbs_g / days).round(),
        fat_g: (totals.fat_g / days).round(),
        fiber_g: (totals.fiber_g / days).round(),
    }
}

fn percentage(actual: f64, target: f64) -> f64 {
    if target <= 0.0 {
        0.0
    } else {
        (actual / target * 100.0).round()
    }
}

pub fn target_percentages(averages: &Macros, targets: &Macros) -> Macros {
    Macros {
        calories: percentage(averages.calories, targets.calories),
        protein_g: percentage(averages.protein_g, targets.protein_g),
        carbs_g: percentage(averages.carbs_g, targets.carbs_g),
        fat_g: percentage(averages.fat_g, targets.fat_g),
        fiber_g: percentage(averages.fiber_g, targets.fiber_g),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub entries: usize,
    pub total: Macros,
    pub daily_average: Macros,
    pub target_percentage: Macros,
}

pub fn summarize(entries: &[MealPlanEntry], targets: &Macros) -> PlanSummary {
    let total = total_macros(entries);
    let daily_average = daily_averages(&total, DAYS_PER_PLAN);
    PlanSummary {
        entries: entries.len(),
        total,
        target_percentage: target_percentages(&daily_average, targets),
        daily_average,
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// 依 (小寫名稱, 單位) 合併食材；冰箱已有足夠數量者標記為不需購買
pub fn generate_grocery_list(entries: &[MealPlanEntry], fridge: Option<&Fridge>) -> Vec<GroceryItem> {
    let mut totals: BTreeMap<(String, String), f64> = BTreeMap::new();
    for entry in entries {
        let factor = serving_factor(entry);
        for ingredient in &entry.recipe.ingredients {
            let key = (
                ingredient.name.trim().to_lowercase(),
                ingredient.unit.trim().to_lowercase(),
            );
            *totals.entry(key).or_insert(0.0) += ingredient.quantity * factor;
        }
    }

    let stocked = |name: &str, unit: &str| -> f64 {
        fridge
            .map(|f| {
                f.items
                    .iter()
                    .filter(|i| {
                        i.name.trim().eq_ignore_ascii_case(name)
                            && i.unit.trim().eq_ignore_ascii_case(unit)
                    })
                    .map(|i| i.quantity)
                    .sum()
            })
            .unwrap_or(0.0)
    };

    totals
        .into_iter()
        .map(|((name, unit), quantity)| {
            let quantity = round_tenth(quantity);
            let needed = stocked(&name, &unit) < quantity;
            GroceryItem {
                name,
                quantity,
                unit,
                needed,
            }
        })
        .collect()
}

pub fn add_entry(plan: &mut Vec<MealPlanEntry>, entry: MealPlanEntry) -> Result<()> {
    if plan.iter().any(|e| e.id == entry.id) {
        return Err(FoodError::Conflict(format!(
            "Meal plan entry {} already exists",
            entry.id
        )));
    }
    if entry.servings <= 0.0 {
        return Err(FoodError::BadRequest("Servings must be positive".to_string()));
    }
    plan.push(entry);
    Ok(())
}

/// 逐一經過 `add_entry` 檢查後組成整份計畫
pub fn build_plan(entries: Vec<MealPlanEntry>) -> Result<Vec<MealPlanEntry>> {
    let mut plan = Vec::with_capacity(entries.len());
    for entry in entries {
        add_entry(&mut plan, entry)?;
    }
    Ok(plan)
}

/// 回傳是否有項目被移除
pub fn remove_entry(plan: &mut Vec<MealPlanEntry>, entry_id: &str) -> bool {
    let before = plan.len();
    plan.retain(|e| e.id != entry_id);
    plan.len() != before
}

pub fn update_servings(plan: &mut [MealPlanEntry], entry_id: &str, servings: f64) -> Result<()> {
    if servings <= 0.0 {
        return Err(FoodError::BadRequest("Servings must be positive".to_string()));
    }
    let entry = plan
        .iter_mut()
        .find(|e| e.id == entry_id)
        .ok_or_else(|| FoodError::NotFound(format!("Meal plan entry {} not found", entry_id)))?;
    entry.servings = servings;
    Ok(())
}
