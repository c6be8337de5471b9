use crate::domain::model::FridgeItem;
use crate::utils::error::{FoodError, Result};

fn same_item(a: &FridgeItem, name: &str, unit: &str) -> bool {
    a.name.trim().eq_ignore_ascii_case(name.trim()) && a.unit.trim().eq_ignore_ascii_case(unit.trim())
}

pub fn validate_items(items: &[FridgeItem]) -> Result<()> {
    for item in items {
        if item.name.trim().is_empty() {
            return Err(FoodError::BadRequest(
                "Fridge item name cannot be empty".to_string(),
            ));
        }
        if !item.quantity.is_finite() || item.quantity < 0.0 {
            return Err(FoodError::BadRequest(format!(
                "Invalid quantity {} for {}",
                item.quantity, item.name
            )));
        }
    }
    Ok(())
}

/// 同名同單位時累加數量，否則新增
pub fn add_item(items: &mut Vec<FridgeItem>, item: FridgeItem) -> Result<()> {
    validate_items(std::slice::from_ref(&item))?;
    match items
        .iter_mut()
        .find(|existing| same_item(existing, &item.name, &item.unit))
    {
        Some(existing) => {
            let merged = existing.quantity + item.quantity;
            if !merged.is_finite() {
                return Err(FoodError::BadRequest(format!(
                    "Quantity of {} would overflow",
                    existing.name
                )));
            }
            existing.quantity = merged;
        }
        None => items.push(FridgeItem {
            name: item.name.trim().to_string(),
            quantity: item.quantity,
            unit: item.unit.trim().to_string(),
        }),
    }
    Ok(())
}

/// 移除所有同名項目，回傳移除數量
pub fn remove_item(items: &mut Vec<FridgeItem>, name: &str) -> usize {
    let before = items.len();
    items.retain(|i| !i.name.trim().eq_ignore_ascii_case(name.trim()));
    before - items.len()
}

pub fn search<'a>(items: &'a [FridgeItem], query: &str) -> Vec<&'a FridgeItem> {
    let query = query.trim().to_lowercase();
    items
        .iter()
        .filter(|i| i.name.to_lowercase().contains(&query))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, quantity: f64, unit: &str) -> FridgeItem {
        FridgeItem {
            name: name.to_string(),
            quantity,
            unit: unit.to_string(),
        }
    }

    #[test]
    fn test_add_item_merges_same_name_and_unit() {
        let mut items = vec![item("Milk", 1.0, "l")];
        add_item(&mut items, item("milk", 0.5, "L")).unwrap();
        add_item(&mut items, item("milk", 200.0, "ml")).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].quantity, 1.5);
    }

    #[test]
    fn test_add_item_rejects_negative_quantity() {
        let mut items = Vec::new();
        assert!(add_item(&mut items, item("eggs", -1.0, "piece")).is_err());
        assert!(add_item(&mut items, item("  ", 1.0, "piece")).is_err());
        assert!(items.is_empty());
    }

    #[test]
    fn test_add_item_rejects_overflowing_sum() {
        let mut items = Vec::new();
        add_item(&mut items, item("flour", 1.7e308, "g")).unwrap();
        let err = add_item(&mut items, item("Flour", 1.7e308, "g")).unwrap_err();

        assert!(matches!(err, FoodError::BadRequest(_)));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 1.7e308);
    }

    #[test]
    fn test_remove_and_search() {
        let mut items = vec![
            item("Cheddar cheese", 200.0, "g"),
            item("cream cheese", 1.0, "tub"),
            item("Eggs", 6.0, "piece"),
        ];
        assert_eq!(search(&items, "CHEESE").len(), 2);
        assert_eq!(remove_item(&mut items, "eggs"), 1);
        assert_eq!(remove_item(&mut items, "eggs"), 0);
        assert_eq!(items.len(), 2);
    }
}
