//! Recipe recommendations.
//!
//! A recipe survives when none of its ingredients is ruled out by the user's
//! dietary restrictions, allergies or disliked ingredients, none of its cuisine
//! tags is disliked, and (when the user has liked cuisines at all) at least one
//! cuisine tag is liked. Survivors are ranked by how many of the user's likes
//! they hit.

use crate::domain::model::{Recipe, User};
use serde::Serialize;

const MEAT: &[&str] = &[
    "beef", "chicken", "pork", "bacon", "ham", "lamb", "turkey", "duck", "veal", "sausage",
    "chorizo", "pepperoni", "salami", "prosciutto", "mince", "steak", "venison", "goat",
];
const FISH: &[&str] = &[
    "fish", "salmon", "tuna", "cod", "anchovy", "anchovies", "sardine", "tilapia", "trout",
    "halibut", "mackerel", "haddock", "fish sauce",
];
const SHELLFISH: &[&str] = &[
    "shrimp", "prawn", "crab", "lobster", "clam", "mussel", "oyster", "scallop", "squid",
    "octopus",
];
const DAIRY: &[&str] = &[
    "milk", "cheese", "butter", "cream", "yogurt", "yoghurt", "ricotta", "mozzarella",
    "parmesan", "cheddar", "feta", "pecorino", "paneer", "ghee", "whey", "mascarpone",
];
const NOT_DAIRY: &[&str] = &[
    "peanut butter",
    "almond butter",
    "cocoa butter",
    "almond milk",
    "oat milk",
    "soy milk",
    "coconut milk",
    "coconut cream",
    "vegan cheese",
];
const EGG: &[&str] = &["egg", "mayonnaise", "meringue"];
const TREE_NUTS: &[&str] = &[
    "almond", "walnut", "cashew", "pecan", "pistachio", "hazelnut", "macadamia", "brazil nut",
    "pine nut",
];
const PEANUT: &[&str] = &["peanut"];
const SOY: &[&str] = &["soy", "soya", "tofu", "tempeh", "edamame", "miso", "soy sauce"];
const GLUTEN: &[&str] = &[
    "wheat", "barley", "rye", "bread", "breadcrumb", "graham", "pasta", "spaghetti", "farfalle",
    "tagliatelle", "penne", "noodle", "couscous", "seitan", "flour tortilla", "plain flour",
    "all purpose flour", "self raising flour", "wheat flour",
];
const SESAME: &[&str] = &["sesame", "tahini"];

/// 名稱含有關鍵字但不屬於該類別的字
const FALSE_FRIENDS: &[(&str, &[&str])] = &[
    ("ham", &["graham", "champagne", "champignon", "chamomile", "shamrock"]),
    ("egg", &["eggplant"]),
    ("butter", &["butternut", "butter bean", "buttercup", "butterfly"]),
    ("cream", &["cream of tartar", "creamy"]),
    ("oyster", &["oyster mushroom"]),
    ("lamb", &["lamb s lettuce", "lambs lettuce"]),
    ("goat", &["goat cheese", "goats cheese", "goat milk"]),
    ("beef", &["beefsteak tomato"]),
    ("steak", &["beefsteak tomato", "cauliflower steak"]),
    ("fish", &["shellfish"]),
    ("honey", &["honeydew"]),
    ("noodle", &["rice noodle", "glass noodle"]),
];

/// 一組排除關鍵字，`except` 中的片語優先視為安全
struct Rule {
    keywords: Vec<&'static str>,
    except: &'static [&'static str],
}

impl Rule {
    fn of(groups: &[&[&'static str]]) -> Self {
        Self {
            keywords: groups.iter().flat_map(|g| g.iter().copied()).collect(),
            except: &[],
        }
    }

    fn with_except(mut self, except: &'static [&'static str]) -> Self {
        self.except = except;
        self
    }

    fn matches(&self, ingredient: &str) -> Option<&'static str> {
        let text = self
            .except
            .iter()
            .fold(searchable(ingredient), |text, phrase| mask(&text, phrase));
        self.keywords
            .iter()
            .copied()
            .find(|keyword| contains_keyword(&text, keyword))
    }
}

/// 小寫並把 `-`、`_` 視為空白
pub fn normalize(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// 小寫、非英數字元視為空白
fn searchable(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// 把字首對齊的 `phrase` (含連寫形式) 從 `text` 中遮掉
fn mask(text: &str, phrase: &str) -> String {
    let joined = phrase.replace(' ', "");
    [phrase, joined.as_str()]
        .into_iter()
        .fold(text.to_string(), |text, needle| {
            let mut masked = String::with_capacity(text.len());
            let mut rest = 0;
            for (start, _) in text.match_indices(needle) {
                if start > 0 && !text[..start].ends_with(' ') {
                    continue;
                }
                masked.push_str(&text[rest..start]);
                masked.push(' ');
                rest = start + needle.len();
            }
            masked.push_str(&text[rest..]);
            masked
        })
}

/// 子字串比對，連寫的複合字 (buttermilk、peanutbutter) 也算命中
fn contains_keyword(text: &str, keyword: &str) -> bool {
    let text = FALSE_FRIENDS
        .iter()
        .filter(|(k, _)| *k == keyword)
        .flat_map(|(_, friends)| friends.iter())
        .fold(searchable(text), |text, friend| mask(&text, friend));
    if text.contains(keyword) {
        return true;
    }
    keyword.contains(' ') && text.replace(' ', "").contains(&keyword.replace(' ', ""))
}

/// 未列入規則表的過敏原，以其文字 (及單數形) 比對
fn mentions_allergen(ingredient: &str, allergy: &str) -> bool {
    let term = searchable(allergy);
    if term.is_empty() {
        return false;
    }
    let stem = term
        .strip_suffix("es")
        .or_else(|| term.strip_suffix('s'))
        .filter(|stem| stem.len() >= 3);
    contains_keyword(ingredient, &term) || stem.is_some_and(|stem| contains_keyword(ingredient, stem))
}

fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn word_matches(word: &str, keyword: &str) -> bool {
    if word == keyword {
        return true;
    }
    for suffix in ["s", "es"] {
        if word.strip_suffix(suffix) == Some(keyword) || keyword.strip_suffix(suffix) == Some(word)
        {
            return true;
        }
    }
    false
}

/// `phrase` 的每個字依序出現在 `text` 中 (允許單複數差異)
pub fn mentions(text: &str, phrase: &str) -> bool {
    let haystack = words(text);
    let needle = words(phrase);
    if needle.is_empty() || needle.len() > haystack.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|window| {
        window
            .iter()
            .zip(needle.iter())
            .all(|(w, k)| word_matches(w, k))
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub recipe: Recipe,
    pub score: u32,
    pub reasons: Vec<String>,
}

/// 排除原因；`None` 表示可推薦
pub fn exclusion_reason(user: &User, recipe: &Recipe) -> Option<String> {
    for restriction in &user.dietary_restrictions {
        if let Some(rule) = restriction_rule(restriction) {
            for ingredient in &recipe.ingredients {
                if let Some(keyword) = rule.matches(&ingredient.name) {
                    return Some(format!(
                        "'{}' conflicts with {} ({})",
                        ingredient.name, restriction, keyword
                    ));
                }
            }
        }
    }

    for allergy in &user.allergies {
        let rule = allergen_rule(allergy);
        for ingredient in &recipe.ingredients {
            if rule.matches(&ingredient.name).is_some()
                || mentions_allergen(&ingredient.name, allergy)
            {
                return Some(format!("'{}' contains allergen {}", ingredient.name, allergy));
            }
        }
    }

    for disliked in &user.disliked_ingredients {
        if let Some(ingredient) = recipe
            .ingredients
            .iter()
            .find(|i| mentions(&i.name, disliked))
        {
            return Some(format!("'{}' is disliked", ingredient.name));
        }
    }

    let disliked_cuisines: Vec<String> = user.disliked_cuisines.iter().map(|c| normalize(c)).collect();
    if let Some(cuisine) = recipe
        .tags
        .cuisine_region
        .iter()
        .find(|c| disliked_cuisines.contains(&normalize(c)))
    {
        return Some(format!("{} cuisine is disliked", cuisine));
    }

    None
}

fn score(user: &User, recipe: &Recipe) -> (u32, Vec<String>) {
    let mut score = 0;
    let mut reasons = Vec::new();

    let liked_cuisines: Vec<String> = user.liked_cuisines.iter().map(|c| normalize(c)).collect();
    if let Some(cuisine) = recipe
        .tags
        .cuisine_region
        .iter()
        .find(|c| liked_cuisines.contains(&normalize(c)))
    {
        score += 3;
        reasons.push(format!("liked cuisine: {}", cuisine));
    }

    for liked in &user.liked_ingredients {
        if recipe.ingredients.iter().any(|i| mentions(&i.name, liked)) {
            score += 2;
            reasons.push(format!("liked ingredient: {}", liked));
        }
    }

    let flavors: Vec<String> = recipe.flavor_profile.iter().map(|f| normalize(f)).collect();
    for flavor in &user.liked_flavor_profile {
        if flavors.contains(&normalize(flavor)) {
            score += 1;
            reasons.push(format!("liked flavor: {}", flavor));
        }
    }

    (score, reasons)
}

fn has_liked_cuisine(user: &User, recipe: &Recipe) -> bool {
    if user.liked_cuisines.is_empty() {
        return true;
    }
    let liked: Vec<String> = user.liked_cuisines.iter().map(|c| normalize(c)).collect();
    recipe
        .tags
        .cuisine_region
        .iter()
        .any(|c| liked.contains(&normalize(c)))
}

pub fn recommend(user: &User, recipes: &[Recipe]) -> Vec<Recommendation> {
    let mut results: Vec<Recommendation> = recipes
        .iter()
        .filter(|recipe| {
            if let Some(reason) = exclusion_reason(user, recipe) {
                tracing::debug!("Recipe {} excluded: {}", recipe.id, reason);
                return false;
            }
            has_liked_cuisine(user, recipe)
        })
        .map(|recipe| {
            let (score, reasons) = score(user, recipe);
            Recommendation {
                recipe: recipe.clone(),
                score,
                reasons,
            }
        })
        .collect();

    results.sort_by(|a, b| b.score.cmp(&a.score).then(a.recipe.id.cmp(&b.recipe.id)));
    results
}
