#![deny(missing_docs)]

//! # Naming Utilities
//!
//! Helper functions for deriving Rust-safe identifiers and observability keys
//! from OpenAPI operation ids and parameter names.

use heck::{ToShoutySnakeCase, ToSnakeCase};

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "type",
    "unsafe", "use", "where", "while", "yield", "abstract", "become", "box", "do", "final",
    "macro", "override", "priv", "try", "typeof", "unsized", "virtual",
];

/// Converts a mixed-case string (CamelCase or camelCase) to snake_case.
///
/// Acronyms stay together: `mealPlanID` becomes `meal_plan_id`.
pub fn to_snake_case(s: &str) -> String {
    s.to_snake_case()
}

/// Converts an identifier to a snake_case Rust identifier, escaping keywords as raw identifiers.
pub fn rust_ident(s: &str) -> String {
    let snake = to_snake_case(s);
    if RUST_KEYWORDS.contains(&snake.as_str()) {
        format!("r#{}", snake)
    } else {
        snake
    }
}

/// Keeps only characters valid in a Rust type name.
pub fn type_ident(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// Upper-cases the first character.
pub fn uppercase_first_letter(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Canonical observability name for a parameter.
///
/// `mealPlanID` -> `MealPlanID`, `oauth2ClientID` -> `OAuth2ClientID`, `q` -> `SearchQuery`.
pub fn observability_key(name: &str) -> String {
    if name == "q" {
        return "SearchQuery".to_string();
    }
    uppercase_first_letter(name).replace("Oauth", "OAuth")
}

/// Name of the generated constant holding a parameter's observability key.
///
/// `mealPlanID` -> `MEAL_PLAN_ID_KEY`.
pub fn key_const_name(name: &str) -> String {
    format!("{}Key", casing_source(name)).to_shouty_snake_case()
}

/// The observability key with `OAuth` folded to one word, so case conversion
/// does not split it into `O` and `Auth`.
fn casing_source(name: &str) -> String {
    observability_key(name).replace("OAuth", "Oauth")
}

/// Value of the generated observability key constant.
///
/// A trailing `_id` becomes `.id`: `mealPlanID` -> `meal_plan.id`.
pub fn key_value(name: &str) -> String {
    let snake = to_snake_case(&casing_source(name));
    match snake.strip_suffix("_id") {
        Some(prefix) if !prefix.is_empty() => format!("{}.id", prefix),
        _ => snake,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case_conversion() {
        assert_eq!(to_snake_case("userId"), "user_id");
        assert_eq!(to_snake_case("id"), "id");
        assert_eq!(to_snake_case("GetMealPlan"), "get_meal_plan");
        assert_eq!(to_snake_case("mealPlanID"), "meal_plan_id");
        assert_eq!(to_snake_case("GetRecipeDAG"), "get_recipe_dag");
    }

    #[test]
    fn test_rust_ident_escapes_keywords() {
        assert_eq!(rust_ident("type"), "r#type");
        assert_eq!(rust_ident("householdID"), "household_id");
    }

    #[test]
    fn test_observability_key_rules() {
        assert_eq!(observability_key("mealPlanID"), "MealPlanID");
        assert_eq!(observability_key("oauth2ClientID"), "OAuth2ClientID");
        assert_eq!(observability_key("q"), "SearchQuery");
    }

    #[test]
    fn test_key_constants() {
        assert_eq!(key_const_name("mealPlanID"), "MEAL_PLAN_ID_KEY");
        assert_eq!(key_const_name("q"), "SEARCH_QUERY_KEY");
        assert_eq!(key_value("mealPlanID"), "meal_plan.id");
        assert_eq!(key_value("q"), "search_query");
        assert_eq!(key_const_name("oauth2ClientID"), "OAUTH2_CLIENT_ID_KEY");
        assert_eq!(key_const_name("OAuth2ClientID"), "OAUTH2_CLIENT_ID_KEY");
        assert_eq!(key_value("oauth2ClientID"), "oauth2_client.id");
    }

    #[test]
    fn test_type_ident() {
        assert_eq!(type_ident("Meal-Plan"), "MealPlan");
    }
}
