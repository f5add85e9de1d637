//! Path template rewriting: `{name}` placeholders become positional `format!` slots.

use crate::error::{AppError, AppResult};
use regex::Regex;

/// A path template split into a format string and its placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    /// Format string with one `{}` slot per placeholder.
    pub format: String,
    /// Placeholder names in order of appearance.
    pub placeholders: Vec<String>,
}

impl PathTemplate {
    /// Rewrites `/things/{thingID}/parts/{partID}` into `/things/{}/parts/{}`.
    pub fn parse(path: &str) -> AppResult<Self> {
        let placeholder = Regex::new(r"\{([a-zA-Z\d_]+)\}")
            .map_err(|e| AppError::General(format!("Invalid placeholder pattern: {}", e)))?;

        let placeholders = placeholder
            .captures_iter(path)
            .map(|caps| caps[1].to_string())
            .collect();
        let format = placeholder.replace_all(path, "{}").into_owned();

        Ok(Self {
            format,
            placeholders,
        })
    }

    /// Renders the Rust expression building the path, given one argument per placeholder.
    pub fn render(&self, args: &[String]) -> String {
        if self.placeholders.is_empty() {
            format!("{:?}", self.format)
        } else {
            format!("&format!({:?}, {})", self.format, args.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrites_placeholders_in_order() {
        let tpl = PathTemplate::parse("/api/v1/meal_plans/{mealPlanID}/events/{mealPlanEventID}")
            .unwrap();
        assert_eq!(tpl.format, "/api/v1/meal_plans/{}/events/{}");
        assert_eq!(tpl.placeholders, vec!["mealPlanID", "mealPlanEventID"]);
        assert_eq!(
            tpl.render(&["meal_plan_id".into(), "meal_plan_event_id".into()]),
            "&format!(\"/api/v1/meal_plans/{}/events/{}\", meal_plan_id, meal_plan_event_id)"
        );
    }

    #[test]
    fn test_static_paths_render_as_literals() {
        let tpl = PathTemplate::parse("/api/v1/things").unwrap();
        assert!(tpl.placeholders.is_empty());
        assert_eq!(tpl.render(&[]), "\"/api/v1/things\"");
    }
}
