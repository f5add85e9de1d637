//! Observability key constants for every path parameter of the emitted operations.

use crate::naming::{key_const_name, key_value};
use crate::oas::models::Operation;
use std::collections::BTreeMap;

/// Renders the body of `keys.rs` (without banner).
pub(crate) fn render_keys<'a>(operations: impl IntoIterator<Item = &'a Operation>) -> String {
    let mut keys: BTreeMap<String, (String, String)> = BTreeMap::new();
    for op in operations {
        for param in &op.path_params {
            keys.entry(key_const_name(&param.name))
                .or_insert_with(|| (param.name.clone(), key_value(&param.name)));
        }
    }

    let mut code = String::new();
    for (i, (constant, (name, value))) in keys.iter().enumerate() {
        if i > 0 {
            code.push('\n');
        }
        code.push_str(&format!("/// Observability key for `{}` values.\n", name));
        code.push_str(&format!("pub const {}: &str = {:?};\n", constant, value));
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oas::models::{HttpMethod, Param, ResponseType};
    use crate::type_mapping::PrimitiveType;

    fn op(params: &[&str]) -> Operation {
        Operation {
            operation_id: "Op".into(),
            method: HttpMethod::Get,
            path_template: "/".into(),
            path_params: params
                .iter()
                .map(|name| Param {
                    name: name.to_string(),
                    ty: PrimitiveType::String,
                    required: true,
                })
                .collect(),
            query_params: Vec::new(),
            request_body_type: None,
            response_type: ResponseType::default(),
            success_status: 200,
            returns_list: false,
            skip: false,
            summary: None,
        }
    }

    #[test]
    fn test_keys_are_deduplicated_and_sorted() {
        let ops = [op(&["mealPlanID", "mealPlanEventID"]), op(&["mealPlanID"])];
        assert_eq!(
            render_keys(ops.iter()),
            "/// Observability key for `mealPlanEventID` values.\n\
             pub const MEAL_PLAN_EVENT_ID_KEY: &str = \"meal_plan_event.id\";\n\
             \n\
             /// Observability key for `mealPlanID` values.\n\
             pub const MEAL_PLAN_ID_KEY: &str = \"meal_plan.id\";\n"
        );
    }
}
