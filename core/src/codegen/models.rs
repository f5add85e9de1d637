//! # Model Emission
//!
//! Renders a serde struct for every object schema in the arena, together with its
//! `Validate` implementation and a test-only `fixture()` constructor.

use crate::codegen::types::{classify_property, TypeResolver};
use crate::config::GeneratorConfig;
use crate::error::{AppError, AppResult};
use crate::naming::{rust_ident, type_ident};
use crate::oas::arena::SchemaArena;
use crate::type_mapping::{schema_type, SchemaType};
use serde_json::Value;
use std::collections::HashSet;

struct Field {
    ident: String,
    json_name: String,
    ty: String,
    doc: String,
    optional: bool,
    required_string: bool,
    fixture: Option<String>,
}

fn first_line(text: Option<&str>) -> Option<String> {
    text.and_then(|t| t.lines().next())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn build_fields(
    name: &str,
    schema: &Value,
    resolver: &TypeResolver,
) -> AppResult<Vec<Field>> {
    let struct_name = type_ident(name);
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(Vec::new());
    };

    let mut seen = HashSet::new();
    let mut fields = Vec::new();
    for (json_name, prop) in properties {
        let ident = rust_ident(json_name);
        if !seen.insert(ident.clone()) {
            return Err(AppError::DuplicateIdentifier(format!(
                "{}.{}",
                struct_name, ident
            )));
        }

        let shape = classify_property(prop);
        let (_, nullable) = schema_type(prop);
        let is_required = required.contains(&json_name.as_str());
        let optional = !is_required || nullable;
        let mut ty = resolver.rust_type(&shape);
        if ty == struct_name {
            ty = format!("Box<{}>", ty);
        }
        let required_string = !optional && ty == "String";
        let fixture = if optional {
            None
        } else if required_string {
            Some("\"example\".to_string()".to_string())
        } else {
            match &shape {
                SchemaType::Named(target) if resolver.is_model(target) && type_ident(target) != struct_name => {
                    Some(format!("{}::fixture()", type_ident(target)))
                }
                _ => None,
            }
        };

        fields.push(Field {
            doc: first_line(prop.get("description").and_then(Value::as_str))
                .unwrap_or_else(|| format!("`{}` property.", json_name)),
            ident,
            json_name: json_name.clone(),
            ty: if optional { format!("Option<{}>", ty) } else { ty },
            optional,
            required_string,
            fixture,
        });
    }
    Ok(fields)
}

fn render_model(name: &str, schema: &Value, resolver: &TypeResolver) -> AppResult<String> {
    let struct_name = type_ident(name);
    let fields = build_fields(name, schema, resolver)?;
    let mut code = String::new();

    let doc = first_line(schema.get("description").and_then(Value::as_str))
        .unwrap_or_else(|| format!("`{}` schema.", name));
    code.push_str(&format!("/// {}\n", doc));
    code.push_str("#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]\n");
    code.push_str("#[serde(default)]\n");
    code.push_str(&format!("pub struct {} {{\n", struct_name));
    for field in &fields {
        code.push_str(&format!("    /// {}\n", field.doc));
        let unraw = field.ident.trim_start_matches("r#");
        let mut attrs = Vec::new();
        if unraw != field.json_name {
            attrs.push(format!("rename = {:?}", field.json_name));
        }
        if field.optional {
            attrs.push("skip_serializing_if = \"Option::is_none\"".to_string());
        }
        if !attrs.is_empty() {
            code.push_str(&format!("    #[serde({})]\n", attrs.join(", ")));
        }
        code.push_str(&format!("    pub {}: {},\n", field.ident, field.ty));
    }
    code.push_str("}\n\n");

    // Validation
    code.push_str(&format!("impl Validate for {} {{\n", struct_name));
    code.push_str("    fn validate(&self) -> Result<(), String> {\n");
    for field in fields.iter().filter(|f| f.required_string) {
        code.push_str(&format!(
            "        if self.{}.is_empty() {{\n            return Err({:?}.to_string());\n        }}\n",
            field.ident,
            format!("{} is required", field.json_name)
        ));
    }
    code.push_str("        Ok(())\n    }\n}\n\n");

    // Fixture
    code.push_str(&format!("#[cfg(test)]\nimpl {} {{\n", struct_name));
    code.push_str("    pub(crate) fn fixture() -> Self {\n        Self {\n");
    for field in &fields {
        if let Some(fixture) = &field.fixture {
            code.push_str(&format!("            {}: {},\n", field.ident, fixture));
        }
    }
    code.push_str("            ..Default::default()\n        }\n    }\n}\n");

    Ok(code)
}

/// Renders the body of `models.rs` (without banner).
pub(crate) fn render_models(arena: &SchemaArena, config: &GeneratorConfig) -> AppResult<String> {
    let resolver = TypeResolver::new(arena, config);
    let mut seen = HashSet::new();
    let mut bodies = Vec::new();
    for (name, schema) in arena.iter() {
        if !resolver.is_model(name) {
            continue;
        }
        if !seen.insert(type_ident(name)) {
            return Err(AppError::DuplicateIdentifier(format!("model {}", name)));
        }
        bodies.push(render_model(name, schema, &resolver)?);
    }

    let mut code = String::new();
    if !bodies.is_empty() {
        code.push_str("use serde::{Deserialize, Serialize};\n\n");
        code.push_str(&format!("use {}::Validate;\n\n", config.runtime_crate));
    }
    code.push_str(&bodies.join("\n"));
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use serde_json::json;

    fn arena() -> SchemaArena {
        let mut schemas = IndexMap::new();
        schemas.insert(
            "Thing".to_string(),
            json!({
                "type": "object",
                "description": "A thing.",
                "required": ["id", "owner"],
                "properties": {
                    "id": {"type": "string"},
                    "displayName": {"type": ["string", "null"]},
                    "count": {"type": "integer", "format": "int32"},
                    "owner": {"$ref": "#/components/schemas/Owner"},
                    "parent": {"$ref": "#/components/schemas/Thing"},
                    "type": {"type": "string"}
                }
            }),
        );
        schemas.insert(
            "Owner".to_string(),
            json!({"type": "object", "properties": {"name": {"type": "string"}}}),
        );
        schemas.insert("Pagination".to_string(), json!({"type": "object"}));
        SchemaArena::new(schemas)
    }

    #[test]
    fn test_renders_struct_with_renames_and_options() {
        let code = render_models(&arena(), &GeneratorConfig::default()).unwrap();
        assert!(code.contains("/// A thing.\n"));
        assert!(code.contains("pub struct Thing {"));
        assert!(code.contains("    pub id: String,\n"));
        assert!(code.contains(
            "    #[serde(rename = \"displayName\", skip_serializing_if = \"Option::is_none\")]\n    pub display_name: Option<String>,\n"
        ));
        assert!(code.contains("    pub count: Option<i32>,\n"));
        assert!(code.contains("    pub owner: Owner,\n"));
        assert!(code.contains("    pub parent: Option<Box<Thing>>,\n"));
        assert!(code.contains("    pub r#type: Option<String>,\n"));
        assert!(!code.contains("pub struct Pagination"));
    }

    #[test]
    fn test_validate_and_fixture() {
        let code = render_models(&arena(), &GeneratorConfig::default()).unwrap();
        assert!(code.contains("if self.id.is_empty() {\n            return Err(\"id is required\".to_string());"));
        assert!(code.contains("            id: \"example\".to_string(),\n"));
        assert!(code.contains("            owner: Owner::fixture(),\n"));
    }
}
