#![deny(missing_docs)]

//! # Operation Builder
//!
//! Logic that transforms `Shim` structs into `Operation` IR models.

use crate::config::GeneratorConfig;
use crate::error::{AppError, AppResult};
use crate::oas::arena::{component_name_from_ref, SchemaArena};
use crate::oas::models::{contains_pagination_markers, HttpMethod, Operation, Param};
use crate::oas::responses::{
    extract_response_type, resolve_response, select_json_media, select_success_response,
};
use crate::oas::shims::{ShimComponents, ShimOpenApi, ShimOperation, ShimParameter, ShimPathItem};
use crate::type_mapping::PrimitiveType;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;

/// Builds every operation of the document, in path then method order.
///
/// Skipped operations are kept in the model with `skip = true`.
pub fn build_operations(
    doc: &ShimOpenApi,
    arena: &SchemaArena,
    config: &GeneratorConfig,
) -> AppResult<Vec<Operation>> {
    let mut operation_ids = HashSet::new();
    let mut operations = Vec::new();

    for (path, item) in &doc.paths.items {
        for method in HttpMethod::ALL {
            let Some(op) = operation_for(item, method) else {
                continue;
            };
            let operation_id =
                op.operation_id
                    .clone()
                    .ok_or_else(|| AppError::MissingOperationId {
                        method: method.to_string(),
                        path: path.clone(),
                    })?;
            if !operation_ids.insert(operation_id.clone()) {
                return Err(AppError::DuplicateIdentifier(format!(
                    "operationId '{}'",
                    operation_id
                )));
            }
            operations.push(build_operation(
                path,
                method,
                operation_id,
                op,
                item,
                &doc.components,
                arena,
                config,
            )?);
        }
    }

    Ok(operations)
}

fn operation_for(item: &ShimPathItem, method: HttpMethod) -> Option<&ShimOperation> {
    match method {
        HttpMethod::Get => item.get.as_ref(),
        HttpMethod::Post => item.post.as_ref(),
        HttpMethod::Put => item.put.as_ref(),
        HttpMethod::Patch => item.patch.as_ref(),
        HttpMethod::Delete => item.delete.as_ref(),
    }
}

#[allow(clippy::too_many_arguments)]
fn build_operation(
    path: &str,
    method: HttpMethod,
    operation_id: String,
    op: &ShimOperation,
    item: &ShimPathItem,
    components: &ShimComponents,
    arena: &SchemaArena,
    config: &GeneratorConfig,
) -> AppResult<Operation> {
    let parameters = merge_parameters(&item.parameters, &op.parameters, components)?;
    for param in &parameters {
        if let Some(schema) = &param.schema {
            arena.validate_refs(schema)?;
        }
    }

    let path_params = collect_path_params(&operation_id, path, &parameters)?;
    let query_params: Vec<Param> = parameters
        .iter()
        .filter(|p| p.location.as_deref() == Some("query"))
        .filter_map(|p| {
            p.name.as_ref().map(|name| Param {
                name: name.clone(),
                ty: param_type(p.schema.as_ref()),
                required: p.required,
            })
        })
        .collect();
    let returns_list = contains_pagination_markers(query_params.iter().map(|p| p.name.as_str()));

    let sends_body = method.traits().uses_body
        && !(method == HttpMethod::Post && config.is_bodyless_post(path));
    let request_body_type = if sends_body {
        extract_request_body_type(op, components, arena)?
    } else {
        None
    };

    let (success_status, mut response_type) = match select_success_response(&op.responses) {
        Some((code, response)) => {
            let resolved = resolve_response(response, components)?;
            (code, extract_response_type(&resolved, arena)?)
        }
        None => (method.traits().default_status, Default::default()),
    };
    response_type.is_raw = config.raw_response_operations.contains(&operation_id)
        || op.extension_flag(&config.raw_response_extension);
    response_type.is_paginated = response_type.is_collection && returns_list;

    Ok(Operation {
        skip: config.is_skipped(&operation_id),
        operation_id,
        method,
        path_template: path.to_string(),
        path_params,
        query_params,
        request_body_type,
        response_type,
        success_status,
        returns_list,
        summary: op.summary.clone(),
    })
}

/// Merges path-level and operation-level parameters; the operation wins on `(name, in)`.
fn merge_parameters(
    path_level: &[ShimParameter],
    op_level: &[ShimParameter],
    components: &ShimComponents,
) -> AppResult<Vec<ShimParameter>> {
    let mut merged: Vec<ShimParameter> = Vec::new();
    for raw in path_level.iter().chain(op_level) {
        let param = resolve_parameter(raw, components)?;
        merged.retain(|existing| {
            existing.name != param.name || existing.location != param.location
        });
        merged.push(param);
    }
    Ok(merged)
}

fn resolve_parameter(param: &ShimParameter, components: &ShimComponents) -> AppResult<ShimParameter> {
    match &param.reference {
        None => Ok(param.clone()),
        Some(reference) => component_name_from_ref(reference, "parameters")
            .and_then(|name| components.parameters.get(&name))
            .cloned()
            .ok_or_else(|| AppError::UnresolvedReference(reference.clone())),
    }
}

fn collect_path_params(
    operation_id: &str,
    path: &str,
    parameters: &[ShimParameter],
) -> AppResult<Vec<Param>> {
    let placeholder = Regex::new(r"\{([^{}]+)\}")
        .map_err(|e| AppError::General(format!("Invalid placeholder pattern: {}", e)))?;

    placeholder
        .captures_iter(path)
        .map(|caps| {
            let name = &caps[1];
            let declared = parameters.iter().find(|p| {
                p.location.as_deref() == Some("path") && p.name.as_deref() == Some(name)
            });
            match declared {
                Some(p) => Ok(Param {
                    name: name.to_string(),
                    ty: param_type(p.schema.as_ref()),
                    required: true,
                }),
                None => Err(AppError::UndeclaredPathParameter {
                    operation: operation_id.to_string(),
                    name: name.to_string(),
                }),
            }
        })
        .collect()
}

fn param_type(schema: Option<&Value>) -> PrimitiveType {
    schema
        .and_then(PrimitiveType::from_schema)
        .unwrap_or(PrimitiveType::String)
}

fn extract_request_body_type(
    op: &ShimOperation,
    components: &ShimComponents,
    arena: &SchemaArena,
) -> AppResult<Option<String>> {
    let Some(body) = &op.request_body else {
        return Ok(None);
    };
    let body = match &body.reference {
        None => body.clone(),
        Some(reference) => component_name_from_ref(reference, "requestBodies")
            .and_then(|name| components.request_bodies.get(&name))
            .cloned()
            .ok_or_else(|| AppError::UnresolvedReference(reference.clone()))?,
    };

    let Some(schema) = select_json_media(&body.content).and_then(|m| m.schema.as_ref()) else {
        return Ok(None);
    };
    match schema.get("$ref").and_then(Value::as_str) {
        Some(reference) => Ok(Some(arena.resolve_ref(reference)?)),
        None => {
            arena.validate_refs(schema)?;
            Ok(None)
        }
    }
}
