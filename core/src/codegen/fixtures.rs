//! # Test Fixture Templates
//!
//! Renders the test file accompanying each generated method. Scenarios:
//! - `standard`: the mock server validates the request and returns the expected envelope.
//! - `with_empty_<param>`: one per identifier, asserts `InvalidIdProvided` on an offline client.
//! - `with_nil_input`: body operations only, asserts `NilInputProvided`.
//! - `with_error_building_request`: a client whose base URL cannot carry paths.
//! - `with_error_executing_request`: a transport that answers with a non-JSON body
//!   (or refuses the connection for raw-response operations).
//! - `with_error_in_response`: envelope operations only, asserts `ProtocolError`.

use crate::codegen::method::MethodPlan;
use crate::codegen::types::{data_element, TypeResolver};
use crate::config::GeneratorConfig;
use crate::error::AppResult;
use crate::naming::to_snake_case;
use crate::oas::models::PAGINATION_MARKERS;
use url::form_urlencoded;

/// Which argument slot is blanked for an invalid-identifier scenario.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Blank {
    None,
    Path(usize),
    Query(usize),
}

fn call_args(plan: &MethodPlan, blank: Blank, nil_input: bool) -> String {
    let mut args = vec!["&ctx".to_string()];
    for (i, arg) in plan.path_args.iter().enumerate() {
        if blank == Blank::Path(i) {
            args.push("\"\"".to_string());
        } else {
            args.push(format!("&{}", arg.ident));
        }
    }
    for (i, arg) in plan.query_args.iter().enumerate() {
        if blank == Blank::Query(i) {
            args.push("\"\"".to_string());
        } else if arg.param.required {
            args.push(arg.param.ty.example_literal().to_string());
        } else {
            args.push("None".to_string());
        }
    }
    if plan.body_type.is_some() {
        if nil_input {
            args.push("None".to_string());
        } else {
            args.push("Some(&example_input)".to_string());
        }
    }
    if plan.returns_list {
        args.push("None".to_string());
    }
    args.join(", ")
}

/// The exact query string the method must send with default arguments.
fn expected_query(plan: &MethodPlan, config: &GeneratorConfig) -> String {
    let mut pairs: Vec<(String, String)> = Vec::new();
    if plan.returns_list {
        pairs.push(("limit".into(), config.default_query_limit.to_string()));
        pairs.push(("page".into(), "1".into()));
        pairs.push(("sortBy".into(), "asc".into()));
    }
    for arg in &plan.query_args {
        if arg.param.required && !PAGINATION_MARKERS.contains(&arg.param.name.as_str()) {
            pairs.push((
                arg.param.name.clone(),
                arg.param.ty.example_query_value().to_string(),
            ));
        }
    }
    pairs.sort();
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

fn expected_path(plan: &MethodPlan) -> String {
    if plan.path_args.is_empty() {
        format!("{:?}.to_string()", plan.path.format)
    } else {
        let args: Vec<&str> = plan.path_args.iter().map(|a| a.ident.as_str()).collect();
        format!("format!({:?}, {})", plan.path.format, args.join(", "))
    }
}

fn preamble(plan: &MethodPlan, with_input: bool, blank: Blank) -> String {
    let mut code = String::from("    let ctx = Context::background();\n");
    for (i, arg) in plan.path_args.iter().enumerate() {
        if blank == Blank::Path(i) {
            continue;
        }
        code.push_str(&format!("    let {} = test_support::fake_id();\n", arg.ident));
    }
    if with_input {
        if let Some(body) = &plan.body_type {
            code.push_str(&format!("    let example_input = {}::fixture();\n", body));
        }
    }
    code
}

fn request_spec(plan: &MethodPlan, config: &GeneratorConfig, status: &str) -> String {
    format!(
        "    let spec = RequestSpec::new(\n        {:?},\n        {},\n        {:?},\n        {},\n        {},\n    );\n",
        plan.op.method.as_str(),
        expected_path(plan),
        expected_query(plan, config),
        status,
        plan.body_type.is_some()
    )
}

/// Renders the body of a test file (without banner).
pub(crate) fn render_tests(
    plan: &MethodPlan,
    resolver: &TypeResolver,
    config: &GeneratorConfig,
) -> AppResult<String> {
    let rt = |item: &str| format!("{}::{}", plan.runtime, item);
    let mut imports = crate::codegen::imports::ImportManifest::new();
    imports.insert(rt("test_support::{self, RequestSpec}"));
    imports.insert(rt("ApiResponse"));
    imports.insert(rt("ClientError"));
    imports.insert(rt("Context"));
    if !plan.is_raw {
        imports.insert(rt("ApiError"));
    }
    if plan.returns_list && plan.returns_data {
        imports.insert(rt("Pagination"));
        imports.insert(rt("QueryFilteredResult"));
    }
    for model in &plan.models {
        imports.insert(rt(&format!("models::{}", model)));
    }

    let fn_name = &plan.fn_name;
    let status = plan.op.success_status.to_string();
    let mut code = imports.render();

    // Happy path
    code.push_str("\n#[actix_web::test]\nasync fn standard() {\n");
    code.push_str(&preamble(plan, true, Blank::None));
    let assertion = if plan.is_raw {
        code.push_str("    let expected = ApiResponse::<serde_json::Value>::empty();\n");
        format!(
            "    let response = actual.expect(\"request should succeed\");\n    assert_eq!(response.status().as_u16(), {});\n",
            status
        )
    } else if let (true, Some(element)) = (plan.returns_data, data_element(&plan.op.response_type)) {
        if plan.returns_list {
            code.push_str(&format!(
                "    let data = vec![{}];\n",
                resolver.fixture_expr(&element)?
            ));
            code.push_str(
                "    let pagination = Pagination {\n        page: 1,\n        limit: 50,\n        filtered_count: 1,\n        total_count: 1,\n    };\n",
            );
            code.push_str(
                "    let expected = ApiResponse::with_page(data.clone(), pagination.clone());\n",
            );
            "    assert_eq!(\n        actual.expect(\"request should succeed\"),\n        QueryFilteredResult { data, pagination }\n    );\n".to_string()
        } else {
            let shape = plan.data_shape.clone().unwrap_or(element);
            code.push_str(&format!(
                "    let data = {};\n",
                resolver.fixture_expr(&shape)?
            ));
            code.push_str("    let expected = ApiResponse::with_data(data.clone());\n");
            "    assert_eq!(actual.expect(\"request should succeed\"), data);\n".to_string()
        }
    } else {
        code.push_str("    let expected = ApiResponse::<serde_json::Value>::empty();\n");
        "    actual.expect(\"request should succeed\");\n".to_string()
    };
    code.push_str(&request_spec(plan, config, &status));
    code.push_str(
        "    let (c, _server) = test_support::build_test_client_with_json_response(spec, &expected).await;\n\n",
    );
    code.push_str(&format!(
        "    let actual = c.{}({}).await;\n\n",
        fn_name,
        call_args(plan, Blank::None, false)
    ));
    code.push_str(&assertion);
    code.push_str("}\n");

    // Invalid identifiers
    let blanks = plan
        .path_args
        .iter()
        .enumerate()
        .map(|(i, a)| (Blank::Path(i), a.name.as_str()))
        .chain(
            plan.query_args
                .iter()
                .enumerate()
                .filter(|(_, q)| q.is_guarded())
                .map(|(i, q)| (Blank::Query(i), q.param.name.as_str())),
        );
    for (blank, name) in blanks {
        code.push_str(&format!(
            "\n#[actix_web::test]\nasync fn with_empty_{}() {{\n",
            to_snake_case(name)
        ));
        code.push_str(&preamble(plan, true, blank));
        code.push_str("    let c = test_support::build_simple_test_client();\n\n");
        code.push_str(&format!(
            "    let actual = c.{}({}).await;\n\n",
            fn_name,
            call_args(plan, blank, false)
        ));
        code.push_str(
            "    assert!(matches!(actual, Err(ClientError::InvalidIdProvided { .. })));\n}\n",
        );
    }

    // Nil input
    if plan.body_type.is_some() {
        code.push_str("\n#[actix_web::test]\nasync fn with_nil_input() {\n");
        code.push_str(&preamble(plan, false, Blank::None));
        code.push_str("    let c = test_support::build_simple_test_client();\n\n");
        code.push_str(&format!(
            "    let actual = c.{}({}).await;\n\n",
            fn_name,
            call_args(plan, Blank::None, true)
        ));
        code.push_str(
            "    assert!(matches!(actual, Err(ClientError::NilInputProvided)));\n}\n",
        );
    }

    // Build failure
    code.push_str("\n#[actix_web::test]\nasync fn with_error_building_request() {\n");
    code.push_str(&preamble(plan, true, Blank::None));
    code.push_str("    let c = test_support::build_test_client_with_invalid_url();\n\n");
    code.push_str(&format!(
        "    let actual = c.{}({}).await;\n\n",
        fn_name,
        call_args(plan, Blank::None, false)
    ));
    code.push_str(
        "    assert!(matches!(actual, Err(ClientError::BuildRequestFailed { .. })));\n}\n",
    );

    // Transport failure
    code.push_str("\n#[actix_web::test]\nasync fn with_error_executing_request() {\n");
    code.push_str(&preamble(plan, true, Blank::None));
    if plan.is_raw {
        code.push_str("    let c = test_support::build_test_client_with_unreachable_server();\n\n");
    } else {
        code.push_str(&request_spec(plan, config, &status));
        code.push_str(
            "    let (c, _server) = test_support::build_test_client_with_invalid_response(spec).await;\n\n",
        );
    }
    code.push_str(&format!(
        "    let actual = c.{}({}).await;\n\n",
        fn_name,
        call_args(plan, Blank::None, false)
    ));
    code.push_str(
        "    assert!(matches!(actual, Err(ClientError::TransportFailed { .. })));\n}\n",
    );

    // Protocol error
    if !plan.is_raw {
        code.push_str("\n#[actix_web::test]\nasync fn with_error_in_response() {\n");
        code.push_str(&preamble(plan, true, Blank::None));
        code.push_str(
            "    let expected = ApiResponse::<serde_json::Value>::from_error(ApiError::new(\"E_TEST\", \"something went wrong\"));\n",
        );
        code.push_str(&request_spec(plan, config, "500"));
        code.push_str(
            "    let (c, _server) = test_support::build_test_client_with_json_response(spec, &expected).await;\n\n",
        );
        code.push_str(&format!(
            "    let actual = c.{}({}).await;\n\n",
            fn_name,
            call_args(plan, Blank::None, false)
        ));
        code.push_str("    assert!(matches!(actual, Err(ClientError::ProtocolError(_))));\n}\n");
    }

    Ok(code)
}
