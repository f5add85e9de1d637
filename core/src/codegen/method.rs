//! # Method Templates
//!
//! Renders one client method per operation. Each HTTP method variant has its own
//! template record (descriptions, request shape, result conversion); the shared
//! skeleton enforces the wire contract:
//!
//! 1. `ctx: &Context` first, then path parameters, extra query parameters, the body and the filter.
//! 2. Nil body, empty identifiers and failed validation are rejected before any I/O.
//! 3. Envelope responses are decoded and a non-empty `error` becomes `ProtocolError`.

use crate::codegen::imports::ImportManifest;
use crate::codegen::path_template::PathTemplate;
use crate::codegen::types::{data_element, data_shape, TypeResolver};
use crate::config::GeneratorConfig;
use crate::error::AppResult;
use crate::naming::{key_const_name, rust_ident, type_ident};
use crate::oas::models::{DataType, HttpMethod, Operation, Param, SEARCH_QUERY_PARAM};
use crate::type_mapping::SchemaType;
use larder_shared::DEFAULT_QUERY_FILTER_LIMIT;
use std::collections::BTreeSet;

/// How the request is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestShape {
    /// `build_request`, empty body.
    Bare,
    /// `build_data_request` with the JSON input.
    Data,
}

/// Per-variant template record.
struct Template {
    build_description: String,
    execute_description: String,
    request: RequestShape,
}

fn get_template(plan: &MethodPlan) -> Template {
    let (build_description, execute_description) = if plan.returns_list {
        (
            format!("building request to fetch list of {}", plan.subject),
            format!("loading {} list response", plan.subject),
        )
    } else {
        (
            format!("building request to fetch {}", plan.subject),
            format!("loading {} response", plan.subject),
        )
    };
    Template {
        build_description,
        execute_description,
        request: RequestShape::Bare,
    }
}

fn post_template(plan: &MethodPlan) -> Template {
    Template {
        build_description: format!("building request to create {}", plan.subject),
        execute_description: format!("creating {}", plan.subject),
        request: plan.body_shape(),
    }
}

fn put_template(plan: &MethodPlan) -> Template {
    Template {
        build_description: format!("building request to update {}", plan.subject),
        execute_description: format!("updating {}", plan.subject),
        request: plan.body_shape(),
    }
}

fn patch_template(plan: &MethodPlan) -> Template {
    Template {
        build_description: format!("building request to patch {}", plan.subject),
        execute_description: format!("patching {}", plan.subject),
        request: plan.body_shape(),
    }
}

fn delete_template(plan: &MethodPlan) -> Template {
    Template {
        build_description: format!("building request to archive {}", plan.subject),
        execute_description: format!("archiving {}", plan.subject),
        request: RequestShape::Bare,
    }
}

/// A path parameter as rendered.
pub(crate) struct PathArg {
    pub name: String,
    pub ident: String,
    pub key_const: String,
}

/// An extra query parameter as rendered.
pub(crate) struct QueryArg<'a> {
    pub param: &'a Param,
    pub ident: String,
}

impl QueryArg<'_> {
    fn signature_type(&self) -> String {
        let ty = self.param.ty.rust_arg_type();
        if self.param.required {
            ty.to_string()
        } else {
            format!("Option<{}>", ty)
        }
    }

    /// Required string queries are guarded like identifiers.
    pub fn is_guarded(&self) -> bool {
        self.param.required && self.param.ty.is_string()
    }

    fn key_expr(&self) -> String {
        if self.param.name == SEARCH_QUERY_PARAM {
            "QUERY_KEY_SEARCH".to_string()
        } else {
            format!("{:?}", self.param.name)
        }
    }

    fn value_expr(&self, ident: &str) -> String {
        if self.param.ty.is_string() {
            ident.to_string()
        } else {
            format!("{}.to_string()", ident)
        }
    }
}

/// Everything the templates need, derived once per operation.
pub(crate) struct MethodPlan<'a> {
    pub op: &'a Operation,
    pub runtime: String,
    pub fn_name: String,
    pub subject: String,
    pub path: PathTemplate,
    pub path_args: Vec<PathArg>,
    pub query_args: Vec<QueryArg<'a>>,
    pub body_type: Option<String>,
    pub data_type: Option<String>,
    pub data_shape: Option<SchemaType>,
    pub returns_list: bool,
    pub returns_data: bool,
    pub is_raw: bool,
    pub default_query_limit: u8,
    pub models: BTreeSet<String>,
}

impl<'a> MethodPlan<'a> {
    pub fn new(
        op: &'a Operation,
        resolver: &TypeResolver,
        config: &GeneratorConfig,
    ) -> AppResult<Self> {
        let path = PathTemplate::parse(&op.path_template)?;
        let path_args = op
            .path_params
            .iter()
            .map(|p| PathArg {
                name: p.name.clone(),
                ident: rust_ident(&p.name),
                key_const: key_const_name(&p.name),
            })
            .collect();
        let query_args = op
            .extra_query_params()
            .into_iter()
            .map(|param| QueryArg {
                param,
                ident: rust_ident(&param.name),
            })
            .collect();

        let mut models = BTreeSet::new();
        let body_type = op.request_body_type.as_ref().map(|name| {
            let shape = SchemaType::Named(name.clone());
            resolver.models_in(&shape, &mut models);
            resolver.rust_type(&shape)
        });

        let returns_data = op.returns_data();
        let element = data_element(&op.response_type);
        let shape = data_shape(&op.response_type);
        let data_type = match (&element, returns_data) {
            (Some(element), true) => {
                resolver.models_in(element, &mut models);
                Some(resolver.rust_type(element))
            }
            _ => None,
        };

        let subject = match &op.response_type.data {
            Some(DataType::Schema(name)) => type_ident(name),
            _ => op.operation_id.clone(),
        };

        Ok(Self {
            op,
            runtime: config.runtime_crate.clone(),
            fn_name: rust_ident(&op.operation_id),
            subject,
            path,
            path_args,
            query_args,
            body_type,
            data_type,
            data_shape: if returns_data { shape } else { None },
            returns_list: op.returns_list,
            returns_data,
            is_raw: op.response_type.is_raw,
            default_query_limit: config.default_query_limit,
            models,
        })
    }

    fn body_shape(&self) -> RequestShape {
        if self.body_type.is_some() {
            RequestShape::Data
        } else {
            RequestShape::Bare
        }
    }

    fn rt(&self, item: &str) -> String {
        format!("{}::{}", self.runtime, item)
    }

    /// The success type of the generated method.
    pub fn return_type(&self) -> String {
        if self.is_raw {
            return "reqwest::Response".to_string();
        }
        match &self.data_type {
            Some(ty) if self.returns_list => format!("QueryFilteredResult<{}>", ty),
            Some(ty) if self.op.response_type.is_collection => format!("Vec<{}>", ty),
            Some(ty) => ty.clone(),
            None => "()".to_string(),
        }
    }

    /// The type the envelope is decoded with.
    fn decode_type(&self) -> String {
        match &self.data_type {
            Some(ty) if self.returns_list || self.op.response_type.is_collection => {
                format!("Vec<{}>", ty)
            }
            Some(ty) => ty.clone(),
            None => "serde::de::IgnoredAny".to_string(),
        }
    }

    fn uses_query_values(&self) -> bool {
        self.returns_list || !self.query_args.is_empty()
    }

    /// Import manifest of the method file.
    pub fn imports(&self) -> ImportManifest {
        let mut manifest = ImportManifest::new();
        manifest.insert(self.rt("Client"));
        manifest.insert(self.rt("ClientError"));
        manifest.insert(self.rt("Context"));
        manifest.insert(self.rt("observability"));

        if !self.path_args.is_empty() {
            manifest.insert(self.rt("keys"));
            manifest.insert(self.rt("observability::spans"));
        }
        if !self.is_raw {
            manifest.insert(self.rt("ApiResponse"));
            manifest.insert(self.rt("ResponseEnvelope"));
        }
        if self.returns_list {
            manifest.insert(self.rt("QueryFilter"));
            if self.returns_data {
                manifest.insert(self.rt("QueryFilteredResult"));
            }
        } else if !self.query_args.is_empty() {
            manifest.insert(self.rt("QueryValues"));
        }
        if self
            .query_args
            .iter()
            .any(|q| q.param.name == SEARCH_QUERY_PARAM)
        {
            manifest.insert(self.rt("QUERY_KEY_SEARCH"));
        }
        if self.body_type.is_some() {
            manifest.insert(self.rt("Validate"));
        }
        for model in &self.models {
            manifest.insert(self.rt(&format!("models::{}", model)));
        }
        manifest
    }
}

const VALIDATION_DESCRIPTION: &str = "validating input";

fn invalid_id_guard(ident: &str, name: &str) -> String {
    format!(
        "\n        if {ident}.is_empty() {{\n            return Err(observability::prepare_and_log_error(\n                ClientError::invalid_id({name:?}),\n                &logger,\n                &span,\n                {description:?},\n            ));\n        }}\n",
        ident = ident,
        name = name,
        description = VALIDATION_DESCRIPTION
    )
}

fn map_err_line(description: &str) -> String {
    format!(
        ".map_err(|err| observability::prepare_and_log_error(err, &logger, &span, {:?}))",
        description
    )
}

/// Renders the body of a method file (without banner).
pub(crate) fn render_method(plan: &MethodPlan) -> String {
    let template = match plan.op.method {
        HttpMethod::Get => get_template(plan),
        HttpMethod::Post => post_template(plan),
        HttpMethod::Put => put_template(plan),
        HttpMethod::Patch => patch_template(plan),
        HttpMethod::Delete => delete_template(plan),
    };
    let op = plan.op;
    let mut code = String::new();

    code.push_str(&plan.imports().render());
    code.push('\n');
    code.push_str("impl Client {\n");

    // Docs
    code.push_str(&format!(
        "    /// {} issues `{} {}`.\n",
        op.operation_id, op.method, op.path_template
    ));
    if let Some(summary) = op.summary.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        code.push_str("    ///\n");
        for line in summary.lines() {
            code.push_str(&format!("    /// {}\n", line.trim()));
        }
    }

    // Signature
    code.push_str(&format!("    pub async fn {}(\n", plan.fn_name));
    code.push_str("        &self,\n");
    code.push_str("        ctx: &Context,\n");
    for arg in &plan.path_args {
        code.push_str(&format!("        {}: &str,\n", arg.ident));
    }
    for arg in &plan.query_args {
        code.push_str(&format!("        {}: {},\n", arg.ident, arg.signature_type()));
    }
    if let Some(body) = &plan.body_type {
        code.push_str(&format!("        input: Option<&{}>,\n", body));
    }
    if plan.returns_list {
        code.push_str("        filter: Option<&QueryFilter>,\n");
    }
    code.push_str(&format!(
        "    ) -> Result<{}, ClientError> {{\n",
        plan.return_type()
    ));

    // Observability
    code.push_str(&format!(
        "        let span = observability::start_span({:?});\n",
        op.operation_id
    ));
    let logger_binding = if plan.path_args.is_empty() {
        "logger"
    } else {
        "mut logger"
    };
    code.push_str(&format!(
        "        let {} = self.logger().clone();\n",
        logger_binding
    ));

    // Guards
    if plan.body_type.is_some() {
        code.push_str(&format!(
            "\n        let input = input\n            .ok_or(ClientError::NilInputProvided)\n            {}?;\n",
            map_err_line(VALIDATION_DESCRIPTION)
        ));
    }
    for arg in &plan.path_args {
        code.push_str(&invalid_id_guard(&arg.ident, &arg.name));
        code.push_str(&format!(
            "        logger = logger.with_value(keys::{key}, {ident});\n        spans::attach_to_span(&span, keys::{key}, {ident});\n",
            key = arg.key_const,
            ident = arg.ident
        ));
    }
    for arg in plan.query_args.iter().filter(|q| q.is_guarded()) {
        code.push_str(&invalid_id_guard(&arg.ident, &arg.param.name));
    }
    if plan.body_type.is_some() {
        code.push_str(&format!(
            "\n        input\n            .validate()\n            .map_err(ClientError::InputValidationFailed)\n            {}?;\n",
            map_err_line(VALIDATION_DESCRIPTION)
        ));
    }

    // Query values
    let values_arg = if plan.uses_query_values() {
        let binding = if plan.query_args.is_empty() {
            "values"
        } else {
            "mut values"
        };
        code.push('\n');
        if plan.returns_list {
            if plan.default_query_limit == DEFAULT_QUERY_FILTER_LIMIT {
                code.push_str("        let filter = filter.cloned().unwrap_or_default();\n");
            } else {
                code.push_str(&format!(
                    "        let filter = filter.cloned().unwrap_or_else(|| QueryFilter {{\n            limit: {},\n            ..QueryFilter::default()\n        }});\n",
                    plan.default_query_limit
                ));
            }
            code.push_str(&format!("        let {} = filter.to_values();\n", binding));
        } else {
            code.push_str(&format!("        let {} = QueryValues::new();\n", binding));
        }
        for arg in &plan.query_args {
            if arg.param.required {
                code.push_str(&format!(
                    "        values.set({}, {});\n",
                    arg.key_expr(),
                    arg.value_expr(&arg.ident)
                ));
            } else {
                code.push_str(&format!(
                    "        if let Some(value) = {} {{\n            values.set({}, {});\n        }}\n",
                    arg.ident,
                    arg.key_expr(),
                    arg.value_expr("value")
                ));
            }
        }
        "Some(&values)"
    } else {
        "None"
    };

    // URL and request
    let path_args: Vec<String> = plan.path_args.iter().map(|a| a.ident.clone()).collect();
    code.push_str(&format!(
        "\n        let url = self\n            .build_url({}, {})\n            {}?;\n",
        values_arg,
        plan.path.render(&path_args),
        map_err_line(&template.build_description)
    ));
    let request = match template.request {
        RequestShape::Bare => format!("build_request(reqwest::Method::{}, url)", op.method),
        RequestShape::Data => format!(
            "build_data_request(reqwest::Method::{}, url, input)",
            op.method
        ),
    };
    code.push_str(&format!(
        "        let req = self\n            .{}\n            {}?;\n",
        request,
        map_err_line(&template.build_description)
    ));

    // Execution
    if plan.is_raw {
        code.push_str(&format!(
            "\n        self.fetch_response(ctx, req)\n            .await\n            {}\n",
            map_err_line(&template.execute_description)
        ));
    } else {
        code.push_str(&format!(
            "\n        let api_response: ApiResponse<{}> = self\n            .fetch_and_unmarshal(ctx, req)\n            .await\n            {}?;\n",
            plan.decode_type(),
            map_err_line(&template.execute_description)
        ));
        let conversion = if plan.returns_list && plan.returns_data {
            "into_query_filtered_result()"
        } else if plan.returns_data {
            "into_data()"
        } else {
            "into_empty()"
        };
        code.push_str(&format!(
            "\n        api_response\n            .{}\n            {}\n",
            conversion,
            map_err_line(&template.execute_description)
        ));
    }

    code.push_str("    }\n}\n");
    code
}
