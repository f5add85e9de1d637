#![deny(missing_docs)]

//! # Client Generator
//!
//! Turns the operation model into Rust client source. For every emitted operation the
//! generator produces a method file (an `impl Client` block) and a test file; `keys.rs`
//! and `models.rs` hold the shared observability keys and request/response structs.
//!
//! Generation is a pure function of `(ApiSpec, GeneratorConfig)`: the same inputs
//! always yield byte-identical files.

pub mod imports;
pub mod path_template;
pub mod types;

mod fixtures;
mod keys;
mod method;
mod models;

use crate::config::GeneratorConfig;
use crate::error::{AppError, AppResult};
use crate::oas::models::ApiSpec;
use method::MethodPlan;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use types::TypeResolver;

/// What a generated file contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratedFileKind {
    /// Observability key constants.
    Keys,
    /// Request and response model structs.
    Models,
    /// One client method.
    Method,
    /// Tests for one client method.
    Test,
    /// The module file tying the rest together.
    Module,
}

/// A single generated source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// File name relative to the output directory.
    pub file_name: String,
    /// Full file contents, banner included.
    pub contents: String,
    /// Content kind.
    pub kind: GeneratedFileKind,
}

impl GeneratedFile {
    fn module_name(&self) -> &str {
        self.file_name.trim_end_matches(".rs")
    }
}

/// The complete output of one generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedClient {
    /// Files in emission order: keys, models, then method/test pairs, then `mod.rs`.
    pub files: Vec<GeneratedFile>,
    banner: String,
}

impl GeneratedClient {
    /// Looks a file up by name.
    pub fn file(&self, file_name: &str) -> Option<&GeneratedFile> {
        self.files.iter().find(|f| f.file_name == file_name)
    }

    /// Writes every file into `dir`, creating it if needed.
    pub fn write_to(&self, dir: &Path) -> AppResult<()> {
        fs::create_dir_all(dir)?;
        for file in &self.files {
            fs::write(dir.join(&file.file_name), &file.contents)?;
        }
        Ok(())
    }

    /// Renders a single-file module tree that `include!`s the files written to `dir`.
    ///
    /// Used from build scripts, where the output lands in `OUT_DIR` and cannot be
    /// reached through `mod` declarations.
    pub fn include_manifest(&self, dir: &Path) -> String {
        let mut code = format!("{}\n", self.banner);
        for file in &self.files {
            if file.kind == GeneratedFileKind::Module {
                continue;
            }
            let path = dir.join(&file.file_name);
            let path = path.to_string_lossy();
            code.push('\n');
            code.push_str(&module_header(file));
            code.push_str(&format!(
                " {{\n    include!({:?});\n}}\n",
                path.as_ref()
            ));
        }
        code
    }
}

fn module_header(file: &GeneratedFile) -> String {
    match file.kind {
        GeneratedFileKind::Keys => "/// Observability keys attached to logs and spans.\npub mod keys".to_string(),
        GeneratedFileKind::Models => "/// Request and response models.\npub mod models".to_string(),
        GeneratedFileKind::Test => format!("#[cfg(test)]\nmod {}", file.module_name()),
        GeneratedFileKind::Method | GeneratedFileKind::Module => {
            format!("mod {}", file.module_name())
        }
    }
}

fn with_banner(banner: &str, body: &str) -> String {
    if body.is_empty() {
        format!("{}\n", banner)
    } else {
        format!("{}\n\n{}", banner, body)
    }
}

/// Generates client source from an `ApiSpec`.
#[derive(Debug, Clone, Default)]
pub struct ClientGenerator {
    config: GeneratorConfig,
}

impl ClientGenerator {
    /// Creates a generator over the given configuration.
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generates every file for the non-skipped operations.
    ///
    /// Two operations mapping to the same module name are a `DuplicateIdentifier` error.
    pub fn generate(&self, spec: &ApiSpec) -> AppResult<GeneratedClient> {
        let config = &self.config;
        let resolver = TypeResolver::new(&spec.schemas, config);
        let mut module_names: BTreeSet<String> =
            ["keys", "models", "mod"].iter().map(|s| s.to_string()).collect();
        let mut files = vec![
            GeneratedFile {
                file_name: "keys.rs".to_string(),
                contents: with_banner(&config.banner, &keys::render_keys(spec.emitted_operations())),
                kind: GeneratedFileKind::Keys,
            },
            GeneratedFile {
                file_name: "models.rs".to_string(),
                contents: with_banner(&config.banner, &models::render_models(&spec.schemas, config)?),
                kind: GeneratedFileKind::Models,
            },
        ];

        for op in spec.emitted_operations() {
            let plan = MethodPlan::new(op, &resolver, config)?;
            let module = plan.fn_name.trim_start_matches("r#").to_string();
            let test_module = format!("{}_test", module);
            for name in [&module, &test_module] {
                if !module_names.insert(name.clone()) {
                    return Err(AppError::DuplicateIdentifier(format!(
                        "module {} (operation {})",
                        name, op.operation_id
                    )));
                }
            }

            files.push(GeneratedFile {
                file_name: format!("{}.rs", module),
                contents: with_banner(&config.banner, &method::render_method(&plan)),
                kind: GeneratedFileKind::Method,
            });
            files.push(GeneratedFile {
                file_name: format!("{}.rs", test_module),
                contents: with_banner(&config.banner, &fixtures::render_tests(&plan, &resolver, config)?),
                kind: GeneratedFileKind::Test,
            });
        }

        let mut module = String::new();
        for file in &files {
            if !module.is_empty() {
                module.push('\n');
            }
            module.push_str(&module_header(file));
            module.push_str(";\n");
        }
        files.push(GeneratedFile {
            file_name: "mod.rs".to_string(),
            contents: with_banner(&config.banner, &module),
            kind: GeneratedFileKind::Module,
        });

        Ok(GeneratedClient {
            files,
            banner: config.banner.clone(),
        })
    }
}
