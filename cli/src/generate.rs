#![deny(missing_docs)]

//! # Generate Command
//!
//! Writes the client sources for every non-skipped operation of the document.

use crate::error::CliResult;
use crate::spec::SpecArgs;
use larder_codegen::ClientGenerator;
use std::path::PathBuf;
use tracing::info;

/// Arguments for the generate command.
#[derive(clap::Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Document and configuration.
    #[clap(flatten)]
    pub input: SpecArgs,

    /// Directory receiving the generated files.
    #[clap(long, env = "LARDER_CODEGEN_OUTPUT", default_value = "generated")]
    pub output: PathBuf,
}

/// Executes the generation and returns the number of files written.
pub fn execute(args: &GenerateArgs) -> CliResult<usize> {
    let (spec, config) = args.input.load()?;
    let client = ClientGenerator::new(config).generate(&spec)?;

    client.write_to(&args.output)?;

    info!(
        output = %args.output.display(),
        files = client.files.len(),
        "generated client"
    );
    Ok(client.files.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const DOCUMENT: &str = r#"
openapi: 3.1.0
info: {title: Things, version: "1"}
paths:
  /api/v1/things/{thingID}:
    get:
      operationId: GetThing
      parameters:
        - {name: thingID, in: path, required: true, schema: {type: string}}
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema:
                allOf:
                  - $ref: '#/components/schemas/APIResponse'
                  - properties:
                      data: {$ref: '#/components/schemas/Thing'}
components:
  schemas:
    APIResponse: {type: object}
    Thing:
      type: object
      properties:
        id: {type: string}
"#;

    #[test]
    fn test_generate_writes_files() {
        let dir = tempdir().unwrap();
        let spec_path = dir.path().join("openapi.yaml");
        fs::write(&spec_path, DOCUMENT).unwrap();
        let output = dir.path().join("out");

        let args = GenerateArgs {
            input: SpecArgs {
                spec: spec_path,
                config: None,
            },
            output: output.clone(),
        };
        let written = execute(&args).unwrap();

        assert!(written >= 2);
        let method = fs::read_to_string(output.join("get_thing.rs")).unwrap();
        assert!(method.contains("GENERATED CODE, DO NOT EDIT MANUALLY"));
        assert!(method.contains("pub async fn get_thing"));
        assert!(output.join("get_thing_test.rs").exists());
    }

    #[test]
    fn test_missing_spec_is_reported() {
        let dir = tempdir().unwrap();
        let args = GenerateArgs {
            input: SpecArgs {
                spec: dir.path().join("absent.yaml"),
                config: None,
            },
            output: dir.path().join("out"),
        };
        let err = execute(&args).unwrap_err();
        assert!(err.to_string().contains("OpenAPI file not found"));
    }
}
