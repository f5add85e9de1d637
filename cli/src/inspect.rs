#![deny(missing_docs)]

//! # Inspect Command
//!
//! Prints the operation model of a document as JSON.

use crate::error::CliResult;
use crate::spec::SpecArgs;

/// Arguments for the inspect command.
#[derive(clap::Args, Debug, Clone)]
pub struct InspectArgs {
    /// Document and configuration.
    #[clap(flatten)]
    pub input: SpecArgs,
}

/// Renders the operation model as pretty-printed JSON.
pub fn render(args: &InspectArgs) -> CliResult<String> {
    let (spec, _) = args.input.load()?;
    Ok(serde_json::to_string_pretty(&spec.operations)?)
}

/// Executes the inspection, writing to stdout.
pub fn execute(args: &InspectArgs) -> CliResult<()> {
    println!("{}", render(args)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_inspect_lists_operations_and_honours_skips() {
        let dir = tempdir().unwrap();
        let spec_path = dir.path().join("openapi.yaml");
        fs::write(
            &spec_path,
            r#"
openapi: 3.1.0
info: {title: Meta, version: "1"}
paths:
  /_meta_/live:
    get:
      operationId: CheckForLiveness
      responses:
        "200": {description: ok}
"#,
        )
        .unwrap();

        let rendered = render(&InspectArgs {
            input: SpecArgs {
                spec: spec_path,
                config: None,
            },
        })
        .unwrap();
        let operations: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(operations[0]["operationId"], "CheckForLiveness");
        assert_eq!(operations[0]["skip"], true);
    }
}
