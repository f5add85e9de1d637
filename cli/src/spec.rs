//! Loading of the API document and the generator configuration shared by every
//! subcommand.

use crate::error::{CliError, CliResult};
use larder_codegen::{parse_openapi_document, ApiSpec, GeneratorConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Input flags common to all subcommands.
#[derive(clap::Args, Debug, Clone)]
pub struct SpecArgs {
    /// Path to the OpenAPI document (YAML or JSON).
    #[clap(long, env = "LARDER_OPENAPI_PATH", default_value = "client/openapi.yaml")]
    pub spec: PathBuf,

    /// Generator configuration (YAML or JSON); built-in defaults when absent.
    #[clap(long, env = "LARDER_CODEGEN_CONFIG")]
    pub config: Option<PathBuf>,
}

fn read(path: &Path, what: &str) -> CliResult<String> {
    if !path.exists() {
        return Err(CliError::General(format!("{} not found: {:?}", what, path)));
    }
    Ok(fs::read_to_string(path)?)
}

impl SpecArgs {
    /// The configuration named by `--config`, or the default one.
    pub fn load_config(&self) -> CliResult<GeneratorConfig> {
        match &self.config {
            Some(path) => {
                debug!(config = %path.display(), "loading generator configuration");
                Ok(GeneratorConfig::from_yaml_str(&read(path, "Configuration file")?)?)
            }
            None => Ok(GeneratorConfig::default()),
        }
    }

    /// The parsed document plus the configuration it was parsed with.
    pub fn load(&self) -> CliResult<(ApiSpec, GeneratorConfig)> {
        let config = self.load_config()?;
        let raw = read(&self.spec, "OpenAPI file")?;
        let spec = parse_openapi_document(&raw, &config)?;
        debug!(
            spec = %self.spec.display(),
            operations = spec.operations.len(),
            "loaded OpenAPI document"
        );
        Ok((spec, config))
    }
}
