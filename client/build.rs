//! Generates the API client from `openapi.yaml` into `OUT_DIR`.

use larder_codegen::{parse_openapi_document, ClientGenerator, GeneratorConfig};
use std::env;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn Error>> {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let spec_path = manifest_dir.join("openapi.yaml");
    println!("cargo:rerun-if-changed={}", spec_path.display());

    let config = GeneratorConfig::default();
    let spec = parse_openapi_document(&fs::read_to_string(&spec_path)?, &config)?;
    let client = ClientGenerator::new(config).generate(&spec)?;

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let api_dir = out_dir.join("api");
    client.write_to(&api_dir)?;
    fs::write(
        out_dir.join("client_operations.rs"),
        client.include_manifest(&api_dir),
    )?;
    Ok(())
}
