use crate::config::ParserConfig;
use crate::engine::Engine;
use crate::serializer::{serialize_json, serialize_yaml, write_if_changed};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info};
use std::path::PathBuf;

/// OpenAPI from classes - Generate an OpenAPI document from compiled endpoint classes
#[derive(Parser, Debug)]
#[command(name = "openapi-from-classes")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Generator configuration file (YAML or JSON)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_path: PathBuf,

    /// Additional class path entry: a descriptor file or a directory of them
    #[arg(long = "class-path", value_name = "PATH")]
    pub class_path: Vec<PathBuf>,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.config_path.is_file() {
        anyhow::bail!(
            "Configuration file does not exist: {}",
            args.config_path.display()
        );
    }

    info!("Configuration: {}", args.config_path.display());
    info!("Output format: {:?}", args.output_format);
    if let Some(ref output) = args.output_path {
        info!("Output file: {}", output.display());
    } else {
        info!("Output: stdout");
    }

    Ok(args)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    let mut config = ParserConfig::from_file(&args.config_path).with_context(|| {
        format!(
            "Failed to load configuration: {}",
            args.config_path.display()
        )
    })?;
    config.class_path.extend(args.class_path);

    let engine = Engine::from_config(config).context("Failed to prepare the class path")?;
    let document = engine
        .generate()
        .context("Failed to generate the OpenAPI document")?;

    let content = match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&document)?,
        OutputFormat::Json => serialize_json(&document)?,
    };

    match &args.output_path {
        Some(output_path) => {
            if write_if_changed(&content, output_path)? {
                info!("Wrote OpenAPI document to {}", output_path.display());
            } else {
                info!("{} is unchanged", output_path.display());
            }
        }
        None => println!("{}", content),
    }

    info!("Summary:");
    info!("  - Tags: {}", document.tags.len());
    info!("  - Paths: {}", document.paths.len());
    info!("  - Schemas: {}", document.components.schemas.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup(dir: &TempDir) -> PathBuf {
        let classes = dir.path().join("classes");
        fs::create_dir(&classes).unwrap();
        fs::write(
            classes.join("Ping.yaml"),
            r#"
name: com.example.PingEndpoint
modifiers: [public]
annotations:
  - name: com.example.Endpoint
    values:
      value: ping
methods:
  - name: ping
    descriptor: ()Z
    modifiers: [public]
"#,
        )
        .unwrap();

        let config = dir.path().join("config.yaml");
        fs::write(
            &config,
            "endpoint-annotation: com.example.Endpoint\n\
             endpoint-exposed-annotation: com.example.EndpointExposed\n\
             class-path: [classes]\n",
        )
        .unwrap();
        config
    }

    #[test]
    fn test_parse_args() {
        let args = CliArgs::try_parse_from([
            "openapi-from-classes",
            "--config",
            "config.yaml",
            "--class-path",
            "a",
            "--class-path",
            "b",
            "-f",
            "json",
            "-v",
        ])
        .unwrap();

        assert_eq!(args.config_path, PathBuf::from("config.yaml"));
        assert_eq!(args.class_path, vec![PathBuf::from("a"), PathBuf::from("b")]);
        assert!(matches!(args.output_format, OutputFormat::Json));
        assert!(args.verbose);
    }

    #[test]
    fn test_missing_config_file() {
        let args = CliArgs::try_parse_from(["openapi-from-classes", "--config", "missing.yaml"])
            .unwrap();
        assert!(parse_args_from_parsed(args).is_err());
    }

    #[test]
    fn test_run_writes_output_once() {
        let dir = TempDir::new().unwrap();
        let config = setup(&dir);
        let output = dir.path().join("out").join("openapi.json");

        let args = || CliArgs {
            config_path: config.clone(),
            class_path: Vec::new(),
            output_format: OutputFormat::Json,
            output_path: Some(output.clone()),
            verbose: false,
        };

        run(args()).unwrap();
        let first = fs::read_to_string(&output).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&first).unwrap();
        assert!(parsed["paths"]["/ping/ping"]["post"].is_object());

        run(args()).unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), first);
    }
}
