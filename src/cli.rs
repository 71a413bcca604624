use crate::config::GeneratorConfig;
use crate::generator::Generator;
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use std::path::PathBuf;

/// goas - Generate an OpenAPI 3 document from annotated Go source code
#[derive(Parser, Debug)]
#[command(name = "goas")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Root directory of the Go module (the one holding go.mod)
    #[arg(long = "module-path", value_name = "DIR", default_value = ".")]
    pub module_path: PathBuf,

    /// File declaring the general API info; found automatically when omitted
    #[arg(long = "main-file-path", value_name = "FILE")]
    pub main_file_path: Option<PathBuf>,

    /// Only collect operations from packages under this directory
    #[arg(long = "handler-path", value_name = "DIR")]
    pub handler_path: Option<PathBuf>,

    /// Output file path, `-` writes to stdout
    #[arg(short = 'o', long = "output", value_name = "FILE", default_value = "oas.json")]
    pub output_path: PathBuf,

    /// Output format (json or yaml)
    #[arg(short = 'f', long = "format", value_enum, default_value = "json")]
    pub output_format: OutputFormat,

    /// Fail on any type or annotation that cannot be resolved
    #[arg(long = "strict")]
    pub strict: bool,

    /// Name schemas by type name only, without the package path
    #[arg(long = "schema-without-pkg")]
    pub schema_without_package: bool,

    /// Module download cache (defaults to $GOPATH/pkg/mod)
    #[arg(long = "go-mod-cache", env = "GOMODCACHE", value_name = "DIR")]
    pub go_mod_cache: Option<PathBuf>,

    /// Go installation root; its `src` directory holds the standard library
    #[arg(long = "go-root", env = "GOROOT", value_name = "DIR")]
    pub go_root: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

impl CliArgs {
    /// Library configuration for these arguments
    pub fn generator_config(&self) -> GeneratorConfig {
        let mut config = GeneratorConfig::new(&self.module_path)
            .with_strict(self.strict)
            .with_schema_without_package(self.schema_without_package);
        if let Some(path) = &self.main_file_path {
            config = config.with_main_file(path);
        }
        if let Some(path) = &self.handler_path {
            config = config.with_handler_path(path);
        }
        if let Some(path) = &self.go_mod_cache {
            config = config.with_go_mod_cache(path);
        }
        if let Some(root) = &self.go_root {
            config = config.with_go_root_src(root.join("src"));
        }
        config
    }

    fn writes_to_stdout(&self) -> bool {
        self.output_path.as_os_str() == "-"
    }
}

/// Parse command line arguments
pub fn parse_args() -> Result<CliArgs> {
    let args = CliArgs::parse();
    parse_args_from_parsed(args)
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.module_path.is_dir() {
        anyhow::bail!(
            "Module path is not a directory: {}",
            args.module_path.display()
        );
    }

    info!("Module path: {}", args.module_path.display());
    info!("Output format: {:?}", args.output_format);
    if args.writes_to_stdout() {
        info!("Output: stdout");
    } else {
        info!("Output file: {}", args.output_path.display());
    }
    if args.strict {
        info!("Strict mode enabled");
    }

    Ok(args)
}

/// Run the main workflow
///
/// Nothing is written unless the whole document validates.
pub fn run(args: CliArgs) -> Result<()> {
    info!("Starting OpenAPI document generation...");

    let mut generator =
        Generator::new(&args.generator_config()).context("Failed to set up the generator")?;
    generator
        .parse()
        .context("Failed to parse annotations and types")?;

    let diagnostics = generator.diagnostics();
    if !diagnostics.is_empty() {
        warn!("{} problems were skipped:", diagnostics.len());
        for diagnostic in diagnostics {
            warn!("  {}", diagnostic);
        }
    }

    let document = generator
        .build()
        .context("Failed to assemble the OpenAPI document")?;
    info!(
        "Generated document with {} paths and {} schemas",
        document.paths.len(),
        document
            .components
            .as_ref()
            .map(|c| c.schemas.len())
            .unwrap_or(0)
    );

    let output = match args.output_format {
        OutputFormat::Json => serialize_json(&document)?,
        OutputFormat::Yaml => serialize_yaml(&document)?,
    };

    if args.writes_to_stdout() {
        println!("{}", output);
    } else {
        write_to_file(&output, &args.output_path)?;
        info!("OpenAPI document written to {}", args.output_path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_module(dir: &TempDir) {
        fs::write(dir.path().join("go.mod"), "module example.com/app\n").unwrap();
        fs::write(
            dir.path().join("main.go"),
            "// @Version 1.0.0\n// @Title Ping API\npackage main\n\nfunc main() {}\n",
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("handlers")).unwrap();
        fs::write(
            dir.path().join("handlers").join("ping.go"),
            r#"
package handlers

// @Title Ping
// @Success 200 string "pong"
// @Router /ping [get]
func Ping() {}
"#,
        )
        .unwrap();
    }

    #[test]
    fn test_defaults() {
        let args = CliArgs::try_parse_from(["goas"]).unwrap();
        assert_eq!(args.module_path, PathBuf::from("."));
        assert_eq!(args.output_path, PathBuf::from("oas.json"));
        assert_eq!(args.output_format, OutputFormat::Json);
        assert!(!args.strict);
        assert!(!args.schema_without_package);
    }

    #[test]
    fn test_all_flags() {
        let args = CliArgs::try_parse_from([
            "goas",
            "--module-path",
            "/src/app",
            "--main-file-path",
            "cmd/main.go",
            "--handler-path",
            "handlers",
            "-o",
            "-",
            "-f",
            "yaml",
            "--strict",
            "--schema-without-pkg",
            "--go-mod-cache",
            "/cache",
            "--go-root",
            "/usr/local/go",
            "-v",
        ])
        .unwrap();

        assert!(args.writes_to_stdout());
        assert_eq!(args.output_format, OutputFormat::Yaml);
        let config = args.generator_config();
        assert_eq!(config.main_file_path, Some(PathBuf::from("cmd/main.go")));
        assert_eq!(config.handler_path, Some(PathBuf::from("handlers")));
        assert!(config.strict);
        assert!(config.schema_without_package);
        assert_eq!(config.go_mod_cache, Some(PathBuf::from("/cache")));
        assert_eq!(config.go_root_src, Some(PathBuf::from("/usr/local/go/src")));
    }

    #[test]
    fn test_invalid_format_is_rejected() {
        assert!(CliArgs::try_parse_from(["goas", "-f", "xml"]).is_err());
    }

    #[test]
    fn test_missing_module_path() {
        let args = CliArgs::try_parse_from(["goas", "--module-path", "/nonexistent/module"]).unwrap();
        assert!(parse_args_from_parsed(args).is_err());
    }

    #[test]
    fn test_run_writes_document() {
        let temp_dir = TempDir::new().unwrap();
        create_module(&temp_dir);
        let output = temp_dir.path().join("out").join("oas.yaml");

        let args = CliArgs::try_parse_from([
            "goas",
            "--module-path",
            temp_dir.path().to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "-f",
            "yaml",
        ])
        .unwrap();
        run(args).unwrap();

        let content = fs::read_to_string(&output).unwrap();
        assert!(content.contains("title: Ping API"));
        assert!(content.contains("/ping:"));
    }

    #[test]
    fn test_run_without_title_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("go.mod"), "module example.com/app\n").unwrap();
        fs::write(
            temp_dir.path().join("main.go"),
            "// @Version 1.0.0\npackage main\n\nfunc main() {}\n",
        )
        .unwrap();
        let output = temp_dir.path().join("oas.json");

        let args = CliArgs::try_parse_from([
            "goas",
            "--module-path",
            temp_dir.path().to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .unwrap();
        let err = run(args).unwrap_err();
        assert!(format!("{:#}", err).contains("info.title cannot not be empty"));
        assert!(!output.exists());
    }
}
