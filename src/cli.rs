//! Command-line interface for treemap.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};

use crate::config::{Config, DEFAULT_CONFIG_NAMES, DEFAULT_CONFIG_YAML};
use crate::detect::Severity;
use crate::report::{self, OutputFormat};
use crate::scan::Scanner;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Structural mapper and code smell detector.
///
/// Treemap walks a project, extracts functions, types and imports from every
/// supported source file, builds the import graph and reports design smells:
/// oversized types, overlong functions, deep nesting, long parameter lists,
/// oversized files, catch-all exception handlers and import cycles.
#[derive(Parser)]
#[command(name = "treemap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Map a project and report its smells
    #[command(visible_alias = "map")]
    Scan(ScanArgs),
    /// Write a default treemap.yaml
    Init(InitArgs),
}

/// Arguments for the scan command.
#[derive(Parser)]
pub struct ScanArgs {
    /// Project root to scan
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Path to config YAML file (default: auto-discover in the project root)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Exit with code 1 when a finding at or above this severity exists
    #[arg(long)]
    pub fail_on: Option<Severity>,

    /// Method count above which a type is oversized
    #[arg(long, allow_negative_numbers = true)]
    pub max_type_methods: Option<i64>,

    /// Line count above which a function is overlong
    #[arg(long, allow_negative_numbers = true)]
    pub max_function_lines: Option<i64>,

    /// Nesting depth above which a function is flagged
    #[arg(long, allow_negative_numbers = true)]
    pub max_nesting: Option<i64>,

    /// Parameter count above which a function is flagged
    #[arg(long, allow_negative_numbers = true)]
    pub max_params: Option<i64>,

    /// Line count above which a file is oversized
    #[arg(long, allow_negative_numbers = true)]
    pub max_file_lines: Option<i64>,

    /// Smell kind to suppress (repeatable)
    #[arg(long = "skip", value_name = "KIND")]
    pub skip: Vec<String>,

    /// Opt-in smell kind to enable (repeatable)
    #[arg(long = "enable", value_name = "KIND")]
    pub enable: Vec<String>,

    /// Extra directory name or glob to exclude (repeatable)
    #[arg(long = "exclude", value_name = "DIR")]
    pub exclude: Vec<String>,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_NAMES[0])]
    pub output: PathBuf,
}

/// Load the config file (explicit or discovered) and layer the flags on top.
fn load_config(args: &ScanArgs) -> anyhow::Result<Config> {
    let path = args.config.clone().or_else(|| Config::discover(&args.path));
    let mut config = match &path {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading config");
            Config::parse_file(path)?
        }
        None => Config::default(),
    };

    let t = &mut config.thresholds;
    t.type_methods = args.max_type_methods.or(t.type_methods);
    t.function_lines = args.max_function_lines.or(t.function_lines);
    t.nesting_depth = args.max_nesting.or(t.nesting_depth);
    t.parameters = args.max_params.or(t.parameters);
    t.file_lines = args.max_file_lines.or(t.file_lines);

    config.disabled.extend(args.skip.iter().cloned());
    config.enabled.extend(args.enable.iter().cloned());
    config.exclude.extend(args.exclude.iter().cloned());
    Ok(config)
}

/// Run the scan command.
pub fn run_scan(args: &ScanArgs) -> anyhow::Result<i32> {
    // Configuration is checked before any source file is read
    let settings = match load_config(args).and_then(|c| c.validate().map_err(Into::into)) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let report = match Scanner::new(&args.path, &settings).run() {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return Ok(EXIT_ERROR);
        }
    };

    match &args.output {
        Some(path) => {
            colored::control::set_override(false);
            let rendered = report.render(args.format)?;
            report::write_output(path, &rendered)?;
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{}", report.render(args.format)?),
    }

    match args.fail_on {
        Some(severity) if report.has_findings_at(severity) => Ok(EXIT_FAILED),
        _ => Ok(EXIT_SUCCESS),
    }
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    let target = &args.output;
    if target.exists() {
        eprintln!("Error: {} already exists, refusing to overwrite it", target.display());
        return Ok(EXIT_ERROR);
    }
    if let Err(e) = write_template(target) {
        eprintln!("Error: {:#}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Wrote the default treemap config to {}", target.display());
    println!("Tune thresholds, disabled kinds and excludes there, then map a project with:");
    println!("  treemap scan <path> --config {}", target.display());
    Ok(EXIT_SUCCESS)
}

fn write_template(target: &Path) -> anyhow::Result<()> {
    if let Some(dir) = target.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;
    }
    fs::write(target, DEFAULT_CONFIG_YAML)
        .with_context(|| format!("cannot write {}", target.display()))
}
