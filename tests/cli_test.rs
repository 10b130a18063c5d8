//! Tests for the command runners and their exit codes.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use tempfile::TempDir;

use treemap::cli::{self, Cli, Commands, ScanArgs, EXIT_ERROR, EXIT_FAILED, EXIT_SUCCESS};
use treemap::config::{Config, DEFAULT_CONFIG_YAML};
use treemap::report::Report;

fn scan_args(args: &[&str]) -> ScanArgs {
    let argv = ["treemap", "scan"].iter().chain(args.iter());
    match Cli::try_parse_from(argv).expect("arguments should parse").command {
        Commands::Scan(args) => args,
        Commands::Init(_) => panic!("expected scan"),
    }
}

fn project(dir: &Path) -> PathBuf {
    let root = dir.join("project");
    fs::create_dir_all(&root).unwrap();
    let mut source = String::from("def handle(a, b, c, d, e, f):\n");
    for i in 0..59 {
        source.push_str(&format!("    v{} = {}\n", i, i));
    }
    fs::write(root.join("app.py"), source).unwrap();
    root
}

#[test]
fn test_fail_on_threshold() {
    let dir = TempDir::new().unwrap();
    let root = project(dir.path());
    let out = dir.path().join("report.json");
    let root = root.to_str().unwrap();
    let out_str = out.to_str().unwrap();

    let args = scan_args(&[root, "--format", "json", "--output", out_str]);
    assert_eq!(cli::run_scan(&args).unwrap(), EXIT_SUCCESS);

    let args = scan_args(&[root, "-f", "json", "-o", out_str, "--fail-on", "medium"]);
    assert_eq!(cli::run_scan(&args).unwrap(), EXIT_FAILED);

    let args = scan_args(&[root, "-f", "json", "-o", out_str, "--fail-on", "high"]);
    assert_eq!(cli::run_scan(&args).unwrap(), EXIT_SUCCESS);

    let report: Report = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(report.findings.len(), 2);
}

#[test]
fn test_flags_override_thresholds_and_kinds() {
    let dir = TempDir::new().unwrap();
    let root = project(dir.path());
    let out = dir.path().join("report.json");

    let args = scan_args(&[
        root.to_str().unwrap(),
        "-f",
        "json",
        "-o",
        out.to_str().unwrap(),
        "--max-function-lines",
        "80",
        "--skip",
        "excess_parameters",
    ]);
    assert_eq!(cli::run_scan(&args).unwrap(), EXIT_SUCCESS);

    let report: Report = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert!(report.findings.is_empty());
    assert_eq!(report.thresholds.function_lines, 80);
}

#[test]
fn test_config_file_is_discovered() {
    let dir = TempDir::new().unwrap();
    let root = project(dir.path());
    fs::write(root.join("treemap.yaml"), "disabled: [overlong_function]\n").unwrap();
    let out = dir.path().join("report.json");

    let args = scan_args(&[root.to_str().unwrap(), "-f", "json", "-o", out.to_str().unwrap()]);
    assert_eq!(cli::run_scan(&args).unwrap(), EXIT_SUCCESS);

    let report: Report = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    let kinds: Vec<_> = report.findings.iter().map(|f| f.kind.as_str()).collect();
    assert_eq!(kinds, vec!["excess_parameters"]);
}

#[test]
fn test_invalid_configuration_exits_with_error() {
    let dir = TempDir::new().unwrap();
    let root = project(dir.path());
    let out = dir.path().join("report.json");
    let root = root.to_str().unwrap();

    let args = scan_args(&[root, "--max-nesting", "-2", "-o", out.to_str().unwrap()]);
    assert_eq!(cli::run_scan(&args).unwrap(), EXIT_ERROR);

    let args = scan_args(&[root, "--skip", "god_object", "-o", out.to_str().unwrap()]);
    assert_eq!(cli::run_scan(&args).unwrap(), EXIT_ERROR);

    // Nothing was scanned, so nothing was written
    assert!(!out.exists());

    let missing = dir.path().join("missing");
    let args = scan_args(&[missing.to_str().unwrap(), "-o", out.to_str().unwrap()]);
    assert_eq!(cli::run_scan(&args).unwrap(), EXIT_ERROR);
}

#[test]
fn test_init_writes_default_config_once() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("conf/treemap.yaml");
    let argv = ["treemap", "init", "--output", path.to_str().unwrap()];
    let Commands::Init(args) = Cli::try_parse_from(argv).unwrap().command else {
        panic!("expected init");
    };

    assert_eq!(cli::run_init(&args).unwrap(), EXIT_SUCCESS);
    assert_eq!(fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG_YAML);
    assert!(Config::parse_file(&path).unwrap().validate().is_ok());

    fs::write(&path, "disabled: [deep_nesting]\n").unwrap();
    assert_eq!(cli::run_init(&args).unwrap(), EXIT_ERROR);
    assert_eq!(fs::read_to_string(&path).unwrap(), "disabled: [deep_nesting]\n");
}

#[test]
fn test_init_reports_unwritable_target() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("taken");
    fs::write(&blocker, "not a directory").unwrap();
    let path = blocker.join("treemap.yaml");
    let argv = ["treemap", "init", "-o", path.to_str().unwrap()];
    let Commands::Init(args) = Cli::try_parse_from(argv).unwrap().command else {
        panic!("expected init");
    };

    assert_eq!(cli::run_init(&args).unwrap(), EXIT_ERROR);
    assert!(!path.exists());
}

#[test]
fn test_verbosity_is_global() {
    let cli = Cli::try_parse_from(["treemap", "scan", ".", "-vv"]).unwrap();
    assert_eq!(cli.verbose, 2);
}
