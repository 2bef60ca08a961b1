//! Tests for the `routes` and `check` subcommands

use clap::Parser;
use ramlrouter::cli::{run_cli, Cli};
use ramlrouter::error::{CompileError, RouterError};

mod common;
use common::temp_files::create_temp_raml;
use std::io::Write;

fn run(args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["ramlrouter"];
    argv.extend_from_slice(args);
    run_cli(Cli::try_parse_from(argv)?)
}

#[test]
fn test_check_accepts_bundled_raml() {
    run(&["check", "--raml", "conf/default.raml"]).unwrap();
}

#[test]
fn test_routes_prints_table() {
    run(&["routes", "--raml", "conf/default.raml"]).unwrap();
}

#[test]
fn test_check_fails_on_missing_file() {
    let err = run(&["check", "--raml", "missing/api.raml"]).unwrap_err();
    assert!(format!("{err:#}").contains("missing/api.raml"));
    assert!(matches!(
        err.downcast_ref::<RouterError>(),
        Some(RouterError::Load(_))
    ));
}

#[test]
fn test_check_fails_on_duplicate_route() {
    let raml = create_temp_raml(
        "#%RAML 1.0\ntitle: Dupes\n/a/b:\n  get:\n/a:\n  /b:\n    get:\n",
    );
    let path = raml.path.to_string_lossy().into_owned();
    let err = run(&["check", "--raml", &path]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CompileError>(),
        Some(CompileError::DuplicateRoute { .. })
    ));
}

#[test]
fn test_check_reads_inline_raml_from_config() {
    let mut config = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(
        config,
        "ramlString: |\n  #%RAML 1.0\n  title: Inline\n  /ping:\n    get:\n"
    )
    .unwrap();
    let path = config.path().to_string_lossy().into_owned();
    run(&["check", "--config", &path]).unwrap();
    run(&["routes", "--config", &path]).unwrap();
}

#[test]
fn test_check_config_errors_match_serve() {
    let mut config = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(
        config,
        r##"{{"ramlString":"#%RAML 1.0\ntitle: Dupes\n/a/b:\n  get:\n/a:\n  /b:\n    get:\n"}}"##
    )
    .unwrap();
    let path = config.path().to_string_lossy().into_owned();
    let err = run(&["check", "--config", &path]).unwrap_err();
    assert!(format!("{err:#}").contains("ramlString"));
    assert!(matches!(
        err.downcast_ref::<CompileError>(),
        Some(CompileError::DuplicateRoute { .. })
    ));
}
