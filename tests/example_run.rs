//! Integration tests for the `example run` command.
use bstock::cli::RunOpts;
use bstock::cli::example::handle_example_run_command;
use bstock::settings::Settings;
use tempfile::tempdir;

/// An integration test for the `example run` command.
#[test]
fn test_handle_example_run_command() {
    unsafe { std::env::set_var("BSTOCK_LOG_LEVEL", "off") };

    let tempdir = tempdir().unwrap();
    let opts = RunOpts {
        output_dir: Some(tempdir.path().join("simple")),
        ..RunOpts::default()
    };
    handle_example_run_command("simple", &opts, Some(Settings::default())).unwrap();
    assert!(tempdir.path().join("simple").join("vintages.csv").is_file());
}
