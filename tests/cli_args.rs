//! Integration tests for CLI argument handling
//!
//! Runs the binary for flag validation paths that never reach the network.

use std::process::Command;

/// Helper to run the CLI with given args and capture output
///
/// Clears every setting the binary reads from the environment so the host's
/// variables cannot leak into the test.
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_castcall"))
        .args(args)
        .env_remove("GEMINI_API_KEY")
        .env_remove("CASTCALL_MODEL")
        .env_remove("CASTCALL_API_BASE")
        .env_remove("CASTCALL_APP_ID")
        .env_remove("CASTCALL_STORE")
        .env_remove("CASTCALL_STORE_DIR")
        .env_remove("CASTCALL_BIND")
        .current_dir(std::env::temp_dir())
        .output()
        .expect("Failed to execute castcall")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success(), "Expected --help to exit successfully");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("castcall"), "Help should mention castcall");
    assert!(stdout.contains("serve"), "Help should mention the serve command");
    assert!(stdout.contains("fee"), "Help should mention the fee command");
}

#[test]
fn test_fee_help_mentions_actor() {
    let output = run_cli(&["fee", "--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ACTOR"));
}

#[test]
fn test_missing_subcommand_fails() {
    let output = run_cli(&[]);
    assert!(!output.status.success());
}

#[test]
fn test_missing_api_key_prints_error_and_exits() {
    let output = run_cli(&["--store", "memory", "fee", "Tom Hanks"]);
    assert!(!output.status.success(), "Expected missing API key to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("API key"),
        "Should print error message about the API key: {}",
        stderr
    );
}

#[test]
fn test_blank_actor_name_fails_before_any_lookup() {
    let output = run_cli(&["--api-key", "k", "--store", "memory", "fee", "   "]);
    assert!(!output.status.success(), "Expected a blank actor name to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("blank"), "Should explain the rejection: {}", stderr);
    assert!(output.stdout.is_empty(), "Nothing should be looked up");
}

#[test]
fn test_invalid_store_kind_fails() {
    let output = run_cli(&["--api-key", "k", "--store", "redis", "fee", "Tom Hanks"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("redis") || stderr.contains("invalid"), "{}", stderr);
}

#[test]
fn test_invalid_bind_address_fails() {
    let output = run_cli(&["--api-key", "k", "serve", "--bind", "nowhere"]);
    assert!(!output.status.success());
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use castcall::cli::{Cli, Command, Settings, StoreSettings};
    use clap::Parser;

    #[test]
    fn test_cli_serve_default_bind() {
        let cli = Cli::try_parse_from(["castcall", "--api-key", "k", "serve"]).unwrap();
        match cli.command {
            Command::Serve { bind } => assert_eq!(bind.port(), 8080),
            other => panic!("Expected Serve, got {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "castcall",
            "fee",
            "Tom Hanks",
            "--api-key",
            "k",
            "--store",
            "memory",
        ])
        .unwrap();
        let settings = Settings::from_cli(&cli).unwrap();
        assert_eq!(settings.store, StoreSettings::Memory);
    }
}
