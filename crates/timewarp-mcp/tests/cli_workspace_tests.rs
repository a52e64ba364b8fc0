// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! CLI tests for the workspace, marker and identity flags
//!
//! These tests verify workspace path configuration, validation,
//! environment variable overrides and the driver built from them.


use clap::Parser;
use std::path::{Path, PathBuf};
use test_utils::{EnvGuard, TempTestDir};
use timewarp_mcp::config::{Command, Config, ConfigError};

// ============================================================================
// Basic --workspace flag parsing tests
// ============================================================================

#[test]
fn test_workspace_short_flag_w() {
    let temp = TempTestDir::new("ws_short_flag");
    let config = Config::try_parse_from(["timewarp-mcp", "-w", temp.path().to_str().unwrap()])
        .expect("parse should succeed");
    assert_eq!(config.workspace, Some(temp.path().to_path_buf()));
}

#[test]
fn test_workspace_long_flag() {
    let temp = TempTestDir::new("ws_long_flag");
    let config = Config::try_parse_from([
        "timewarp-mcp",
        "--workspace",
        temp.path().to_str().unwrap(),
    ])
    .expect("parse should succeed");
    assert_eq!(config.workspace, Some(temp.path().to_path_buf()));
}

#[test]
fn test_workspace_flag_missing_value_fails() {
    let result = Config::try_parse_from(["timewarp-mcp", "--workspace"]);
    assert!(result.is_err());
    let err = result.unwrap_err().to_string();
    assert!(
        err.contains("value") || err.contains("argument"),
        "Error should mention missing value: {}",
        err
    );
}

#[test]
fn test_workspace_path_method_defaults_to_current_dir() {
    let config = Config::default();
    let workspace = config.workspace_path();
    assert!(workspace.is_some(), "Should return current directory");
    assert!(
        workspace.as_ref().unwrap().is_absolute(),
        "Default workspace should be absolute path"
    );
}

// ============================================================================
// Environment variable tests
// ============================================================================

#[test]
fn test_workspace_env_var_and_override() {
    // One test owns TIMEWARP_WORKSPACE so parallel tests never race on it
    let temp_env = TempTestDir::new("ws_env");
    let temp_cli = TempTestDir::new("ws_cli");

    {
        let _guard = EnvGuard::set("TIMEWARP_WORKSPACE", temp_env.path().to_str().unwrap());

        let config = Config::try_parse_from(["timewarp-mcp"]).expect("parse should succeed");
        assert_eq!(config.workspace, Some(temp_env.path().to_path_buf()));

        let config =
            Config::try_parse_from(["timewarp-mcp", "-w", temp_cli.path().to_str().unwrap()])
                .expect("parse should succeed");
        assert_eq!(config.workspace, Some(temp_cli.path().to_path_buf()));
    }

    let _guard = EnvGuard::remove("TIMEWARP_WORKSPACE");
    let config = Config::try_parse_from(["timewarp-mcp"]).expect("parse should succeed");
    assert!(config.workspace.is_none());
}

#[test]
fn test_marker_file_env_var() {
    let _guard = EnvGuard::set("TIMEWARP_MARKER_FILE", "logs/activity.log");
    let config = Config::try_parse_from(["timewarp-mcp"]).expect("parse should succeed");
    assert_eq!(config.marker_file, PathBuf::from("logs/activity.log"));
}

// ============================================================================
// Validation tests
// ============================================================================

#[test]
fn test_workspace_validation_succeeds_for_existing_directory() {
    let temp = TempTestDir::new("ws_valid");
    let config = Config {
        workspace: Some(temp.path().to_path_buf()),
        ..Default::default()
    };
    assert!(config.validate().is_ok());
}

#[test]
fn test_workspace_validation_fails_for_nonexistent_path() {
    let config = Config {
        workspace: Some(PathBuf::from("/nonexistent/timewarp/workspace")),
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::WorkspaceNotFound(_))
    ));
}

#[test]
fn test_workspace_validation_fails_for_file_not_directory() {
    let temp = TempTestDir::new("ws_file");
    let file = temp.create_file("not_a_dir.txt", "content");
    let config = Config {
        workspace: Some(file),
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::WorkspaceNotDirectory(_))
    ));
}

#[test]
fn test_workspace_validation_error_contains_path() {
    let path = PathBuf::from("/nonexistent/timewarp/reported");
    let config = Config {
        workspace: Some(path.clone()),
        ..Default::default()
    };
    let err = config.validate().unwrap_err().to_string();
    assert!(err.contains("/nonexistent/timewarp/reported"), "{err}");
}

#[test]
fn test_marker_file_outside_workspace_rejected() {
    let config = Config::try_parse_from(["timewarp-mcp", "--marker-file", "/tmp/data.txt"])
        .expect("parse should succeed");
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidMarkerFile(_))
    ));
}

#[test]
fn test_workspace_path_with_spaces() {
    let temp = TempTestDir::new("ws_spaces");
    let spaced = temp.create_subdir("my project");
    let config = Config::try_parse_from(["timewarp-mcp", "-w", spaced.to_str().unwrap()])
        .expect("parse should succeed");
    assert!(config.validate().is_ok());
    assert_eq!(config.workspace_path(), Some(spaced));
}

// ============================================================================
// Driver construction
// ============================================================================

#[test]
fn test_driver_from_flags() {
    let temp = TempTestDir::new("ws_driver");
    let config = Config::try_parse_from([
        "timewarp-mcp",
        "-w",
        temp.path().to_str().unwrap(),
        "--marker-file",
        "history/log.txt",
        "--author-name",
        "Grace",
        "--author-email",
        "grace@example.com",
    ])
    .expect("parse should succeed");

    let identity = config.identity().expect("identity");
    assert_eq!(identity.name, "Grace");
    assert_eq!(identity.email, "grace@example.com");

    let driver = config.driver().expect("driver");
    assert_eq!(driver.workdir(), temp.path());
    assert_eq!(
        driver.marker().relative_path(),
        Path::new("history/log.txt")
    );
}

#[test]
fn test_workspace_flag_with_generate_subcommand() {
    let temp = TempTestDir::new("ws_generate");
    let config = Config::try_parse_from([
        "timewarp-mcp",
        "-w",
        temp.path().to_str().unwrap(),
        "generate",
        "--start-date",
        "2024-01-01",
        "--end-date",
        "2024-01-07",
        "--intensity",
        "0.8",
        "--dry-run",
    ])
    .expect("parse should succeed");

    assert_eq!(config.workspace, Some(temp.path().to_path_buf()));
    assert_eq!(
        config.command,
        Some(Command::Generate {
            start_date: "2024-01-01".to_string(),
            end_date: "2024-01-07".to_string(),
            intensity: Some("0.8".to_string()),
            dry_run: true,
        })
    );
}

#[test]
fn test_generate_requires_dates() {
    let result = Config::try_parse_from(["timewarp-mcp", "generate", "--start-date", "2024-01-01"]);
    assert!(result.is_err());
}

#[test]
fn test_serve_subcommand() {
    let config =
        Config::try_parse_from(["timewarp-mcp", "--utc", "serve"]).expect("parse should succeed");
    assert!(config.utc);
    assert_eq!(config.command, Some(Command::Serve));
}
