//! Configuration for the timewarp-mcp server
//!
//! This module provides configuration types and utilities for the server and
//! its one-shot subcommands, including workspace, identity and logging options.

use std::path::{Component, Path, PathBuf};

use clap::{Parser, Subcommand};
use timewarp_git::driver::DEFAULT_MARKER_FILE;
use timewarp_git::{GitDriver, Identity};

/// Timewarp MCP Server - synthesize backdated commit history
#[derive(Parser, Debug, Clone)]
#[command(name = "timewarp-mcp")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Subcommand to run (defaults to MCP server mode)
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Workspace holding the repository to rewrite
    ///
    /// Must be the repository root; parent directories are never searched.
    /// Defaults to the current working directory.
    #[arg(short, long, env = "TIMEWARP_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Marker file appended to for every synthesized commit, relative to the workspace
    #[arg(long, env = "TIMEWARP_MARKER_FILE", default_value = DEFAULT_MARKER_FILE)]
    pub marker_file: PathBuf,

    /// Author name used when the repository has no user.name configured
    #[arg(long, env = "TIMEWARP_AUTHOR_NAME")]
    pub author_name: Option<String>,

    /// Author email used when the repository has no user.email configured
    #[arg(long, env = "TIMEWARP_AUTHOR_EMAIL")]
    pub author_email: Option<String>,

    /// Generate commit times in UTC instead of the local time zone
    #[arg(long, default_value = "false")]
    pub utc: bool,

    /// Enable verbose logging (debug level)
    ///
    /// When enabled, logs every synthesized event. Logs are written to
    /// stderr to avoid interfering with MCP stdio transport.
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,

    /// Quiet mode - suppress info-level logs
    ///
    /// Only errors and warnings will be logged.
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command: None,
            workspace: None,
            marker_file: PathBuf::from(DEFAULT_MARKER_FILE),
            author_name: None,
            author_email: None,
            utc: false,
            verbose: false,
            quiet: false,
        }
    }
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the MCP server over stdio (default)
    Serve,

    /// Generate history once and print the result as JSON
    ///
    /// Example:
    ///   timewarp-mcp generate --start-date 2024-01-01 --end-date 2024-03-31 --intensity 0.6
    Generate {
        /// First day of the range
        #[arg(long)]
        start_date: String,

        /// Last day of the range, inclusive
        #[arg(long)]
        end_date: String,

        /// Probability of activity on a weekday, between 0 and 1
        #[arg(long)]
        intensity: Option<String>,

        /// Preview the generated distribution without touching the repository
        #[arg(long, default_value = "false")]
        dry_run: bool,
    },

    /// Reset the repository to its initial commit
    Reset,
}

impl Config {
    /// Get the workspace path, using current directory as default
    ///
    /// Returns `None` if no workspace is specified and the current
    /// directory cannot be determined.
    #[must_use]
    pub fn workspace_path(&self) -> Option<PathBuf> {
        self.workspace
            .clone()
            .or_else(|| std::env::current_dir().ok())
    }

    /// Identity override, when either part was supplied
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        if self.author_name.is_none() && self.author_email.is_none() {
            return None;
        }
        let fallback = Identity::default();
        Some(Identity::new(
            self.author_name.clone().unwrap_or(fallback.name),
            self.author_email.clone().unwrap_or(fallback.email),
        ))
    }

    /// Build the repository driver this configuration describes
    ///
    /// # Errors
    ///
    /// Returns an error if no workspace was given and the current directory
    /// cannot be determined.
    pub fn driver(&self) -> Result<GitDriver, ConfigError> {
        let workspace = self
            .workspace_path()
            .ok_or(ConfigError::WorkspaceUnavailable)?;
        let driver = GitDriver::new(workspace).with_marker_file(self.marker_file.clone());
        Ok(match self.identity() {
            Some(identity) => driver.with_identity(identity),
            None => driver,
        })
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The workspace path is specified but doesn't exist or isn't a directory
    /// - The marker path is empty, absolute or climbs out of the workspace
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref workspace) = self.workspace {
            if !workspace.exists() {
                return Err(ConfigError::WorkspaceNotFound(workspace.clone()));
            }
            if !workspace.is_dir() {
                return Err(ConfigError::WorkspaceNotDirectory(workspace.clone()));
            }
        }

        if !is_workspace_relative(&self.marker_file) {
            return Err(ConfigError::InvalidMarkerFile(self.marker_file.clone()));
        }

        Ok(())
    }

    /// Get the log level based on verbose/quiet flags
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }
}

/// A non-empty path made only of plain components below the workspace root
fn is_workspace_relative(path: &Path) -> bool {
    let mut has_name = false;
    for component in path.components() {
        match component {
            Component::Normal(_) => has_name = true,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    has_name
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Workspace path not found
    #[error("Workspace path not found: {0}")]
    WorkspaceNotFound(PathBuf),

    /// Workspace path is not a directory
    #[error("Workspace path is not a directory: {0}")]
    WorkspaceNotDirectory(PathBuf),

    /// No workspace given and the current directory is unavailable
    #[error("No workspace given and the current directory cannot be determined")]
    WorkspaceUnavailable,

    /// Marker path must stay inside the workspace
    #[error("Marker file must be a relative path inside the workspace: {0}")]
    InvalidMarkerFile(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.command.is_none());
        assert!(config.workspace.is_none());
        assert_eq!(config.marker_file, PathBuf::from("data.txt"));
        assert!(config.identity().is_none());
        assert!(!config.utc);
        assert!(!config.verbose);
        assert!(!config.quiet);
    }

    #[test]
    fn test_workspace_path_default() {
        let config = Config::default();
        // Should fallback to current directory
        let workspace = config.workspace_path();
        assert!(workspace.is_some());
    }

    #[test]
    fn test_workspace_path_custom() {
        let custom = PathBuf::from("/tmp");
        let config = Config {
            workspace: Some(custom.clone()),
            ..Default::default()
        };
        assert_eq!(config.workspace_path(), Some(custom));
    }

    #[test]
    fn test_identity_partial_override() {
        let config = Config {
            author_name: Some("Ada".to_string()),
            ..Default::default()
        };
        let identity = config.identity().expect("identity");
        assert_eq!(identity.name, "Ada");
        assert_eq!(identity.email, Identity::default().email);
    }

    #[test]
    fn test_driver_uses_marker_file() {
        let config = Config {
            workspace: Some(PathBuf::from("/tmp/ws")),
            marker_file: PathBuf::from("logs/activity.txt"),
            ..Default::default()
        };
        let driver = config.driver().expect("driver");
        assert_eq!(driver.workdir(), std::path::Path::new("/tmp/ws"));
        assert_eq!(
            driver.marker().relative_path(),
            std::path::Path::new("logs/activity.txt")
        );
    }

    #[test]
    fn test_log_level_default() {
        let config = Config::default();
        assert_eq!(config.log_level(), tracing::Level::INFO);
    }

    #[test]
    fn test_log_level_verbose() {
        let config = Config {
            verbose: true,
            ..Default::default()
        };
        assert_eq!(config.log_level(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_log_level_quiet() {
        let config = Config {
            quiet: true,
            ..Default::default()
        };
        assert_eq!(config.log_level(), tracing::Level::WARN);
    }

    #[test]
    fn test_validate_nonexistent_workspace() {
        let config = Config {
            workspace: Some(PathBuf::from("/nonexistent/path/12345")),
            ..Default::default()
        };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::WorkspaceNotFound(_))));
    }

    #[test]
    fn test_validate_valid_workspace() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config {
            workspace: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_absolute_marker() {
        let config = Config {
            marker_file: PathBuf::from("/etc/data.txt"),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidMarkerFile(_))
        ));
    }

    #[test]
    fn test_validate_marker_outside_workspace() {
        for marker in ["../data.txt", "logs/../../data.txt", "", "."] {
            let config = Config {
                marker_file: PathBuf::from(marker),
                ..Default::default()
            };
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidMarkerFile(_))),
                "{marker:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_nested_marker() {
        let config = Config {
            marker_file: PathBuf::from("./logs/activity.txt"),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Config::command().debug_assert();
    }
}
