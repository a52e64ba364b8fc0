// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! The repository capability consumed by the synthesis engine
//!
//! Everything the engine needs from version control goes through
//! [`HistoryDriver`], so the same orchestration runs against a real
//! repository ([`crate::GitDriver`]) or an in-memory one
//! ([`crate::MemoryDriver`]).

use chrono::{DateTime, FixedOffset, SecondsFormat, TimeDelta, Utc};
use serde::Serialize;

use crate::error::GitError;

/// Default marker file name, relative to the workspace
pub const DEFAULT_MARKER_FILE: &str = "data.txt";

/// Bootstrap commit date, `2021-02-01T10:00:00Z`, as seconds since the Unix epoch
pub const BOOTSTRAP_EPOCH_SECS: i64 = 1_612_173_600;

/// Message of the bootstrap commit
pub const BOOTSTRAP_MESSAGE: &str = "chore: initial project setup";

/// Message of the bootstrap commit when the targeted add failed
pub const BOOTSTRAP_FALLBACK_MESSAGE: &str = "chore: initial project setup (fallback)";

/// Message of every synthesized commit
pub const ACTIVITY_MESSAGE: &str = "feat: sync historical activity data";

/// Files added by the bootstrap commit when present
pub const DEFAULT_BOOTSTRAP_FILES: &[&str] =
    &[".gitignore", "Cargo.toml", "Cargo.lock", "README.md"];

/// The fixed date of the bootstrap commit
#[must_use]
pub fn bootstrap_date() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(BOOTSTRAP_EPOCH_SECS)
}

/// Render a timestamp as an ISO-8601 instant with millisecond precision
///
/// UTC renders with a `Z` suffix; other offsets are kept so the calendar day
/// stays the one the event was generated for.
#[must_use]
pub fn format_timestamp(timestamp: &DateTime<FixedOffset>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The line appended to the marker file for one synthesized event
#[must_use]
pub fn activity_line(timestamp: &DateTime<FixedOffset>) -> String {
    format!("Activity log: {}\n", format_timestamp(timestamp))
}

/// What `ensure_initialized` found or did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Bootstrap {
    /// A repository already existed; nothing was touched
    Existing,
    /// A repository was created with the targeted bootstrap files
    Created {
        /// The new root commit
        root: String,
    },
    /// A repository was created by adding every non-ignored file
    CreatedWithFallback {
        /// The new root commit
        root: String,
    },
}

impl Bootstrap {
    /// Whether this call created the repository
    #[must_use]
    pub fn created(&self) -> bool {
        !matches!(self, Bootstrap::Existing)
    }
}

/// Result of materializing one synthesized event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// A new commit was written
    Committed {
        /// The new commit id
        id: String,
    },
    /// The marker was appended but the tree matched HEAD, so no commit was needed
    NothingToCommit,
    /// The commit could not be made
    Failed {
        /// Underlying failure message
        cause: String,
    },
}

impl CommitOutcome {
    /// Whether the event counts as realized
    #[must_use]
    pub fn is_success(&self) -> bool {
        !matches!(self, CommitOutcome::Failed { .. })
    }
}

impl From<Result<Option<String>, GitError>> for CommitOutcome {
    fn from(result: Result<Option<String>, GitError>) -> Self {
        match result {
            Ok(Some(id)) => CommitOutcome::Committed { id },
            Ok(None) => CommitOutcome::NothingToCommit,
            Err(e) => CommitOutcome::Failed {
                cause: e.to_string(),
            },
        }
    }
}

/// Version-control capability used by the history engine
///
/// Implementations own one workspace. None of the methods are safe to call
/// concurrently against the same workspace from different drivers.
pub trait HistoryDriver {
    /// Whether the workspace already holds a repository
    fn is_initialized(&self) -> bool;

    /// Create the repository and its bootstrap commit if missing
    ///
    /// # Errors
    ///
    /// Returns an error if the repository can neither be opened nor created.
    fn ensure_initialized(&mut self) -> Result<Bootstrap, GitError>;

    /// Append an activity line and commit it with forged author and committer dates
    fn commit_at(&mut self, timestamp: &DateTime<FixedOffset>) -> CommitOutcome;

    /// Identifier of the single parentless commit reachable from HEAD
    ///
    /// # Errors
    ///
    /// Returns [`GitError::MultipleRoots`] if history has more than one root.
    fn find_root_commit(&self) -> Result<String, GitError>;

    /// Hard-reset the working tree, index and current branch to `target`
    ///
    /// # Errors
    ///
    /// Returns an error if `target` does not resolve or the reset fails.
    fn reset_hard(&mut self, target: &str) -> Result<(), GitError>;

    /// Delete the marker file; returns whether it existed
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    fn remove_marker(&mut self) -> Result<bool, GitError>;

    /// Discard every synthesized commit and the marker file
    ///
    /// # Errors
    ///
    /// Propagates failures from root lookup, reset or marker removal.
    fn reset_to_root(&mut self) -> Result<String, GitError> {
        let root = self.find_root_commit()?;
        self.reset_hard(&root)?;
        self.remove_marker()?;
        Ok(root)
    }
}
