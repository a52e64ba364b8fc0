//! Commit records read back from a repository

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A commit as observed in the repository history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// The commit SHA (40 hex characters)
    pub sha: String,
    /// Commit message
    pub message: String,
    /// Author date
    pub authored_at: DateTime<Utc>,
    /// Committer date
    pub committed_at: DateTime<Utc>,
    /// Parent commit SHAs
    pub parents: Vec<String>,
}

impl Commit {
    /// Check if this is a root commit (has no parents)
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// Whether author and committer dates agree, as they do for every forged commit
    #[must_use]
    pub fn has_matching_dates(&self) -> bool {
        self.authored_at == self.committed_at
    }

    /// Get the first line of the commit message (subject)
    #[must_use]
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}
