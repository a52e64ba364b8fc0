// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for timewarp-git

use thiserror::Error;

/// Errors that can occur while driving the repository
#[derive(Debug, Error)]
pub enum GitError {
    /// Error from git2 library
    #[error("Git error: {0}")]
    Git2(#[from] git2::Error),

    /// Filesystem error while touching the marker file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Repository not found at the specified path
    #[error("Repository not found: {path}")]
    RepositoryNotFound {
        /// The path that was expected to hold a repository
        path: String,
    },

    /// HEAD does not resolve to any commit
    #[error("Repository has no commits")]
    EmptyHistory,

    /// History reachable from HEAD has more than one parentless commit
    #[error("Expected a single root commit, found {count}: {}", roots.join(", "))]
    MultipleRoots {
        /// Number of root commits found
        count: usize,
        /// Identifiers of every root commit, in walk order
        roots: Vec<String>,
    },

    /// Invalid commit reference (branch, tag, or SHA)
    #[error("Invalid commit reference: {reference}")]
    InvalidReference {
        /// The reference string that could not be resolved
        reference: String,
    },
}
