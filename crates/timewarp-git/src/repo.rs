// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! libgit2-backed repository driver
//!
//! [`GitDriver`] owns one workspace directory. It never searches parent
//! directories for a repository: a workspace nested inside some other
//! checkout is treated as uninitialized and gets its own repository.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, Utc};
use git2::{
    ErrorCode, Index, IndexAddOption, IndexMatchedPath, Repository, RepositoryOpenFlags,
    ResetType, Signature, Sort, Time,
};
use tracing::{debug, info, warn};

use crate::commit::Commit;
use crate::driver::{
    ACTIVITY_MESSAGE, BOOTSTRAP_EPOCH_SECS, BOOTSTRAP_FALLBACK_MESSAGE, BOOTSTRAP_MESSAGE,
    Bootstrap, CommitOutcome, DEFAULT_BOOTSTRAP_FILES, DEFAULT_MARKER_FILE, HistoryDriver,
    activity_line,
};
use crate::error::GitError;
use crate::marker::MarkerFile;

/// Name and email written on commits when the repository config has none
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Author and committer name
    pub name: String,
    /// Author and committer email
    pub email: String,
}

impl Identity {
    /// Create an identity
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::new("timewarp", "timewarp@localhost")
    }
}

/// Repository driver for a single workspace
#[derive(Debug, Clone)]
pub struct GitDriver {
    workdir: PathBuf,
    marker: MarkerFile,
    identity: Identity,
    bootstrap_files: Vec<String>,
}

impl GitDriver {
    /// Create a driver for the workspace at `workdir` with default settings
    #[must_use]
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        let workdir = workdir.into();
        Self {
            marker: MarkerFile::new(&workdir, DEFAULT_MARKER_FILE),
            workdir,
            identity: Identity::default(),
            bootstrap_files: DEFAULT_BOOTSTRAP_FILES
                .iter()
                .map(|f| (*f).to_string())
                .collect(),
        }
    }

    /// Use a different marker file, relative to the workspace
    #[must_use]
    pub fn with_marker_file(mut self, relative: impl Into<PathBuf>) -> Self {
        self.marker = MarkerFile::new(&self.workdir, relative);
        self
    }

    /// Fallback identity for commits
    #[must_use]
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = identity;
        self
    }

    /// Files the bootstrap commit adds before resorting to the fallback
    #[must_use]
    pub fn with_bootstrap_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bootstrap_files = files.into_iter().map(Into::into).collect();
        self
    }

    /// The workspace directory
    #[must_use]
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// The marker file handle
    #[must_use]
    pub fn marker(&self) -> &MarkerFile {
        &self.marker
    }

    /// Open the repository rooted exactly at the workspace
    ///
    /// # Errors
    ///
    /// Returns `GitError::RepositoryNotFound` if the workspace is not a repository.
    pub fn open(&self) -> Result<Repository, GitError> {
        Repository::open_ext(
            &self.workdir,
            RepositoryOpenFlags::NO_SEARCH,
            std::iter::empty::<&OsStr>(),
        )
        .map_err(|_| GitError::RepositoryNotFound {
            path: self.workdir.display().to_string(),
        })
    }

    /// All commits reachable from HEAD, newest first
    ///
    /// # Errors
    ///
    /// Returns `GitError` if the repository cannot be opened or walked.
    pub fn commits(&self) -> Result<Vec<Commit>, GitError> {
        let repo = self.open()?;
        let mut revwalk = repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME | Sort::TOPOLOGICAL)?;
        if revwalk.push_head().is_err() {
            return Ok(Vec::new());
        }

        let mut commits = Vec::new();
        for oid in revwalk {
            let git_commit = repo.find_commit(oid?)?;
            commits.push(to_commit(&git_commit));
        }
        Ok(commits)
    }

    fn signature_at(&self, repo: &Repository, time: &Time) -> Result<Signature<'static>, GitError> {
        let (name, email) = match repo.signature() {
            Ok(sig) => (
                sig.name().unwrap_or(&self.identity.name).to_string(),
                sig.email().unwrap_or(&self.identity.email).to_string(),
            ),
            Err(_) => (self.identity.name.clone(), self.identity.email.clone()),
        };
        Ok(Signature::new(&name, &email, time)?)
    }

    /// Write the index as a commit on HEAD dated `time`
    ///
    /// Returns `None` when the resulting tree equals HEAD's tree.
    fn commit_index(
        &self,
        repo: &Repository,
        index: &mut Index,
        message: &str,
        time: &Time,
    ) -> Result<Option<String>, GitError> {
        let tree_id = index.write_tree()?;
        index.write()?;

        let parent = match repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => None,
            Err(e) => return Err(e.into()),
        };
        if parent.as_ref().is_some_and(|p| p.tree_id() == tree_id) {
            return Ok(None);
        }

        let tree = repo.find_tree(tree_id)?;
        let signature = self.signature_at(repo, time)?;
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        let oid = repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parents,
        )?;
        Ok(Some(oid.to_string()))
    }

    fn bootstrap_targeted(&self, repo: &Repository, time: &Time) -> Result<String, GitError> {
        let mut index = repo.index()?;
        for file in &self.bootstrap_files {
            let path = Path::new(file);
            if path == self.marker.relative_path() {
                continue;
            }
            index.add_path(path)?;
        }
        self.commit_index(repo, &mut index, BOOTSTRAP_MESSAGE, time)?
            .ok_or(GitError::EmptyHistory)
    }

    fn bootstrap_fallback(&self, repo: &Repository, time: &Time) -> Result<String, GitError> {
        let mut index = repo.index()?;
        index.clear()?;

        let marker = self.marker.relative_path().to_path_buf();
        let mut skip_marker = |path: &Path, _spec: &[u8]| -> i32 { i32::from(path == marker) };
        index.add_all(
            ["*"].iter(),
            IndexAddOption::DEFAULT,
            Some(&mut skip_marker as &mut IndexMatchedPath<'_>),
        )?;

        self.commit_index(repo, &mut index, BOOTSTRAP_FALLBACK_MESSAGE, time)?
            .ok_or(GitError::EmptyHistory)
    }

    fn try_commit_at(&self, timestamp: &DateTime<FixedOffset>) -> Result<Option<String>, GitError> {
        let repo = self.open()?;
        self.marker.append(&activity_line(timestamp))?;

        // add_path stages the file even when ignore rules match it
        let mut index = repo.index()?;
        index.add_path(self.marker.relative_path())?;

        self.commit_index(&repo, &mut index, ACTIVITY_MESSAGE, &git_time(timestamp))
    }
}

impl HistoryDriver for GitDriver {
    fn is_initialized(&self) -> bool {
        self.open().is_ok()
    }

    fn ensure_initialized(&mut self) -> Result<Bootstrap, GitError> {
        let repo = match self.open() {
            Ok(repo) if has_commits(&repo)? => return Ok(Bootstrap::Existing),
            Ok(repo) => {
                info!(
                    workdir = %self.workdir.display(),
                    "Repository has no commits, bootstrapping"
                );
                repo
            }
            Err(_) => {
                info!(workdir = %self.workdir.display(), "No repository found, bootstrapping");
                Repository::init(&self.workdir)?
            }
        };
        let time = Time::new(BOOTSTRAP_EPOCH_SECS, 0);

        match self.bootstrap_targeted(&repo, &time) {
            Ok(root) => {
                info!(root = %root, "Created bootstrap commit");
                Ok(Bootstrap::Created { root })
            }
            Err(e) => {
                warn!(error = %e, "Targeted bootstrap failed, adding all files instead");
                let root = self.bootstrap_fallback(&repo, &time)?;
                info!(root = %root, "Created fallback bootstrap commit");
                Ok(Bootstrap::CreatedWithFallback { root })
            }
        }
    }

    fn commit_at(&mut self, timestamp: &DateTime<FixedOffset>) -> CommitOutcome {
        let outcome = CommitOutcome::from(self.try_commit_at(timestamp));
        match &outcome {
            CommitOutcome::Committed { id } => debug!(%timestamp, commit = %id, "Committed"),
            CommitOutcome::NothingToCommit => {
                debug!(%timestamp, "Nothing to commit, activity still logged");
            }
            CommitOutcome::Failed { cause } => warn!(%timestamp, %cause, "Commit failed"),
        }
        outcome
    }

    fn find_root_commit(&self) -> Result<String, GitError> {
        let repo = self.open()?;
        let mut revwalk = repo.revwalk()?;
        revwalk
            .push_head()
            .map_err(|_| GitError::EmptyHistory)?;

        let mut roots = Vec::new();
        for oid in revwalk {
            let oid = oid?;
            if repo.find_commit(oid)?.parent_count() == 0 {
                roots.push(oid.to_string());
            }
        }

        match roots.len() {
            0 => Err(GitError::EmptyHistory),
            1 => Ok(roots.remove(0)),
            count => Err(GitError::MultipleRoots { count, roots }),
        }
    }

    fn reset_hard(&mut self, target: &str) -> Result<(), GitError> {
        let repo = self.open()?;
        let object = repo
            .revparse_single(target)
            .map_err(|_| GitError::InvalidReference {
                reference: target.to_string(),
            })?;
        repo.reset(&object, ResetType::Hard, None)?;
        info!(target = %target, "Hard reset complete");
        Ok(())
    }

    fn remove_marker(&mut self) -> Result<bool, GitError> {
        Ok(self.marker.remove()?)
    }
}

/// Convert a chrono timestamp into a git time keeping its offset
fn git_time(timestamp: &DateTime<FixedOffset>) -> Time {
    Time::new(
        timestamp.timestamp(),
        timestamp.offset().local_minus_utc() / 60,
    )
}

/// Whether HEAD points at a commit
fn has_commits(repo: &Repository) -> Result<bool, GitError> {
    match repo.head() {
        Ok(_) => Ok(true),
        Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn to_utc(time: Time) -> DateTime<Utc> {
    DateTime::from_timestamp(time.seconds(), 0).unwrap_or(DateTime::UNIX_EPOCH)
}

fn to_commit(git_commit: &git2::Commit<'_>) -> Commit {
    Commit {
        sha: git_commit.id().to_string(),
        message: git_commit.message().unwrap_or("").to_string(),
        authored_at: to_utc(git_commit.author().when()),
        committed_at: to_utc(git_commit.committer().when()),
        parents: git_commit.parent_ids().map(|id| id.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use similar_asserts::assert_eq;

    #[test]
    fn test_git_time_keeps_offset() {
        let ts = FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 4, 9, 30, 0)
            .unwrap();
        let time = git_time(&ts);
        assert_eq!(time.seconds(), ts.timestamp());
        assert_eq!(time.offset_minutes(), 120);
    }

    #[test]
    fn test_unrepresentable_git_time_maps_to_epoch() {
        assert_eq!(to_utc(Time::new(i64::MAX, 0)), DateTime::UNIX_EPOCH);
        assert_eq!(
            to_utc(Time::new(1_612_173_600, 60)),
            Utc.with_ymd_and_hms(2021, 2, 1, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_identity_default() {
        let identity = Identity::default();
        assert_eq!(identity.name, "timewarp");
        assert_eq!(identity.email, "timewarp@localhost");
    }

    #[test]
    fn test_builder_settings() {
        let driver = GitDriver::new("/tmp/ws")
            .with_marker_file("activity.log")
            .with_identity(Identity::new("A", "a@example.com"))
            .with_bootstrap_files(["README.md"]);

        assert_eq!(driver.workdir(), Path::new("/tmp/ws"));
        assert_eq!(driver.marker().relative_path(), Path::new("activity.log"));
        assert_eq!(driver.identity.name, "A");
        assert_eq!(driver.bootstrap_files, vec!["README.md".to_string()]);
    }

    #[test]
    fn test_missing_workspace_is_uninitialized() {
        let driver = GitDriver::new("/nonexistent/path/for/timewarp");
        assert!(!driver.is_initialized());
        match driver.open() {
            Err(GitError::RepositoryNotFound { path }) => assert!(path.contains("nonexistent")),
            Err(e) => panic!("Expected RepositoryNotFound, got {e}"),
            Ok(_) => panic!("Expected RepositoryNotFound, opened a repository"),
        }
    }
}
