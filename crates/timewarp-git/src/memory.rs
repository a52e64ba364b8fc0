//! In-memory repository driver
//!
//! Mirrors the observable behavior of [`crate::GitDriver`] without touching
//! the filesystem. Used for dry runs and for exercising the engine in tests.

use std::fmt;

use chrono::{DateTime, FixedOffset};

use crate::driver::{
    ACTIVITY_MESSAGE, BOOTSTRAP_MESSAGE, Bootstrap, CommitOutcome, HistoryDriver, activity_line,
    bootstrap_date,
};
use crate::error::GitError;

type EventPredicate = Box<dyn Fn(&DateTime<FixedOffset>) -> bool + Send + Sync>;

/// A commit held by [`MemoryDriver`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryCommit {
    /// Synthetic 40-character id
    pub id: String,
    /// Commit message
    pub message: String,
    /// Author and committer date
    pub timestamp: DateTime<FixedOffset>,
    /// Parent id, `None` for roots
    pub parent: Option<String>,
}

/// Repository driver backed by plain vectors
pub struct MemoryDriver {
    initialized: bool,
    commits: Vec<MemoryCommit>,
    marker: Option<Vec<String>>,
    next_id: u64,
    bootstrap_calls: usize,
    fail_when: Option<EventPredicate>,
    noop_when: Option<EventPredicate>,
}

impl fmt::Debug for MemoryDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDriver")
            .field("initialized", &self.initialized)
            .field("commits", &self.commits.len())
            .field("marker_lines", &self.marker.as_ref().map(Vec::len))
            .finish_non_exhaustive()
    }
}

impl Default for MemoryDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDriver {
    /// An uninitialized workspace
    #[must_use]
    pub fn new() -> Self {
        Self {
            initialized: false,
            commits: Vec::new(),
            marker: None,
            next_id: 1,
            bootstrap_calls: 0,
            fail_when: None,
            noop_when: None,
        }
    }

    /// A workspace that already holds a bootstrapped repository
    #[must_use]
    pub fn bootstrapped() -> Self {
        let mut driver = Self::new();
        driver.bootstrap();
        driver
    }

    /// Make every commit whose timestamp matches `predicate` fail
    #[must_use]
    pub fn fail_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&DateTime<FixedOffset>) -> bool + Send + Sync + 'static,
    {
        self.fail_when = Some(Box::new(predicate));
        self
    }

    /// Make every commit whose timestamp matches `predicate` report nothing to commit
    #[must_use]
    pub fn noop_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&DateTime<FixedOffset>) -> bool + Send + Sync + 'static,
    {
        self.noop_when = Some(Box::new(predicate));
        self
    }

    /// Add a second parentless commit, as a grafted or tampered history would have
    #[must_use]
    pub fn with_extra_root(mut self) -> Self {
        let id = self.allocate_id();
        self.commits.push(MemoryCommit {
            id,
            message: "graft".to_string(),
            timestamp: bootstrap_date().fixed_offset(),
            parent: None,
        });
        self
    }

    /// Commits in creation order, root first
    #[must_use]
    pub fn commits(&self) -> &[MemoryCommit] {
        &self.commits
    }

    /// Marker lines, or `None` when the marker file does not exist
    #[must_use]
    pub fn marker_lines(&self) -> Option<&[String]> {
        self.marker.as_deref()
    }

    /// How many times a repository was created
    #[must_use]
    pub fn bootstrap_calls(&self) -> usize {
        self.bootstrap_calls
    }

    fn allocate_id(&mut self) -> String {
        let id = format!("{:040x}", self.next_id);
        self.next_id += 1;
        id
    }

    fn bootstrap(&mut self) -> String {
        let id = self.allocate_id();
        self.commits.push(MemoryCommit {
            id: id.clone(),
            message: BOOTSTRAP_MESSAGE.to_string(),
            timestamp: bootstrap_date().fixed_offset(),
            parent: None,
        });
        self.initialized = true;
        self.bootstrap_calls += 1;
        id
    }

    fn matches(predicate: Option<&EventPredicate>, timestamp: &DateTime<FixedOffset>) -> bool {
        predicate.is_some_and(|p| p(timestamp))
    }
}

impl HistoryDriver for MemoryDriver {
    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn ensure_initialized(&mut self) -> Result<Bootstrap, GitError> {
        if self.initialized {
            return Ok(Bootstrap::Existing);
        }
        let root = self.bootstrap();
        Ok(Bootstrap::Created { root })
    }

    fn commit_at(&mut self, timestamp: &DateTime<FixedOffset>) -> CommitOutcome {
        if !self.initialized {
            return CommitOutcome::Failed {
                cause: "Repository not found: <memory>".to_string(),
            };
        }
        // Written before the commit step, as GitDriver does
        self.marker
            .get_or_insert_with(Vec::new)
            .push(activity_line(timestamp));

        if Self::matches(self.fail_when.as_ref(), timestamp) {
            return CommitOutcome::Failed {
                cause: format!("simulated failure at {timestamp}"),
            };
        }
        if Self::matches(self.noop_when.as_ref(), timestamp) {
            return CommitOutcome::NothingToCommit;
        }

        let parent = self.commits.last().map(|c| c.id.clone());
        let id = self.allocate_id();
        self.commits.push(MemoryCommit {
            id: id.clone(),
            message: ACTIVITY_MESSAGE.to_string(),
            timestamp: *timestamp,
            parent,
        });
        CommitOutcome::Committed { id }
    }

    fn find_root_commit(&self) -> Result<String, GitError> {
        if !self.initialized {
            return Err(GitError::RepositoryNotFound {
                path: "<memory>".to_string(),
            });
        }
        let roots: Vec<String> = self
            .commits
            .iter()
            .filter(|c| c.parent.is_none())
            .map(|c| c.id.clone())
            .collect();
        match roots.as_slice() {
            [] => Err(GitError::EmptyHistory),
            [root] => Ok(root.clone()),
            _ => Err(GitError::MultipleRoots {
                count: roots.len(),
                roots,
            }),
        }
    }

    fn reset_hard(&mut self, target: &str) -> Result<(), GitError> {
        let position = self
            .commits
            .iter()
            .position(|c| c.id == target)
            .ok_or_else(|| GitError::InvalidReference {
                reference: target.to_string(),
            })?;
        self.commits.truncate(position + 1);
        Ok(())
    }

    fn remove_marker(&mut self) -> Result<bool, GitError> {
        Ok(self.marker.take().is_some())
    }
}
