//! Resetting a workspace back to its bootstrap commit

use timewarp_git::{GitError, HistoryDriver};
use tracing::info;

/// Result of a reset request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetOutcome {
    /// The workspace holds no repository; nothing was touched
    NoRepository,
    /// History was reset to the root commit and the marker removed
    Reset {
        /// The root commit history now ends at
        root: String,
    },
}

/// Discard synthesized history, returning the workspace to its bootstrap state
///
/// The hard reset itself is not rolled back if a later step fails.
///
/// # Errors
///
/// Returns an error if the root commit cannot be determined, the reset
/// fails, or the marker file cannot be removed.
pub fn reset_history<D: HistoryDriver + ?Sized>(driver: &mut D) -> Result<ResetOutcome, GitError> {
    if !driver.is_initialized() {
        info!("No repository found, nothing to reset");
        return Ok(ResetOutcome::NoRepository);
    }

    let root = driver.reset_to_root()?;
    info!(root = %root, "History reset to root commit");
    Ok(ResetOutcome::Reset { root })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use similar_asserts::assert_eq;
    use timewarp_git::MemoryDriver;

    #[test]
    fn test_reset_without_repository() {
        let mut driver = MemoryDriver::new();
        assert_eq!(
            reset_history(&mut driver).expect("reset"),
            ResetOutcome::NoRepository
        );
        assert!(!driver.is_initialized());
    }

    #[test]
    fn test_reset_discards_synthesized_commits() {
        let mut driver = MemoryDriver::bootstrapped();
        let root = driver.find_root_commit().expect("root");
        let when = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 2, 10, 0, 0)
            .unwrap();
        driver.commit_at(&when);

        let outcome = reset_history(&mut driver).expect("reset");
        assert_eq!(outcome, ResetOutcome::Reset { root: root.clone() });
        assert_eq!(driver.commits().len(), 1);
        assert!(driver.marker_lines().is_none());

        // A second reset is harmless
        let again = reset_history(&mut driver).expect("reset");
        assert_eq!(again, ResetOutcome::Reset { root });
    }

    #[test]
    fn test_reset_with_multiple_roots_fails() {
        let mut driver = MemoryDriver::bootstrapped().with_extra_root();
        assert!(matches!(
            reset_history(&mut driver),
            Err(GitError::MultipleRoots { .. })
        ));
        assert_eq!(driver.commits().len(), 2);
    }
}
