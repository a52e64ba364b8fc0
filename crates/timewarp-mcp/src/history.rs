//! Range orchestration
//!
//! Walks a closed range of calendar days, synthesizing each one, and
//! aggregates the realized commits in chronological day order.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use rand::Rng;
use serde::Serialize;
use timewarp_git::{Bootstrap, GitError, HistoryDriver};
use tracing::{debug, info};

use crate::dates::{add_days, days_inclusive};
use crate::synth::CommitSynthesizer;

/// A closed range of calendar days with `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Build a range; `None` if `start` is after `end`
    #[must_use]
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// First day
    #[must_use]
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day, inclusive
    #[must_use]
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days in the range, never zero
    #[must_use]
    pub fn day_count(&self) -> u64 {
        days_inclusive(self.start, self.end)
    }

    /// Every day from `start` to `end`
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        std::iter::successors(Some(self.start), move |current| add_days(*current, 1))
            .take_while(move |current| *current <= end)
    }
}

/// Aggregate result of one generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryOutcome {
    /// What the bootstrap step did
    pub bootstrap: Bootstrap,
    /// Realized commit timestamps in day order
    pub commits: Vec<DateTime<FixedOffset>>,
    /// Calendar days visited
    pub days_visited: u64,
    /// Events dropped after a commit failure
    pub failed_events: usize,
    /// Events realized without a new commit
    pub no_op_events: usize,
}

impl HistoryOutcome {
    /// Number of realized commits
    #[must_use]
    pub fn total_commits(&self) -> usize {
        self.commits.len()
    }
}

/// Synthesize history for every day in `range`
///
/// The repository is bootstrapped first if needed. Per-event failures are
/// counted and skipped; commits made before a failure stay in history.
///
/// # Errors
///
/// Returns an error only if the repository cannot be initialized.
pub fn generate_history<D, R, Tz>(
    driver: &mut D,
    synthesizer: &mut CommitSynthesizer<R>,
    tz: &Tz,
    range: DateRange,
) -> Result<HistoryOutcome, GitError>
where
    D: HistoryDriver + ?Sized,
    R: Rng,
    Tz: TimeZone,
{
    let bootstrap = driver.ensure_initialized()?;
    if bootstrap.created() {
        info!(?bootstrap, "Repository bootstrapped");
    }

    let mut outcome = HistoryOutcome {
        bootstrap,
        commits: Vec::new(),
        days_visited: 0,
        failed_events: 0,
        no_op_events: 0,
    };

    for day in range.days() {
        let day_outcome = synthesizer.synthesize(&mut *driver, tz, day);
        debug!(%day, commits = day_outcome.commits.len(), "Synthesized day");
        outcome.days_visited += 1;
        outcome.failed_events += day_outcome.failed;
        outcome.no_op_events += day_outcome.no_ops;
        outcome.commits.extend(day_outcome.commits);
    }

    info!(
        start = %range.start(),
        end = %range.end(),
        intensity = synthesizer.intensity().value(),
        commits = outcome.total_commits(),
        failed = outcome.failed_events,
        "History generated"
    );
    Ok(outcome)
}
