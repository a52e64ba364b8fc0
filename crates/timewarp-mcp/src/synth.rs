//! Per-day commit synthesis
//!
//! For one calendar day the synthesizer decides whether any activity
//! happens, how many commits it produces and when each lands, then asks the
//! repository driver to realize them.

use std::ops::RangeInclusive;

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use rand::Rng;
use timewarp_git::{CommitOutcome, HistoryDriver};
use tracing::{debug, warn};

use crate::dates::{at_time, is_weekend};
use crate::validation::Intensity;

/// Weekend probability relative to the weekday intensity
pub const WEEKEND_FACTOR: f64 = 0.3;

/// Weekend probability never drops below this
pub const WEEKEND_FLOOR: f64 = 0.05;

/// Hours an event may start in
pub const WORK_HOURS: RangeInclusive<u32> = 9..=20;

/// Number of commits on a day that fires
pub const EVENTS_PER_ACTIVE_DAY: RangeInclusive<u32> = 1..=3;

/// Probability that a day produces any commits
#[must_use]
pub fn firing_probability(intensity: Intensity, weekend: bool) -> f64 {
    if weekend {
        (intensity.value() * WEEKEND_FACTOR).max(WEEKEND_FLOOR)
    } else {
        intensity.value()
    }
}

/// What happened on one synthesized day
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayOutcome {
    /// Realized event timestamps in generation order
    pub commits: Vec<DateTime<FixedOffset>>,
    /// Events that were realized without a new commit
    pub no_ops: usize,
    /// Events the driver failed to realize
    pub failed: usize,
}

impl DayOutcome {
    /// Number of events planned for the day
    #[must_use]
    pub fn planned(&self) -> usize {
        self.commits.len() + self.failed
    }
}

/// Plans and realizes commit events for individual days
#[derive(Debug)]
pub struct CommitSynthesizer<R> {
    rng: R,
    intensity: Intensity,
}

impl<R: Rng> CommitSynthesizer<R> {
    /// Create a synthesizer drawing from `rng`
    pub fn new(rng: R, intensity: Intensity) -> Self {
        Self { rng, intensity }
    }

    /// The intensity in effect
    pub fn intensity(&self) -> Intensity {
        self.intensity
    }

    /// Pick the event times for `day` without touching any repository
    pub fn plan<Tz: TimeZone>(&mut self, tz: &Tz, day: NaiveDate) -> Vec<DateTime<Tz>> {
        let probability = firing_probability(self.intensity, is_weekend(&day));
        let roll: f64 = self.rng.random();
        if roll >= probability {
            return Vec::new();
        }

        let count = self.rng.random_range(EVENTS_PER_ACTIVE_DAY);
        (0..count)
            .map(|_| {
                let hour = self.rng.random_range(WORK_HOURS);
                let minute = self.rng.random_range(0..60);
                at_time(tz, day, hour, minute)
            })
            .collect()
    }

    /// Plan `day` and commit each event through `driver`
    pub fn synthesize<D, Tz>(&mut self, driver: &mut D, tz: &Tz, day: NaiveDate) -> DayOutcome
    where
        D: HistoryDriver + ?Sized,
        Tz: TimeZone,
    {
        let mut outcome = DayOutcome::default();
        for event in self.plan(tz, day) {
            let timestamp = event.fixed_offset();
            match driver.commit_at(&timestamp) {
                CommitOutcome::Committed { .. } => outcome.commits.push(timestamp),
                CommitOutcome::NothingToCommit => {
                    debug!(%timestamp, "No changes to commit, keeping event");
                    outcome.no_ops += 1;
                    outcome.commits.push(timestamp);
                }
                CommitOutcome::Failed { cause } => {
                    warn!(%timestamp, %cause, "Dropping event after commit failure");
                    outcome.failed += 1;
                }
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike, Utc};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use similar_asserts::assert_eq;
    use timewarp_git::MemoryDriver;

    fn intensity(value: f64) -> Intensity {
        Intensity::new(value).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_weekday_probability_is_intensity() {
        assert_eq!(firing_probability(intensity(0.7), false), 0.7);
        assert_eq!(firing_probability(intensity(0.0), false), 0.0);
    }

    #[test]
    fn test_weekend_probability_scaled_with_floor() {
        assert!((firing_probability(intensity(1.0), true) - 0.3).abs() < 1e-12);
        assert_eq!(firing_probability(intensity(0.1), true), 0.05);
        assert_eq!(firing_probability(intensity(0.0), true), 0.05);
    }

    #[test]
    fn test_full_intensity_weekday_always_fires() {
        let monday = date(2024, 1, 1);
        for seed in 0..50 {
            let mut synth = CommitSynthesizer::new(StdRng::seed_from_u64(seed), intensity(1.0));
            let events = synth.plan(&Utc, monday);
            assert!(
                EVENTS_PER_ACTIVE_DAY.contains(&(events.len() as u32)),
                "seed {seed} produced {} events",
                events.len()
            );
            for event in events {
                assert_eq!(event.date_naive(), monday);
                assert!(WORK_HOURS.contains(&event.hour()));
                assert!(event.minute() < 60);
                assert_eq!(event.second(), 0);
            }
        }
    }

    #[test]
    fn test_zero_intensity_weekday_never_fires() {
        let tuesday = date(2024, 1, 2);
        let mut synth = CommitSynthesizer::new(StdRng::seed_from_u64(7), intensity(0.0));
        for _ in 0..200 {
            assert!(synth.plan(&Utc, tuesday).is_empty());
        }
    }

    #[test]
    fn test_zero_intensity_weekend_uses_floor() {
        let saturday = date(2024, 1, 6);
        assert_eq!(saturday.weekday(), chrono::Weekday::Sat);
        let mut synth = CommitSynthesizer::new(StdRng::seed_from_u64(42), intensity(0.0));
        let active = (0..4000)
            .filter(|_| !synth.plan(&Utc, saturday).is_empty())
            .count();
        // 5% of 4000 is 200; leave a wide margin for sampling noise
        assert!((100..=300).contains(&active), "active weekend days: {active}");
    }

    #[test]
    fn test_synthesize_commits_each_event() {
        let mut driver = MemoryDriver::bootstrapped();
        let mut synth = CommitSynthesizer::new(StdRng::seed_from_u64(3), intensity(1.0));
        let outcome = synth.synthesize(&mut driver, &Utc, date(2024, 1, 3));

        assert!(!outcome.commits.is_empty());
        assert_eq!(outcome.failed, 0);
        assert_eq!(driver.commits().len(), 1 + outcome.commits.len());
        assert_eq!(
            driver.marker_lines().map(<[String]>::len),
            Some(outcome.commits.len())
        );
    }

    #[test]
    fn test_synthesize_drops_failed_events() {
        let mut driver = MemoryDriver::bootstrapped().fail_when(|_| true);
        let mut synth = CommitSynthesizer::new(StdRng::seed_from_u64(11), intensity(1.0));
        let outcome = synth.synthesize(&mut driver, &Utc, date(2024, 1, 4));

        assert!(outcome.commits.is_empty());
        assert!(EVENTS_PER_ACTIVE_DAY.contains(&(outcome.failed as u32)));
        assert_eq!(outcome.planned(), outcome.failed);
        assert_eq!(driver.commits().len(), 1);
    }

    #[test]
    fn test_synthesize_keeps_noop_events() {
        let mut driver = MemoryDriver::bootstrapped().noop_when(|_| true);
        let mut synth = CommitSynthesizer::new(StdRng::seed_from_u64(5), intensity(1.0));
        let outcome = synth.synthesize(&mut driver, &Utc, date(2024, 1, 5));

        assert!(!outcome.commits.is_empty());
        assert_eq!(outcome.no_ops, outcome.commits.len());
        assert_eq!(driver.commits().len(), 1);
    }

    #[test]
    fn test_seeded_plans_are_reproducible() {
        let day = date(2024, 2, 14);
        let mut a = CommitSynthesizer::new(StdRng::seed_from_u64(99), intensity(0.8));
        let mut b = CommitSynthesizer::new(StdRng::seed_from_u64(99), intensity(0.8));
        for offset in 0..30 {
            let day = day + chrono::Days::new(offset);
            assert_eq!(a.plan(&Utc, day), b.plan(&Utc, day));
        }
    }
}
