//! Test utilities and helpers
//!
//! Mock data factories and assertion helpers shared by the per-module test
//! suites. All fixtures are anchored to fixed calendar dates so every test
//! is deterministic regardless of when it runs.

use chrono::{Duration, NaiveDate};

use crate::models::{ActivityRecord, AthleteProfile};

/// Fixed anchor for relative-date fixtures.
const ANCHOR: (i32, u32, u32) = (2024, 7, 1);

/// ---------------------------------------------------------------------------
/// Date Helpers
/// ---------------------------------------------------------------------------

/// Shorthand for a calendar date; panics only on impossible literals, which
/// is fine in tests.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

fn anchor() -> NaiveDate {
  date(ANCHOR.0, ANCHOR.1, ANCHOR.2)
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

/// Profile with a measured max HR of 190 and resting HR of 50.
pub fn mock_profile() -> AthleteProfile {
  AthleteProfile {
    max_heart_rate: Some(190),
    resting_heart_rate: Some(50),
    ..AthleteProfile::default()
  }
}

/// A run on a specific date with optional average HR.
pub fn run_on(
  date: NaiveDate,
  distance_meters: f64,
  duration_seconds: f64,
  avg_heart_rate: Option<i64>,
) -> ActivityRecord {
  ActivityRecord {
    date: Some(date),
    distance_meters,
    duration_seconds,
    avg_heart_rate,
    max_heart_rate: None,
    elevation_gain_meters: None,
    training_stress_score: None,
  }
}

/// A run `days_ago` before the fixed anchor date, no HR data.
pub fn run(days_ago: i64, distance_meters: f64, duration_seconds: f64) -> ActivityRecord {
  run_on(anchor() - Duration::days(days_ago), distance_meters, duration_seconds, None)
}

/// A run `days_ago` before the anchor with an average HR.
pub fn run_with_hr(
  days_ago: i64,
  distance_meters: f64,
  duration_seconds: f64,
  avg_heart_rate: i64,
) -> ActivityRecord {
  run_on(
    anchor() - Duration::days(days_ago),
    distance_meters,
    duration_seconds,
    Some(avg_heart_rate),
  )
}

/// A dated activity with an explicit stress score, for load-series tests.
pub fn run_with_tss(date: NaiveDate, tss: f64) -> ActivityRecord {
  ActivityRecord {
    date: Some(date),
    distance_meters: 10000.0,
    duration_seconds: 3600.0,
    avg_heart_rate: None,
    max_heart_rate: None,
    elevation_gain_meters: None,
    training_stress_score: Some(tss),
  }
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {
    let diff = ($left - $right).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  };
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_factories_produce_valid_records() {
    let profile = mock_profile();
    assert_eq!(profile.max_heart_rate, Some(190));
    assert_eq!(profile.effective_max_hr(), 190);

    let activity = run(3, 10000.0, 3000.0);
    assert_eq!(activity.date, Some(date(2024, 6, 28)));
    assert_eq!(activity.pace_secs_per_km(), Some(300.0));

    let with_hr = run_with_hr(0, 5000.0, 1500.0, 150);
    assert_eq!(with_hr.avg_heart_rate, Some(150));

    let with_tss = run_with_tss(date(2024, 1, 1), 80.0);
    assert_eq!(with_tss.training_stress_score, Some(80.0));
  }

  #[test]
  fn test_approx_eq_macro() {
    assert_approx_eq!(1.0_f64, 1.004, 0.01);
  }
}
