//! Chronic/acute training-load engine
//!
//! Converts a dated stream of per-activity stress scores into the classic
//! fitness/fatigue/form triple via exponential weighted moving averages:
//! CTL over a 42-day horizon, ATL over 7 days, TSB as their difference.
//!
//! The walk is date-by-date, not activity-by-activity, so rest days decay
//! the averages exactly like training days raise them.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::effort::EffortClassifier;
use crate::models::{ActivityRecord, AthleteProfile};

/// ---------------------------------------------------------------------------
/// Constants
/// ---------------------------------------------------------------------------

/// EWMA time constants in days.
const CTL_DAYS: f64 = 42.0;
const ATL_DAYS: f64 = 7.0;

/// Stress-score scale: one hour at threshold intensity = 100 points.
const TSS_PER_HOUR_AT_THRESHOLD: f64 = 100.0;

/// ---------------------------------------------------------------------------
/// Output Types
/// ---------------------------------------------------------------------------

/// One date's fitness state. Values are rounded to 2 decimal places, and the
/// series is deterministic in the input TSS sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingLoadPoint {
  pub date: NaiveDate,
  /// Chronic training load ("fitness").
  pub ctl: f64,
  /// Acute training load ("fatigue").
  pub atl: f64,
  /// Training stress balance, ctl - atl ("form").
  pub tsb: f64,
}

/// Seed values carried over from a previously stored point, for resuming a
/// series mid-history instead of re-walking from zero.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LoadSeed {
  pub ctl: f64,
  pub atl: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadGranularity {
  /// One point for every calendar day in the walked range.
  #[default]
  Daily,
  /// Only the days on which at least one activity happened.
  ActivityDates,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
  /// First date of the walk. Defaults to the earliest activity date.
  pub start_date: Option<NaiveDate>,
  /// Prior ctl/atl when start_date sits mid-history. Defaults to zero.
  pub seed: Option<LoadSeed>,
  pub granularity: LoadGranularity,
}

/// ---------------------------------------------------------------------------
/// Engine
/// ---------------------------------------------------------------------------

/// Compute the CTL/ATL/TSB series for an activity history.
///
/// Activities without a date, or with a negative stress estimate, are
/// excluded rather than failing the whole series. An empty history returns
/// an empty series, not an error.
pub fn compute_load_series(
  activities: &[ActivityRecord],
  profile: &AthleteProfile,
  options: LoadOptions,
) -> Vec<TrainingLoadPoint> {
  let classifier = EffortClassifier::new(activities, profile);

  // Daily TSS totals keyed by date. BTreeMap keeps the walk chronological.
  let mut daily_tss: BTreeMap<NaiveDate, f64> = BTreeMap::new();
  let mut excluded = 0usize;

  for activity in activities {
    let Some(date) = activity.date else {
      excluded += 1;
      continue;
    };
    let tss = activity
      .training_stress_score
      .unwrap_or_else(|| estimate_tss(activity, &classifier));
    if !tss.is_finite() || tss < 0.0 {
      excluded += 1;
      continue;
    }
    *daily_tss.entry(date).or_insert(0.0) += tss;
  }

  if excluded > 0 {
    debug!(excluded, "load series: excluded undated or malformed activities");
  }

  let Some((&first_activity_date, _)) = daily_tss.first_key_value() else {
    return Vec::new();
  };
  let last_date = daily_tss.keys().next_back().copied().unwrap_or(first_activity_date);

  let start = options.start_date.unwrap_or(first_activity_date);
  if start > last_date {
    return Vec::new();
  }

  let seed = options.seed.unwrap_or_default();
  let mut ctl = seed.ctl;
  let mut atl = seed.atl;
  let mut series = Vec::new();

  let mut date = start;
  while date <= last_date {
    let tss_today = daily_tss.get(&date).copied().unwrap_or(0.0);

    ctl += (tss_today - ctl) / CTL_DAYS;
    atl += (tss_today - atl) / ATL_DAYS;

    let include = match options.granularity {
      LoadGranularity::Daily => true,
      LoadGranularity::ActivityDates => daily_tss.contains_key(&date),
    };
    if include {
      series.push(TrainingLoadPoint {
        date,
        ctl: round2(ctl),
        atl: round2(atl),
        tsb: round2(ctl - atl),
      });
    }

    match date.succ_opt() {
      Some(next) => date = next,
      None => break,
    }
  }

  series
}

/// Estimate a stress score for an activity that has none recorded:
/// duration in hours x 100 x an intensity factor from the effort rating.
pub fn estimate_tss(activity: &ActivityRecord, classifier: &EffortClassifier) -> f64 {
  let rating = classifier.classify(activity);
  activity.duration_hours() * TSS_PER_HOUR_AT_THRESHOLD * rating.effort.intensity_factor()
}

fn round2(value: f64) -> f64 {
  (value * 100.0).round() / 100.0
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::assert_approx_eq;
  use crate::test_utils::{date, mock_profile, run_on, run_with_tss};

  #[test]
  fn test_empty_history_returns_empty_series() {
    let series = compute_load_series(&[], &mock_profile(), LoadOptions::default());
    assert!(series.is_empty());
  }

  #[test]
  fn test_single_spike_decay_rates() {
    // One 300-TSS day followed by 41 days of rest
    let profile = mock_profile();
    let mut activities = vec![run_with_tss(date(2024, 1, 1), 300.0)];
    // A zero-TSS marker on the final day extends the walk without load
    activities.push(run_with_tss(date(2024, 2, 11), 0.0));

    let series = compute_load_series(&activities, &profile, LoadOptions::default());
    assert_eq!(series.len(), 42);

    let peak_ctl = series[0].ctl;
    let last = series.last().unwrap();

    // Day 1: ctl = 300/42 ≈ 7.14, atl = 300/7 ≈ 42.86, deeply fatigued
    assert_approx_eq!(peak_ctl, 7.14, 0.01);
    assert_approx_eq!(series[0].atl, 42.86, 0.01);
    assert!(series[0].tsb < 0.0);

    // ATL (7-day constant) must fall below CTL (42-day) within 2-3 weeks
    let crossover = series.iter().position(|p| p.tsb > 0.0);
    assert!(crossover.is_some(), "tsb never went positive");
    let crossover = crossover.unwrap();
    assert!(
      (7..=21).contains(&crossover),
      "expected freshness between day 8 and 21, got day {}",
      crossover + 1
    );

    // CTL decayed to under half its peak by day 42
    assert!(
      last.ctl < peak_ctl / 2.0,
      "ctl {} did not decay below half of peak {}",
      last.ctl,
      peak_ctl
    );
  }

  #[test]
  fn test_rest_days_decay_between_activities() {
    let profile = mock_profile();
    let activities = vec![
      run_with_tss(date(2024, 3, 1), 100.0),
      run_with_tss(date(2024, 3, 8), 100.0),
    ];

    let series = compute_load_series(&activities, &profile, LoadOptions::default());
    assert_eq!(series.len(), 8);

    // ATL decays across the 6 rest days before the next spike
    let after_first = series[0].atl;
    let before_second = series[6].atl;
    assert!(before_second < after_first);

    // Every day between the two runs is present in the daily series
    for window in series.windows(2) {
      assert_eq!(window[1].date, window[0].date.succ_opt().unwrap());
    }
  }

  #[test]
  fn test_activity_date_granularity() {
    let profile = mock_profile();
    let activities = vec![
      run_with_tss(date(2024, 3, 1), 100.0),
      run_with_tss(date(2024, 3, 8), 100.0),
    ];

    let options = LoadOptions {
      granularity: LoadGranularity::ActivityDates,
      ..LoadOptions::default()
    };
    let series = compute_load_series(&activities, &profile, options);

    assert_eq!(series.len(), 2);
    assert_eq!(series[0].date, date(2024, 3, 1));
    assert_eq!(series[1].date, date(2024, 3, 8));

    // The skipped rest days still decayed the second point
    let daily = compute_load_series(&activities, &profile, LoadOptions::default());
    assert_eq!(series[1], *daily.last().unwrap());
  }

  #[test]
  fn test_seeded_continuation_matches_full_walk() {
    let profile = mock_profile();
    let activities: Vec<_> = (0..20)
      .map(|i| run_with_tss(date(2024, 1, 1) + chrono::Duration::days(i), 60.0))
      .collect();

    let full = compute_load_series(&activities, &profile, LoadOptions::default());

    // Resume from day 10 using day 10's stored values as the seed
    let seed_point = full[9];
    let tail: Vec<_> = activities[10..].to_vec();
    let options = LoadOptions {
      start_date: Some(date(2024, 1, 11)),
      seed: Some(LoadSeed {
        ctl: seed_point.ctl,
        atl: seed_point.atl,
      }),
      ..LoadOptions::default()
    };
    let resumed = compute_load_series(&tail, &profile, options);

    assert_eq!(resumed.len(), 10);
    for (a, b) in resumed.iter().zip(full[10..].iter()) {
      assert_eq!(a.date, b.date);
      // Seeding from rounded values keeps the continuation within rounding
      // distance of the unbroken walk
      assert_approx_eq!(a.ctl, b.ctl, 0.05);
      assert_approx_eq!(a.atl, b.atl, 0.05);
    }
  }

  #[test]
  fn test_undated_activities_are_excluded() {
    let profile = mock_profile();
    let mut undated = run_with_tss(date(2024, 3, 1), 100.0);
    undated.date = None;

    let activities = vec![undated, run_with_tss(date(2024, 3, 2), 50.0)];
    let series = compute_load_series(&activities, &profile, LoadOptions::default());

    assert_eq!(series.len(), 1);
    assert_approx_eq!(series[0].atl, 50.0 / 7.0, 0.01);
  }

  #[test]
  fn test_tss_estimated_from_effort_when_absent() {
    let profile = mock_profile();
    // 1 hour with avg HR 170 (89% of 190) -> hard -> IF 1.0 -> TSS 100
    let activity = run_on(date(2024, 3, 1), 10000.0, 3600.0, Some(170));

    let series = compute_load_series(&[activity], &profile, LoadOptions::default());
    assert_eq!(series.len(), 1);
    assert_approx_eq!(series[0].atl, 100.0 / 7.0, 0.01);
    assert_approx_eq!(series[0].ctl, 100.0 / 42.0, 0.01);
  }

  #[test]
  fn test_determinism() {
    let profile = mock_profile();
    let activities: Vec<_> = (0..30)
      .map(|i| run_on(date(2024, 1, 1) + chrono::Duration::days(i), 8000.0, 2700.0, Some(150)))
      .collect();

    let a = compute_load_series(&activities, &profile, LoadOptions::default());
    let b = compute_load_series(&activities, &profile, LoadOptions::default());
    assert_eq!(a, b);
  }
}
