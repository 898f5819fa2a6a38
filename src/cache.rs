//! Prediction memoization
//!
//! Predictions are O(n) over the activity list and UI layers tend to ask for
//! the same one on every re-render. This is a least-recently-computed cache
//! of depth 1, keyed by a cheap fingerprint of the input list. It is an
//! explicit object the caller owns and injects, never module state, so the
//! engines stay pure and trivially testable.

use std::hash::{Hash, Hasher};

use crate::models::{ActivityRecord, AthleteProfile};
use crate::predictor::{predict, PredictionResult};

/// Number of trailing records hashed into the fingerprint. New activities
/// arrive at the ends of the list, so the count plus the last few records
/// catches every realistic change.
const FINGERPRINT_TAIL: usize = 10;

/// ---------------------------------------------------------------------------
/// Fingerprint
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityFingerprint {
  count: usize,
  tail_hash: u64,
}

impl ActivityFingerprint {
  pub fn of(activities: &[ActivityRecord]) -> Self {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    let start = activities.len().saturating_sub(FINGERPRINT_TAIL);
    for activity in &activities[start..] {
      activity.date.hash(&mut hasher);
      activity.distance_meters.to_bits().hash(&mut hasher);
      activity.duration_seconds.to_bits().hash(&mut hasher);
      activity.avg_heart_rate.hash(&mut hasher);
    }
    Self {
      count: activities.len(),
      tail_hash: hasher.finish(),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Cache
/// ---------------------------------------------------------------------------

/// Depth-1 memo for marathon predictions. A boundary optimization only: a
/// miss just recomputes, and correctness never depends on a hit.
#[derive(Debug, Default)]
pub struct PredictionCache {
  entry: Option<(ActivityFingerprint, PredictionResult)>,
}

impl PredictionCache {
  pub fn new() -> Self {
    Self::default()
  }

  /// Return the cached prediction when the input fingerprint matches,
  /// otherwise compute, store, and return.
  pub fn get_or_compute(
    &mut self,
    activities: &[ActivityRecord],
    profile: &AthleteProfile,
  ) -> PredictionResult {
    let fingerprint = ActivityFingerprint::of(activities);
    if let Some((cached_fp, result)) = &self.entry {
      if *cached_fp == fingerprint {
        return result.clone();
      }
    }

    let result = predict(activities, profile);
    self.entry = Some((fingerprint, result.clone()));
    result
  }

  pub fn invalidate(&mut self) {
    self.entry = None;
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::{date, mock_profile, run_on};

  fn history(count: i64) -> Vec<ActivityRecord> {
    (0..count)
      .map(|i| run_on(date(2024, 6, 1) + chrono::Duration::days(i), 10000.0, 3000.0, None))
      .collect()
  }

  #[test]
  fn test_hit_returns_identical_result() {
    let activities = history(6);
    let profile = mock_profile();
    let mut cache = PredictionCache::new();

    let first = cache.get_or_compute(&activities, &profile);
    let second = cache.get_or_compute(&activities, &profile);
    assert_eq!(first, second);
  }

  #[test]
  fn test_cache_matches_direct_prediction() {
    let activities = history(8);
    let profile = mock_profile();
    let mut cache = PredictionCache::new();

    assert_eq!(
      cache.get_or_compute(&activities, &profile),
      predict(&activities, &profile)
    );
  }

  #[test]
  fn test_appending_an_activity_invalidates() {
    let profile = mock_profile();
    let mut cache = PredictionCache::new();

    let short = history(6);
    let stale = cache.get_or_compute(&short, &profile);

    let longer = history(7);
    let fresh = cache.get_or_compute(&longer, &profile);

    assert_eq!(fresh.based_on_activity_count, 7);
    assert_ne!(stale.based_on_activity_count, fresh.based_on_activity_count);
  }

  #[test]
  fn test_editing_a_trailing_record_changes_fingerprint() {
    let mut a = history(6);
    let b = a.clone();
    a.last_mut().unwrap().duration_seconds += 60.0;

    assert_ne!(ActivityFingerprint::of(&a), ActivityFingerprint::of(&b));
  }

  #[test]
  fn test_invalidate_clears_entry() {
    let activities = history(6);
    let profile = mock_profile();
    let mut cache = PredictionCache::new();

    cache.get_or_compute(&activities, &profile);
    cache.invalidate();
    assert!(cache.entry.is_none());
  }
}
