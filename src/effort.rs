//! Effort classification for completed runs
//!
//! Rates each activity easy/moderate/hard/very-hard. Heart rate (as a
//! fraction of max) is the primary signal; when HR is missing the classifier
//! falls back to pace thresholds calibrated against the athlete's own recent
//! median pace, so the same code adapts to different ability levels.

use serde::{Deserialize, Serialize};

use crate::models::{ActivityRecord, AthleteProfile};

/// ---------------------------------------------------------------------------
/// Effort Rating
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effort {
  Easy,
  Moderate,
  Hard,
  VeryHard,
}

impl Effort {
  pub fn as_str(&self) -> &'static str {
    match self {
      Effort::Easy => "easy",
      Effort::Moderate => "moderate",
      Effort::Hard => "hard",
      Effort::VeryHard => "very_hard",
    }
  }

  /// Intensity factor used by the training-load engine when estimating a
  /// stress score from duration alone.
  pub fn intensity_factor(&self) -> f64 {
    match self {
      Effort::Easy => 0.5,
      Effort::Moderate => 0.7,
      Effort::Hard => 1.0,
      Effort::VeryHard => 1.3,
    }
  }
}

/// A classification plus whether the signal behind it was usable. Callers
/// that only want the label can ignore `reliable`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EffortRating {
  pub effort: Effort,
  pub reliable: bool,
}

/// ---------------------------------------------------------------------------
/// Thresholds
/// ---------------------------------------------------------------------------

/// HR bands as fractions of max HR.
const HR_EASY_BELOW: f64 = 0.65;
const HR_MODERATE_BELOW: f64 = 0.80;
const HR_HARD_BELOW: f64 = 0.90;

/// Pace bands as multiples of the athlete's recent median pace (lower pace
/// value = faster).
const PACE_VERY_HARD_BELOW: f64 = 0.85;
const PACE_HARD_BELOW: f64 = 0.92;
const PACE_MODERATE_BELOW: f64 = 1.03;

/// Any pace in the fastest 20% of recent runs rates at least hard, whatever
/// the median-relative bands say.
const FAST_QUANTILE: f64 = 0.20;

/// Below 8 km, HR lag makes short efforts unreliable; pace wins ties there.
const HR_PREFERRED_ABOVE_METERS: f64 = 8000.0;

/// Calibration window and the minimum paced runs before the relative pace
/// bands engage.
const CALIBRATION_WINDOW_DAYS: i64 = 90;
const MIN_PACED_RUNS: usize = 4;

/// ---------------------------------------------------------------------------
/// Classifier
/// ---------------------------------------------------------------------------

/// Classifier calibrated against one athlete's recent history.
///
/// Build it once from the activity list, then classify any number of
/// individual records against the precomputed pace distribution.
#[derive(Debug, Clone)]
pub struct EffortClassifier {
  max_hr: i64,
  median_pace: Option<f64>,
  fast_pace_cutoff: Option<f64>,
}

impl EffortClassifier {
  pub fn new(activities: &[ActivityRecord], profile: &AthleteProfile) -> Self {
    let reference = activities
      .iter()
      .filter_map(|a| a.date)
      .max();

    let mut paces: Vec<f64> = activities
      .iter()
      .filter(|a| match (a.date, reference) {
        (Some(d), Some(latest)) => (latest - d).num_days() < CALIBRATION_WINDOW_DAYS,
        _ => false,
      })
      .filter_map(|a| a.pace_secs_per_km())
      .collect();
    paces.sort_by(|a, b| a.total_cmp(b));

    let (median_pace, fast_pace_cutoff) = if paces.len() >= MIN_PACED_RUNS {
      (
        Some(quantile(&paces, 0.5)),
        Some(quantile(&paces, FAST_QUANTILE)),
      )
    } else {
      (None, None)
    };

    Self {
      max_hr: profile.effective_max_hr(),
      median_pace,
      fast_pace_cutoff,
    }
  }

  /// Classify one activity.
  ///
  /// When HR and pace disagree, pace wins for runs under 8 km and HR wins
  /// otherwise. With neither signal the run defaults to easy, flagged
  /// unreliable.
  pub fn classify(&self, activity: &ActivityRecord) -> EffortRating {
    let by_hr = self.classify_by_hr(activity);
    let by_pace = self.classify_by_pace(activity);

    match (by_hr, by_pace) {
      (Some(hr), Some(pace)) => {
        let effort = if activity.distance_meters < HR_PREFERRED_ABOVE_METERS {
          pace
        } else {
          hr
        };
        EffortRating { effort, reliable: true }
      }
      (Some(hr), None) => EffortRating { effort: hr, reliable: true },
      (None, Some(pace)) => EffortRating { effort: pace, reliable: true },
      (None, None) => EffortRating {
        effort: Effort::Easy,
        reliable: false,
      },
    }
  }

  fn classify_by_hr(&self, activity: &ActivityRecord) -> Option<Effort> {
    let fraction = activity.hr_fraction(self.max_hr)?;
    let effort = match fraction {
      f if f < HR_EASY_BELOW => Effort::Easy,
      f if f < HR_MODERATE_BELOW => Effort::Moderate,
      f if f <= HR_HARD_BELOW => Effort::Hard,
      _ => Effort::VeryHard,
    };
    Some(effort)
  }

  fn classify_by_pace(&self, activity: &ActivityRecord) -> Option<Effort> {
    let pace = activity.pace_secs_per_km()?;
    let median = self.median_pace?;

    let mut effort = match pace / median {
      r if r <= PACE_VERY_HARD_BELOW => Effort::VeryHard,
      r if r <= PACE_HARD_BELOW => Effort::Hard,
      r if r <= PACE_MODERATE_BELOW => Effort::Moderate,
      _ => Effort::Easy,
    };

    // Floor: fastest-quintile runs are hard even when the median bands
    // would call them moderate.
    if let Some(cutoff) = self.fast_pace_cutoff {
      if pace <= cutoff && effort < Effort::Hard {
        effort = Effort::Hard;
      }
    }

    Some(effort)
  }
}

/// Linear-interpolated quantile over a sorted slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
  let position = q * (sorted.len() - 1) as f64;
  let low = position.floor() as usize;
  let high = position.ceil() as usize;
  if low == high {
    sorted[low]
  } else {
    let weight = position - low as f64;
    sorted[low] * (1.0 - weight) + sorted[high] * weight
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
