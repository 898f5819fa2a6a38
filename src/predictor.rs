//! Marathon finish-time prediction
//!
//! Extrapolates recent race-effort runs to marathon distance with Riegel
//! power-law scaling, weighting samples by recency and distance. The output
//! carries a confidence interval and a qualitative reliability rating so the
//! caller can render a "need more data" state instead of handling errors.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{ActivityRecord, AthleteProfile};

/// ---------------------------------------------------------------------------
/// Constants
/// ---------------------------------------------------------------------------

pub const MARATHON_METERS: f64 = 42195.0;

/// Minimum distance for a run to count as a predictive sample.
const MIN_SAMPLE_METERS: f64 = 2000.0;

/// At most this many most-recent runs feed one prediction.
const MAX_SAMPLES: usize = 10;

/// Fewer valid runs than this yields the zeroed low-reliability result.
const MIN_SAMPLES: usize = 2;

/// Riegel exponents. The lower exponent applies only to the most recent run
/// of an improving athlete, trusting that run's fitness signal a bit more.
const RIEGEL_EXPONENT: f64 = 1.06;
const RIEGEL_EXPONENT_IMPROVING: f64 = 1.04;

/// HR corrections at the extremes only; anything between is trusted as-is.
const HR_VERY_HARD_FRACTION: f64 = 0.92;
const HR_VERY_EASY_FRACTION: f64 = 0.60;
const HR_VERY_HARD_CORRECTION: f64 = 1.03;
const HR_VERY_EASY_CORRECTION: f64 = 0.97;

/// Recency weights decay linearly from the newest sample to the oldest.
const RECENCY_WEIGHT_MAX_IMPROVING: f64 = 4.0;
const RECENCY_WEIGHT_MAX: f64 = 2.5;
const RECENCY_WEIGHT_MIN: f64 = 0.3;

/// The most recent run's distance weight never drops below this, so a short
/// tune-up run right before race day still counts.
const RECENT_DISTANCE_WEIGHT_FLOOR: f64 = 1.2;

/// Deliberate heuristic, not a statistically pure 95% interval: recency
/// weighting already shrinks the effective uncertainty, so the classic
/// 1.96 * stderr band is halved to match observed spread.
const CI_DAMPENING: f64 = 0.5;
const CI_Z: f64 = 1.96;

const RELIABILITY_HIGH_AT: usize = 5;
const RELIABILITY_MEDIUM_AT: usize = 3;

/// ---------------------------------------------------------------------------
/// Result Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reliability {
  Low,
  Medium,
  High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
  /// Predicted marathon finish time in seconds; 0 when data is insufficient.
  pub seconds: f64,
  /// Plus/minus band around the prediction.
  pub confidence_interval_seconds: f64,
  pub reliability: Reliability,
  pub based_on_activity_count: usize,
}

impl PredictionResult {
  fn insufficient(count: usize) -> Self {
    Self {
      seconds: 0.0,
      confidence_interval_seconds: 0.0,
      reliability: Reliability::Low,
      based_on_activity_count: count,
    }
  }

  pub fn to_json(&self) -> String {
    serde_json::to_string_pretty(self).unwrap_or_default()
  }
}

/// ---------------------------------------------------------------------------
/// Predictor
/// ---------------------------------------------------------------------------

/// Predict a marathon finish time from recent runs.
///
/// The profile contributes only the max-HR reference for the extreme-effort
/// corrections; prediction works without one.
pub fn predict(activities: &[ActivityRecord], profile: &AthleteProfile) -> PredictionResult {
  // Newest first; only dated runs of at least 2 km with a real duration
  let mut samples: Vec<&ActivityRecord> = activities
    .iter()
    .filter(|a| {
      a.date.is_some() && a.distance_meters >= MIN_SAMPLE_METERS && a.duration_seconds > 0.0
    })
    .collect();
  samples.sort_by(|a, b| b.date.cmp(&a.date));
  samples.truncate(MAX_SAMPLES);

  if samples.len() < MIN_SAMPLES {
    debug!(count = samples.len(), "prediction: not enough qualifying runs");
    return PredictionResult::insufficient(samples.len());
  }

  let improving = detect_improvement(&samples);
  let max_hr = profile.effective_max_hr();

  let mut equivalents: Vec<(f64, f64)> = Vec::with_capacity(samples.len());
  for (index, activity) in samples.iter().enumerate() {
    let Some(equivalent) = marathon_equivalent(activity, index == 0 && improving, max_hr) else {
      continue;
    };
    let weight = recency_weight(index, samples.len(), improving)
      * distance_weight(activity.distance_meters, index == 0);
    if equivalent.is_finite() && weight.is_finite() && weight > 0.0 {
      equivalents.push((equivalent, weight));
    }
  }

  if equivalents.len() < MIN_SAMPLES {
    return PredictionResult::insufficient(equivalents.len());
  }

  let total_weight: f64 = equivalents.iter().map(|(_, w)| w).sum();
  let mean: f64 = equivalents.iter().map(|(t, w)| t * w).sum::<f64>() / total_weight;

  let variance: f64 = equivalents
    .iter()
    .map(|(t, w)| w * (t - mean).powi(2))
    .sum::<f64>()
    / total_weight;
  let n = equivalents.len() as f64;
  let confidence_interval = CI_Z * (variance.sqrt() / n.sqrt()) * CI_DAMPENING;

  let reliability = if equivalents.len() >= RELIABILITY_HIGH_AT {
    Reliability::High
  } else if equivalents.len() >= RELIABILITY_MEDIUM_AT {
    Reliability::Medium
  } else {
    Reliability::Low
  };

  PredictionResult {
    seconds: mean,
    confidence_interval_seconds: confidence_interval,
    reliability,
    based_on_activity_count: equivalents.len(),
  }
}

/// Riegel-scale one run to marathon distance, with the small HR correction
/// at effort extremes. Non-finite results exclude the sample.
fn marathon_equivalent(
  activity: &ActivityRecord,
  most_recent_improving: bool,
  max_hr: i64,
) -> Option<f64> {
  let exponent = if most_recent_improving {
    RIEGEL_EXPONENT_IMPROVING
  } else {
    RIEGEL_EXPONENT
  };

  let ratio = MARATHON_METERS / activity.distance_meters;
  let mut equivalent = activity.duration_seconds * ratio.powf(exponent);

  if let Some(fraction) = activity.hr_fraction(max_hr) {
    if fraction > HR_VERY_HARD_FRACTION {
      equivalent *= HR_VERY_HARD_CORRECTION;
    } else if fraction < HR_VERY_EASY_FRACTION {
      equivalent *= HR_VERY_EASY_CORRECTION;
    }
  }

  equivalent.is_finite().then_some(equivalent)
}

/// Compare the mean pace of the 3 newest runs to the 3 before them. A faster
/// recent block marks the athlete improving, which biases the weighting and
/// the newest run's Riegel exponent toward trusting recent data.
fn detect_improvement(samples: &[&ActivityRecord]) -> bool {
  if samples.len() < 6 {
    return false;
  }
  let mean_pace = |runs: &[&ActivityRecord]| -> Option<f64> {
    let paces: Vec<f64> = runs.iter().filter_map(|a| a.pace_secs_per_km()).collect();
    if paces.is_empty() {
      return None;
    }
    Some(paces.iter().sum::<f64>() / paces.len() as f64)
  };

  match (mean_pace(&samples[..3]), mean_pace(&samples[3..6])) {
    (Some(recent), Some(older)) => recent < older,
    _ => false,
  }
}

/// Linear decay from the newest sample's ceiling down to 0.3 at the oldest.
fn recency_weight(index: usize, count: usize, improving: bool) -> f64 {
  let max = if improving {
    RECENCY_WEIGHT_MAX_IMPROVING
  } else {
    RECENCY_WEIGHT_MAX
  };
  if count <= 1 {
    return max;
  }
  let step = (max - RECENCY_WEIGHT_MIN) / (count - 1) as f64;
  max - step * index as f64
}

/// Longer runs say more about marathon fitness; the newest run is floored so
/// a short sharpening run is not discarded.
fn distance_weight(distance_meters: f64, most_recent: bool) -> f64 {
  let weight: f64 = match distance_meters {
    d if d < 5000.0 => 0.7,
    d if d < 10000.0 => 1.0,
    d if d < 15000.0 => 1.3,
    d if d < 20000.0 => 1.5,
    _ => 1.8,
  };
  if most_recent {
    weight.max(RECENT_DISTANCE_WEIGHT_FLOOR)
  } else {
    weight
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
