//! Personalized training-pace targets
//!
//! Derives easy/marathon/tempo/interval paces either from the athlete's own
//! effort-classified recent runs, or from a marathon goal time alone when
//! there is too little history. Output paces are seconds per kilometer and
//! always satisfy easy > marathon > tempo > interval.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::effort::{Effort, EffortClassifier};
use crate::models::{ActivityRecord, AthleteProfile};
use crate::predictor::MARATHON_METERS;

/// ---------------------------------------------------------------------------
/// Constants
/// ---------------------------------------------------------------------------

/// Generic multipliers over marathon pace when history is too thin.
const EASY_OVER_MARATHON: f64 = 1.20;
const TEMPO_OVER_MARATHON: f64 = 0.92;
const INTERVAL_OVER_MARATHON: f64 = 0.86;

/// Ordering fix-up when a derived easy pace collides with marathon pace.
const EASY_FIX_OVER_MARATHON: f64 = 1.10;
/// Ordering fix-up when a derived interval pace collides with tempo pace.
const INTERVAL_FIX_OVER_TEMPO: f64 = 0.93;

/// Runs needed before personal history outranks the generic derivation.
const MIN_QUALIFYING_RUNS: usize = 3;

/// How much history feeds the personalized derivation.
const HISTORY_RUNS: usize = 15;

/// Any run at 5:30/km or faster counts as tempo-or-harder regardless of HR
/// zone; pace is the more reliable tempo signal in practice.
const TEMPO_PACE_OVERRIDE: f64 = 330.0;

/// Interval pace comes from hard efforts in this distance band.
const INTERVAL_MIN_METERS: f64 = 3000.0;
const INTERVAL_MAX_METERS: f64 = 8000.0;

/// Moderate runs of at least this length stand in for marathon pace when no
/// goal time exists.
const MARATHON_PROXY_MIN_METERS: f64 = 15000.0;

/// Neutral marathon assumption when neither a goal nor history exists.
const DEFAULT_MARATHON_SECONDS: f64 = 14400.0;

/// HR-reserve fractions for the personalized zones (Karvonen form when a
/// resting HR is known, plain %max otherwise).
const ZONE_EASY_BELOW: f64 = 0.65;
const ZONE_MODERATE_BELOW: f64 = 0.80;
const ZONE_HARD_BELOW: f64 = 0.90;

/// ---------------------------------------------------------------------------
/// Output Type
/// ---------------------------------------------------------------------------

/// Target paces in seconds per kilometer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingPaces {
  pub easy: f64,
  pub marathon: f64,
  pub tempo: f64,
  pub interval: f64,
}

impl TrainingPaces {
  pub fn to_json(&self) -> String {
    serde_json::to_string_pretty(self).unwrap_or_default()
  }
}

/// Render a pace as "M:SS/km" for descriptions and UI strings.
pub fn pace_to_string(secs_per_km: f64) -> String {
  let total = secs_per_km.round() as i64;
  format!("{}:{:02}/km", total / 60, total % 60)
}

/// ---------------------------------------------------------------------------
/// Calculator
/// ---------------------------------------------------------------------------

/// Compute the four target paces.
///
/// `marathon_seconds` is the caller's best marathon estimate (goal time or a
/// prediction); when absent the profile goal time is used, then a neutral
/// default.
pub fn compute_paces(
  activities: &[ActivityRecord],
  profile: &AthleteProfile,
  marathon_seconds: Option<f64>,
) -> TrainingPaces {
  let goal_seconds = marathon_seconds
    .filter(|s| *s > 0.0)
    .or_else(|| profile.goal_time_seconds());

  // Newest qualifying runs: dated, with a real pace
  let mut qualifying: Vec<&ActivityRecord> = activities
    .iter()
    .filter(|a| a.date.is_some() && a.pace_secs_per_km().is_some())
    .collect();
  qualifying.sort_by(|a, b| b.date.cmp(&a.date));
  qualifying.truncate(HISTORY_RUNS);

  if qualifying.len() < MIN_QUALIFYING_RUNS {
    debug!(count = qualifying.len(), "paces: falling back to goal-time derivation");
    return from_marathon_seconds(goal_seconds.unwrap_or(DEFAULT_MARATHON_SECONDS));
  }

  let classifier = EffortClassifier::new(activities, profile);
  let rated: Vec<(f64, f64, Effort)> = qualifying
    .iter()
    .filter_map(|a| {
      let pace = a.pace_secs_per_km()?;
      let mut effort = classify_with_zones(a, profile, &classifier);
      if pace <= TEMPO_PACE_OVERRIDE && effort < Effort::Hard {
        effort = Effort::Hard;
      }
      Some((pace, a.distance_meters, effort))
    })
    .collect();

  let paces_where = |pred: &dyn Fn(Effort) -> bool| -> Vec<f64> {
    rated.iter().filter(|(_, _, e)| pred(*e)).map(|(p, _, _)| *p).collect()
  };

  let easy_pool = paces_where(&|e| matches!(e, Effort::Easy | Effort::Moderate));
  let hard_pool = paces_where(&|e| e == Effort::Hard);
  let moderate_pool = paces_where(&|e| e == Effort::Moderate);

  // Marathon pace: supplied goal first, then moderate long runs, then any
  // moderate run
  let marathon = goal_seconds
    .map(|s| s / (MARATHON_METERS / 1000.0))
    .or_else(|| {
      let long_moderate: Vec<f64> = rated
        .iter()
        .filter(|(_, d, e)| *e == Effort::Moderate && *d >= MARATHON_PROXY_MIN_METERS)
        .map(|(p, _, _)| *p)
        .collect();
      median(&long_moderate)
    })
    .or_else(|| median(&moderate_pool));

  let easy = median(&easy_pool);
  let tempo = median(&hard_pool).or_else(|| median(&moderate_pool));

  // Interval: fastest hard/very-hard effort in the 3-8 km band, else the
  // fastest hard effort of any distance
  let interval_band: Vec<f64> = rated
    .iter()
    .filter(|(_, d, e)| {
      *e >= Effort::Hard && *d >= INTERVAL_MIN_METERS && *d <= INTERVAL_MAX_METERS
    })
    .map(|(p, _, _)| *p)
    .collect();
  let interval = fastest(&interval_band).or_else(|| fastest(&paces_where(&|e| e >= Effort::Hard)));

  resolve(easy, marathon, tempo, interval, goal_seconds)
}

/// Generic derivation from a marathon time alone.
fn from_marathon_seconds(marathon_seconds: f64) -> TrainingPaces {
  let mp = marathon_seconds / (MARATHON_METERS / 1000.0);
  TrainingPaces {
    easy: mp * EASY_OVER_MARATHON,
    marathon: mp,
    tempo: mp * TEMPO_OVER_MARATHON,
    interval: mp * INTERVAL_OVER_MARATHON,
  }
}

/// Fill gaps from neighbors and enforce easy > marathon > tempo > interval.
///
/// An inconsistent set is never returned; an out-of-order value is rederived
/// from its neighbor instead.
fn resolve(
  easy: Option<f64>,
  marathon: Option<f64>,
  tempo: Option<f64>,
  interval: Option<f64>,
  goal_seconds: Option<f64>,
) -> TrainingPaces {
  // Anchor on marathon pace; without any signal at all fall back wholesale
  let marathon = match marathon
    .or_else(|| easy.map(|e| e / EASY_OVER_MARATHON))
    .or_else(|| tempo.map(|t| t / TEMPO_OVER_MARATHON))
  {
    Some(mp) => mp,
    None => {
      return from_marathon_seconds(goal_seconds.unwrap_or(DEFAULT_MARATHON_SECONDS));
    }
  };

  let mut easy = easy.unwrap_or(marathon * EASY_OVER_MARATHON);
  let mut tempo = tempo.unwrap_or(marathon * TEMPO_OVER_MARATHON);
  let mut interval = interval.unwrap_or(marathon * INTERVAL_OVER_MARATHON);

  if easy <= marathon {
    easy = marathon * EASY_FIX_OVER_MARATHON;
  }
  if tempo >= marathon {
    tempo = marathon * TEMPO_OVER_MARATHON;
  }
  if interval >= tempo {
    interval = tempo * INTERVAL_FIX_OVER_TEMPO;
  }

  TrainingPaces { easy, marathon, tempo, interval }
}

/// Classify with zones personalized by max and resting HR. With a resting HR
/// the bands apply to heart-rate reserve; otherwise to plain %max. Runs
/// without HR fall through to the pace-calibrated classifier.
fn classify_with_zones(
  activity: &ActivityRecord,
  profile: &AthleteProfile,
  classifier: &EffortClassifier,
) -> Effort {
  let max_hr = profile.effective_max_hr();
  let Some(avg) = activity.avg_heart_rate else {
    return classifier.classify(activity).effort;
  };

  let fraction = match profile.resting_heart_rate {
    Some(rest) if rest > 0 && max_hr > rest => {
      (avg - rest) as f64 / (max_hr - rest) as f64
    }
    _ => avg as f64 / max_hr as f64,
  };

  match fraction {
    f if f < ZONE_EASY_BELOW => Effort::Easy,
    f if f < ZONE_MODERATE_BELOW => Effort::Moderate,
    f if f <= ZONE_HARD_BELOW => Effort::Hard,
    _ => Effort::VeryHard,
  }
}

fn median(values: &[f64]) -> Option<f64> {
  if values.is_empty() {
    return None;
  }
  let mut sorted = values.to_vec();
  sorted.sort_by(|a, b| a.total_cmp(b));
  let mid = sorted.len() / 2;
  if sorted.len() % 2 == 0 {
    Some((sorted[mid - 1] + sorted[mid]) / 2.0)
  } else {
    Some(sorted[mid])
  }
}

fn fastest(values: &[f64]) -> Option<f64> {
  values.iter().copied().min_by(|a, b| a.total_cmp(b))
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
