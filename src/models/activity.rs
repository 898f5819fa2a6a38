use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One completed run, as handed over by the ingestion collaborator.
///
/// Records are immutable once inside the engine: every calculation derives
/// new values and never writes back into the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
  /// Calendar date of the run. Records without a date are excluded from any
  /// windowed aggregation but still count toward simple totals.
  pub date: Option<NaiveDate>,
  pub distance_meters: f64,
  pub duration_seconds: f64,
  pub avg_heart_rate: Option<i64>,
  pub max_heart_rate: Option<i64>,
  pub elevation_gain_meters: Option<f64>,
  /// Explicit stress score; estimated from duration and intensity if absent.
  pub training_stress_score: Option<f64>,
}

impl ActivityRecord {
  /// Pace in seconds per kilometer.
  ///
  /// Returns None for zero distance or duration so pace-derived calculations
  /// can exclude the record instead of dividing by zero.
  pub fn pace_secs_per_km(&self) -> Option<f64> {
    if self.distance_meters <= 0.0 || self.duration_seconds <= 0.0 {
      return None;
    }
    let pace = self.duration_seconds / (self.distance_meters / 1000.0);
    if pace.is_finite() {
      Some(pace)
    } else {
      None
    }
  }

  pub fn distance_km(&self) -> f64 {
    self.distance_meters / 1000.0
  }

  pub fn duration_hours(&self) -> f64 {
    self.duration_seconds / 3600.0
  }

  /// Fraction of the athlete's max HR this run averaged, when both are known.
  pub fn hr_fraction(&self, max_hr: i64) -> Option<f64> {
    if max_hr <= 0 {
      return None;
    }
    self.avg_heart_rate.map(|hr| hr as f64 / max_hr as f64)
  }
}

/// ---------------------------------------------------------------------------
/// Athlete Profile
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
  Beginner,
  #[default]
  Intermediate,
  Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingFocus {
  Speed,
  Endurance,
  Strength,
  Recovery,
}

/// Static and slowly-changing facts about the runner, supplied whole by the
/// profile store. Read-only to the engine.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AthleteProfile {
  pub max_heart_rate: Option<i64>,
  pub resting_heart_rate: Option<i64>,
  pub age: Option<u32>,
  /// Race target in "HH:MM:SS" form.
  pub goal_time: Option<String>,
  pub race_date: Option<NaiveDate>,
  pub experience_level: ExperienceLevel,
  pub training_focus: Vec<TrainingFocus>,
}

/// Default max HR when neither a measured value nor an age is available.
const DEFAULT_MAX_HR: i64 = 185;

impl AthleteProfile {
  /// Get max HR, falling back to the Tanaka age estimate (208 - 0.7 * age)
  /// and finally a population default.
  pub fn effective_max_hr(&self) -> i64 {
    self
      .max_heart_rate
      .or_else(|| self.age.map(|a| (208.0 - 0.7 * a as f64) as i64))
      .unwrap_or(DEFAULT_MAX_HR)
  }

  /// Parse the goal time into seconds. "3:45:00" -> 13500.
  ///
  /// Accepts H:MM:SS or MM:SS; anything unparsable is None rather than an
  /// error since a malformed profile field should not break a calculation.
  pub fn goal_time_seconds(&self) -> Option<f64> {
    let raw = self.goal_time.as_deref()?;
    let parts: Vec<&str> = raw.split(':').collect();
    let nums: Vec<f64> = parts
      .iter()
      .map(|p| p.trim().parse::<f64>())
      .collect::<Result<_, _>>()
      .ok()?;

    let seconds = match nums.as_slice() {
      [h, m, s] => h * 3600.0 + m * 60.0 + s,
      [m, s] => m * 60.0 + s,
      _ => return None,
    };

    if seconds > 0.0 {
      Some(seconds)
    } else {
      None
    }
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
