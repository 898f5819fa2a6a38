//! Race-readiness scoring
//!
//! Blends five windowed sub-scores (aerobic base, lactate threshold,
//! neuromuscular power, strength/mobility, mental preparation) into one
//! 0-100 readiness number. The blend weights shift with race proximity:
//! far out the aerobic base dominates, in race week freshness and mental
//! preparation do. Sub-scores under 70 emit a recommendation string.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::effort::{Effort, EffortClassifier};
use crate::load::{compute_load_series, LoadOptions};
use crate::models::{ActivityRecord, AthleteProfile};

/// ---------------------------------------------------------------------------
/// Constants
/// ---------------------------------------------------------------------------

/// Lookback windows per sub-score, in weeks.
const AEROBIC_WINDOW_WEEKS: i64 = 16;
const THRESHOLD_WINDOW_WEEKS: i64 = 12;
const POWER_WINDOW_WEEKS: i64 = 8;
const STRENGTH_WINDOW_WEEKS: i64 = 6;
const MENTAL_WINDOW_WEEKS: i64 = 4;

/// A sub-score below this triggers a recommendation.
const RECOMMENDATION_THRESHOLD: f64 = 70.0;

/// Weekly targets the sub-scores normalize against.
const TARGET_WEEKLY_HOURS: f64 = 5.0;
const TARGET_TEMPO_PER_WEEK: f64 = 1.0;
const TARGET_SPEED_SESSIONS_PER_WEEK: f64 = 1.0;
const TARGET_WEEKLY_ELEVATION_METERS: f64 = 150.0;
const TARGET_RUNS_PER_WEEK: f64 = 3.0;

/// Weekly volume above this multiple of the prior 3-week average is treated
/// as an injury-risk ramp.
const RAMP_RISK_RATIO: f64 = 1.3;

/// Speed work distance band (same as the interval-pace band).
const SPEED_MIN_METERS: f64 = 3000.0;
const SPEED_MAX_METERS: f64 = 8000.0;

/// ---------------------------------------------------------------------------
/// Report
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessReport {
    /// Blended 0-100 readiness.
    pub overall: f64,
    pub aerobic_base: f64,
    pub lactate_threshold: f64,
    pub neuromuscular_power: f64,
    pub strength_mobility: f64,
    pub mental_preparation: f64,
    pub recommendations: Vec<String>,
}

impl ReadinessReport {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Blend weights for the five sub-scores, summing to 1.
#[derive(Debug, Clone, Copy)]
struct BlendWeights {
    aerobic: f64,
    threshold: f64,
    power: f64,
    strength: f64,
    mental: f64,
}

/// Weights by days-to-race band. Without a race date the far-out band
/// applies.
fn blend_weights(days_to_race: Option<i64>) -> BlendWeights {
    match days_to_race {
        Some(d) if d < 7 => BlendWeights {
            aerobic: 0.15,
            threshold: 0.20,
            power: 0.15,
            strength: 0.10,
            mental: 0.40,
        },
        Some(d) if d < 28 => BlendWeights {
            aerobic: 0.20,
            threshold: 0.25,
            power: 0.25,
            strength: 0.10,
            mental: 0.20,
        },
        Some(d) if d < 84 => BlendWeights {
            aerobic: 0.30,
            threshold: 0.30,
            power: 0.15,
            strength: 0.15,
            mental: 0.10,
        },
        _ => BlendWeights {
            aerobic: 0.40,
            threshold: 0.20,
            power: 0.10,
            strength: 0.20,
            mental: 0.10,
        },
    }
}

/// ---------------------------------------------------------------------------
/// Scorer
/// ---------------------------------------------------------------------------

/// Assess race readiness as of `today` (passed explicitly; the scorer never
/// reads the wall clock).
pub fn assess_readiness(
    activities: &[ActivityRecord],
    profile: &AthleteProfile,
    today: NaiveDate,
) -> ReadinessReport {
    let classifier = EffortClassifier::new(activities, profile);

    // (record, effort, weeks-ago) for every dated run up to today
    let rated: Vec<(&ActivityRecord, Effort, i64)> = activities
        .iter()
        .filter_map(|a| {
            let date = a.date?;
            let days_ago = (today - date).num_days();
            if days_ago < 0 {
                return None;
            }
            Some((a, classifier.classify(a).effort, days_ago / 7))
        })
        .collect();

    let aerobic_base = score_aerobic_base(&rated);
    let lactate_threshold = score_lactate_threshold(&rated);
    let neuromuscular_power = score_neuromuscular_power(&rated);
    let strength_mobility = score_strength_mobility(&rated);
    let mental_preparation = score_mental_preparation(&rated, activities, profile, today);

    let days_to_race = profile.race_date.map(|race| (race - today).num_days());
    let weights = blend_weights(days_to_race);

    let overall = aerobic_base * weights.aerobic
        + lactate_threshold * weights.threshold
        + neuromuscular_power * weights.power
        + strength_mobility * weights.strength
        + mental_preparation * weights.mental;

    let mut recommendations = Vec::new();
    let mut recommend = |score: f64, text: &str| {
        if score < RECOMMENDATION_THRESHOLD {
            recommendations.push(text.to_string());
        }
    };
    recommend(
        aerobic_base,
        "Aerobic base is thin: add easy weekly volume and protect the long run",
    );
    recommend(
        lactate_threshold,
        "Lactate threshold needs work: schedule a weekly tempo session",
    );
    recommend(
        neuromuscular_power,
        "Little recent speed work: add short intervals once a week",
    );
    recommend(
        strength_mobility,
        "Strength and durability lag: add hills or strength work and ramp volume gradually",
    );
    recommend(
        mental_preparation,
        "Race sharpness is low: train consistently this month and arrive fresh, not flat",
    );

    ReadinessReport {
        overall: round1(overall),
        aerobic_base: round1(aerobic_base),
        lactate_threshold: round1(lactate_threshold),
        neuromuscular_power: round1(neuromuscular_power),
        strength_mobility: round1(strength_mobility),
        mental_preparation: round1(mental_preparation),
        recommendations,
    }
}

/// Aerobic base (16 weeks): share of weeks with any running, weekly volume
/// against target, and the easy/moderate share of total time.
fn score_aerobic_base(rated: &[(&ActivityRecord, Effort, i64)]) -> f64 {
    let window: Vec<_> = in_window(rated, AEROBIC_WINDOW_WEEKS);
    if window.is_empty() {
        return 0.0;
    }

    let weeks_with_runs = distinct_weeks(&window);
    let consistency = pct(weeks_with_runs as f64 / AEROBIC_WINDOW_WEEKS as f64);

    let total_hours: f64 = window.iter().map(|(a, _, _)| a.duration_hours()).sum();
    let volume = pct(total_hours / (TARGET_WEEKLY_HOURS * AEROBIC_WINDOW_WEEKS as f64));

    let easy_hours: f64 = window
        .iter()
        .filter(|(_, e, _)| matches!(*e, Effort::Easy | Effort::Moderate))
        .map(|(a, _, _)| a.duration_hours())
        .sum();
    let easy_share = if total_hours > 0.0 {
        pct(easy_hours / total_hours)
    } else {
        0.0
    };

    consistency * 0.5 + volume * 0.3 + easy_share * 0.2
}

/// Lactate threshold (12 weeks): tempo-or-harder frequency plus whether
/// those paces are trending faster across the window.
fn score_lactate_threshold(rated: &[(&ActivityRecord, Effort, i64)]) -> f64 {
    let window: Vec<_> = in_window(rated, THRESHOLD_WINDOW_WEEKS);
    let tempo_runs: Vec<_> = window
        .iter()
        .filter(|(_, e, _)| *e >= Effort::Hard)
        .collect();

    let frequency = pct(
        tempo_runs.len() as f64 / (TARGET_TEMPO_PER_WEEK * THRESHOLD_WINDOW_WEEKS as f64),
    );

    // Pace progression: recent half of the window vs the older half
    let half = THRESHOLD_WINDOW_WEEKS / 2;
    let recent: Vec<f64> = tempo_runs
        .iter()
        .filter(|(_, _, w)| *w < half)
        .filter_map(|(a, _, _)| a.pace_secs_per_km())
        .collect();
    let older: Vec<f64> = tempo_runs
        .iter()
        .filter(|(_, _, w)| *w >= half)
        .filter_map(|(a, _, _)| a.pace_secs_per_km())
        .collect();

    let progression = match (mean(&recent), mean(&older)) {
        (Some(r), Some(o)) if r < o => 100.0,
        (Some(_), Some(_)) => 60.0,
        // Too little data to judge a trend; neutral credit
        _ => 50.0,
    };

    frequency * 0.7 + progression * 0.3
}

/// Neuromuscular power (8 weeks): hard efforts in the 3-8 km speed band.
fn score_neuromuscular_power(rated: &[(&ActivityRecord, Effort, i64)]) -> f64 {
    let window: Vec<_> = in_window(rated, POWER_WINDOW_WEEKS);
    let speed_sessions = window
        .iter()
        .filter(|(a, e, _)| {
            *e >= Effort::Hard
                && a.distance_meters >= SPEED_MIN_METERS
                && a.distance_meters <= SPEED_MAX_METERS
        })
        .count();

    let base = pct(
        speed_sessions as f64 / (TARGET_SPEED_SESSIONS_PER_WEEK * POWER_WINDOW_WEEKS as f64),
    );
    // A very-hard session in the window shows top-end work is present at all
    let has_very_hard = window.iter().any(|(_, e, _)| *e == Effort::VeryHard);
    if has_very_hard {
        (base + 10.0).min(100.0)
    } else {
        base
    }
}

/// Strength/mobility (6 weeks): elevation work against target, minus an
/// injury-risk penalty when the last week's volume ramps past 1.3x the
/// previous three weeks' average.
fn score_strength_mobility(rated: &[(&ActivityRecord, Effort, i64)]) -> f64 {
    let window: Vec<_> = in_window(rated, STRENGTH_WINDOW_WEEKS);
    if window.is_empty() {
        return 0.0;
    }

    let elevation: f64 = window
        .iter()
        .filter_map(|(a, _, _)| a.elevation_gain_meters)
        .sum();
    let elevation_score = pct(
        elevation / (TARGET_WEEKLY_ELEVATION_METERS * STRENGTH_WINDOW_WEEKS as f64),
    );

    let hours_in = |from_week: i64, to_week: i64| -> f64 {
        window
            .iter()
            .filter(|(_, _, w)| *w >= from_week && *w < to_week)
            .map(|(a, _, _)| a.duration_hours())
            .sum()
    };
    let this_week = hours_in(0, 1);
    let prior_avg = hours_in(1, 4) / 3.0;

    let ramp_penalty = if prior_avg > 0.0 && this_week / prior_avg > RAMP_RISK_RATIO {
        20.0
    } else {
        0.0
    };

    (elevation_score * 0.6 + 40.0 - ramp_penalty).clamp(0.0, 100.0)
}

/// Mental preparation (4 weeks): training consistency plus current form
/// (TSB) from the load series.
fn score_mental_preparation(
    rated: &[(&ActivityRecord, Effort, i64)],
    activities: &[ActivityRecord],
    profile: &AthleteProfile,
    today: NaiveDate,
) -> f64 {
    let window: Vec<_> = in_window(rated, MENTAL_WINDOW_WEEKS);
    let consistency = pct(
        window.len() as f64 / (TARGET_RUNS_PER_WEEK * MENTAL_WINDOW_WEEKS as f64),
    );

    let series = compute_load_series(activities, profile, LoadOptions::default());
    let tsb = series
        .iter()
        .filter(|p| p.date <= today)
        .next_back()
        .map(|p| p.tsb);

    // Fresh-but-fit is the target band; deep fatigue reads as unprepared
    let freshness = match tsb {
        Some(t) if t > 25.0 => 70.0,
        Some(t) if t > 0.0 => 100.0,
        Some(t) if t > -10.0 => 80.0,
        Some(t) if t > -20.0 => 50.0,
        Some(_) => 25.0,
        None => 50.0,
    };

    consistency * 0.6 + freshness * 0.4
}

/// ---------------------------------------------------------------------------
/// Helpers
/// ---------------------------------------------------------------------------

fn in_window<'a>(
    rated: &'a [(&'a ActivityRecord, Effort, i64)],
    weeks: i64,
) -> Vec<&'a (&'a ActivityRecord, Effort, i64)> {
    rated.iter().filter(|(_, _, w)| *w < weeks).collect()
}

fn distinct_weeks(window: &[&(&ActivityRecord, Effort, i64)]) -> usize {
    let mut weeks: Vec<i64> = window.iter().map(|(_, _, w)| *w).collect();
    weeks.sort_unstable();
    weeks.dedup();
    weeks.len()
}

/// Ratio clamped into a 0-100 score.
fn pct(ratio: f64) -> f64 {
    (ratio * 100.0).clamp(0.0, 100.0)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
