//! Periodized training-plan generation
//!
//! Builds a calendar of contiguous 7-day weeks from a start date to a race
//! date. Each week carries a training phase and seven prescribed workouts
//! from a fixed weekly template, with durations and descriptions scaled by
//! phase. Phase transitions are monotonic (base -> build -> peak -> taper),
//! computed once from the week index at generation time.
//!
//! Generation is fully deterministic: the same (start, race) pair always
//! yields byte-identical output.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// ---------------------------------------------------------------------------
/// Training Phase
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingPhase {
    Base,
    Build,
    Peak,
    Taper,
}

impl TrainingPhase {
    /// Duration multiplier applied to every workout in the phase.
    pub fn duration_multiplier(&self) -> f64 {
        match self {
            Self::Base => 0.9,
            Self::Build => 1.0,
            Self::Peak => 1.1,
            Self::Taper => 0.75,
        }
    }
}

impl std::fmt::Display for TrainingPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Base => write!(f, "base"),
            Self::Build => write!(f, "build"),
            Self::Peak => write!(f, "peak"),
            Self::Taper => write!(f, "taper"),
        }
    }
}

impl std::str::FromStr for TrainingPhase {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "base" => Ok(Self::Base),
            "build" => Ok(Self::Build),
            "peak" => Ok(Self::Peak),
            "taper" => Ok(Self::Taper),
            _ => Err(format!("Unknown training phase: {}", s)),
        }
    }
}

/// ---------------------------------------------------------------------------
/// Workout Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutType {
    Easy,
    Tempo,
    Interval,
    Long,
    Recovery,
}

impl WorkoutType {
    /// Baseline duration in minutes before the phase multiplier.
    fn base_minutes(&self) -> f64 {
        match self {
            Self::Easy => 50.0,
            Self::Tempo => 50.0,
            Self::Interval => 45.0,
            Self::Long => 90.0,
            Self::Recovery => 30.0,
        }
    }
}

/// One prescribed day. `completed` starts false; the presentation layer owns
/// flipping it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub date: NaiveDate,
    pub workout_type: WorkoutType,
    pub description: String,
    pub duration_minutes: i64,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingWeek {
    pub start_date: NaiveDate,
    pub phase: TrainingPhase,
    /// Exactly 7 entries, one per day starting at `start_date`.
    pub days: Vec<Workout>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingPlan {
    pub weeks: Vec<TrainingWeek>,
}

impl TrainingPlan {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// ---------------------------------------------------------------------------
/// Errors
/// ---------------------------------------------------------------------------

/// A race date before the start date is a caller bug, not dirty data, and
/// fails loudly.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("race date {race} is before plan start {start}")]
    RaceBeforeStart { start: NaiveDate, race: NaiveDate },
}

/// ---------------------------------------------------------------------------
/// Constants
/// ---------------------------------------------------------------------------

/// Reference phase spans in weeks for a full-length (20-week) plan. Shorter
/// plans compress all four proportionally rather than dropping the taper.
const BASE_SPAN_WEEKS: f64 = 8.0;
const BUILD_SPAN_WEEKS: f64 = 6.0;
const PEAK_SPAN_WEEKS: f64 = 4.0;
const TAPER_SPAN_WEEKS: f64 = 2.0;
const REFERENCE_PLAN_WEEKS: f64 =
    BASE_SPAN_WEEKS + BUILD_SPAN_WEEKS + PEAK_SPAN_WEEKS + TAPER_SPAN_WEEKS;

/// Weekly template, indexed by day offset within the week. Slot 5 is the
/// long run (Saturday for the usual Sunday start).
const WEEK_TEMPLATE: [WorkoutType; 7] = [
    WorkoutType::Easy,
    WorkoutType::Interval,
    WorkoutType::Recovery,
    WorkoutType::Tempo,
    WorkoutType::Easy,
    WorkoutType::Long,
    WorkoutType::Recovery,
];

/// ---------------------------------------------------------------------------
/// Generation
/// ---------------------------------------------------------------------------

/// Generate a periodized plan covering `start_date` through the race.
pub fn generate_plan(
    start_date: NaiveDate,
    race_date: NaiveDate,
) -> Result<TrainingPlan, PlanError> {
    if race_date < start_date {
        return Err(PlanError::RaceBeforeStart {
            start: start_date,
            race: race_date,
        });
    }

    let total_days = (race_date - start_date).num_days().max(7);
    let total_weeks = (total_days + 6) / 7;
    let spans = allocate_phases(total_weeks as usize);

    let mut weeks = Vec::with_capacity(total_weeks as usize);
    for week_index in 0..total_weeks as usize {
        let phase = phase_for_week(week_index, &spans);
        let week_start = start_date + Duration::days(week_index as i64 * 7);

        let days = (0..7)
            .map(|offset| {
                let workout_type = WEEK_TEMPLATE[offset as usize];
                let minutes =
                    (workout_type.base_minutes() * phase.duration_multiplier()).round() as i64;
                Workout {
                    date: week_start + Duration::days(offset),
                    workout_type,
                    description: describe(workout_type, phase),
                    duration_minutes: minutes,
                    completed: false,
                }
            })
            .collect();

        weeks.push(TrainingWeek {
            start_date: week_start,
            phase,
            days,
        });
    }

    Ok(TrainingPlan { weeks })
}

/// Weeks allocated to each phase, in plan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PhaseSpans {
    base: usize,
    build: usize,
    peak: usize,
    taper: usize,
}

/// Scale the reference spans down for short plans. Taper is floored at one
/// week so even a crash plan ends with recovery before the race; base
/// absorbs every week beyond the 20-week reference.
fn allocate_phases(total_weeks: usize) -> PhaseSpans {
    let scale = (total_weeks as f64 / REFERENCE_PLAN_WEEKS).min(1.0);

    let mut taper = ((TAPER_SPAN_WEEKS * scale).round() as usize).max(1).min(total_weeks);
    let mut peak = (PEAK_SPAN_WEEKS * scale).round() as usize;
    let mut build = (BUILD_SPAN_WEEKS * scale).round() as usize;

    // Rounding can overshoot very short plans; shed weeks from the earliest
    // compressible phases first, taper last
    while taper + peak + build > total_weeks {
        if build > 0 {
            build -= 1;
        } else if peak > 0 {
            peak -= 1;
        } else {
            taper -= 1;
        }
    }

    PhaseSpans {
        base: total_weeks - taper - peak - build,
        build,
        peak,
        taper,
    }
}

/// Monotonic, date-driven phase lookup from the week index alone.
fn phase_for_week(week_index: usize, spans: &PhaseSpans) -> TrainingPhase {
    if week_index < spans.base {
        TrainingPhase::Base
    } else if week_index < spans.base + spans.build {
        TrainingPhase::Build
    } else if week_index < spans.base + spans.build + spans.peak {
        TrainingPhase::Peak
    } else {
        TrainingPhase::Taper
    }
}

/// Phase-appropriate description for each workout slot. Interval set/rep
/// counts climb from base to peak and back off for the taper.
fn describe(workout_type: WorkoutType, phase: TrainingPhase) -> String {
    match (workout_type, phase) {
        (WorkoutType::Easy, TrainingPhase::Base) => {
            "Easy run, conversational pace, building the aerobic base".to_string()
        }
        (WorkoutType::Easy, TrainingPhase::Build) => {
            "Easy run, conversational pace between quality days".to_string()
        }
        (WorkoutType::Easy, TrainingPhase::Peak) => {
            "Easy run, relaxed; save the legs for the key sessions".to_string()
        }
        (WorkoutType::Easy, TrainingPhase::Taper) => {
            "Short easy run, stay loose without adding fatigue".to_string()
        }

        (WorkoutType::Interval, TrainingPhase::Base) => {
            "6 x 400m at interval pace with 90s jog recoveries".to_string()
        }
        (WorkoutType::Interval, TrainingPhase::Build) => {
            "8 x 600m at interval pace with 90s jog recoveries".to_string()
        }
        (WorkoutType::Interval, TrainingPhase::Peak) => {
            "10 x 800m at interval pace with 2min jog recoveries".to_string()
        }
        (WorkoutType::Interval, TrainingPhase::Taper) => {
            "4 x 400m at interval pace, crisp but comfortable".to_string()
        }

        (WorkoutType::Tempo, TrainingPhase::Base) => {
            "2 x 10min at tempo effort with 3min easy between".to_string()
        }
        (WorkoutType::Tempo, TrainingPhase::Build) => {
            "20min continuous at tempo effort".to_string()
        }
        (WorkoutType::Tempo, TrainingPhase::Peak) => {
            "30min continuous at tempo effort, race-focused".to_string()
        }
        (WorkoutType::Tempo, TrainingPhase::Taper) => {
            "10min at tempo effort to keep the legs sharp".to_string()
        }

        (WorkoutType::Long, TrainingPhase::Base) => {
            "Long run at easy pace, time on feet over speed".to_string()
        }
        (WorkoutType::Long, TrainingPhase::Build) => {
            "Long run with the final third at marathon pace".to_string()
        }
        (WorkoutType::Long, TrainingPhase::Peak) => {
            "Long run with extended marathon-pace blocks, dress rehearsal".to_string()
        }
        (WorkoutType::Long, TrainingPhase::Taper) => {
            "Reduced long run at easy pace, no marathon-pace work".to_string()
        }

        (WorkoutType::Recovery, _) => {
            "Recovery jog or full rest day, by feel".to_string()
        }
    }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::date;

    #[test]
    fn test_thirteen_week_plan_shape() {
        // 2024-01-01 to 2024-04-01 is 91 days -> 13 weeks
        let plan = generate_plan(date(2024, 1, 1), date(2024, 4, 1)).unwrap();

        assert_eq!(plan.weeks.len(), 13);
        assert_eq!(plan.weeks[0].phase, TrainingPhase::Base);
        assert_eq!(plan.weeks.last().unwrap().phase, TrainingPhase::Taper);

        // Every week's slot 5 is the long run
        for week in &plan.weeks {
            assert_eq!(week.days[5].workout_type, WorkoutType::Long);
        }
    }

    #[test]
    fn test_weeks_are_contiguous_seven_day_blocks() {
        let start = date(2024, 1, 3); // a Wednesday
        let plan = generate_plan(start, date(2024, 3, 20)).unwrap();

        let mut expected = start;
        for week in &plan.weeks {
            assert_eq!(week.start_date, expected);
            assert_eq!(week.days.len(), 7);
            for (offset, workout) in week.days.iter().enumerate() {
                assert_eq!(workout.date, week.start_date + Duration::days(offset as i64));
                assert!(!workout.completed);
            }
            expected += Duration::days(7);
        }
    }

    #[test]
    fn test_plan_covers_race_date() {
        let start = date(2024, 1, 1);
        let race = date(2024, 3, 24); // 83 days, not a multiple of 7
        let plan = generate_plan(start, race).unwrap();

        assert_eq!(plan.weeks.len(), 12);
        let last_day = plan.weeks.last().unwrap().days.last().unwrap().date;
        assert!(last_day >= race, "plan ends {} before race {}", last_day, race);
    }

    #[test]
    fn test_race_before_start_fails_loudly() {
        let result = generate_plan(date(2024, 5, 1), date(2024, 4, 1));
        assert!(matches!(result, Err(PlanError::RaceBeforeStart { .. })));
    }

    #[test]
    fn test_same_day_race_yields_one_week() {
        let day = date(2024, 7, 1);
        let plan = generate_plan(day, day).unwrap();
        assert_eq!(plan.weeks.len(), 1);
        assert_eq!(plan.weeks[0].days.len(), 7);
    }

    #[test]
    fn test_phases_are_monotonic() {
        let plan = generate_plan(date(2024, 1, 1), date(2024, 6, 1)).unwrap();

        let order = |p: TrainingPhase| match p {
            TrainingPhase::Base => 0,
            TrainingPhase::Build => 1,
            TrainingPhase::Peak => 2,
            TrainingPhase::Taper => 3,
        };
        for pair in plan.weeks.windows(2) {
            assert!(
                order(pair[1].phase) >= order(pair[0].phase),
                "phase reversed between {} and {}",
                pair[0].phase,
                pair[1].phase
            );
        }
    }

    #[test]
    fn test_short_plan_compresses_phases_but_keeps_taper() {
        // 4 weeks: every phase shrinks, taper survives
        let plan = generate_plan(date(2024, 1, 1), date(2024, 1, 29)).unwrap();
        assert_eq!(plan.weeks.len(), 4);
        assert_eq!(plan.weeks.last().unwrap().phase, TrainingPhase::Taper);
        assert_eq!(plan.weeks[0].phase, TrainingPhase::Base);
    }

    #[test]
    fn test_full_length_plan_uses_reference_spans() {
        // 20 weeks = 140 days
        let plan = generate_plan(date(2024, 1, 1), date(2024, 5, 20)).unwrap();
        assert_eq!(plan.weeks.len(), 20);

        let count = |phase: TrainingPhase| plan.weeks.iter().filter(|w| w.phase == phase).count();
        assert_eq!(count(TrainingPhase::Base), 8);
        assert_eq!(count(TrainingPhase::Build), 6);
        assert_eq!(count(TrainingPhase::Peak), 4);
        assert_eq!(count(TrainingPhase::Taper), 2);
    }

    #[test]
    fn test_taper_cuts_duration_and_peak_raises_it() {
        let plan = generate_plan(date(2024, 1, 1), date(2024, 5, 20)).unwrap();

        let easy_minutes = |phase: TrainingPhase| {
            plan.weeks
                .iter()
                .find(|w| w.phase == phase)
                .map(|w| w.days[0].duration_minutes)
                .unwrap()
        };

        // Easy slot: 50 min baseline
        assert_eq!(easy_minutes(TrainingPhase::Base), 45);
        assert_eq!(easy_minutes(TrainingPhase::Build), 50);
        assert_eq!(easy_minutes(TrainingPhase::Peak), 55);
        assert_eq!(easy_minutes(TrainingPhase::Taper), 38);
    }

    #[test]
    fn test_interval_prescriptions_grow_toward_peak() {
        let plan = generate_plan(date(2024, 1, 1), date(2024, 5, 20)).unwrap();

        let interval_desc = |phase: TrainingPhase| {
            plan.weeks
                .iter()
                .find(|w| w.phase == phase)
                .map(|w| w.days[1].description.clone())
                .unwrap()
        };

        assert!(interval_desc(TrainingPhase::Base).starts_with("6 x 400m"));
        assert!(interval_desc(TrainingPhase::Build).starts_with("8 x 600m"));
        assert!(interval_desc(TrainingPhase::Peak).starts_with("10 x 800m"));
        assert!(interval_desc(TrainingPhase::Taper).starts_with("4 x 400m"));
    }

    #[test]
    fn test_regeneration_is_deterministic() {
        let a = generate_plan(date(2024, 2, 1), date(2024, 6, 2)).unwrap();
        let b = generate_plan(date(2024, 2, 1), date(2024, 6, 2)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_json(), b.to_json());
    }
}
