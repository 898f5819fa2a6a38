//! Marathon training engine
//!
//! Pure computation over an in-memory activity history: marathon finish-time
//! prediction, chronic/acute training-load modeling, personalized training
//! paces, periodized plan generation, and race-readiness scoring. The crate
//! performs no I/O; ingestion, persistence, and presentation are external
//! collaborators that hand records in and render results out.

pub mod cache;
pub mod effort;
pub mod load;
pub mod models;
pub mod paces;
pub mod plan;
pub mod predictor;
pub mod readiness;

#[cfg(test)]
pub mod test_utils;

pub use cache::{ActivityFingerprint, PredictionCache};
pub use effort::{Effort, EffortClassifier, EffortRating};
pub use load::{compute_load_series, LoadGranularity, LoadOptions, LoadSeed, TrainingLoadPoint};
pub use models::{ActivityRecord, AthleteProfile, ExperienceLevel, TrainingFocus};
pub use paces::{compute_paces, TrainingPaces};
pub use plan::{generate_plan, PlanError, TrainingPhase, TrainingPlan, TrainingWeek, Workout, WorkoutType};
pub use predictor::{predict, PredictionResult, Reliability};
pub use readiness::{assess_readiness, ReadinessReport};
