pub mod activity;

pub use activity::{ActivityRecord, AthleteProfile, ExperienceLevel, TrainingFocus};
