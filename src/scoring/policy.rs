// src/scoring/policy.rs

//! Every tunable number used by scoring and ranking, kept in one versioned
//! table so grade boundaries can be audited and tested on their own.

use crate::models::{
    level::{LessonLevel, ProficiencyLevel},
    ranking::{RankGrade, Theme},
};

/// Minimum total points for a grade.
#[derive(Debug, Clone, Copy)]
pub struct GradeThreshold {
    pub grade: RankGrade,
    pub min_points: i64,
}

/// Minimum placement result for a proficiency level.
#[derive(Debug, Clone, Copy)]
pub struct PlacementThreshold {
    pub level: ProficiencyLevel,
    pub min_wpm: u32,
    pub min_accuracy: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct ScoringPolicy {
    /// Stored with every ranking row.
    pub version: i32,

    /// Elapsed time is floored here before computing WPM.
    pub min_elapsed_ms: i64,

    /// Points for a perfect-accuracy session typed exactly at target speed
    /// scale from `base_points * 0.5` (crawling) up to
    /// `base_points * (0.5 + 0.5 * max_speed_ratio)`.
    pub base_points: f64,
    pub max_speed_ratio: f64,

    /// Highest grade first.
    pub grade_thresholds: &'static [GradeThreshold],

    /// Highest level first. Anything below the last entry is Beginner.
    pub placement: &'static [PlacementThreshold],
}

const GRADE_THRESHOLDS_V1: &[GradeThreshold] = &[
    GradeThreshold {
        grade: RankGrade::S,
        min_points: 900,
    },
    GradeThreshold {
        grade: RankGrade::A,
        min_points: 700,
    },
    GradeThreshold {
        grade: RankGrade::B,
        min_points: 500,
    },
    GradeThreshold {
        grade: RankGrade::C,
        min_points: 300,
    },
];

const PLACEMENT_V1: &[PlacementThreshold] = &[
    PlacementThreshold {
        level: ProficiencyLevel::Advanced,
        min_wpm: 40,
        min_accuracy: 90,
    },
    PlacementThreshold {
        level: ProficiencyLevel::Intermediate,
        min_wpm: 25,
        min_accuracy: 80,
    },
];

impl ScoringPolicy {
    pub const V1: ScoringPolicy = ScoringPolicy {
        version: 1,
        min_elapsed_ms: 1_000,
        base_points: 40.0,
        max_speed_ratio: 2.0,
        grade_thresholds: GRADE_THRESHOLDS_V1,
        placement: PLACEMENT_V1,
    };

    /// The policy the service runs with.
    pub fn current() -> &'static ScoringPolicy {
        &Self::V1
    }

    /// Grade is a pure step function of total points.
    pub fn grade_for(&self, total_points: i64) -> RankGrade {
        self.grade_thresholds
            .iter()
            .find(|t| total_points >= t.min_points)
            .map(|t| t.grade)
            .unwrap_or(RankGrade::D)
    }

    pub fn theme_for(&self, grade: RankGrade) -> Theme {
        match grade {
            RankGrade::S => Theme::Gold,
            RankGrade::A => Theme::Silver,
            RankGrade::B => Theme::Bronze,
            RankGrade::C | RankGrade::D => Theme::Standard,
        }
    }

    /// WPM a student is expected to reach on a lesson of this level.
    pub fn target_wpm(&self, level: LessonLevel) -> f64 {
        match level {
            LessonLevel::Beginner => 25.0,
            LessonLevel::Intermediate => 40.0,
            LessonLevel::Advanced => 60.0,
            LessonLevel::All => 35.0,
        }
    }

    /// Points earned by one completed session.
    /// Non-decreasing in both `wpm` and `accuracy`.
    pub fn session_points(&self, wpm: i32, accuracy: i32, level: LessonLevel) -> i64 {
        let accuracy = f64::from(accuracy.clamp(0, 100)) / 100.0;
        let speed_ratio =
            (f64::from(wpm.max(0)) / self.target_wpm(level)).min(self.max_speed_ratio);
        let quality = accuracy * (0.5 + 0.5 * speed_ratio);
        (self.base_points * quality).round() as i64
    }

    pub fn placement_level(&self, wpm: u32, accuracy: u32) -> ProficiencyLevel {
        self.placement
            .iter()
            .find(|t| wpm >= t.min_wpm && accuracy >= t.min_accuracy)
            .map(|t| t.level)
            .unwrap_or(ProficiencyLevel::Beginner)
    }
}
