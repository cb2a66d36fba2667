// src/models/ranking.rs

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::level::ProficiencyLevel;

/// Letter grade derived from total points. Ordered `D < C < B < A < S`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
pub enum RankGrade {
    D,
    C,
    B,
    A,
    S,
}

impl RankGrade {
    pub fn as_str(&self) -> &'static str {
        match self {
            RankGrade::D => "D",
            RankGrade::C => "C",
            RankGrade::B => "B",
            RankGrade::A => "A",
            RankGrade::S => "S",
        }
    }
}

impl FromStr for RankGrade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "D" => Ok(RankGrade::D),
            "C" => Ok(RankGrade::C),
            "B" => Ok(RankGrade::B),
            "A" => Ok(RankGrade::A),
            "S" => Ok(RankGrade::S),
            other => Err(format!("unknown rank grade '{}'", other)),
        }
    }
}

impl fmt::Display for RankGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cosmetic dashboard theme that follows the grade tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Standard,
    Bronze,
    Silver,
    Gold,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Standard => "standard",
            Theme::Bronze => "bronze",
            Theme::Silver => "silver",
            Theme::Gold => "gold",
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Theme::Standard),
            "bronze" => Ok(Theme::Bronze),
            "silver" => Ok(Theme::Silver),
            "gold" => Ok(Theme::Gold),
            other => Err(format!("unknown theme '{}'", other)),
        }
    }
}

/// Represents the derived 'rankings' table. Never edited directly;
/// every refresh rewrites the whole table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RankingRecord {
    pub user_id: i64,
    pub total_points: i64,
    pub average_wpm: f64,
    pub average_accuracy: f64,
    pub rank_grade: RankGrade,
    /// `None` groups students who have not taken the placement assessment.
    pub rank_category: Option<ProficiencyLevel>,
    pub overall_position: i64,
    pub category_position: i64,
    pub total_lessons_completed: i64,
    pub total_time_spent_seconds: i64,
    pub theme: Theme,
    /// Version of the scoring policy that produced this row.
    pub policy_version: i32,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Label used to group leaderboard categories.
pub fn category_label(category: Option<ProficiencyLevel>) -> &'static str {
    category.map(|c| c.as_str()).unwrap_or("unassigned")
}

/// Ranking joined with the student's display name.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub full_name: String,
    pub total_points: i64,
    pub average_wpm: f64,
    pub average_accuracy: f64,
    pub rank_grade: RankGrade,
    pub rank_category: Option<ProficiencyLevel>,
    pub overall_position: i64,
    pub category_position: i64,
    pub total_lessons_completed: i64,
    pub total_time_spent_seconds: i64,
}

impl LeaderboardEntry {
    pub fn new(record: &RankingRecord, full_name: String) -> Self {
        Self {
            user_id: record.user_id,
            full_name,
            total_points: record.total_points,
            average_wpm: record.average_wpm,
            average_accuracy: record.average_accuracy,
            rank_grade: record.rank_grade,
            rank_category: record.rank_category,
            overall_position: record.overall_position,
            category_position: record.category_position,
            total_lessons_completed: record.total_lessons_completed,
            total_time_spent_seconds: record.total_time_spent_seconds,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    /// Everyone, ordered by overall position.
    pub overall: Vec<LeaderboardEntry>,
    /// Keyed by category label, each ordered by category position.
    pub categories: BTreeMap<String, Vec<LeaderboardEntry>>,
}

/// Query parameters for the leaderboard.
#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardParams {
    /// Max entries per list (default: 50, max: 500).
    pub limit: Option<usize>,
}

impl LeaderboardParams {
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(50).clamp(1, 500)
    }
}
