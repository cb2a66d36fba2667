// src/models/activity.rs

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Lesson,
    Assessment,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Lesson => "lesson",
            ActivityType::Assessment => "assessment",
        }
    }
}

impl FromStr for ActivityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lesson" => Ok(ActivityType::Lesson),
            "assessment" => Ok(ActivityType::Assessment),
            other => Err(format!("unknown activity type '{}'", other)),
        }
    }
}

/// Represents the append-only 'activity_logs' table. One row per attempt.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActivityLog {
    pub id: i64,
    pub user_id: i64,
    pub activity_type: ActivityType,
    /// Missing for assessments, and for lessons deleted since.
    pub lesson_id: Option<i64>,
    pub duration_seconds: i32,
    pub wpm: i32,
    pub accuracy: i32,
    pub errors: i32,
    /// Snapshot of the reference text at the time of the attempt.
    pub text_content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone)]
pub struct NewActivityLog {
    pub user_id: i64,
    pub activity_type: ActivityType,
    pub lesson_id: Option<i64>,
    pub duration_seconds: i32,
    pub wpm: i32,
    pub accuracy: i32,
    pub errors: i32,
    pub text_content: String,
}

/// Query parameters for activity listings.
#[derive(Debug, Default, Deserialize)]
pub struct ActivityListParams {
    /// Number of items to return (default: 20, max: 100).
    pub limit: Option<i64>,
}

impl ActivityListParams {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(20).clamp(1, 100)
    }
}
