// src/models/session.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{certification::Certification, ranking::RankingRecord};

/// Represents the 'progress' table: the latest attempt per (student, lesson).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SessionResult {
    pub student_id: i64,
    pub lesson_id: i64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub raw_input: String,
    pub wpm: i32,
    /// Percentage, 0..=100.
    pub accuracy: i32,
    pub error_count: i32,
    pub time_spent_seconds: i32,
    /// Sticky: stays true once any attempt reached the end of the text.
    pub completed: bool,
    pub updated_at: DateTime<Utc>,
}

/// DTO for submitting a typed lesson or assessment.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubmitSessionRequest {
    #[validate(length(max = 20000, message = "Input is too long"))]
    pub input: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// The student pressed "finish" before reaching the end of the text.
    #[serde(default)]
    pub finished_early: bool,
}

impl SubmitSessionRequest {
    /// Elapsed milliseconds between start and finish, or `None` if the
    /// timestamps are reversed.
    pub fn elapsed_ms(&self) -> Option<i64> {
        let elapsed = (self.finished_at - self.started_at).num_milliseconds();
        (elapsed >= 0).then_some(elapsed)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub wpm: i32,
    pub accuracy: i32,
    pub error_count: i32,
    pub time_spent_seconds: i32,
    pub completed: bool,
    /// Fresh standing after this session, when the refresh succeeded.
    pub ranking: Option<RankingRecord>,
    /// Certificates issued by this session's refresh.
    pub certificates: Vec<Certification>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn elapsed_rejects_reversed_timestamps() {
        let start = Utc::now();
        let mut req = SubmitSessionRequest {
            input: "abc".into(),
            started_at: start,
            finished_at: start + Duration::seconds(30),
            finished_early: false,
        };
        assert_eq!(req.elapsed_ms(), Some(30_000));

        req.finished_at = start - Duration::seconds(1);
        assert_eq!(req.elapsed_ms(), None);
    }

    #[test]
    fn finished_early_defaults_to_false() {
        let req: SubmitSessionRequest = serde_json::from_value(serde_json::json!({
            "input": "the cat",
            "started_at": "2024-01-01T00:00:00Z",
            "finished_at": "2024-01-01T00:00:30Z"
        }))
        .unwrap();
        assert!(!req.finished_early);
    }
}
