// src/handlers/mod.rs

pub mod admin;
pub mod assessment;
pub mod auth;
pub mod lessons;
pub mod profile;
pub mod rankings;
pub mod speech;

use validator::Validate;

use crate::{
    error::AppError,
    models::{
        session::SubmitSessionRequest,
        user::{Role, User},
    },
    scoring::{ScoringPolicy, scorer},
};

/// Scored typing attempt, converted to storage column types.
pub(crate) struct ScoredAttempt {
    pub wpm: i32,
    pub accuracy: i32,
    pub error_count: i32,
    pub time_spent_seconds: i32,
    pub completed: bool,
}

fn to_column(value: impl TryInto<i32>) -> i32 {
    value.try_into().unwrap_or(i32::MAX)
}

/// Validates a submission and scores it against `reference`.
///
/// Rejects reversed timestamps and attempts that stop short of the
/// reference without `finished_early`.
pub(crate) fn score_attempt(
    reference: &str,
    req: &SubmitSessionRequest,
    policy: &ScoringPolicy,
) -> Result<ScoredAttempt, AppError> {
    req.validate()?;

    let elapsed_ms = req.elapsed_ms().ok_or_else(|| {
        AppError::BadRequest("finished_at must not be before started_at".to_string())
    })?;

    let completed = scorer::is_complete(reference, &req.input);
    if !completed && !req.finished_early {
        return Err(AppError::BadRequest(
            "Input is shorter than the text; set finished_early to submit a partial attempt"
                .to_string(),
        ));
    }

    let metrics = scorer::score(reference, &req.input, elapsed_ms, policy);

    Ok(ScoredAttempt {
        wpm: to_column(metrics.wpm),
        accuracy: to_column(metrics.accuracy),
        error_count: to_column(metrics.error_count),
        time_spent_seconds: to_column((elapsed_ms + 500) / 1000),
        completed,
    })
}

/// Sessions and assessments are for students only.
pub(crate) fn require_student(user: &User) -> Result<(), AppError> {
    if user.role != Role::Student {
        return Err(AppError::Forbidden(
            "Only students can submit typing attempts".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn request(input: &str, seconds: i64, finished_early: bool) -> SubmitSessionRequest {
        let start = Utc::now();
        SubmitSessionRequest {
            input: input.to_string(),
            started_at: start,
            finished_at: start + Duration::seconds(seconds),
            finished_early,
        }
    }

    #[test]
    fn complete_attempt_is_scored() {
        let req = request("the cat sat", 30, false);
        let attempt = score_attempt("the cat sat", &req, ScoringPolicy::current()).unwrap();
        assert_eq!(attempt.wpm, 6);
        assert_eq!(attempt.accuracy, 100);
        assert_eq!(attempt.time_spent_seconds, 30);
        assert!(attempt.completed);
    }

    #[test]
    fn short_attempt_needs_finished_early() {
        let policy = ScoringPolicy::current();
        assert!(matches!(
            score_attempt("the cat sat", &request("the", 5, false), policy),
            Err(AppError::BadRequest(_))
        ));
        let attempt = score_attempt("the cat sat", &request("the", 5, true), policy).unwrap();
        assert!(!attempt.completed);
        assert_eq!(attempt.accuracy, 27);
    }

    #[test]
    fn reversed_timestamps_are_rejected() {
        assert!(matches!(
            score_attempt("abc", &request("abc", -3, false), ScoringPolicy::current()),
            Err(AppError::BadRequest(_))
        ));
    }
}
