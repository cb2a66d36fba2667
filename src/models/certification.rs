// src/models/certification.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::ranking::RankGrade;

/// Represents the append-only 'certifications' table.
/// Unique per (user_id, rank_achieved).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Certification {
    pub id: i64,
    pub user_id: i64,
    pub rank_achieved: RankGrade,
    pub points_at_issue: i64,
    pub wpm_at_issue: f64,
    pub accuracy_at_issue: f64,
    pub issued_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCertification {
    pub user_id: i64,
    pub rank_achieved: RankGrade,
    pub points_at_issue: i64,
    pub wpm_at_issue: f64,
    pub accuracy_at_issue: f64,
}
