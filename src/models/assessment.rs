// src/models/assessment.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::level::ProficiencyLevel;

/// Represents the 'assessments' table: placement test results.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Assessment {
    pub id: i64,
    pub student_id: i64,
    pub wpm: i32,
    pub accuracy: i32,
    pub error_count: i32,
    pub assigned_level: ProficiencyLevel,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAssessment {
    pub student_id: i64,
    pub wpm: i32,
    pub accuracy: i32,
    pub error_count: i32,
    pub assigned_level: ProficiencyLevel,
}

/// Passage served to the student before the placement test.
#[derive(Debug, Serialize, ToSchema)]
pub struct AssessmentPassage {
    pub content: String,
    pub word_count: usize,
}
