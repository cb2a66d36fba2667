// src/models/admin.rs

use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{
    activity::ActivityLog, assessment::Assessment, certification::Certification,
    ranking::RankingRecord, session::SessionResult, user::User,
};

/// Headline numbers for the admin dashboard.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct AdminOverview {
    pub total_students: usize,
    pub pending_students: usize,
    pub approved_students: usize,
    pub denied_students: usize,
    pub total_lessons: usize,
    /// Every recorded attempt, lessons and assessments.
    pub total_sessions: i64,
    pub certifications_issued: usize,
    /// Mean of ranked students' averages, one decimal. Students without
    /// completed lessons are left out.
    pub average_wpm: f64,
    pub average_accuracy: f64,
}

/// Drill-down for one student.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserAnalytics {
    pub user: User,
    pub ranking: Option<RankingRecord>,
    pub progress: Vec<SessionResult>,
    pub assessments: Vec<Assessment>,
    pub recent_activity: Vec<ActivityLog>,
    pub certifications: Vec<Certification>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshSummary {
    pub students_ranked: usize,
    pub certificates_issued: Vec<Certification>,
}
