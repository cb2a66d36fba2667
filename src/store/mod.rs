// src/store/mod.rs

//! Persistence boundary. Handlers only talk to `dyn Store`; rows are typed
//! records from `crate::models`, never loose JSON.

pub mod memory;
pub mod postgres;
#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    activity::{ActivityLog, NewActivityLog},
    assessment::{Assessment, NewAssessment},
    certification::{Certification, NewCertification},
    lesson::{Lesson, LessonChanges, NewLesson},
    level::{LessonLevel, ProficiencyLevel},
    ranking::RankingRecord,
    session::SessionResult,
    user::{AccountStatus, NewUser, Role, User},
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("connection error: {0}")]
    Connection(String),

    /// A stored value could not be mapped back to its typed record.
    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type DynStore = Arc<dyn Store>;

/// Every table the service reads or writes.
#[async_trait]
pub trait Store: Send + Sync {
    /// Fails with `Conflict` if the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;
    async fn get_user(&self, id: i64) -> Result<User, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    /// Ordered by registration, oldest first.
    async fn list_users(
        &self,
        role: Option<Role>,
        status: Option<AccountStatus>,
    ) -> Result<Vec<User>, StoreError>;
    async fn set_user_status(&self, id: i64, status: AccountStatus) -> Result<User, StoreError>;
    async fn set_user_level(&self, id: i64, level: ProficiencyLevel) -> Result<User, StoreError>;
    /// Removes the user together with everything they own.
    async fn delete_user(&self, id: i64) -> Result<(), StoreError>;

    async fn create_lesson(&self, lesson: NewLesson) -> Result<Lesson, StoreError>;
    async fn get_lesson(&self, id: i64) -> Result<Lesson, StoreError>;
    /// Newest first. `level` filters on the exact lesson level.
    async fn list_lessons(&self, level: Option<LessonLevel>) -> Result<Vec<Lesson>, StoreError>;
    async fn update_lesson(&self, id: i64, changes: LessonChanges) -> Result<Lesson, StoreError>;
    /// Cascades progress rows; activity entries keep their text snapshot.
    async fn delete_lesson(&self, id: i64) -> Result<(), StoreError>;
    async fn lesson_has_progress(&self, id: i64) -> Result<bool, StoreError>;

    /// Whole-row upsert keyed by (student, lesson). `completed` is OR-ed with
    /// the stored value. Returns the row as stored.
    async fn upsert_progress(&self, result: SessionResult) -> Result<SessionResult, StoreError>;
    /// All progress rows, or one student's when `student_id` is set.
    async fn list_progress(
        &self,
        student_id: Option<i64>,
    ) -> Result<Vec<SessionResult>, StoreError>;

    async fn append_activity(&self, entry: NewActivityLog) -> Result<ActivityLog, StoreError>;
    /// Newest first.
    async fn list_activity(&self, user_id: i64, limit: i64) -> Result<Vec<ActivityLog>, StoreError>;
    async fn count_activity(&self) -> Result<i64, StoreError>;

    async fn insert_assessment(&self, assessment: NewAssessment) -> Result<Assessment, StoreError>;
    /// Newest first.
    async fn list_assessments(&self, student_id: i64) -> Result<Vec<Assessment>, StoreError>;

    /// Atomically swaps the ranking table for `records`. On error the
    /// previous table is left untouched.
    async fn replace_rankings(&self, records: &[RankingRecord]) -> Result<(), StoreError>;
    async fn get_ranking(&self, user_id: i64) -> Result<Option<RankingRecord>, StoreError>;
    /// Ordered by overall position.
    async fn list_rankings(&self) -> Result<Vec<RankingRecord>, StoreError>;

    /// Returns `None` if the user already holds a certificate for that grade.
    async fn insert_certification(
        &self,
        cert: NewCertification,
    ) -> Result<Option<Certification>, StoreError>;
    /// Newest first. All users when `user_id` is `None`.
    async fn list_certifications(
        &self,
        user_id: Option<i64>,
    ) -> Result<Vec<Certification>, StoreError>;
}
