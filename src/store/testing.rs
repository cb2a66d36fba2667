// src/store/testing.rs

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::{
    models::{
        activity::{ActivityLog, NewActivityLog},
        assessment::{Assessment, NewAssessment},
        certification::{Certification, NewCertification},
        lesson::{Lesson, LessonChanges, NewLesson},
        level::{LessonLevel, ProficiencyLevel},
        ranking::RankingRecord,
        session::SessionResult,
        user::{AccountStatus, NewUser, Role, User},
    },
    store::{MemoryStore, Store, StoreError},
};

/// Delegates to a `MemoryStore`. Each counter fails that many upcoming calls
/// of its operation with `StoreError::Connection`.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    pub failing_certificate_inserts: AtomicUsize,
    pub failing_ranking_swaps: AtomicUsize,
    pub failing_ranking_reads: AtomicUsize,
}

fn take_failure(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl Store for FlakyStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        self.inner.create_user(user).await
    }
    async fn get_user(&self, id: i64) -> Result<User, StoreError> {
        self.inner.get_user(id).await
    }
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.inner.find_user_by_email(email).await
    }
    async fn list_users(
        &self,
        role: Option<Role>,
        status: Option<AccountStatus>,
    ) -> Result<Vec<User>, StoreError> {
        self.inner.list_users(role, status).await
    }
    async fn set_user_status(&self, id: i64, status: AccountStatus) -> Result<User, StoreError> {
        self.inner.set_user_status(id, status).await
    }
    async fn set_user_level(
        &self,
        id: i64,
        level: ProficiencyLevel,
    ) -> Result<User, StoreError> {
        self.inner.set_user_level(id, level).await
    }
    async fn delete_user(&self, id: i64) -> Result<(), StoreError> {
        self.inner.delete_user(id).await
    }
    async fn create_lesson(&self, lesson: NewLesson) -> Result<Lesson, StoreError> {
        self.inner.create_lesson(lesson).await
    }
    async fn get_lesson(&self, id: i64) -> Result<Lesson, StoreError> {
        self.inner.get_lesson(id).await
    }
    async fn list_lessons(&self, level: Option<LessonLevel>) -> Result<Vec<Lesson>, StoreError> {
        self.inner.list_lessons(level).await
    }
    async fn update_lesson(
        &self,
        id: i64,
        changes: LessonChanges,
    ) -> Result<Lesson, StoreError> {
        self.inner.update_lesson(id, changes).await
    }
    async fn delete_lesson(&self, id: i64) -> Result<(), StoreError> {
        self.inner.delete_lesson(id).await
    }
    async fn lesson_has_progress(&self, id: i64) -> Result<bool, StoreError> {
        self.inner.lesson_has_progress(id).await
    }
    async fn upsert_progress(&self, result: SessionResult) -> Result<SessionResult, StoreError> {
        self.inner.upsert_progress(result).await
    }
    async fn list_progress(
        &self,
        student_id: Option<i64>,
    ) -> Result<Vec<SessionResult>, StoreError> {
        self.inner.list_progress(student_id).await
    }
    async fn append_activity(&self, entry: NewActivityLog) -> Result<ActivityLog, StoreError> {
        self.inner.append_activity(entry).await
    }
    async fn list_activity(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<ActivityLog>, StoreError> {
        self.inner.list_activity(user_id, limit).await
    }
    async fn count_activity(&self) -> Result<i64, StoreError> {
        self.inner.count_activity().await
    }
    async fn insert_assessment(
        &self,
        assessment: NewAssessment,
    ) -> Result<Assessment, StoreError> {
        self.inner.insert_assessment(assessment).await
    }
    async fn list_assessments(&self, student_id: i64) -> Result<Vec<Assessment>, StoreError> {
        self.inner.list_assessments(student_id).await
    }
    async fn replace_rankings(&self, records: &[RankingRecord]) -> Result<(), StoreError> {
        if take_failure(&self.failing_ranking_swaps) {
            return Err(StoreError::Connection("rankings unavailable".to_string()));
        }
        self.inner.replace_rankings(records).await
    }
    async fn get_ranking(&self, user_id: i64) -> Result<Option<RankingRecord>, StoreError> {
        if take_failure(&self.failing_ranking_reads) {
            return Err(StoreError::Connection("rankings unavailable".to_string()));
        }
        self.inner.get_ranking(user_id).await
    }
    async fn list_rankings(&self) -> Result<Vec<RankingRecord>, StoreError> {
        self.inner.list_rankings().await
    }
    async fn insert_certification(
        &self,
        cert: NewCertification,
    ) -> Result<Option<Certification>, StoreError> {
        if take_failure(&self.failing_certificate_inserts) {
            return Err(StoreError::Connection("certifications unavailable".to_string()));
        }
        self.inner.insert_certification(cert).await
    }
    async fn list_certifications(
        &self,
        user_id: Option<i64>,
    ) -> Result<Vec<Certification>, StoreError> {
        self.inner.list_certifications(user_id).await
    }
}
