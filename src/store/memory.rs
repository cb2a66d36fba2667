// src/store/memory.rs

use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::Utc;

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
    store::{Store, StoreError},
};

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: BTreeMap<i64, User>,
    lessons: BTreeMap<i64, Lesson>,
    progress: BTreeMap<(i64, i64), SessionResult>,
    activity: Vec<ActivityLog>,
    assessments: Vec<Assessment>,
    rankings: Vec<RankingRecord>,
    certifications: Vec<Certification>,
}

impl Tables {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Process-local store. Used by tests and for running without a database.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Connection("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut t = self.tables()?;
        if t.users.values().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(StoreError::Conflict(format!("email '{}' already registered", user.email)));
        }
        let id = t.id();
        let row = User {
            id,
            email: user.email,
            full_name: user.full_name,
            password_hash: user.password_hash,
            role: user.role,
            status: user.status,
            level: None,
            created_at: Utc::now(),
        };
        t.users.insert(id, row.clone());
        Ok(row)
    }

    async fn get_user(&self, id: i64) -> Result<User, StoreError> {
        self.tables()?.users.get(&id).cloned().ok_or(StoreError::NotFound("user"))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .tables()?
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list_users(
        &self,
        role: Option<Role>,
        status: Option<AccountStatus>,
    ) -> Result<Vec<User>, StoreError> {
        let t = self.tables()?;
        let mut users: Vec<User> = t
            .users
            .values()
            .filter(|u| role.is_none_or(|r| u.role == r))
            .filter(|u| status.is_none_or(|s| u.status == s))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(users)
    }

    async fn set_user_status(&self, id: i64, status: AccountStatus) -> Result<User, StoreError> {
        let mut t = self.tables()?;
        let user = t.users.get_mut(&id).ok_or(StoreError::NotFound("user"))?;
        user.status = status;
        Ok(user.clone())
    }

    async fn set_user_level(&self, id: i64, level: ProficiencyLevel) -> Result<User, StoreError> {
        let mut t = self.tables()?;
        let user = t.users.get_mut(&id).ok_or(StoreError::NotFound("user"))?;
        user.level = Some(level);
        Ok(user.clone())
    }

    async fn delete_user(&self, id: i64) -> Result<(), StoreError> {
        let mut t = self.tables()?;
        if t.users.remove(&id).is_none() {
            return Err(StoreError::NotFound("user"));
        }
        t.progress.retain(|(student_id, _), _| *student_id != id);
        t.activity.retain(|a| a.user_id != id);
        t.assessments.retain(|a| a.student_id != id);
        t.rankings.retain(|r| r.user_id != id);
        t.certifications.retain(|c| c.user_id != id);
        Ok(())
    }

    async fn create_lesson(&self, lesson: NewLesson) -> Result<Lesson, StoreError> {
        let mut t = self.tables()?;
        let id = t.id();
        let row = Lesson {
            id,
            title: lesson.title,
            content: lesson.content,
            level: lesson.level,
            module_type: lesson.module_type,
            audio_url: lesson.audio_url,
            created_at: Utc::now(),
        };
        t.lessons.insert(id, row.clone());
        Ok(row)
    }

    async fn get_lesson(&self, id: i64) -> Result<Lesson, StoreError> {
        self.tables()?.lessons.get(&id).cloned().ok_or(StoreError::NotFound("lesson"))
    }

    async fn list_lessons(&self, level: Option<LessonLevel>) -> Result<Vec<Lesson>, StoreError> {
        let t = self.tables()?;
        let mut lessons: Vec<Lesson> = t
            .lessons
            .values()
            .filter(|l| level.is_none_or(|lv| l.level == lv))
            .cloned()
            .collect();
        lessons.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(lessons)
    }

    async fn update_lesson(&self, id: i64, changes: LessonChanges) -> Result<Lesson, StoreError> {
        let mut t = self.tables()?;
        let lesson = t.lessons.get_mut(&id).ok_or(StoreError::NotFound("lesson"))?;
        if let Some(title) = changes.title {
            lesson.title = title;
        }
        if let Some(content) = changes.content {
            lesson.content = content;
        }
        if let Some(level) = changes.level {
            lesson.level = level;
        }
        if let Some(module_type) = changes.module_type {
            lesson.module_type = module_type;
        }
        if let Some(audio_url) = changes.audio_url {
            lesson.audio_url = Some(audio_url);
        }
        Ok(lesson.clone())
    }

    async fn delete_lesson(&self, id: i64) -> Result<(), StoreError> {
        let mut t = self.tables()?;
        if t.lessons.remove(&id).is_none() {
            return Err(StoreError::NotFound("lesson"));
        }
        t.progress.retain(|(_, lesson_id), _| *lesson_id != id);
        for entry in t.activity.iter_mut().filter(|a| a.lesson_id == Some(id)) {
            entry.lesson_id = None;
        }
        Ok(())
    }

    async fn lesson_has_progress(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.tables()?.progress.keys().any(|(_, lesson_id)| *lesson_id == id))
    }

    async fn upsert_progress(&self, result: SessionResult) -> Result<SessionResult, StoreError> {
        let mut t = self.tables()?;
        if !t.users.contains_key(&result.student_id) {
            return Err(StoreError::NotFound("user"));
        }
        if !t.lessons.contains_key(&result.lesson_id) {
            return Err(StoreError::NotFound("lesson"));
        }
        let key = (result.student_id, result.lesson_id);
        let completed = result.completed || t.progress.get(&key).is_some_and(|p| p.completed);
        let row = SessionResult {
            completed,
            ..result
        };
        t.progress.insert(key, row.clone());
        Ok(row)
    }

    async fn list_progress(
        &self,
        student_id: Option<i64>,
    ) -> Result<Vec<SessionResult>, StoreError> {
        Ok(self
            .tables()?
            .progress
            .values()
            .filter(|p| student_id.is_none_or(|id| p.student_id == id))
            .cloned()
            .collect())
    }

    async fn append_activity(&self, entry: NewActivityLog) -> Result<ActivityLog, StoreError> {
        let mut t = self.tables()?;
        let id = t.id();
        let row = ActivityLog {
            id,
            user_id: entry.user_id,
            activity_type: entry.activity_type,
            lesson_id: entry.lesson_id,
            duration_seconds: entry.duration_seconds,
            wpm: entry.wpm,
            accuracy: entry.accuracy,
            errors: entry.errors,
            text_content: entry.text_content,
            created_at: Utc::now(),
        };
        t.activity.push(row.clone());
        Ok(row)
    }

    async fn list_activity(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<ActivityLog>, StoreError> {
        let t = self.tables()?;
        Ok(t.activity
            .iter()
            .rev()
            .filter(|a| a.user_id == user_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn count_activity(&self) -> Result<i64, StoreError> {
        Ok(self.tables()?.activity.len() as i64)
    }

    async fn insert_assessment(&self, assessment: NewAssessment) -> Result<Assessment, StoreError> {
        let mut t = self.tables()?;
        let id = t.id();
        let row = Assessment {
            id,
            student_id: assessment.student_id,
            wpm: assessment.wpm,
            accuracy: assessment.accuracy,
            error_count: assessment.error_count,
            assigned_level: assessment.assigned_level,
            created_at: Utc::now(),
        };
        t.assessments.push(row.clone());
        Ok(row)
    }

    async fn list_assessments(&self, student_id: i64) -> Result<Vec<Assessment>, StoreError> {
        let t = self.tables()?;
        Ok(t.assessments
            .iter()
            .rev()
            .filter(|a| a.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn replace_rankings(&self, records: &[RankingRecord]) -> Result<(), StoreError> {
        let mut t = self.tables()?;
        let mut rows = records.to_vec();
        rows.sort_by_key(|r| r.overall_position);
        t.rankings = rows;
        Ok(())
    }

    async fn get_ranking(&self, user_id: i64) -> Result<Option<RankingRecord>, StoreError> {
        Ok(self.tables()?.rankings.iter().find(|r| r.user_id == user_id).cloned())
    }

    async fn list_rankings(&self) -> Result<Vec<RankingRecord>, StoreError> {
        Ok(self.tables()?.rankings.clone())
    }

    async fn insert_certification(
        &self,
        cert: NewCertification,
    ) -> Result<Option<Certification>, StoreError> {
        let mut t = self.tables()?;
        if t
            .certifications
            .iter()
            .any(|c| c.user_id == cert.user_id && c.rank_achieved == cert.rank_achieved)
        {
            return Ok(None);
        }
        let id = t.id();
        let row = Certification {
            id,
            user_id: cert.user_id,
            rank_achieved: cert.rank_achieved,
            points_at_issue: cert.points_at_issue,
            wpm_at_issue: cert.wpm_at_issue,
            accuracy_at_issue: cert.accuracy_at_issue,
            issued_at: Utc::now(),
        };
        t.certifications.push(row.clone());
        Ok(Some(row))
    }

    async fn list_certifications(
        &self,
        user_id: Option<i64>,
    ) -> Result<Vec<Certification>, StoreError> {
        let t = self.tables()?;
        Ok(t.certifications
            .iter()
            .rev()
            .filter(|c| user_id.is_none_or(|id| c.user_id == id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{lesson::ModuleType, ranking::RankGrade};

    fn new_student(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            full_name: "Test Student".to_string(),
            password_hash: "hash".to_string(),
            role: Role::Student,
            status: AccountStatus::Pending,
        }
    }

    fn new_lesson() -> NewLesson {
        NewLesson {
            title: "Vitals".to_string(),
            content: "the cat sat".to_string(),
            level: LessonLevel::Beginner,
            module_type: ModuleType::Text,
            audio_url: None,
        }
    }

    fn result(student_id: i64, lesson_id: i64, wpm: i32, completed: bool) -> SessionResult {
        let now = Utc::now();
        SessionResult {
            student_id,
            lesson_id,
            started_at: now,
            finished_at: now,
            raw_input: "the cat".to_string(),
            wpm,
            accuracy: 90,
            error_count: 0,
            time_spent_seconds: 10,
            completed,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = MemoryStore::new();
        store.create_user(new_student("a@example.com")).await.unwrap();
        let err = store.create_user(new_student("A@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn progress_upsert_keeps_one_row_and_sticky_completion() {
        let store = MemoryStore::new();
        let user = store.create_user(new_student("a@example.com")).await.unwrap();
        let lesson = store.create_lesson(new_lesson()).await.unwrap();

        store.upsert_progress(result(user.id, lesson.id, 20, true)).await.unwrap();
        let stored = store.upsert_progress(result(user.id, lesson.id, 35, false)).await.unwrap();

        assert!(stored.completed);
        assert_eq!(stored.wpm, 35);
        assert_eq!(store.list_progress(Some(user.id)).await.unwrap().len(), 1);
        assert!(store.lesson_has_progress(lesson.id).await.unwrap());
    }

    #[tokio::test]
    async fn deleting_lesson_cascades_progress_and_detaches_activity() {
        let store = MemoryStore::new();
        let user = store.create_user(new_student("a@example.com")).await.unwrap();
        let lesson = store.create_lesson(new_lesson()).await.unwrap();
        store.upsert_progress(result(user.id, lesson.id, 20, true)).await.unwrap();
        store
            .append_activity(NewActivityLog {
                user_id: user.id,
                activity_type: crate::models::activity::ActivityType::Lesson,
                lesson_id: Some(lesson.id),
                duration_seconds: 10,
                wpm: 20,
                accuracy: 90,
                errors: 1,
                text_content: lesson.content.clone(),
            })
            .await
            .unwrap();

        store.delete_lesson(lesson.id).await.unwrap();

        assert!(store.list_progress(None).await.unwrap().is_empty());
        let activity = store.list_activity(user.id, 10).await.unwrap();
        assert_eq!(activity.len(), 1);
        assert_eq!(activity[0].lesson_id, None);
        assert_eq!(activity[0].text_content, "the cat sat");
    }

    #[tokio::test]
    async fn certification_is_unique_per_grade() {
        let store = MemoryStore::new();
        let cert = NewCertification {
            user_id: 1,
            rank_achieved: RankGrade::C,
            points_at_issue: 300,
            wpm_at_issue: 30.0,
            accuracy_at_issue: 95.0,
        };
        assert!(store.insert_certification(cert.clone()).await.unwrap().is_some());
        assert!(store.insert_certification(cert).await.unwrap().is_none());
        assert_eq!(store.list_certifications(Some(1)).await.unwrap().len(), 1);
    }
}
