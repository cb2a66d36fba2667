// src/store/postgres.rs

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::{
    models::{
        activity::{ActivityLog, NewActivityLog},
        assessment::{Assessment, NewAssessment},
        certification::{Certification, NewCertification},
        lesson::{Lesson, LessonChanges, NewLesson},
        level::{LessonLevel, ProficiencyLevel},
        ranking::{RankingRecord, category_label},
        session::SessionResult,
        user::{AccountStatus, NewUser, Role, User},
    },
    store::{Store, StoreError},
};

/// Rows per INSERT when rewriting the ranking table. Keeps bind count
/// well under the Postgres limit of 65535 parameters.
const RANKING_INSERT_CHUNK: usize = 1000;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("row"),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(db.message().to_string())
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                StoreError::NotFound("referenced row")
            }
            other => StoreError::Connection(other.to_string()),
        }
    }
}

fn parse<T>(value: &str) -> Result<T, StoreError>
where
    T: FromStr<Err = String>,
{
    value.parse::<T>().map_err(StoreError::Serialization)
}

/// Category is stored as text; students without a level use the
/// `unassigned` label.
fn parse_category(value: &str) -> Result<Option<ProficiencyLevel>, StoreError> {
    if value == category_label(None) {
        Ok(None)
    } else {
        parse(value).map(Some)
    }
}

#[derive(FromRow)]
struct UserRow {
    id: i64,
    email: String,
    full_name: String,
    password_hash: String,
    role: String,
    status: String,
    level: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            email: row.email,
            full_name: row.full_name,
            password_hash: row.password_hash,
            role: parse(&row.role)?,
            status: parse(&row.status)?,
            level: row.level.as_deref().map(parse).transpose()?,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct LessonRow {
    id: i64,
    title: String,
    content: String,
    level: String,
    module_type: String,
    audio_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<LessonRow> for Lesson {
    type Error = StoreError;

    fn try_from(row: LessonRow) -> Result<Self, Self::Error> {
        Ok(Lesson {
            id: row.id,
            title: row.title,
            content: row.content,
            level: parse(&row.level)?,
            module_type: parse(&row.module_type)?,
            audio_url: row.audio_url,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct ProgressRow {
    student_id: i64,
    lesson_id: i64,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    raw_input: String,
    wpm: i32,
    accuracy: i32,
    error_count: i32,
    time_spent_seconds: i32,
    completed: bool,
    updated_at: DateTime<Utc>,
}

impl From<ProgressRow> for SessionResult {
    fn from(row: ProgressRow) -> Self {
        SessionResult {
            student_id: row.student_id,
            lesson_id: row.lesson_id,
            started_at: row.started_at,
            finished_at: row.finished_at,
            raw_input: row.raw_input,
            wpm: row.wpm,
            accuracy: row.accuracy,
            error_count: row.error_count,
            time_spent_seconds: row.time_spent_seconds,
            completed: row.completed,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct ActivityRow {
    id: i64,
    user_id: i64,
    activity_type: String,
    lesson_id: Option<i64>,
    duration_seconds: i32,
    wpm: i32,
    accuracy: i32,
    errors: i32,
    text_content: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ActivityRow> for ActivityLog {
    type Error = StoreError;

    fn try_from(row: ActivityRow) -> Result<Self, Self::Error> {
        Ok(ActivityLog {
            id: row.id,
            user_id: row.user_id,
            activity_type: parse(&row.activity_type)?,
            lesson_id: row.lesson_id,
            duration_seconds: row.duration_seconds,
            wpm: row.wpm,
            accuracy: row.accuracy,
            errors: row.errors,
            text_content: row.text_content,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct AssessmentRow {
    id: i64,
    student_id: i64,
    wpm: i32,
    accuracy: i32,
    error_count: i32,
    assigned_level: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AssessmentRow> for Assessment {
    type Error = StoreError;

    fn try_from(row: AssessmentRow) -> Result<Self, Self::Error> {
        Ok(Assessment {
            id: row.id,
            student_id: row.student_id,
            wpm: row.wpm,
            accuracy: row.accuracy,
            error_count: row.error_count,
            assigned_level: parse(&row.assigned_level)?,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct RankingRow {
    user_id: i64,
    total_points: i64,
    average_wpm: f64,
    average_accuracy: f64,
    rank_grade: String,
    rank_category: String,
    overall_position: i64,
    category_position: i64,
    total_lessons_completed: i64,
    total_time_spent_seconds: i64,
    theme: String,
    policy_version: i32,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RankingRow> for RankingRecord {
    type Error = StoreError;

    fn try_from(row: RankingRow) -> Result<Self, Self::Error> {
        Ok(RankingRecord {
            user_id: row.user_id,
            total_points: row.total_points,
            average_wpm: row.average_wpm,
            average_accuracy: row.average_accuracy,
            rank_grade: parse(&row.rank_grade)?,
            rank_category: parse_category(&row.rank_category)?,
            overall_position: row.overall_position,
            category_position: row.category_position,
            total_lessons_completed: row.total_lessons_completed,
            total_time_spent_seconds: row.total_time_spent_seconds,
            theme: parse(&row.theme)?,
            policy_version: row.policy_version,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct CertificationRow {
    id: i64,
    user_id: i64,
    rank_achieved: String,
    points_at_issue: i64,
    wpm_at_issue: f64,
    accuracy_at_issue: f64,
    issued_at: DateTime<Utc>,
}

impl TryFrom<CertificationRow> for Certification {
    type Error = StoreError;

    fn try_from(row: CertificationRow) -> Result<Self, Self::Error> {
        Ok(Certification {
            id: row.id,
            user_id: row.user_id,
            rank_achieved: parse(&row.rank_achieved)?,
            points_at_issue: row.points_at_issue,
            wpm_at_issue: row.wpm_at_issue,
            accuracy_at_issue: row.accuracy_at_issue,
            issued_at: row.issued_at,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

const USER_COLUMNS: &str = "id, email, full_name, password_hash, role, status, level, created_at";
const LESSON_COLUMNS: &str = "id, title, content, level, module_type, audio_url, created_at";
const PROGRESS_COLUMNS: &str = "student_id, lesson_id, started_at, finished_at, raw_input, wpm, \
     accuracy, error_count, time_spent_seconds, completed, updated_at";
const ACTIVITY_COLUMNS: &str = "id, user_id, activity_type, lesson_id, duration_seconds, wpm, \
     accuracy, errors, text_content, created_at";
const ASSESSMENT_COLUMNS: &str =
    "id, student_id, wpm, accuracy, error_count, assigned_level, created_at";
const RANKING_COLUMNS: &str = "user_id, total_points, average_wpm, average_accuracy, rank_grade, \
     rank_category, overall_position, category_position, total_lessons_completed, \
     total_time_spent_seconds, theme, policy_version, updated_at";
const CERTIFICATION_COLUMNS: &str =
    "id, user_id, rank_achieved, points_at_issue, wpm_at_issue, accuracy_at_issue, issued_at";

/// PostgreSQL-backed store. Schema lives in `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let row: UserRow = sqlx::query_as(&format!(
            "INSERT INTO users (email, full_name, password_hash, role, status) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::Conflict(_) => {
                StoreError::Conflict(format!("email '{}' already registered", user.email))
            }
            other => other,
        })?;

        row.try_into()
    }

    async fn get_user(&self, id: i64) -> Result<User, StoreError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.ok_or(StoreError::NotFound("user"))?.try_into()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn list_users(
        &self,
        role: Option<Role>,
        status: Option<AccountStatus>,
    ) -> Result<Vec<User>, StoreError> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE ($1::TEXT IS NULL OR role = $1) AND ($2::TEXT IS NULL OR status = $2) \
             ORDER BY created_at, id"
        ))
        .bind(role.map(|r| r.as_str()))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        convert_all(rows)
    }

    async fn set_user_status(&self, id: i64, status: AccountStatus) -> Result<User, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users SET status = $1, updated_at = NOW() \
             WHERE id = $2 RETURNING {USER_COLUMNS}"
        ))
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(StoreError::NotFound("user"))?.try_into()
    }

    async fn set_user_level(&self, id: i64, level: ProficiencyLevel) -> Result<User, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users SET level = $1, updated_at = NOW() WHERE id = $2 RETURNING {USER_COLUMNS}"
        ))
        .bind(level.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(StoreError::NotFound("user"))?.try_into()
    }

    async fn delete_user(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("user"));
        }
        Ok(())
    }

    async fn create_lesson(&self, lesson: NewLesson) -> Result<Lesson, StoreError> {
        let row: LessonRow = sqlx::query_as(&format!(
            "INSERT INTO lessons (title, content, level, module_type, audio_url) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {LESSON_COLUMNS}"
        ))
        .bind(&lesson.title)
        .bind(&lesson.content)
        .bind(lesson.level.as_str())
        .bind(lesson.module_type.as_str())
        .bind(&lesson.audio_url)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn get_lesson(&self, id: i64) -> Result<Lesson, StoreError> {
        let row: Option<LessonRow> =
            sqlx::query_as(&format!("SELECT {LESSON_COLUMNS} FROM lessons WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.ok_or(StoreError::NotFound("lesson"))?.try_into()
    }

    async fn list_lessons(&self, level: Option<LessonLevel>) -> Result<Vec<Lesson>, StoreError> {
        let rows: Vec<LessonRow> = sqlx::query_as(&format!(
            "SELECT {LESSON_COLUMNS} FROM lessons \
             WHERE ($1::TEXT IS NULL OR level = $1) \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(level.map(|l| l.as_str()))
        .fetch_all(&self.pool)
        .await?;

        convert_all(rows)
    }

    async fn update_lesson(&self, id: i64, changes: LessonChanges) -> Result<Lesson, StoreError> {
        if changes.is_empty() {
            return self.get_lesson(id).await;
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE lessons SET ");
        let mut separated = builder.separated(", ");

        if let Some(title) = changes.title {
            separated.push("title = ");
            separated.push_bind_unseparated(title);
        }

        if let Some(content) = changes.content {
            separated.push("content = ");
            separated.push_bind_unseparated(content);
        }

        if let Some(level) = changes.level {
            separated.push("level = ");
            separated.push_bind_unseparated(level.as_str());
        }

        if let Some(module_type) = changes.module_type {
            separated.push("module_type = ");
            separated.push_bind_unseparated(module_type.as_str());
        }

        if let Some(audio_url) = changes.audio_url {
            separated.push("audio_url = ");
            separated.push_bind_unseparated(audio_url);
        }

        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(format!(" RETURNING {LESSON_COLUMNS}"));

        let row: Option<LessonRow> = builder.build_query_as().fetch_optional(&self.pool).await?;

        row.ok_or(StoreError::NotFound("lesson"))?.try_into()
    }

    async fn delete_lesson(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM lessons WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("lesson"));
        }
        Ok(())
    }

    async fn lesson_has_progress(&self, id: i64) -> Result<bool, StoreError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM progress WHERE lesson_id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn upsert_progress(&self, result: SessionResult) -> Result<SessionResult, StoreError> {
        let row: ProgressRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO progress
                (student_id, lesson_id, started_at, finished_at, raw_input, wpm, accuracy,
                 error_count, time_spent_seconds, completed, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (student_id, lesson_id) DO UPDATE SET
                started_at = EXCLUDED.started_at,
                finished_at = EXCLUDED.finished_at,
                raw_input = EXCLUDED.raw_input,
                wpm = EXCLUDED.wpm,
                accuracy = EXCLUDED.accuracy,
                error_count = EXCLUDED.error_count,
                time_spent_seconds = EXCLUDED.time_spent_seconds,
                completed = progress.completed OR EXCLUDED.completed,
                updated_at = EXCLUDED.updated_at
            RETURNING {PROGRESS_COLUMNS}
            "#
        ))
        .bind(result.student_id)
        .bind(result.lesson_id)
        .bind(result.started_at)
        .bind(result.finished_at)
        .bind(&result.raw_input)
        .bind(result.wpm)
        .bind(result.accuracy)
        .bind(result.error_count)
        .bind(result.time_spent_seconds)
        .bind(result.completed)
        .bind(result.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn list_progress(
        &self,
        student_id: Option<i64>,
    ) -> Result<Vec<SessionResult>, StoreError> {
        let rows: Vec<ProgressRow> = sqlx::query_as(&format!(
            "SELECT {PROGRESS_COLUMNS} FROM progress \
             WHERE ($1::BIGINT IS NULL OR student_id = $1) \
             ORDER BY student_id, updated_at"
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SessionResult::from).collect())
    }

    async fn append_activity(&self, entry: NewActivityLog) -> Result<ActivityLog, StoreError> {
        let row: ActivityRow = sqlx::query_as(&format!(
            "INSERT INTO activity_logs \
             (user_id, activity_type, lesson_id, duration_seconds, wpm, accuracy, errors, \
             text_content) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {ACTIVITY_COLUMNS}"
        ))
        .bind(entry.user_id)
        .bind(entry.activity_type.as_str())
        .bind(entry.lesson_id)
        .bind(entry.duration_seconds)
        .bind(entry.wpm)
        .bind(entry.accuracy)
        .bind(entry.errors)
        .bind(&entry.text_content)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn list_activity(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<ActivityLog>, StoreError> {
        let rows: Vec<ActivityRow> = sqlx::query_as(&format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activity_logs \
             WHERE user_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2"
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        convert_all(rows)
    }

    async fn count_activity(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM activity_logs")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn insert_assessment(&self, assessment: NewAssessment) -> Result<Assessment, StoreError> {
        let row: AssessmentRow = sqlx::query_as(&format!(
            "INSERT INTO assessments (student_id, wpm, accuracy, error_count, assigned_level) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {ASSESSMENT_COLUMNS}"
        ))
        .bind(assessment.student_id)
        .bind(assessment.wpm)
        .bind(assessment.accuracy)
        .bind(assessment.error_count)
        .bind(assessment.assigned_level.as_str())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn list_assessments(&self, student_id: i64) -> Result<Vec<Assessment>, StoreError> {
        let rows: Vec<AssessmentRow> = sqlx::query_as(&format!(
            "SELECT {ASSESSMENT_COLUMNS} FROM assessments \
             WHERE student_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        convert_all(rows)
    }

    async fn replace_rankings(&self, records: &[RankingRecord]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        // Serializes concurrent swaps; readers are not blocked.
        sqlx::query("LOCK TABLE rankings IN EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM rankings").execute(&mut *tx).await?;

        for chunk in records.chunks(RANKING_INSERT_CHUNK) {
            let mut builder: QueryBuilder<Postgres> =
                QueryBuilder::new(format!("INSERT INTO rankings ({RANKING_COLUMNS}) "));
            builder.push_values(chunk, |mut b, r| {
                b.push_bind(r.user_id)
                    .push_bind(r.total_points)
                    .push_bind(r.average_wpm)
                    .push_bind(r.average_accuracy)
                    .push_bind(r.rank_grade.as_str())
                    .push_bind(category_label(r.rank_category))
                    .push_bind(r.overall_position)
                    .push_bind(r.category_position)
                    .push_bind(r.total_lessons_completed)
                    .push_bind(r.total_time_spent_seconds)
                    .push_bind(r.theme.as_str())
                    .push_bind(r.policy_version)
                    .push_bind(r.updated_at);
            });
            builder.build().execute(&mut *tx).await?;
        }

        // Dropping `tx` on an early return rolls back, leaving the old table.
        tx.commit().await?;
        Ok(())
    }

    async fn get_ranking(&self, user_id: i64) -> Result<Option<RankingRecord>, StoreError> {
        let row: Option<RankingRow> =
            sqlx::query_as(&format!("SELECT {RANKING_COLUMNS} FROM rankings WHERE user_id = $1"))
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(RankingRecord::try_from).transpose()
    }

    async fn list_rankings(&self) -> Result<Vec<RankingRecord>, StoreError> {
        let rows: Vec<RankingRow> = sqlx::query_as(&format!(
            "SELECT {RANKING_COLUMNS} FROM rankings ORDER BY overall_position"
        ))
        .fetch_all(&self.pool)
        .await?;

        convert_all(rows)
    }

    async fn insert_certification(
        &self,
        cert: NewCertification,
    ) -> Result<Option<Certification>, StoreError> {
        let row: Option<CertificationRow> = sqlx::query_as(&format!(
            "INSERT INTO certifications \
             (user_id, rank_achieved, points_at_issue, wpm_at_issue, accuracy_at_issue) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (user_id, rank_achieved) DO NOTHING \
             RETURNING {CERTIFICATION_COLUMNS}"
        ))
        .bind(cert.user_id)
        .bind(cert.rank_achieved.as_str())
        .bind(cert.points_at_issue)
        .bind(cert.wpm_at_issue)
        .bind(cert.accuracy_at_issue)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Certification::try_from).transpose()
    }

    async fn list_certifications(
        &self,
        user_id: Option<i64>,
    ) -> Result<Vec<Certification>, StoreError> {
        let rows: Vec<CertificationRow> = sqlx::query_as(&format!(
            "SELECT {CERTIFICATION_COLUMNS} FROM certifications \
             WHERE ($1::BIGINT IS NULL OR user_id = $1) \
             ORDER BY issued_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        convert_all(rows)
    }
}
