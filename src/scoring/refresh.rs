// src/scoring/refresh.rs

use std::collections::HashMap;

use chrono::Utc;

use crate::{
    models::{
        certification::Certification,
        level::LessonLevel,
        ranking::{RankGrade, RankingRecord},
        user::{AccountStatus, Role},
    },
    scoring::{
        certification::maybe_issue_certificate,
        policy::ScoringPolicy,
        ranking::{SessionSample, StudentSnapshot, rank_population},
    },
    store::{Store, StoreError},
};

/// Result of one refresh pass.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    /// The new ranking table, ordered by overall position.
    pub rankings: Vec<RankingRecord>,
    /// Certificates issued during this pass.
    pub issued: Vec<Certification>,
}

impl RefreshOutcome {
    pub fn ranking_for(&self, user_id: i64) -> Option<&RankingRecord> {
        self.rankings.iter().find(|r| r.user_id == user_id)
    }

    pub fn issued_to(&self, user_id: i64) -> Vec<Certification> {
        self.issued.iter().filter(|c| c.user_id == user_id).cloned().collect()
    }
}

/// Recomputes every approved student's ranking, swaps the stored table and
/// issues certificates for grade increases.
///
/// Progress rows whose lesson has disappeared are scored against the `All`
/// target. If the table swap fails nothing is issued and the previous
/// rankings stay in place.
///
/// A student's previous grade is the highest certificate they hold, not the
/// stored ranking, so a certificate whose insert failed is issued again by
/// the next pass.
pub async fn refresh_rankings(
    store: &dyn Store,
    policy: &ScoringPolicy,
) -> Result<RefreshOutcome, StoreError> {
    let students = store
        .list_users(Some(Role::Student), Some(AccountStatus::Approved))
        .await?;

    let lesson_levels: HashMap<i64, LessonLevel> = store
        .list_lessons(None)
        .await?
        .into_iter()
        .map(|lesson| (lesson.id, lesson.level))
        .collect();

    let mut sessions: HashMap<i64, Vec<SessionSample>> = HashMap::new();
    for row in store.list_progress(None).await? {
        sessions.entry(row.student_id).or_default().push(SessionSample {
            lesson_id: row.lesson_id,
            lesson_level: lesson_levels
                .get(&row.lesson_id)
                .copied()
                .unwrap_or(LessonLevel::All),
            wpm: row.wpm,
            accuracy: row.accuracy,
            time_spent_seconds: row.time_spent_seconds,
            completed: row.completed,
        });
    }

    let mut held: HashMap<i64, Vec<RankGrade>> = HashMap::new();
    for cert in store.list_certifications(None).await? {
        held.entry(cert.user_id).or_default().push(cert.rank_achieved);
    }

    let snapshots: Vec<StudentSnapshot> = students
        .into_iter()
        .map(|user| StudentSnapshot {
            user_id: user.id,
            registered_at: user.created_at,
            level: user.level,
            sessions: sessions.remove(&user.id).unwrap_or_default(),
        })
        .collect();

    let rankings = rank_population(&snapshots, policy, Utc::now());
    store.replace_rankings(&rankings).await?;

    let mut issued = Vec::new();
    for record in &rankings {
        let already_held = held.get(&record.user_id).map(Vec::as_slice).unwrap_or(&[]);
        let previous = already_held.iter().max().copied();
        let Some(candidate) = maybe_issue_certificate(previous, record, already_held) else {
            continue;
        };

        // `None` means a concurrent refresh got there first.
        if let Some(cert) = store.insert_certification(candidate).await? {
            tracing::info!(
                "Issued {} certificate to user {} at {} points",
                cert.rank_achieved,
                cert.user_id,
                cert.points_at_issue
            );
            issued.push(cert);
        }
    }

    tracing::debug!(
        "Rankings refreshed: {} students, {} certificates issued",
        rankings.len(),
        issued.len()
    );

    Ok(RefreshOutcome { rankings, issued })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    use crate::{
        models::{
            lesson::{ModuleType, NewLesson},
            level::ProficiencyLevel,
            session::SessionResult,
            user::NewUser,
        },
        store::{MemoryStore, testing::FlakyStore},
    };

    async fn approved_student(store: &dyn Store, email: &str) -> i64 {
        let user = store
            .create_user(NewUser {
                email: email.to_string(),
                full_name: email.to_string(),
                password_hash: "hash".to_string(),
                role: Role::Student,
                status: AccountStatus::Pending,
            })
            .await
            .unwrap();
        store.set_user_status(user.id, AccountStatus::Approved).await.unwrap();
        user.id
    }

    async fn lessons(store: &dyn Store, count: usize) -> Vec<i64> {
        let mut ids = Vec::new();
        for i in 0..count {
            let lesson = store
                .create_lesson(NewLesson {
                    title: format!("Lesson {i}"),
                    content: "the cat sat".to_string(),
                    level: LessonLevel::Beginner,
                    module_type: ModuleType::Text,
                    audio_url: None,
                })
                .await
                .unwrap();
            ids.push(lesson.id);
        }
        ids
    }

    async fn complete(store: &dyn Store, student_id: i64, lesson_id: i64) {
        let now = Utc::now();
        store
            .upsert_progress(SessionResult {
                student_id,
                lesson_id,
                started_at: now,
                finished_at: now,
                raw_input: "the cat sat".to_string(),
                wpm: 25,
                accuracy: 100,
                error_count: 0,
                time_spent_seconds: 30,
                completed: true,
                updated_at: now,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn only_approved_students_are_ranked() {
        let store = MemoryStore::new();
        let approved = approved_student(&store, "a@example.com").await;
        store
            .create_user(NewUser {
                email: "p@example.com".to_string(),
                full_name: "Pending".to_string(),
                password_hash: "hash".to_string(),
                role: Role::Student,
                status: AccountStatus::Pending,
            })
            .await
            .unwrap();

        let outcome = refresh_rankings(&store, ScoringPolicy::current()).await.unwrap();
        assert_eq!(outcome.rankings.len(), 1);
        assert_eq!(outcome.rankings[0].user_id, approved);
        assert_eq!(store.list_rankings().await.unwrap(), outcome.rankings);
    }

    #[tokio::test]
    async fn crossing_a_threshold_issues_one_certificate() {
        let store = MemoryStore::new();
        let student = approved_student(&store, "a@example.com").await;
        // 40 points per beginner lesson at target speed: 8 lessons reach C.
        let ids = lessons(&store, 8).await;
        for id in &ids[..7] {
            complete(&store, student, *id).await;
        }

        let first = refresh_rankings(&store, ScoringPolicy::current()).await.unwrap();
        assert_eq!(first.rankings[0].rank_grade, RankGrade::D);
        assert!(first.issued.is_empty());

        complete(&store, student, ids[7]).await;
        let second = refresh_rankings(&store, ScoringPolicy::current()).await.unwrap();
        assert_eq!(second.rankings[0].total_points, 320);
        assert_eq!(second.rankings[0].rank_grade, RankGrade::C);
        assert_eq!(second.issued_to(student).len(), 1);

        let third = refresh_rankings(&store, ScoringPolicy::current()).await.unwrap();
        assert!(third.issued.is_empty());
        assert_eq!(store.list_certifications(Some(student)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn categories_follow_assessed_level() {
        let store = MemoryStore::new();
        let a = approved_student(&store, "a@example.com").await;
        let b = approved_student(&store, "b@example.com").await;
        store.set_user_level(b, ProficiencyLevel::Advanced).await.unwrap();
        let ids = lessons(&store, 1).await;
        complete(&store, b, ids[0]).await;

        let outcome = refresh_rankings(&store, ScoringPolicy::current()).await.unwrap();
        let ranked_b = outcome.ranking_for(b).unwrap();
        let ranked_a = outcome.ranking_for(a).unwrap();
        assert_eq!(ranked_b.overall_position, 1);
        assert_eq!(ranked_b.category_position, 1);
        assert_eq!(ranked_b.rank_category, Some(ProficiencyLevel::Advanced));
        assert_eq!(ranked_a.overall_position, 2);
        assert_eq!(ranked_a.category_position, 1);
        assert_eq!(ranked_a.rank_category, None);
    }

    #[tokio::test]
    async fn failed_certificate_insert_is_retried_by_next_refresh() {
        let store = FlakyStore::default();
        let student = approved_student(&store, "a@example.com").await;
        for id in lessons(&store, 8).await {
            complete(&store, student, id).await;
        }
        store.failing_certificate_inserts.store(1, Ordering::SeqCst);

        let failed = refresh_rankings(&store, ScoringPolicy::current()).await;
        assert!(matches!(failed, Err(StoreError::Connection(_))));
        // The swap already happened; the grade is stored without a certificate.
        let stored = store.get_ranking(student).await.unwrap().unwrap();
        assert_eq!(stored.rank_grade, RankGrade::C);
        assert!(store.list_certifications(Some(student)).await.unwrap().is_empty());

        let retry = refresh_rankings(&store, ScoringPolicy::current()).await.unwrap();
        assert_eq!(retry.issued_to(student).len(), 1);
        let held = store.list_certifications(Some(student)).await.unwrap();
        assert_eq!(held.len(), 1);
        assert_eq!(held[0].rank_achieved, RankGrade::C);
        assert_eq!(held[0].points_at_issue, 320);
    }

    #[tokio::test]
    async fn failed_swap_keeps_previous_rankings() {
        let store = FlakyStore::default();
        let student = approved_student(&store, "a@example.com").await;
        let ids = lessons(&store, 8).await;
        complete(&store, student, ids[0]).await;
        let before = refresh_rankings(&store, ScoringPolicy::current()).await.unwrap();
        assert_eq!(before.rankings[0].total_points, 40);

        for id in &ids[1..] {
            complete(&store, student, *id).await;
        }
        store.failing_ranking_swaps.store(1, Ordering::SeqCst);

        let failed = refresh_rankings(&store, ScoringPolicy::current()).await;
        assert!(failed.is_err());
        assert_eq!(store.list_rankings().await.unwrap(), before.rankings);
        assert!(store.list_certifications(Some(student)).await.unwrap().is_empty());

        let recovered = refresh_rankings(&store, ScoringPolicy::current()).await.unwrap();
        assert_eq!(recovered.rankings[0].total_points, 320);
        assert_eq!(recovered.issued_to(student).len(), 1);
    }

    #[tokio::test]
    async fn lost_grade_does_not_reissue_held_certificate() {
        let store = MemoryStore::new();
        let student = approved_student(&store, "a@example.com").await;
        let ids = lessons(&store, 8).await;
        for id in &ids {
            complete(&store, student, *id).await;
        }
        let first = refresh_rankings(&store, ScoringPolicy::current()).await.unwrap();
        assert_eq!(first.issued_to(student).len(), 1);

        store.delete_lesson(ids[0]).await.unwrap();
        let dropped = refresh_rankings(&store, ScoringPolicy::current()).await.unwrap();
        assert_eq!(dropped.rankings[0].rank_grade, RankGrade::D);

        let lesson = lessons(&store, 1).await[0];
        complete(&store, student, lesson).await;
        let regained = refresh_rankings(&store, ScoringPolicy::current()).await.unwrap();
        assert_eq!(regained.rankings[0].rank_grade, RankGrade::C);
        assert!(regained.issued.is_empty());
    }
}
