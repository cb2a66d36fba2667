// src/scoring/ranking.rs

use std::{cmp::Ordering, collections::HashMap};

use chrono::{DateTime, Utc};

use crate::{
    models::{
        level::{LessonLevel, ProficiencyLevel},
        ranking::{RankGrade, RankingRecord, Theme},
    },
    scoring::policy::ScoringPolicy,
};

/// One stored progress row, joined with the level of its lesson.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSample {
    pub lesson_id: i64,
    pub lesson_level: LessonLevel,
    pub wpm: i32,
    pub accuracy: i32,
    pub time_spent_seconds: i32,
    pub completed: bool,
}

/// Everything the aggregator needs to know about one student.
#[derive(Debug, Clone)]
pub struct StudentSnapshot {
    pub user_id: i64,
    /// Registration time, the final tie-breaker.
    pub registered_at: DateTime<Utc>,
    pub level: Option<ProficiencyLevel>,
    pub sessions: Vec<SessionSample>,
}

/// Per-student aggregate, before positions are known.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub total_points: i64,
    pub average_wpm: f64,
    pub average_accuracy: f64,
    pub rank_grade: RankGrade,
    pub theme: Theme,
    pub total_lessons_completed: i64,
    pub total_time_spent_seconds: i64,
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Folds a student's history into totals and a grade.
///
/// Only completed sessions count. If a lesson shows up more than once the
/// last entry wins, matching the one-row-per-lesson progress table.
pub fn aggregate(history: &[SessionSample], policy: &ScoringPolicy) -> Aggregate {
    let mut latest: HashMap<i64, &SessionSample> = HashMap::new();
    let mut order: Vec<i64> = Vec::new();
    for sample in history.iter().filter(|s| s.completed) {
        if latest.insert(sample.lesson_id, sample).is_none() {
            order.push(sample.lesson_id);
        }
    }

    let counted: Vec<&SessionSample> =
        order.iter().filter_map(|id| latest.get(id).copied()).collect();
    let count = counted.len();

    let total_points = counted
        .iter()
        .map(|s| policy.session_points(s.wpm, s.accuracy, s.lesson_level))
        .sum::<i64>();
    let total_time_spent_seconds = counted
        .iter()
        .map(|s| i64::from(s.time_spent_seconds.max(0)))
        .sum::<i64>();

    let (average_wpm, average_accuracy) = if count == 0 {
        (0.0, 0.0)
    } else {
        let wpm_sum: i64 = counted.iter().map(|s| i64::from(s.wpm)).sum();
        let acc_sum: i64 = counted.iter().map(|s| i64::from(s.accuracy)).sum();
        (
            round_one_decimal(wpm_sum as f64 / count as f64),
            round_one_decimal(acc_sum as f64 / count as f64),
        )
    };

    let rank_grade = policy.grade_for(total_points);

    Aggregate {
        total_points,
        average_wpm,
        average_accuracy,
        rank_grade,
        theme: policy.theme_for(rank_grade),
        total_lessons_completed: count as i64,
        total_time_spent_seconds,
    }
}

struct Ranked<'a> {
    student: &'a StudentSnapshot,
    aggregate: Aggregate,
}

/// Leaderboard order: points, then accuracy, then WPM (all descending),
/// then registration order and id so no two students ever tie.
fn leaderboard_cmp(a: &Ranked<'_>, b: &Ranked<'_>) -> Ordering {
    b.aggregate
        .total_points
        .cmp(&a.aggregate.total_points)
        .then_with(|| b.aggregate.average_accuracy.total_cmp(&a.aggregate.average_accuracy))
        .then_with(|| b.aggregate.average_wpm.total_cmp(&a.aggregate.average_wpm))
        .then_with(|| a.student.registered_at.cmp(&b.student.registered_at))
        .then_with(|| a.student.user_id.cmp(&b.student.user_id))
}

/// Aggregates every student and assigns overall and per-category positions.
///
/// Output is ordered by overall position. Positions are 1-based and
/// contiguous within each ranking.
pub fn rank_population(
    students: &[StudentSnapshot],
    policy: &ScoringPolicy,
    now: DateTime<Utc>,
) -> Vec<RankingRecord> {
    let mut ranked: Vec<Ranked<'_>> = students
        .iter()
        .map(|student| Ranked {
            student,
            aggregate: aggregate(&student.sessions, policy),
        })
        .collect();
    ranked.sort_by(leaderboard_cmp);

    let mut category_counters: HashMap<Option<ProficiencyLevel>, i64> = HashMap::new();

    ranked
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let counter = category_counters.entry(entry.student.level).or_insert(0);
            *counter += 1;

            RankingRecord {
                user_id: entry.student.user_id,
                total_points: entry.aggregate.total_points,
                average_wpm: entry.aggregate.average_wpm,
                average_accuracy: entry.aggregate.average_accuracy,
                rank_grade: entry.aggregate.rank_grade,
                rank_category: entry.student.level,
                overall_position: index as i64 + 1,
                category_position: *counter,
                total_lessons_completed: entry.aggregate.total_lessons_completed,
                total_time_spent_seconds: entry.aggregate.total_time_spent_seconds,
                theme: entry.aggregate.theme,
                policy_version: policy.version,
                updated_at: now,
            }
        })
        .collect()
}
