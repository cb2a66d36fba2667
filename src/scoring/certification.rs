// src/scoring/certification.rs

use crate::models::{
    certification::NewCertification,
    ranking::{RankGrade, RankingRecord},
};

/// Decides whether a grade change earns a certificate.
///
/// A certificate is issued when the grade went up (`D < C < B < A < S`) and
/// the student has never held a certificate for the new grade. A student
/// without a previous record starts from `D`.
pub fn maybe_issue_certificate(
    previous: Option<RankGrade>,
    ranking: &RankingRecord,
    already_held: &[RankGrade],
) -> Option<NewCertification> {
    let previous = previous.unwrap_or(RankGrade::D);
    let new = ranking.rank_grade;

    if new <= previous || already_held.contains(&new) {
        return None;
    }

    Some(NewCertification {
        user_id: ranking.user_id,
        rank_achieved: new,
        points_at_issue: ranking.total_points,
        wpm_at_issue: ranking.average_wpm,
        accuracy_at_issue: ranking.average_accuracy,
    })
}
