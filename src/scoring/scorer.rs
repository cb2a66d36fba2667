// src/scoring/scorer.rs

use serde::Serialize;

use crate::scoring::policy::ScoringPolicy;

/// Result of scoring one typing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionMetrics {
    pub wpm: u32,
    /// Percentage of the reference reproduced correctly, 0..=100.
    pub accuracy: u32,
    pub error_count: u32,
}

/// Counts whitespace-separated words. Empty or blank input has no words.
pub fn count_words(input: &str) -> usize {
    input.split_whitespace().count()
}

/// The session is finished once the input is at least as long as the reference.
pub fn is_complete(reference: &str, input: &str) -> bool {
    input.chars().count() >= reference.chars().count()
}

/// Scores `input` against `reference` over `elapsed_ms`.
///
/// * WPM: words in `input` over elapsed minutes, with elapsed floored at
///   `policy.min_elapsed_ms`.
/// * Accuracy: matching positions in the overlapping prefix over the
///   reference length. Characters past the shorter string are ignored.
/// * Errors: mismatching positions in the overlapping prefix.
///
/// Never fails; degenerate input yields zeroed metrics.
pub fn score(
    reference: &str,
    input: &str,
    elapsed_ms: i64,
    policy: &ScoringPolicy,
) -> SessionMetrics {
    let reference_len = reference.chars().count();
    if reference_len == 0 {
        return SessionMetrics {
            wpm: 0,
            accuracy: 0,
            error_count: 0,
        };
    }

    let (correct, errors) = reference
        .chars()
        .zip(input.chars())
        .fold((0usize, 0usize), |(correct, errors), (expected, typed)| {
            if expected == typed {
                (correct + 1, errors)
            } else {
                (correct, errors + 1)
            }
        });

    let minutes = elapsed_ms.max(policy.min_elapsed_ms) as f64 / 60_000.0;
    let wpm = (count_words(input) as f64 / minutes).round();
    let accuracy = (correct as f64 / reference_len as f64 * 100.0).round();

    SessionMetrics {
        wpm: wpm as u32,
        accuracy: accuracy as u32,
        error_count: errors as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> &'static ScoringPolicy {
        ScoringPolicy::current()
    }

    #[test]
    fn exact_copy_is_fully_accurate() {
        let m = score("the cat sat", "the cat sat", 30_000, policy());
        assert_eq!(
            m,
            SessionMetrics {
                wpm: 6,
                accuracy: 100,
                error_count: 0
            }
        );
    }

    #[test]
    fn exact_copy_is_accurate_for_any_elapsed_time() {
        for elapsed in [1, 999, 1_000, 45_000, 3_600_000] {
            let text = "Vital signs include pulse.";
            let m = score(text, text, elapsed, policy());
            assert_eq!(m.accuracy, 100);
            assert_eq!(m.error_count, 0);
        }
    }

    #[test]
    fn one_substitution() {
        let m = score("hello world", "hallo world", 60_000, policy());
        assert_eq!(m.error_count, 1);
        assert_eq!(m.accuracy, 91);
        assert_eq!(m.wpm, 2);
    }

    #[test]
    fn empty_input_scores_zero() {
        let m = score("patient care", "", 10_000, policy());
        assert_eq!(m.wpm, 0);
        assert_eq!(m.accuracy, 0);
        assert_eq!(m.error_count, 0);
    }

    #[test]
    fn blank_input_has_no_words() {
        assert_eq!(count_words("   \t\n "), 0);
        assert_eq!(count_words("  two   words "), 2);
        assert_eq!(score("abc", "   ", 10_000, policy()).wpm, 0);
    }

    #[test]
    fn empty_reference_scores_zero() {
        let m = score("", "anything", 10_000, policy());
        assert_eq!(m.accuracy, 0);
        assert_eq!(m.error_count, 0);
        assert_eq!(m.wpm, 0);
    }

    #[test]
    fn elapsed_time_is_floored() {
        // 3 words in "0 ms" count as 3 words in one second.
        assert_eq!(score("a b c", "a b c", 0, policy()).wpm, 180);
        assert_eq!(score("a b c", "a b c", -50, policy()).wpm, 180);
    }

    #[test]
    fn partial_input_only_scores_overlap() {
        // 5 of 10 reference characters typed correctly.
        let m = score("abcdefghij", "abcde", 60_000, policy());
        assert_eq!(m.accuracy, 50);
        assert_eq!(m.error_count, 0);
    }

    #[test]
    fn trailing_extra_characters_are_ignored() {
        let m = score("abc", "abcxyz", 60_000, policy());
        assert_eq!(m.accuracy, 100);
        assert_eq!(m.error_count, 0);
    }

    #[test]
    fn error_count_never_exceeds_reference_length() {
        let m = score("abc", "xyzxyzxyz", 60_000, policy());
        assert_eq!(m.error_count, 3);
        assert_eq!(m.accuracy, 0);
    }

    #[test]
    fn accuracy_does_not_increase_as_mismatches_are_added() {
        let reference = "Hand hygiene is the most important infection control measure.";
        let mut typed: Vec<char> = reference.chars().collect();
        let mut last = score(reference, reference, 60_000, policy()).accuracy;
        for i in 0..typed.len() {
            typed[i] = if typed[i] == '#' { '%' } else { '#' };
            let input: String = typed.iter().collect();
            let accuracy = score(reference, &input, 60_000, policy()).accuracy;
            assert!(accuracy <= last, "accuracy rose at position {}", i);
            last = accuracy;
        }
        assert_eq!(last, 0);
    }

    #[test]
    fn compares_characters_not_bytes() {
        let m = score("café au lait", "cafe au lait", 60_000, policy());
        assert_eq!(m.error_count, 1);
        assert!(is_complete("café", "cafe"));
    }

    #[test]
    fn completion_requires_reaching_reference_length() {
        assert!(!is_complete("the cat sat", "the cat"));
        assert!(is_complete("the cat sat", "the cat sat"));
        assert!(is_complete("the cat sat", "the cat sat!"));
    }
}
