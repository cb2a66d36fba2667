// src/models/level.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A student's assessed proficiency. Also the leaderboard category.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ProficiencyLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl ProficiencyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProficiencyLevel::Beginner => "beginner",
            ProficiencyLevel::Intermediate => "intermediate",
            ProficiencyLevel::Advanced => "advanced",
        }
    }
}

impl FromStr for ProficiencyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(ProficiencyLevel::Beginner),
            "intermediate" => Ok(ProficiencyLevel::Intermediate),
            "advanced" => Ok(ProficiencyLevel::Advanced),
            other => Err(format!("unknown proficiency level '{}'", other)),
        }
    }
}

impl fmt::Display for ProficiencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Level a lesson is written for. `All` lessons are offered to everyone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LessonLevel {
    Beginner,
    Intermediate,
    Advanced,
    All,
}

impl LessonLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LessonLevel::Beginner => "beginner",
            LessonLevel::Intermediate => "intermediate",
            LessonLevel::Advanced => "advanced",
            LessonLevel::All => "all",
        }
    }

    /// Whether a student at `level` should see this lesson.
    /// Students without an assessed level only see `All` lessons.
    pub fn is_offered_to(&self, level: Option<ProficiencyLevel>) -> bool {
        match (self, level) {
            (LessonLevel::All, _) => true,
            (LessonLevel::Beginner, Some(ProficiencyLevel::Beginner)) => true,
            (LessonLevel::Intermediate, Some(ProficiencyLevel::Intermediate)) => true,
            (LessonLevel::Advanced, Some(ProficiencyLevel::Advanced)) => true,
            _ => false,
        }
    }
}

impl FromStr for LessonLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(LessonLevel::All),
            other => other.parse::<ProficiencyLevel>().map(LessonLevel::from),
        }
    }
}

impl From<ProficiencyLevel> for LessonLevel {
    fn from(level: ProficiencyLevel) -> Self {
        match level {
            ProficiencyLevel::Beginner => LessonLevel::Beginner,
            ProficiencyLevel::Intermediate => LessonLevel::Intermediate,
            ProficiencyLevel::Advanced => LessonLevel::Advanced,
        }
    }
}

impl fmt::Display for LessonLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lesson_levels_round_trip_through_text() {
        for level in [
            LessonLevel::Beginner,
            LessonLevel::Intermediate,
            LessonLevel::Advanced,
            LessonLevel::All,
        ] {
            assert_eq!(level.as_str().parse::<LessonLevel>(), Ok(level));
        }
        assert!("expert".parse::<LessonLevel>().is_err());
    }

    #[test]
    fn all_lessons_are_offered_to_unassessed_students() {
        assert!(LessonLevel::All.is_offered_to(None));
        assert!(!LessonLevel::Beginner.is_offered_to(None));
        assert!(LessonLevel::Advanced.is_offered_to(Some(ProficiencyLevel::Advanced)));
        assert!(!LessonLevel::Advanced.is_offered_to(Some(ProficiencyLevel::Beginner)));
    }
}
