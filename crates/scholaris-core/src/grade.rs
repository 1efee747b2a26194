//! Grade progression table.
//!
//! Grades advance along a fixed ladder from pre-primary through grade 12.
//! Anything past the last rung, or not on the ladder at all, graduates.

use serde::{Deserialize, Serialize};

/// The ordered grade ladder.
pub const GRADE_SEQUENCE: [&str; 15] = [
    "nursery", "lkg", "ukg", "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12",
];

/// Result of looking up the grade that follows another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "grade")]
pub enum NextGrade {
    /// The student advances to this grade.
    Grade(String),
    /// There is no next grade.
    Graduate,
}

impl NextGrade {
    /// Returns true for the graduate sentinel.
    #[must_use]
    pub const fn is_graduate(&self) -> bool {
        matches!(self, Self::Graduate)
    }
}

/// Look up the grade that follows `code`.
///
/// Matching ignores surrounding whitespace and ASCII case. Unknown codes
/// graduate rather than erroring.
#[must_use]
pub fn next_grade(code: &str) -> NextGrade {
    let code = code.trim();
    GRADE_SEQUENCE
        .iter()
        .position(|g| g.eq_ignore_ascii_case(code))
        .and_then(|idx| GRADE_SEQUENCE.get(idx + 1))
        .map_or(NextGrade::Graduate, |g| NextGrade::Grade((*g).to_string()))
}

/// Returns true if `code` is on the grade ladder.
#[must_use]
pub fn is_known_grade(code: &str) -> bool {
    let code = code.trim();
    GRADE_SEQUENCE.iter().any(|g| g.eq_ignore_ascii_case(code))
}
