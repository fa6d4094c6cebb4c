use serde::{Deserialize, Serialize};

/// Fraction of correct answers (as tenths) needed to pass a quiz: 7/10.
const PASS_NUMERATOR: usize = 7;
const PASS_DENOMINATOR: usize = 10;

/// `score / total >= 0.7`, evaluated in integers so `ceil(0.7 * total)` always passes.
///
/// An empty quiz never passes.
#[must_use]
pub fn is_passing(score: usize, total: usize) -> bool {
    total > 0 && score * PASS_DENOMINATOR >= total * PASS_NUMERATOR
}

/// A single multiple-choice question as served by the quiz generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl QuizQuestion {
    #[must_use]
    pub fn new(
        question: impl Into<String>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            options,
            correct_answer: correct_answer.into(),
            explanation: None,
        }
    }

    /// Exact comparison against the correct answer.
    #[must_use]
    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer == answer
    }
}

/// Server verdict for a submitted quiz, stored verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub total_questions: u32,
    pub score_percentage: f64,
    #[serde(default)]
    pub time_taken_seconds: u64,
    #[serde(default)]
    pub xp_earned: u32,
    #[serde(default)]
    pub performance_level: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceil_of_seventy_percent_passes() {
        for total in 1..=20_usize {
            let ceil = (total * 7).div_ceil(10);
            assert!(is_passing(ceil, total), "ceil for {total}");
        }
    }

    #[test]
    fn just_under_threshold_fails() {
        for total in 2..=20_usize {
            let floor = total * 7 / 10;
            if floor == 0 {
                continue;
            }
            assert!(!is_passing(floor - 1, total), "floor-1 for {total}");
        }
    }

    #[test]
    fn empty_quiz_never_passes() {
        assert!(!is_passing(0, 0));
    }

    #[test]
    fn result_tolerates_missing_optional_fields() {
        let result: QuizResult = serde_json::from_str(
            r#"{"score_percentage": 80.0, "xp_earned": 40, "performance_level": "good"}"#,
        )
        .unwrap();
        assert_eq!(result.xp_earned, 40);
        assert!(result.recommendations.is_empty());
    }
}
