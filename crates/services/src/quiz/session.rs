use chrono::{DateTime, Utc};
use sprint_core::model::{QuizQuestion, QuizResult, SkillId, is_passing};

use crate::api::{GeneratedQuiz, QuizSubmission};
use crate::error::QuizError;

/// Lifecycle of one quiz attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    Idle,
    Generating,
    InProgress,
    Submitting,
    Completed,
}

impl QuizPhase {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Generating => "generating",
            Self::InProgress => "in progress",
            Self::Submitting => "submitting",
            Self::Completed => "completed",
        }
    }
}

/// Outcome of answering the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub correct: bool,
    /// True when this was the last question and the session moved to `Submitting`.
    pub finished: bool,
}

/// One quiz attempt: question set, answers given so far and the local score.
///
/// Every transition checks the current phase; an out-of-order call leaves the
/// session untouched and returns `QuizError::InvalidState`.
#[derive(Debug, Clone)]
pub struct QuizSession {
    skill_id: SkillId,
    phase: QuizPhase,
    quiz_id: String,
    skill_name: String,
    questions: Vec<QuizQuestion>,
    current: usize,
    score: usize,
    answers: Vec<String>,
    started_at: Option<DateTime<Utc>>,
    result: Option<QuizResult>,
}

impl QuizSession {
    #[must_use]
    pub fn new(skill_id: SkillId) -> Self {
        Self {
            skill_id,
            phase: QuizPhase::Idle,
            quiz_id: String::new(),
            skill_name: String::new(),
            questions: Vec::new(),
            current: 0,
            score: 0,
            answers: Vec::new(),
            started_at: None,
            result: None,
        }
    }

    #[must_use]
    pub fn skill_id(&self) -> SkillId {
        self.skill_id
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    #[must_use]
    pub fn quiz_id(&self) -> &str {
        &self.quiz_id
    }

    #[must_use]
    pub fn skill_name(&self) -> &str {
        &self.skill_name
    }

    #[must_use]
    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    /// Zero-based index of the question being answered.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn score(&self) -> usize {
        self.score
    }

    #[must_use]
    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    #[must_use]
    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }

    /// The question awaiting an answer; `None` outside `InProgress`.
    #[must_use]
    pub fn current_question(&self) -> Option<&QuizQuestion> {
        (self.phase == QuizPhase::InProgress)
            .then(|| self.questions.get(self.current))
            .flatten()
    }

    /// Whether the local score reaches the 70% pass mark.
    #[must_use]
    pub fn passed(&self) -> bool {
        is_passing(self.score, self.questions.len())
    }

    /// `Idle -> Generating`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidState` outside `Idle`.
    pub fn begin_generating(&mut self) -> Result<(), QuizError> {
        self.require_phase(QuizPhase::Idle)?;
        self.phase = QuizPhase::Generating;
        Ok(())
    }

    /// `Generating -> Idle` after the generator request failed.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidState` outside `Generating`.
    pub fn generation_failed(&mut self) -> Result<(), QuizError> {
        self.require_phase(QuizPhase::Generating)?;
        self.phase = QuizPhase::Idle;
        Ok(())
    }

    /// `Generating -> InProgress` with a fresh question set, starting the timer at `now`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidState` outside `Generating`, or
    /// `QuizError::NoQuestions` (back in `Idle`) for an empty quiz.
    pub fn questions_received(
        &mut self,
        quiz: GeneratedQuiz,
        now: DateTime<Utc>,
    ) -> Result<(), QuizError> {
        self.require_phase(QuizPhase::Generating)?;
        if quiz.questions.is_empty() {
            self.phase = QuizPhase::Idle;
            return Err(QuizError::NoQuestions);
        }
        self.quiz_id = quiz.quiz_id;
        self.skill_name = quiz.skill_name;
        self.questions = quiz.questions;
        self.restart(now);
        Ok(())
    }

    /// Record `answer` for the current question and advance. Past the last
    /// question the session moves to `Submitting`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidState` outside `InProgress`.
    pub fn answer(&mut self, answer: impl Into<String>) -> Result<AnswerOutcome, QuizError> {
        self.require_phase(QuizPhase::InProgress)?;
        let answer = answer.into();
        let correct = self
            .questions
            .get(self.current)
            .is_some_and(|q| q.is_correct(&answer));
        if correct {
            self.score += 1;
        }
        self.answers.push(answer);
        self.current += 1;

        let finished = self.current >= self.questions.len();
        if finished {
            self.phase = QuizPhase::Submitting;
        }
        Ok(AnswerOutcome { correct, finished })
    }

    /// Payload for grading: every recorded answer plus whole seconds since the start.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidState` outside `Submitting`.
    pub fn submission(&self, now: DateTime<Utc>) -> Result<QuizSubmission, QuizError> {
        self.require_phase(QuizPhase::Submitting)?;
        let elapsed = self
            .started_at
            .map_or(0, |start| u64::try_from((now - start).num_seconds()).unwrap_or(0));
        Ok(QuizSubmission {
            skill_id: self.skill_id,
            questions: self.questions.clone(),
            user_answers: self.answers.clone(),
            time_taken_seconds: elapsed,
        })
    }

    /// `Submitting -> Completed`, keeping the server verdict as returned.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidState` outside `Submitting`.
    pub fn complete(&mut self, result: QuizResult) -> Result<(), QuizError> {
        self.require_phase(QuizPhase::Submitting)?;
        self.result = Some(result);
        self.phase = QuizPhase::Completed;
        Ok(())
    }

    /// Start the same question set over after a failed attempt.
    ///
    /// Only a finished but ungraded attempt below the pass mark can be retaken;
    /// a completed session is final.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidState` outside `Submitting`, or
    /// `QuizError::RetakeNotAllowed` when the attempt passed.
    pub fn retake(&mut self, now: DateTime<Utc>) -> Result<(), QuizError> {
        self.require_phase(QuizPhase::Submitting)?;
        if self.passed() {
            return Err(QuizError::RetakeNotAllowed);
        }
        self.restart(now);
        Ok(())
    }

    fn restart(&mut self, now: DateTime<Utc>) {
        self.current = 0;
        self.score = 0;
        self.answers.clear();
        self.started_at = Some(now);
        self.phase = QuizPhase::InProgress;
    }

    fn require_phase(&self, expected: QuizPhase) -> Result<(), QuizError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(QuizError::InvalidState {
                expected: expected.name(),
                actual: self.phase.name(),
            })
        }
    }
}
