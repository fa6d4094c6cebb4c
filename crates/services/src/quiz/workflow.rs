use std::sync::Arc;

use sprint_core::Clock;
use sprint_core::model::{QuizResult, Reward, RewardEvent, SkillId};

use super::session::QuizSession;
use crate::api::LearningApi;
use crate::credential::Credential;
use crate::error::{ApiError, QuizError};
use crate::events::RewardBus;

/// Questions requested per generated quiz.
pub const DEFAULT_QUIZ_LENGTH: u32 = 5;

/// Drives `QuizSession`s against the remote quiz generator and grader.
#[derive(Clone)]
pub struct QuizService {
    api: Arc<dyn LearningApi>,
    credential: Credential,
    events: RewardBus,
    clock: Clock,
    num_questions: u32,
}

impl QuizService {
    #[must_use]
    pub fn new(
        api: Arc<dyn LearningApi>,
        credential: Credential,
        events: RewardBus,
        clock: Clock,
    ) -> Self {
        Self {
            api,
            credential,
            events,
            clock,
            num_questions: DEFAULT_QUIZ_LENGTH,
        }
    }

    #[must_use]
    pub fn with_num_questions(mut self, num_questions: u32) -> Self {
        self.num_questions = num_questions.max(1);
        self
    }

    /// Generate a quiz for `skill_id` and return a session ready for the first answer.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::AuthRequired` without contacting the server when no
    /// credential is held, `QuizError::AuthExpired` on 401, `QuizError::NoQuestions`
    /// for an empty quiz, or `QuizError::Generate` for other failures.
    pub async fn start(&self, skill_id: SkillId) -> Result<QuizSession, QuizError> {
        if !self.credential.is_present() {
            return Err(QuizError::AuthRequired);
        }
        let mut session = QuizSession::new(skill_id);
        session.begin_generating()?;

        match self.api.generate_quiz(skill_id, self.num_questions).await {
            Ok(quiz) => {
                session.questions_received(quiz, self.clock.now())?;
                tracing::info!(
                    %skill_id,
                    questions = session.total_questions(),
                    "quiz started"
                );
                Ok(session)
            }
            Err(err) => {
                session.generation_failed()?;
                Err(self.classify(err, QuizError::Generate))
            }
        }
    }

    /// Grade a finished attempt and complete the session.
    ///
    /// A failed submission leaves the session in `Submitting` so it can be retried.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidState` unless every question was answered,
    /// `QuizError::AuthExpired` on 401, or `QuizError::Submit` for other failures.
    pub async fn submit(&self, session: &mut QuizSession) -> Result<QuizResult, QuizError> {
        let submission = session.submission(self.clock.now())?;
        let result = self
            .api
            .submit_quiz(&submission)
            .await
            .map_err(|err| self.classify(err, QuizError::Submit))?;
        session.complete(result.clone())?;

        tracing::info!(
            skill_id = %session.skill_id(),
            score = result.score,
            total = result.total_questions,
            xp = result.xp_earned,
            "quiz graded"
        );
        if result.xp_earned > 0 {
            self.events.publish(RewardEvent::QuizCompleted {
                skill_id: session.skill_id(),
                reward: Reward::xp(result.xp_earned),
            });
        }
        Ok(result)
    }

    fn classify(&self, err: ApiError, wrap: fn(ApiError) -> QuizError) -> QuizError {
        if err.is_auth_failure() {
            self.credential.clear();
            QuizError::AuthExpired
        } else {
            tracing::warn!(error = %err, "quiz request failed");
            wrap(err)
        }
    }
}
