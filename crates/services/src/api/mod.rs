//! Remote learning API seam.
//!
//! Services depend on the `LearningApi` trait; `HttpLearningApi` is the reqwest
//! implementation and tests substitute in-memory fakes.

mod http;
mod wire;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use sprint_core::model::{
    CompletionState, Percent, ProgressRecord, QuizQuestion, QuizResult, Resource, Reward, Skill,
    SkillDetail, SkillId,
};

use crate::error::ApiError;

pub use http::HttpLearningApi;

/// Server view of one skill's progress, including the completed subskill names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillProgressSnapshot {
    pub skill_id: SkillId,
    pub percent: Percent,
    pub completed: bool,
    pub completed_subskills: Vec<String>,
    pub total_subskills: usize,
    pub has_started: bool,
}

/// Questions produced by the quiz generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedQuiz {
    pub quiz_id: String,
    pub skill_name: String,
    pub questions: Vec<QuizQuestion>,
}

/// Everything the server needs to grade an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizSubmission {
    pub skill_id: SkillId,
    pub questions: Vec<QuizQuestion>,
    pub user_answers: Vec<String>,
    pub time_taken_seconds: u64,
}

/// Remote operations consumed by the client core. Every call carries the bearer
/// credential; a 401 surfaces as `ApiError::Unauthorized`.
#[async_trait]
pub trait LearningApi: Send + Sync {
    /// All skills visible to the user (top-level and subskills).
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport, status or payload failures.
    async fn list_skills(&self) -> Result<Vec<Skill>, ApiError>;

    /// One skill with the ordered names of its subskills.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown ids, or other `ApiError`s.
    async fn skill_detail(&self, skill_id: SkillId) -> Result<SkillDetail, ApiError>;

    /// Every progress record of the current user.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport, status or payload failures.
    async fn list_progress(&self) -> Result<Vec<ProgressRecord>, ApiError>;

    /// Progress snapshot for one skill; `None` when the user never started it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport, status or payload failures.
    async fn skill_progress(
        &self,
        skill_id: SkillId,
    ) -> Result<Option<SkillProgressSnapshot>, ApiError>;

    /// Create the progress record that marks a skill as started.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Conflict` when the skill was already started.
    async fn create_progress(&self, skill_id: SkillId) -> Result<ProgressRecord, ApiError>;

    /// Set one subskill's completion flag. Completing returns the earned reward;
    /// uncompleting returns an empty reward.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport, status or payload failures.
    async fn set_subskill_completion(
        &self,
        skill_id: SkillId,
        subskill: &str,
        target: CompletionState,
    ) -> Result<Reward, ApiError>;

    /// Raw resource candidates for several subskills in one request.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport, status or payload failures.
    async fn search_resources_batch(
        &self,
        subskills: &[String],
    ) -> Result<HashMap<String, Vec<Resource>>, ApiError>;

    /// Raw resource candidates for a single subskill.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport, status or payload failures.
    async fn search_resources(&self, subskill: &str) -> Result<Vec<Resource>, ApiError>;

    /// Generate a quiz for a skill.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport, status or payload failures.
    async fn generate_quiz(
        &self,
        skill_id: SkillId,
        num_questions: u32,
    ) -> Result<GeneratedQuiz, ApiError>;

    /// Grade a finished attempt.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport, status or payload failures.
    async fn submit_quiz(&self, submission: &QuizSubmission) -> Result<QuizResult, ApiError>;

    /// Total XP of the current user.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport, status or payload failures.
    async fn total_xp(&self) -> Result<u64, ApiError>;
}
