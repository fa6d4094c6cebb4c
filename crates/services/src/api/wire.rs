//! JSON payloads exchanged with the learning server.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sprint_core::model::{
    Percent, ProgressRecord, QuizQuestion, Resource, Skill, SkillDetail, SkillId,
};

use super::{GeneratedQuiz, SkillProgressSnapshot};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub(super) struct SkillDto {
    id: u64,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parent_id: Option<u64>,
    #[serde(default)]
    subskills: Option<Vec<String>>,
}

impl SkillDto {
    pub(super) fn into_skill(self) -> Result<Skill, ApiError> {
        Skill::new(
            SkillId::new(self.id),
            self.name,
            self.description.unwrap_or_default(),
            self.parent_id.map(SkillId::new),
        )
        .map_err(|err| ApiError::Invalid(err.into()))
    }

    pub(super) fn into_detail(mut self) -> Result<SkillDetail, ApiError> {
        let subskills = self.subskills.take().unwrap_or_default();
        let skill = self.into_skill()?;
        SkillDetail::new(skill, subskills).map_err(|err| ApiError::Invalid(err.into()))
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ProgressDto {
    skill_id: u64,
    #[serde(default)]
    progress_percentage: f64,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    completed_subskills: Option<Vec<String>>,
}

impl ProgressDto {
    pub(super) fn into_record(self) -> Result<ProgressRecord, ApiError> {
        ProgressRecord::new(
            SkillId::new(self.skill_id),
            clamp_percentage(self.progress_percentage),
            self.completed,
            self.completed_subskills.unwrap_or_default(),
        )
        .map_err(|err| ApiError::Invalid(err.into()))
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct SnapshotDto {
    skill_id: u64,
    #[serde(default)]
    progress_percentage: f64,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    completed_subskills: Vec<String>,
    #[serde(default)]
    total_subskills: usize,
    #[serde(default)]
    has_started: bool,
}

impl From<SnapshotDto> for SkillProgressSnapshot {
    fn from(dto: SnapshotDto) -> Self {
        Self {
            skill_id: SkillId::new(dto.skill_id),
            percent: Percent::from_lossy(dto.progress_percentage),
            completed: dto.completed,
            completed_subskills: dto.completed_subskills,
            total_subskills: dto.total_subskills,
            has_started: dto.has_started,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct CreateProgressRequest {
    pub skill_id: SkillId,
    pub progress_percentage: f64,
    pub completed: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct SubskillToggleRequest<'a> {
    pub skill_id: SkillId,
    pub subskill_name: &'a str,
    pub completed: bool,
    pub time_spent_minutes: u32,
}

#[derive(Debug, Deserialize)]
pub(super) struct BatchSearchResponse {
    #[serde(default)]
    pub results: HashMap<String, Vec<Resource>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchResponse {
    #[serde(default)]
    pub resources: Vec<Resource>,
}

#[derive(Debug, Serialize)]
pub(super) struct GenerateQuizRequest {
    pub skill_id: SkillId,
    pub num_questions: u32,
    pub difficulty: &'static str,
}

#[derive(Debug, Deserialize)]
pub(super) struct GenerateQuizResponse {
    #[serde(default)]
    quiz_id: String,
    #[serde(default)]
    skill_name: String,
    #[serde(default)]
    questions: Vec<QuizQuestion>,
}

impl From<GenerateQuizResponse> for GeneratedQuiz {
    fn from(dto: GenerateQuizResponse) -> Self {
        Self {
            quiz_id: dto.quiz_id,
            skill_name: dto.skill_name,
            questions: dto.questions,
        }
    }
}

/// FastAPI-style `{"detail": ...}` error body.
#[derive(Debug, Deserialize)]
pub(super) struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    pub(super) fn message(&self) -> String {
        match &self.detail {
            Some(serde_json::Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }
}

fn clamp_percentage(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}
