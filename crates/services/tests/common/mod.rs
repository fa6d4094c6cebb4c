#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;
use services::{ApiError, GeneratedQuiz, LearningApi, QuizSubmission, SkillProgressSnapshot};
use sprint_core::model::{
    CompletionState, Percent, ProgressRecord, QuizQuestion, QuizResult, Resource, Reward, Skill,
    SkillDetail, SkillId,
};
use tokio::sync::Semaphore;

/// One recorded request against the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListSkills,
    SkillDetail(SkillId),
    ListProgress,
    SkillProgress(SkillId),
    CreateProgress(SkillId),
    SetSubskill(String, CompletionState),
    Batch(Vec<String>),
    Single(String),
    GenerateQuiz(SkillId),
    SubmitQuiz(Vec<String>),
    TotalXp,
}

/// How a scripted request fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Unavailable,
    Unauthorized,
    Conflict,
}

impl Failure {
    fn into_error(self) -> ApiError {
        match self {
            Self::Unavailable => ApiError::HttpStatus(StatusCode::SERVICE_UNAVAILABLE),
            Self::Unauthorized => ApiError::Unauthorized,
            Self::Conflict => ApiError::Conflict("already started".into()),
        }
    }
}

/// Scriptable in-memory `LearningApi` that records every call.
#[derive(Default)]
pub struct FakeApi {
    pub skills: Mutex<Vec<Skill>>,
    pub records: Mutex<Vec<ProgressRecord>>,
    pub details: Mutex<HashMap<SkillId, SkillDetail>>,
    pub completed: Mutex<HashMap<SkillId, Vec<String>>>,
    pub resources: Mutex<HashMap<String, Vec<Resource>>>,
    pub questions: Mutex<Vec<QuizQuestion>>,
    pub total_xp: Mutex<u64>,
    pub toggle_xp: Mutex<u32>,
    pub quiz_xp: Mutex<u32>,
    pub batch_failure: Mutex<Option<Failure>>,
    pub single_failures: Mutex<HashSet<String>>,
    pub toggle_failure: Mutex<Option<Failure>>,
    pub create_failure: Mutex<Option<Failure>>,
    pub quiz_failure: Mutex<Option<Failure>>,
    pub submit_failure: Mutex<Option<Failure>>,
    held_toggles: Mutex<HashMap<String, Arc<Semaphore>>>,
    calls: Mutex<Vec<Call>>,
    fail_everything: AtomicBool,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Requests that reached the resource endpoints.
    pub fn resource_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Batch(_) | Call::Single(_)))
            .collect()
    }

    pub fn set_skill(&self, skill: Skill, subskills: &[&str]) {
        let detail = SkillDetail::new(
            skill.clone(),
            subskills.iter().map(|s| (*s).to_owned()).collect(),
        )
        .unwrap();
        self.details.lock().unwrap().insert(skill.id(), detail);
        self.skills.lock().unwrap().push(skill);
    }

    pub fn set_completed(&self, skill_id: SkillId, names: &[&str]) {
        self.completed
            .lock()
            .unwrap()
            .insert(skill_id, names.iter().map(|s| (*s).to_owned()).collect());
    }

    pub fn set_resources(&self, subskill: &str, resources: Vec<Resource>) {
        self.resources
            .lock()
            .unwrap()
            .insert(subskill.to_owned(), resources);
    }

    pub fn fail_batch(&self, failure: Failure) {
        *self.batch_failure.lock().unwrap() = Some(failure);
    }

    pub fn fail_single(&self, subskill: &str) {
        self.single_failures
            .lock()
            .unwrap()
            .insert(subskill.to_owned());
    }

    /// Every request fails as unavailable.
    pub fn go_offline(&self) {
        self.fail_everything.store(true, Ordering::SeqCst);
    }

    /// Block toggles of `subskill` until permits are added to the returned gate.
    pub fn hold_toggle(&self, subskill: &str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.held_toggles
            .lock()
            .unwrap()
            .insert(subskill.to_owned(), Arc::clone(&gate));
        gate
    }

    fn record(&self, call: Call) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(call);
        if self.fail_everything.load(Ordering::SeqCst) {
            return Err(Failure::Unavailable.into_error());
        }
        Ok(())
    }

    fn scripted(slot: &Mutex<Option<Failure>>) -> Result<(), ApiError> {
        match *slot.lock().unwrap() {
            Some(failure) => Err(failure.into_error()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl LearningApi for FakeApi {
    async fn list_skills(&self) -> Result<Vec<Skill>, ApiError> {
        self.record(Call::ListSkills)?;
        Ok(self.skills.lock().unwrap().clone())
    }

    async fn skill_detail(&self, skill_id: SkillId) -> Result<SkillDetail, ApiError> {
        self.record(Call::SkillDetail(skill_id))?;
        self.details
            .lock()
            .unwrap()
            .get(&skill_id)
            .cloned()
            .ok_or(ApiError::NotFound)
    }

    async fn list_progress(&self) -> Result<Vec<ProgressRecord>, ApiError> {
        self.record(Call::ListProgress)?;
        Ok(self.records.lock().unwrap().clone())
    }

    async fn skill_progress(
        &self,
        skill_id: SkillId,
    ) -> Result<Option<SkillProgressSnapshot>, ApiError> {
        self.record(Call::SkillProgress(skill_id))?;
        let completed = self.completed.lock().unwrap().get(&skill_id).cloned();
        let total = self
            .details
            .lock()
            .unwrap()
            .get(&skill_id)
            .map_or(0, |d| d.subskills().len());
        Ok(completed.map(|names| SkillProgressSnapshot {
            skill_id,
            percent: Percent::from_ratio(names.len(), total),
            completed: total > 0 && names.len() == total,
            completed_subskills: names,
            total_subskills: total,
            has_started: true,
        }))
    }

    async fn create_progress(&self, skill_id: SkillId) -> Result<ProgressRecord, ApiError> {
        self.record(Call::CreateProgress(skill_id))?;
        Self::scripted(&self.create_failure)?;
        Ok(ProgressRecord::started(skill_id))
    }

    async fn set_subskill_completion(
        &self,
        skill_id: SkillId,
        subskill: &str,
        target: CompletionState,
    ) -> Result<Reward, ApiError> {
        self.record(Call::SetSubskill(subskill.to_owned(), target))?;
        let gate = self.held_toggles.lock().unwrap().get(subskill).cloned();
        if let Some(gate) = gate {
            let _permit = gate.acquire().await.unwrap();
        }
        Self::scripted(&self.toggle_failure)?;

        let mut completed = self.completed.lock().unwrap();
        let names = completed.entry(skill_id).or_default();
        names.retain(|name| name != subskill);
        if target.is_completed() {
            names.push(subskill.to_owned());
            Ok(Reward {
                xp_earned: *self.toggle_xp.lock().unwrap(),
                current_streak: 1,
                ..Reward::default()
            })
        } else {
            Ok(Reward::default())
        }
    }

    async fn search_resources_batch(
        &self,
        subskills: &[String],
    ) -> Result<HashMap<String, Vec<Resource>>, ApiError> {
        self.record(Call::Batch(subskills.to_vec()))?;
        Self::scripted(&self.batch_failure)?;
        let resources = self.resources.lock().unwrap();
        Ok(subskills
            .iter()
            .filter_map(|name| resources.get(name).map(|r| (name.clone(), r.clone())))
            .collect())
    }

    async fn search_resources(&self, subskill: &str) -> Result<Vec<Resource>, ApiError> {
        self.record(Call::Single(subskill.to_owned()))?;
        if self.single_failures.lock().unwrap().contains(subskill) {
            return Err(Failure::Unavailable.into_error());
        }
        Ok(self
            .resources
            .lock()
            .unwrap()
            .get(subskill)
            .cloned()
            .unwrap_or_default())
    }

    async fn generate_quiz(
        &self,
        skill_id: SkillId,
        _num_questions: u32,
    ) -> Result<GeneratedQuiz, ApiError> {
        self.record(Call::GenerateQuiz(skill_id))?;
        Self::scripted(&self.quiz_failure)?;
        Ok(GeneratedQuiz {
            quiz_id: format!("quiz-{skill_id}"),
            skill_name: "Python".into(),
            questions: self.questions.lock().unwrap().clone(),
        })
    }

    async fn submit_quiz(&self, submission: &QuizSubmission) -> Result<QuizResult, ApiError> {
        self.record(Call::SubmitQuiz(submission.user_answers.clone()))?;
        Self::scripted(&self.submit_failure)?;
        let score = submission
            .questions
            .iter()
            .zip(&submission.user_answers)
            .filter(|(q, a)| q.is_correct(a))
            .count();
        let total = submission.questions.len();
        Ok(QuizResult {
            score: u32::try_from(score).unwrap(),
            total_questions: u32::try_from(total).unwrap(),
            score_percentage: 100.0 * score as f64 / total as f64,
            time_taken_seconds: submission.time_taken_seconds,
            xp_earned: *self.quiz_xp.lock().unwrap(),
            performance_level: if score * 10 >= total * 7 {
                "Good".into()
            } else {
                "Needs practice".into()
            },
            recommendations: vec!["Revisit the basics".into()],
        })
    }

    async fn total_xp(&self) -> Result<u64, ApiError> {
        self.record(Call::TotalXp)?;
        Ok(*self.total_xp.lock().unwrap())
    }
}

/// A resource that passes the quality filter.
pub fn good_resource(subskill: &str, n: usize) -> Resource {
    Resource::new(
        format!("{subskill} guide part {n}"),
        format!("A thorough walkthrough of {subskill}, part {n}"),
        format!("https://blog.dev/{}/{n}", subskill.to_lowercase()),
        "article",
    )
}

pub fn skill(id: u64, name: &str, parent: Option<u64>) -> Skill {
    Skill::new(
        SkillId::new(id),
        name,
        format!("{name} description"),
        parent.map(SkillId::new),
    )
    .unwrap()
}

pub fn question(n: usize) -> QuizQuestion {
    QuizQuestion::new(
        format!("Question {n}?"),
        vec!["right".into(), "wrong".into()],
        "right",
    )
}
