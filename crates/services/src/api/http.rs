use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use sprint_core::model::{
    CompletionState, ProgressRecord, QuizResult, Resource, Reward, Skill, SkillDetail, SkillId,
};

use super::wire::{
    BatchSearchResponse, CreateProgressRequest, ErrorBody, GenerateQuizRequest,
    GenerateQuizResponse, ProgressDto, SearchResponse, SkillDto, SnapshotDto,
    SubskillToggleRequest,
};
use super::{GeneratedQuiz, LearningApi, QuizSubmission, SkillProgressSnapshot};
use crate::config::ClientConfig;
use crate::credential::Credential;
use crate::error::ApiError;

/// Candidates requested per subskill on the single-subskill search.
const SEARCH_LIMIT: u32 = 6;
const QUIZ_DIFFICULTY: &str = "adaptive";

/// reqwest-backed `LearningApi`.
#[derive(Clone)]
pub struct HttpLearningApi {
    client: Client,
    base_url: String,
    credential: Credential,
}

impl HttpLearningApi {
    /// Build a client from config, sharing `credential` with the rest of the app.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig, credential: Credential) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_owned(),
            credential,
        })
    }

    #[must_use]
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match self.credential.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send and map non-success statuses onto `ApiError`.
    async fn send(&self, builder: RequestBuilder, op: &'static str) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(|err| {
            tracing::warn!(op, error = %err, "request failed");
            ApiError::Http(err)
        })?;
        let status = response.status();
        tracing::debug!(op, %status, "response");
        if status.is_success() {
            return Ok(response);
        }

        let detail = response
            .json::<ErrorBody>()
            .await
            .map(|body| body.message())
            .unwrap_or_default();
        let err = status_error(status, detail);
        if err.is_auth_failure() {
            self.credential.clear();
        }
        Err(err)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        op: &'static str,
    ) -> Result<T, ApiError> {
        let response = self.send(builder, op).await?;
        response
            .json::<T>()
            .await
            .map_err(|err| ApiError::Decode(format!("{op}: {err}")))
    }
}

/// Map an unsuccessful status onto the error taxonomy.
pub(crate) fn status_error(status: StatusCode, detail: String) -> ApiError {
    match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
        StatusCode::NOT_FOUND => ApiError::NotFound,
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT => ApiError::Conflict(detail),
        other => ApiError::HttpStatus(other),
    }
}

#[async_trait]
impl LearningApi for HttpLearningApi {
    async fn list_skills(&self) -> Result<Vec<Skill>, ApiError> {
        let dtos: Vec<SkillDto> = self
            .send_json(self.request(Method::GET, "/skills"), "list_skills")
            .await?;
        dtos.into_iter().map(SkillDto::into_skill).collect()
    }

    async fn skill_detail(&self, skill_id: SkillId) -> Result<SkillDetail, ApiError> {
        let dto: SkillDto = self
            .send_json(
                self.request(Method::GET, &format!("/skills/{skill_id}")),
                "skill_detail",
            )
            .await?;
        dto.into_detail()
    }

    async fn list_progress(&self) -> Result<Vec<ProgressRecord>, ApiError> {
        let dtos: Vec<ProgressDto> = self
            .send_json(self.request(Method::GET, "/progress"), "list_progress")
            .await?;
        dtos.into_iter().map(ProgressDto::into_record).collect()
    }

    async fn skill_progress(
        &self,
        skill_id: SkillId,
    ) -> Result<Option<SkillProgressSnapshot>, ApiError> {
        let result: Result<SnapshotDto, ApiError> = self
            .send_json(
                self.request(Method::GET, &format!("/progress/skill/{skill_id}")),
                "skill_progress",
            )
            .await;
        match result {
            Ok(dto) => Ok(Some(dto.into())),
            Err(ApiError::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn create_progress(&self, skill_id: SkillId) -> Result<ProgressRecord, ApiError> {
        let body = CreateProgressRequest {
            skill_id,
            progress_percentage: 0.0,
            completed: false,
        };
        let dto: ProgressDto = self
            .send_json(
                self.request(Method::POST, "/progress").json(&body),
                "create_progress",
            )
            .await?;
        dto.into_record()
    }

    async fn set_subskill_completion(
        &self,
        skill_id: SkillId,
        subskill: &str,
        target: CompletionState,
    ) -> Result<Reward, ApiError> {
        let body = SubskillToggleRequest {
            skill_id,
            subskill_name: subskill,
            completed: target.is_completed(),
            time_spent_minutes: 0,
        };
        match target {
            CompletionState::Completed => {
                self.send_json(
                    self.request(Method::POST, "/progress/subskill/complete")
                        .json(&body),
                    "complete_subskill",
                )
                .await
            }
            CompletionState::Incomplete => {
                self.send(
                    self.request(Method::POST, "/progress/subskill/uncomplete")
                        .json(&body),
                    "uncomplete_subskill",
                )
                .await?;
                Ok(Reward::default())
            }
        }
    }

    async fn search_resources_batch(
        &self,
        subskills: &[String],
    ) -> Result<HashMap<String, Vec<Resource>>, ApiError> {
        let response: BatchSearchResponse = self
            .send_json(
                self.request(Method::POST, "/resources/search/batch")
                    .json(subskills),
                "search_resources_batch",
            )
            .await?;
        Ok(response.results)
    }

    async fn search_resources(&self, subskill: &str) -> Result<Vec<Resource>, ApiError> {
        let response: SearchResponse = self
            .send_json(
                self.request(Method::GET, "/resources/search")
                    .query(&[("skill", subskill.to_owned()), ("limit", SEARCH_LIMIT.to_string())]),
                "search_resources",
            )
            .await?;
        Ok(response.resources)
    }

    async fn generate_quiz(
        &self,
        skill_id: SkillId,
        num_questions: u32,
    ) -> Result<GeneratedQuiz, ApiError> {
        let body = GenerateQuizRequest {
            skill_id,
            num_questions,
            difficulty: QUIZ_DIFFICULTY,
        };
        let dto: GenerateQuizResponse = self
            .send_json(
                self.request(Method::POST, "/quiz/generate").json(&body),
                "generate_quiz",
            )
            .await?;
        Ok(dto.into())
    }

    async fn submit_quiz(&self, submission: &QuizSubmission) -> Result<QuizResult, ApiError> {
        self.send_json(
            self.request(Method::POST, "/quiz/submit").json(submission),
            "submit_quiz",
        )
        .await
    }

    async fn total_xp(&self) -> Result<u64, ApiError> {
        self.send_json(self.request(Method::GET, "/users/xp"), "total_xp")
            .await
    }
}
