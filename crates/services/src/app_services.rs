use std::sync::Arc;

use storage::repository::Storage;

use crate::api::{HttpLearningApi, LearningApi};
use crate::config::ClientConfig;
use crate::credential::Credential;
use crate::error::AppServicesError;
use crate::events::RewardBus;
use crate::learning_path::LearningPathService;
use crate::progress::DashboardService;
use crate::quiz::QuizService;
use crate::Clock;

/// Assembles app-facing services around one API client, one store and one
/// reward bus.
#[derive(Clone)]
pub struct AppServices {
    credential: Credential,
    events: RewardBus,
    dashboard: Arc<DashboardService>,
    learning_paths: Arc<LearningPathService>,
    quizzes: Arc<QuizService>,
}

impl AppServices {
    /// Build services backed by the HTTP API and `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or HTTP client setup fails.
    pub async fn new_sqlite(config: &ClientConfig, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(&config.db_url).await?;
        let credential = Credential::new(config.token.clone());
        let api = Arc::new(HttpLearningApi::new(config, credential.clone())?);
        tracing::debug!(?config, "app services configured");
        Ok(Self::from_parts(api, storage, credential, clock))
    }

    /// Build services from already constructed parts.
    #[must_use]
    pub fn from_parts(
        api: Arc<dyn LearningApi>,
        storage: Storage,
        credential: Credential,
        clock: Clock,
    ) -> Self {
        let events = RewardBus::new();
        let dashboard = Arc::new(DashboardService::new(Arc::clone(&api)));
        let learning_paths = Arc::new(LearningPathService::new(
            Arc::clone(&api),
            Arc::clone(&storage.documents),
            events.clone(),
            clock,
        ));
        let quizzes = Arc::new(QuizService::new(
            api,
            credential.clone(),
            events.clone(),
            clock,
        ));

        Self {
            credential,
            events,
            dashboard,
            learning_paths,
            quizzes,
        }
    }

    #[must_use]
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    #[must_use]
    pub fn events(&self) -> &RewardBus {
        &self.events
    }

    #[must_use]
    pub fn dashboard(&self) -> Arc<DashboardService> {
        Arc::clone(&self.dashboard)
    }

    #[must_use]
    pub fn learning_paths(&self) -> Arc<LearningPathService> {
        Arc::clone(&self.learning_paths)
    }

    #[must_use]
    pub fn quizzes(&self) -> Arc<QuizService> {
        Arc::clone(&self.quizzes)
    }
}
