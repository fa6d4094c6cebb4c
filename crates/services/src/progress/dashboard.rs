use std::sync::Arc;

use sprint_core::ProgressOverview;
use sprint_core::model::{ProgressRecord, Skill};

use crate::api::LearningApi;
use crate::error::ApiError;

/// Everything the dashboard shows, derived from one consistent fetch.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub overview: ProgressOverview,
    pub skills: Vec<Skill>,
    pub records: Vec<ProgressRecord>,
    pub total_xp: u64,
}

/// Loads skills, progress and XP, then recomputes the overview from scratch.
#[derive(Clone)]
pub struct DashboardService {
    api: Arc<dyn LearningApi>,
}

impl DashboardService {
    #[must_use]
    pub fn new(api: Arc<dyn LearningApi>) -> Self {
        Self { api }
    }

    /// Fetch the inputs concurrently and derive the overview once all have arrived.
    ///
    /// # Errors
    ///
    /// Returns the first `ApiError` among the three requests.
    pub async fn load(&self) -> Result<Dashboard, ApiError> {
        let (skills, records, total_xp) = futures_util::try_join!(
            self.api.list_skills(),
            self.api.list_progress(),
            self.api.total_xp(),
        )?;
        let overview = ProgressOverview::derive(&skills, &records);
        tracing::debug!(
            in_progress = overview.in_progress.len(),
            completed = overview.completed.len(),
            "dashboard derived"
        );
        Ok(Dashboard {
            overview,
            skills,
            records,
            total_xp,
        })
    }
}
