use std::sync::Arc;

use sprint_core::Clock;
use sprint_core::model::{Percent, Resource, Reward, RewardEvent, SkillDetail, SkillId, SubskillProgress};
use storage::repository::KvStore;

use crate::api::LearningApi;
use crate::error::ApiError;
use crate::events::RewardBus;
use crate::progress::SubskillTracker;
use crate::resources::{ResourceCache, ResourceFetch, ResourceFetchOrchestrator};

/// XP the server grants for starting a skill.
pub const LEARNING_STARTED_XP: u32 = 50;

/// Result of asking the server to start a skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started(Reward),
    /// The server already had a record; nothing changed.
    AlreadyStarted,
}

/// One skill's learning path: subskills, completion state and resources.
pub struct LearningPath {
    pub detail: SkillDetail,
    pub has_started: bool,
    pub tracker: SubskillTracker,
    pub cache: ResourceCache,
    pub resources: ResourceFetch,
}

impl LearningPath {
    #[must_use]
    pub fn skill_id(&self) -> SkillId {
        self.detail.skill().id()
    }

    #[must_use]
    pub fn percent(&self) -> Percent {
        self.tracker.percent()
    }

    #[must_use]
    pub fn progress(&self) -> SubskillProgress {
        self.tracker.snapshot()
    }

    #[must_use]
    pub fn resources_for(&self, subskill: &str) -> &[Resource] {
        self.resources.for_subskill(subskill)
    }
}

impl std::fmt::Debug for LearningPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LearningPath")
            .field("skill_id", &self.skill_id())
            .field("has_started", &self.has_started)
            .field("tracker", &self.tracker)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

/// Composes the skill detail, the completion tracker and the resource pipeline
/// behind one open call.
#[derive(Clone)]
pub struct LearningPathService {
    api: Arc<dyn LearningApi>,
    store: Arc<dyn KvStore>,
    events: RewardBus,
    clock: Clock,
    orchestrator: ResourceFetchOrchestrator,
}

impl LearningPathService {
    #[must_use]
    pub fn new(
        api: Arc<dyn LearningApi>,
        store: Arc<dyn KvStore>,
        events: RewardBus,
        clock: Clock,
    ) -> Self {
        let orchestrator = ResourceFetchOrchestrator::new(Arc::clone(&api));
        Self {
            api,
            store,
            events,
            clock,
            orchestrator,
        }
    }

    /// Load a skill's path: detail and progress concurrently, then the cached and
    /// fetched resources for every subskill.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the detail or progress request fails, or if the
    /// resource batch is rejected as unauthorized. Other resource failures only
    /// leave some subskills without resources.
    pub async fn open(&self, skill_id: SkillId) -> Result<LearningPath, ApiError> {
        let (detail, snapshot) = futures_util::try_join!(
            self.api.skill_detail(skill_id),
            self.api.skill_progress(skill_id),
        )?;

        let has_started = snapshot.as_ref().is_some_and(|s| s.has_started);
        let completed = snapshot.map(|s| s.completed_subskills).unwrap_or_default();
        let progress = SubskillProgress::new(skill_id, detail.subskills().to_vec(), completed);
        let tracker = SubskillTracker::new(Arc::clone(&self.api), self.events.clone(), progress);

        let cache = ResourceCache::load(Arc::clone(&self.store), skill_id, self.clock).await;
        let resources = self.orchestrator.fetch(&cache, detail.subskills()).await?;
        tracing::info!(
            %skill_id,
            subskills = detail.subskills().len(),
            strategy = ?resources.strategy,
            percent = %tracker.percent(),
            "learning path opened"
        );

        Ok(LearningPath {
            detail,
            has_started,
            tracker,
            cache,
            resources,
        })
    }

    /// Re-run the resource pipeline; only stale or missing subskills hit the network.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the resource batch is rejected.
    pub async fn refresh_resources(&self, path: &mut LearningPath) -> Result<(), ApiError> {
        path.resources = self
            .orchestrator
            .fetch(&path.cache, path.detail.subskills())
            .await?;
        Ok(())
    }

    /// Create the progress record that starts `skill_id`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` for failures other than the "already started" conflict,
    /// which is reported as `StartOutcome::AlreadyStarted`.
    pub async fn start_learning(&self, skill_id: SkillId) -> Result<StartOutcome, ApiError> {
        match self.api.create_progress(skill_id).await {
            Ok(_) => {
                let reward = Reward::xp(LEARNING_STARTED_XP);
                self.events
                    .publish(RewardEvent::LearningStarted { skill_id, reward });
                tracing::info!(%skill_id, "learning started");
                Ok(StartOutcome::Started(reward))
            }
            Err(ApiError::Conflict(detail)) => {
                tracing::info!(%skill_id, %detail, "skill already started");
                Ok(StartOutcome::AlreadyStarted)
            }
            Err(err) => Err(err),
        }
    }

    /// Start the skill behind an open path unless it is already marked started.
    ///
    /// # Errors
    ///
    /// See [`LearningPathService::start_learning`].
    pub async fn start_path(&self, path: &mut LearningPath) -> Result<StartOutcome, ApiError> {
        if path.has_started {
            return Ok(StartOutcome::AlreadyStarted);
        }
        let outcome = self.start_learning(path.skill_id()).await?;
        path.has_started = true;
        Ok(outcome)
    }
}
