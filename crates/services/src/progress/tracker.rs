use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use sprint_core::model::{
    CompletionState, Percent, Reward, RewardEvent, SkillId, SubskillProgress,
};

use crate::api::LearningApi;
use crate::error::{ApiError, ToggleError};
use crate::events::RewardBus;

/// Result of a settled toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub subskill: String,
    pub state: CompletionState,
    /// Aggregate percentage after the change.
    pub percent: Percent,
    /// Present when the subskill moved into `Completed`.
    pub reward: Option<Reward>,
}

struct TrackerState {
    progress: SubskillProgress,
    pending: HashSet<String>,
}

/// Owns one skill's completed-subskill set and applies server-confirmed toggles.
///
/// The set only changes after the server accepts a mutation. At most one toggle per
/// subskill is in flight; toggles on different subskills run independently.
pub struct SubskillTracker {
    api: Arc<dyn LearningApi>,
    events: RewardBus,
    state: Mutex<TrackerState>,
}

impl SubskillTracker {
    #[must_use]
    pub fn new(api: Arc<dyn LearningApi>, events: RewardBus, progress: SubskillProgress) -> Self {
        Self {
            api,
            events,
            state: Mutex::new(TrackerState {
                progress,
                pending: HashSet::new(),
            }),
        }
    }

    #[must_use]
    pub fn skill_id(&self) -> SkillId {
        self.lock().progress.skill_id()
    }

    /// Copy of the current completion set.
    #[must_use]
    pub fn snapshot(&self) -> SubskillProgress {
        self.lock().progress.clone()
    }

    #[must_use]
    pub fn percent(&self) -> Percent {
        self.lock().progress.percent()
    }

    #[must_use]
    pub fn is_pending(&self, subskill: &str) -> bool {
        self.lock().pending.contains(subskill)
    }

    /// Flip `subskill` to the opposite of its current state.
    ///
    /// # Errors
    ///
    /// Returns `ToggleError::UnknownSubskill`, `ToggleError::AlreadyPending` while a
    /// toggle for the same subskill is in flight, or `ToggleError::Api` when the
    /// server rejects the change. The local set is unchanged on every error.
    pub async fn toggle(&self, subskill: &str) -> Result<ToggleOutcome, ToggleError> {
        let current = self
            .lock()
            .progress
            .state_of(subskill)
            .ok_or_else(|| ToggleError::UnknownSubskill(subskill.to_owned()))?;
        self.set_state(subskill, current.toggled()).await
    }

    /// Drive `subskill` to `target`. Already in `target` settles without a request.
    ///
    /// # Errors
    ///
    /// See [`SubskillTracker::toggle`].
    pub async fn set_state(
        &self,
        subskill: &str,
        target: CompletionState,
    ) -> Result<ToggleOutcome, ToggleError> {
        let skill_id = {
            let mut state = self.lock();
            let current = state
                .progress
                .state_of(subskill)
                .ok_or_else(|| ToggleError::UnknownSubskill(subskill.to_owned()))?;
            if state.pending.contains(subskill) {
                tracing::debug!(subskill, "toggle rejected; one already in flight");
                return Err(ToggleError::AlreadyPending(subskill.to_owned()));
            }
            if current == target {
                return Ok(ToggleOutcome {
                    subskill: subskill.to_owned(),
                    state: current,
                    percent: state.progress.percent(),
                    reward: None,
                });
            }
            state.pending.insert(subskill.to_owned());
            state.progress.skill_id()
        };
        let _pending = PendingGuard {
            tracker: self,
            subskill,
        };

        let reward = self
            .api
            .set_subskill_completion(skill_id, subskill, target)
            .await
            .inspect_err(|err| {
                tracing::warn!(%skill_id, subskill, error = %err, "subskill toggle failed");
            })?;

        let percent = {
            let mut state = self.lock();
            let next = state
                .progress
                .with_state(subskill, target)
                .map_err(|err| ToggleError::Api(ApiError::Invalid(err.into())))?;
            state.progress = next;
            state.progress.percent()
        };
        tracing::info!(%skill_id, subskill, state = ?target, %percent, "subskill toggled");

        let reward = target.is_completed().then(|| {
            self.events.publish(RewardEvent::SubskillCompleted {
                skill_id,
                subskill: subskill.to_owned(),
                reward,
            });
            reward
        });

        Ok(ToggleOutcome {
            subskill: subskill.to_owned(),
            state: target,
            percent,
            reward,
        })
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SubskillTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("SubskillTracker")
            .field("progress", &state.progress)
            .field("pending", &state.pending)
            .finish_non_exhaustive()
    }
}

/// Clears the in-flight flag however the toggle settles, including cancellation.
struct PendingGuard<'a> {
    tracker: &'a SubskillTracker,
    subskill: &'a str,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.tracker.lock().pending.remove(self.subskill);
    }
}
