use serde::{Deserialize, Serialize};

use crate::model::ids::SkillId;

/// XP and streak payload returned by reward-granting operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Reward {
    #[serde(default)]
    pub xp_earned: u32,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub total_xp: u64,
    #[serde(default)]
    pub completed_today: bool,
}

impl Reward {
    #[must_use]
    pub fn xp(xp_earned: u32) -> Self {
        Self {
            xp_earned,
            ..Self::default()
        }
    }
}

/// Domain event published when the learner earns something, so other views can
/// refresh without a full reload.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RewardEvent {
    SubskillCompleted {
        skill_id: SkillId,
        subskill: String,
        reward: Reward,
    },
    QuizCompleted {
        skill_id: SkillId,
        reward: Reward,
    },
    LearningStarted {
        skill_id: SkillId,
        reward: Reward,
    },
}

impl RewardEvent {
    #[must_use]
    pub fn skill_id(&self) -> SkillId {
        match self {
            Self::SubskillCompleted { skill_id, .. }
            | Self::QuizCompleted { skill_id, .. }
            | Self::LearningStarted { skill_id, .. } => *skill_id,
        }
    }

    #[must_use]
    pub fn reward(&self) -> Reward {
        match self {
            Self::SubskillCompleted { reward, .. }
            | Self::QuizCompleted { reward, .. }
            | Self::LearningStarted { reward, .. } => *reward,
        }
    }
}
