mod ids;
mod progress;
mod quiz;
mod resource;
mod reward;
mod skill;

pub use ids::{ParseIdError, SkillId};
pub use progress::{CompletionState, Percent, ProgressError, ProgressRecord, SubskillProgress};
pub use quiz::{QuizQuestion, QuizResult, is_passing};
pub use resource::Resource;
pub use reward::{Reward, RewardEvent};
pub use skill::{Skill, SkillDetail, SkillError};
