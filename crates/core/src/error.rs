use thiserror::Error;

use crate::model::{ProgressError, SkillError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Skill(#[from] SkillError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
}
