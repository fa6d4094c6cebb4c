use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::SkillId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SkillError {
    #[error("skill name cannot be empty")]
    EmptyName,

    #[error("skill {0} cannot be its own parent")]
    SelfParent(SkillId),

    #[error("subskill name cannot be empty")]
    EmptySubskillName,
}

//
// ─── SKILL ─────────────────────────────────────────────────────────────────────
//

/// A node of the skill forest.
///
/// A skill without `parent_id` is top-level; otherwise it is a subskill of exactly
/// one parent. Only two levels are modelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    id: SkillId,
    name: String,
    description: String,
    parent_id: Option<SkillId>,
}

impl Skill {
    /// Creates a validated skill.
    ///
    /// # Errors
    ///
    /// Returns `SkillError::EmptyName` for a blank name and `SkillError::SelfParent`
    /// when `parent_id` points at the skill itself.
    pub fn new(
        id: SkillId,
        name: impl Into<String>,
        description: impl Into<String>,
        parent_id: Option<SkillId>,
    ) -> Result<Self, SkillError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(SkillError::EmptyName);
        }
        if parent_id == Some(id) {
            return Err(SkillError::SelfParent(id));
        }
        Ok(Self {
            id,
            name,
            description: description.into(),
            parent_id,
        })
    }

    #[must_use]
    pub fn id(&self) -> SkillId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn parent_id(&self) -> Option<SkillId> {
        self.parent_id
    }

    #[must_use]
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Returns true if this skill is a direct child of `parent`.
    #[must_use]
    pub fn is_subskill_of(&self, parent: SkillId) -> bool {
        self.parent_id == Some(parent)
    }
}

//
// ─── DETAIL ────────────────────────────────────────────────────────────────────
//

/// A skill together with the ordered names of its subskills.
///
/// Resources and completion flags on a learning path are keyed by subskill *name*
/// because the resource search is name-keyed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillDetail {
    skill: Skill,
    subskills: Vec<String>,
}

impl SkillDetail {
    /// Builds a detail view, trimming names and dropping duplicates while keeping order.
    ///
    /// # Errors
    ///
    /// Returns `SkillError::EmptySubskillName` if any subskill name is blank.
    pub fn new(skill: Skill, subskills: Vec<String>) -> Result<Self, SkillError> {
        let mut names: Vec<String> = Vec::with_capacity(subskills.len());
        for raw in subskills {
            let name = raw.trim();
            if name.is_empty() {
                return Err(SkillError::EmptySubskillName);
            }
            if !names.iter().any(|existing| existing == name) {
                names.push(name.to_owned());
            }
        }
        Ok(Self {
            skill,
            subskills: names,
        })
    }

    #[must_use]
    pub fn skill(&self) -> &Skill {
        &self.skill
    }

    #[must_use]
    pub fn subskills(&self) -> &[String] {
        &self.subskills
    }
}
