use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::SkillId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("progress percentage must be within 0..=100, got {0}")]
    PercentageOutOfRange(f64),

    #[error("{0:?} is not a subskill of this skill")]
    UnknownSubskill(String),
}

//
// ─── PERCENT ───────────────────────────────────────────────────────────────────
//

/// Whole-number percentage in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percent(u8);

impl Percent {
    pub const ZERO: Percent = Percent(0);
    pub const FULL: Percent = Percent(100);

    /// `round(100 * done / total)` with halves rounded up. A zero total yields 0.
    #[must_use]
    pub fn from_ratio(done: usize, total: usize) -> Self {
        if total == 0 {
            return Self::ZERO;
        }
        let done = done.min(total);
        let scaled = (200 * done + total) / (2 * total);
        Self(u8::try_from(scaled).unwrap_or(100))
    }

    /// Rounds and clamps a server-provided percentage.
    #[must_use]
    pub fn from_lossy(value: f64) -> Self {
        if !value.is_finite() {
            return Self::ZERO;
        }
        let clamped = value.round().clamp(0.0, 100.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Self(clamped as u8)
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn is_full(self) -> bool {
        self.0 == 100
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

//
// ─── PROGRESS RECORD ───────────────────────────────────────────────────────────
//

/// Client-side copy of the server's progress for one (user, skill) pair.
///
/// The copy may be stale; the server stays the owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    skill_id: SkillId,
    progress_percentage: f64,
    completed: bool,
    completed_subskills: BTreeSet<String>,
}

impl ProgressRecord {
    /// Creates a validated record.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::PercentageOutOfRange` if the percentage is outside `0..=100`
    /// or not a finite number.
    pub fn new(
        skill_id: SkillId,
        progress_percentage: f64,
        completed: bool,
        completed_subskills: impl IntoIterator<Item = String>,
    ) -> Result<Self, ProgressError> {
        if !progress_percentage.is_finite() || !(0.0..=100.0).contains(&progress_percentage) {
            return Err(ProgressError::PercentageOutOfRange(progress_percentage));
        }
        Ok(Self {
            skill_id,
            progress_percentage,
            completed,
            completed_subskills: completed_subskills.into_iter().collect(),
        })
    }

    /// A freshly started record: 0%, not completed.
    #[must_use]
    pub fn started(skill_id: SkillId) -> Self {
        Self {
            skill_id,
            progress_percentage: 0.0,
            completed: false,
            completed_subskills: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn skill_id(&self) -> SkillId {
        self.skill_id
    }

    #[must_use]
    pub fn progress_percentage(&self) -> f64 {
        self.progress_percentage
    }

    #[must_use]
    pub fn percent(&self) -> Percent {
        Percent::from_lossy(self.progress_percentage)
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn completed_subskills(&self) -> &BTreeSet<String> {
        &self.completed_subskills
    }
}

//
// ─── SUBSKILL COMPLETION ───────────────────────────────────────────────────────
//

/// Completion flag of a single subskill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionState {
    Incomplete,
    Completed,
}

impl CompletionState {
    #[must_use]
    pub fn from_completed(completed: bool) -> Self {
        if completed {
            Self::Completed
        } else {
            Self::Incomplete
        }
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Incomplete => Self::Completed,
            Self::Completed => Self::Incomplete,
        }
    }

    #[must_use]
    pub fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// The completed-subskill set of one skill, plus the ordered subskill list it is
/// measured against.
///
/// Mutations return a new value; the percentage is always derived from the set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubskillProgress {
    skill_id: SkillId,
    subskills: Vec<String>,
    completed: BTreeSet<String>,
}

impl SubskillProgress {
    /// Builds the state from the subskill list and the server's completed names.
    ///
    /// Completed names that are not part of `subskills` are dropped.
    #[must_use]
    pub fn new(
        skill_id: SkillId,
        subskills: Vec<String>,
        completed: impl IntoIterator<Item = String>,
    ) -> Self {
        let completed = completed
            .into_iter()
            .filter(|name| subskills.iter().any(|s| s == name))
            .collect();
        Self {
            skill_id,
            subskills,
            completed,
        }
    }

    #[must_use]
    pub fn skill_id(&self) -> SkillId {
        self.skill_id
    }

    #[must_use]
    pub fn subskills(&self) -> &[String] {
        &self.subskills
    }

    #[must_use]
    pub fn completed(&self) -> &BTreeSet<String> {
        &self.completed
    }

    #[must_use]
    pub fn contains(&self, subskill: &str) -> bool {
        self.subskills.iter().any(|s| s == subskill)
    }

    /// Current state of `subskill`, or `None` if it does not belong to this skill.
    #[must_use]
    pub fn state_of(&self, subskill: &str) -> Option<CompletionState> {
        self.contains(subskill)
            .then(|| CompletionState::from_completed(self.completed.contains(subskill)))
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.subskills.len()
    }

    #[must_use]
    pub fn percent(&self) -> Percent {
        Percent::from_ratio(self.completed_count(), self.total())
    }

    #[must_use]
    pub fn is_all_completed(&self) -> bool {
        self.total() > 0 && self.completed_count() == self.total()
    }

    /// Returns a copy with `subskill` set to `target`.
    ///
    /// Setting a state that already holds is a no-op, so re-applying a late result
    /// never reverts a newer local change.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownSubskill` if `subskill` is not part of this skill.
    pub fn with_state(&self, subskill: &str, target: CompletionState) -> Result<Self, ProgressError> {
        if !self.contains(subskill) {
            return Err(ProgressError::UnknownSubskill(subskill.to_owned()));
        }
        let mut next = self.clone();
        match target {
            CompletionState::Completed => {
                next.completed.insert(subskill.to_owned());
            }
            CompletionState::Incomplete => {
                next.completed.remove(subskill);
            }
        }
        Ok(next)
    }
}
