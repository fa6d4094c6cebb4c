//! Derives per-skill completion state from flat progress records.
//!
//! The output is always recomputed from the full input; nothing here is patched
//! incrementally.

use std::collections::HashMap;

use crate::model::{Percent, ProgressRecord, Skill, SkillId};

/// A top-level skill with its derived percentage, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedSkillView {
    pub skill: Skill,
    pub progress: Percent,
}

/// Classification of one top-level skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillStatus {
    InProgress(Percent),
    Completed(Percent),
}

/// Top-level skills split into in-progress and completed, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressOverview {
    pub in_progress: Vec<AggregatedSkillView>,
    pub completed: Vec<AggregatedSkillView>,
}

impl ProgressOverview {
    /// Classify every top-level skill in `skills` against `records`.
    #[must_use]
    pub fn derive(skills: &[Skill], records: &[ProgressRecord]) -> Self {
        let by_skill: HashMap<SkillId, &ProgressRecord> =
            records.iter().map(|r| (r.skill_id(), r)).collect();

        let mut overview = Self::default();
        for parent in skills.iter().filter(|s| s.is_top_level()) {
            let subskills: Vec<&Skill> = skills
                .iter()
                .filter(|s| s.is_subskill_of(parent.id()))
                .collect();
            let Some(status) = classify(parent, &subskills, &by_skill) else {
                continue;
            };
            match status {
                SkillStatus::InProgress(progress) => {
                    overview.in_progress.push(AggregatedSkillView {
                        skill: parent.clone(),
                        progress,
                    });
                }
                SkillStatus::Completed(progress) => {
                    overview.completed.push(AggregatedSkillView {
                        skill: parent.clone(),
                        progress,
                    });
                }
            }
        }
        overview
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.in_progress.is_empty() && self.completed.is_empty()
    }

    /// Look up the derived status of a top-level skill.
    #[must_use]
    pub fn status_of(&self, id: SkillId) -> Option<SkillStatus> {
        if let Some(view) = self.in_progress.iter().find(|v| v.skill.id() == id) {
            return Some(SkillStatus::InProgress(view.progress));
        }
        self.completed
            .iter()
            .find(|v| v.skill.id() == id)
            .map(|v| SkillStatus::Completed(v.progress))
    }
}

/// Status of a single top-level skill. A skill with subskills is always classified;
/// a leaf skill without its own record yields `None`.
fn classify(
    parent: &Skill,
    subskills: &[&Skill],
    records: &HashMap<SkillId, &ProgressRecord>,
) -> Option<SkillStatus> {
    let own = records.get(&parent.id());

    if subskills.is_empty() {
        let record = own?;
        return Some(if record.is_completed() {
            SkillStatus::Completed(record.percent())
        } else {
            SkillStatus::InProgress(record.percent())
        });
    }

    let total = subskills.len();
    let completed = subskills
        .iter()
        .filter(|s| records.get(&s.id()).is_some_and(|r| r.is_completed()))
        .count();

    if completed < total {
        Some(SkillStatus::InProgress(Percent::from_ratio(completed, total)))
    } else {
        Some(SkillStatus::Completed(Percent::FULL))
    }
}
