#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

/// Storage key of the persisted resource cache for one skill.
#[must_use]
pub fn resource_cache_key(skill_id: sprint_core::model::SkillId) -> String {
    format!("skillsprint_resources_{skill_id}")
}
