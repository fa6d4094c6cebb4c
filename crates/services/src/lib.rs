#![forbid(unsafe_code)]

pub mod api;
pub mod app_services;
pub mod config;
pub mod credential;
pub mod error;
pub mod events;
pub mod learning_path;
pub mod progress;
pub mod quiz;
pub mod resources;

pub use sprint_core::Clock;

pub use api::{GeneratedQuiz, HttpLearningApi, LearningApi, QuizSubmission, SkillProgressSnapshot};
pub use app_services::AppServices;
pub use config::ClientConfig;
pub use credential::Credential;
pub use error::{ApiError, AppServicesError, QuizError, ToggleError};
pub use events::RewardBus;
pub use learning_path::{LearningPath, LearningPathService, StartOutcome};
pub use progress::{Dashboard, DashboardService, SubskillTracker, ToggleOutcome};
pub use quiz::{AnswerOutcome, QuizPhase, QuizService, QuizSession};
pub use resources::{
    CacheEntry, FetchStrategy, ResourceCache, ResourceFetch, ResourceFetchOrchestrator,
};
