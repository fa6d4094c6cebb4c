//! Shared error types for the services crate.

use reqwest::StatusCode;
use thiserror::Error;

use storage::sqlite::SqliteInitError;

/// Errors emitted by the remote learning API.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("credential expired or missing; sign in again")]
    Unauthorized,
    #[error("request conflicts with server state: {0}")]
    Conflict(String),
    #[error("not found")]
    NotFound,
    #[error("request failed with status {0}")]
    HttpStatus(StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("unexpected response payload: {0}")]
    Decode(String),
    #[error(transparent)]
    Invalid(#[from] sprint_core::Error),
}

impl ApiError {
    /// True for 401 responses; never retried.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Network failures and 5xx responses, which callers may recover from locally.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::HttpStatus(status) => status.is_server_error(),
            _ => false,
        }
    }
}

/// Errors emitted by `SubskillTracker`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ToggleError {
    #[error("{0:?} is not a subskill of this skill")]
    UnknownSubskill(String),
    #[error("a toggle for {0:?} is already in flight")]
    AlreadyPending(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted by quiz sessions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("sign in to take the quiz")]
    AuthRequired,
    #[error("session expired; sign in again")]
    AuthExpired,
    #[error("quiz is {actual}, expected {expected}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("quiz generator returned no questions")]
    NoQuestions,
    #[error("only a failed attempt can be retaken")]
    RetakeNotAllowed,
    #[error("failed to generate quiz: {0}")]
    Generate(#[source] ApiError),
    #[error("failed to submit quiz: {0}")]
    Submit(#[source] ApiError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
