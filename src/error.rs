use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{
    dao::storage::StorageError,
    state::{
        game::AnswerRejected,
        model::{MatchId, PlayerId, QuizId},
        registry::RegistryFull,
    },
};

/// Failures of lobby, match and catalogue operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The quiz store failed.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// No quiz store is installed yet.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// No stored quiz has this id.
    #[error("quiz `{0}` not found")]
    UnknownQuiz(QuizId),
    /// No stored player has this id.
    #[error("player `{0}` not found")]
    UnknownPlayer(PlayerId),
    /// No live match has this id.
    #[error("match `{0}` not found")]
    UnknownMatch(MatchId),
    /// Item activation without an explicit match for a player outside every match.
    #[error("player `{0}` is not in a match")]
    NotInMatch(PlayerId),
    /// The match refused the answer.
    #[error("answer rejected: {0}")]
    AnswerRejected(#[from] AnswerRejected),
    /// Every match id is taken.
    #[error(transparent)]
    RegistryFull(#[from] RegistryFull),
}

impl ServiceError {
    /// Whether the error names a missing quiz, player or match.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ServiceError::UnknownQuiz(_)
                | ServiceError::UnknownPlayer(_)
                | ServiceError::UnknownMatch(_)
                | ServiceError::NotInMatch(_)
        )
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

/// Errors surfaced by the REST handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// 400: the payload failed validation.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// 404: unknown quiz, player or match.
    #[error("not found: {0}")]
    NotFound(String),
    /// 409: the match state refuses the request.
    #[error("conflict: {0}")]
    Conflict(String),
    /// 503: storage is unreachable.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("invalid payload: {err}"))
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::AnswerRejected(_) | ServiceError::RegistryFull(_) => {
                AppError::Conflict(message)
            }
            ServiceError::UnknownQuiz(_)
            | ServiceError::UnknownPlayer(_)
            | ServiceError::UnknownMatch(_)
            | ServiceError::NotInMatch(_) => AppError::NotFound(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let body = Json(ErrorBody {
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}
