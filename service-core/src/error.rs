use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Application error taxonomy shared by all request handlers.
///
/// Each variant maps to exactly one HTTP status. `into_response` logs the
/// error and renders the `{status: false, message}` envelope the API speaks;
/// 5xx responses carry a fixed message and keep the underlying cause in the
/// server log only.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed input. 400.
    #[error("{0}")]
    Validation(anyhow::Error),

    /// A referenced entity does not exist. 404.
    #[error("{0}")]
    NotFound(anyhow::Error),

    /// An upstream service reported failure or an unexpected status. 400.
    #[error("{0}")]
    Upstream(anyhow::Error),

    /// Document store failure. 500 with a fixed message.
    #[error("database error: {0}")]
    Database(anyhow::Error),

    /// Anything else. 500 with a fixed message.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    status: bool,
    message: String,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Upstream(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.status_code();

        if code.is_server_error() {
            tracing::error!(status = %code, error = %self, "request failed");
        } else {
            tracing::warn!(status = %code, error = %self, "request rejected");
        }

        let message = match &self {
            AppError::Validation(err) | AppError::NotFound(err) | AppError::Upstream(err) => {
                err.to_string()
            }
            AppError::Database(_) => {
                "Database operation failed. Please contact support.".to_string()
            }
            AppError::Internal(_) => "Internal Server Error".to_string(),
        };

        (
            code,
            Json(ErrorBody {
                status: false,
                message,
            }),
        )
            .into_response()
    }
}
