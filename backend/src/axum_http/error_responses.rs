use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crates::domain::value_objects::errors::{LedgerError, TokenLimitExceeded};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Insufficient credit: {0}")]
    InsufficientCredit(String),

    #[error("Token limit exceeded: {0}")]
    TokenLimitExceeded(String),

    #[error("URL access error: {0}")]
    UrlAccess(String),

    #[error("File processing error: {0}")]
    FileProcessing(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error")]
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for AppError {
    /// Lifts typed domain errors out of an anyhow chain; anything unknown is
    /// an internal error.
    fn from(err: anyhow::Error) -> Self {
        for cause in err.chain() {
            if let Some(ledger_err) = cause.downcast_ref::<LedgerError>() {
                return match ledger_err {
                    LedgerError::InsufficientCredit { .. } => {
                        AppError::InsufficientCredit(ledger_err.to_string())
                    }
                    LedgerError::UserNotFound => AppError::NotFound(ledger_err.to_string()),
                    LedgerError::CodeNotFound
                    | LedgerError::CodeAlreadyUsed
                    | LedgerError::RedeemLimitReached => {
                        AppError::BadRequest(ledger_err.to_string())
                    }
                };
            }
            if let Some(token_err) = cause.downcast_ref::<TokenLimitExceeded>() {
                return AppError::TokenLimitExceeded(token_err.to_string());
            }
        }
        AppError::Internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::InsufficientCredit(msg) => (StatusCode::PAYMENT_REQUIRED, msg),
            AppError::TokenLimitExceeded(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::UrlAccess(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::FileProcessing(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Storage(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Internal(err) => {
                tracing::error!(error = ?err, "internal server error");
                // Don't leak internal error detail to the client.
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            code: status.as_u16(),
            message,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_errors_map_to_typed_responses() {
        let err = anyhow::Error::new(LedgerError::InsufficientCredit {
            balance: 25,
            required: 30,
        });
        assert!(matches!(
            AppError::from(err),
            AppError::InsufficientCredit(_)
        ));

        let err = anyhow::Error::new(LedgerError::CodeAlreadyUsed).context("redeem failed");
        assert!(matches!(AppError::from(err), AppError::BadRequest(_)));
    }

    #[test]
    fn token_limit_maps_through_chains() {
        let err = anyhow::Error::new(TokenLimitExceeded {
            token_count: 2_000_000,
            max_tokens: 1_048_576,
        })
        .context("admission validation");
        assert!(matches!(
            AppError::from(err),
            AppError::TokenLimitExceeded(_)
        ));
    }

    #[test]
    fn unknown_errors_become_internal() {
        let err = anyhow::anyhow!("boom");
        assert!(matches!(AppError::from(err), AppError::Internal(_)));
    }
}
