//--------------------------------------------------------------------------------------------------
// ENUMS
//--------------------------------------------------------------------------------------------------
// | Name      | Description                                                  | Key Methods  |
// |-----------|--------------------------------------------------------------|--------------|
// | ApiError  | Maps EngineError/request-parsing failures to an HTTP response | into_response|
//--------------------------------------------------------------------------------------------------

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::domain::services::engine::EngineError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Error, Debug, Clone)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };
        let body = Json(json!({ "error": { "message": message, "code": status.as_u16() } }));
        (status, body).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::UnknownSymbol(symbol) => Self::NotFound(format!("unknown symbol {symbol}")),
            EngineError::ActorGone(symbol) => {
                Self::Internal(format!("symbol {symbol} is no longer being served"))
            }
            EngineError::InternalInvariantViolation { symbol, source } => {
                Self::Internal(format!("symbol {symbol} quarantined: {source}"))
            }
        }
    }
}
