// error.rs
// Structured failure taxonomy for the HTTP boundary. Every variant renders as
// {"success": false, "error": "<mensaje>"} with a matching status code; the
// state layer keeps using anyhow and flows in through the Storage variant.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No autenticado")]
    Unauthenticated,
    #[error("El usuario no tiene ninguna organización asignada")]
    NoTenant,
    #[error("Operación no permitida")]
    Forbidden,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Error interno de almacenamiento")]
    Storage(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::NoTenant | ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Storage(err) = &self {
            tracing::error!(error = ?err, "storage failure");
        }
        (
            self.status(),
            Json(json!({ "success": false, "error": self.to_string() })),
        )
            .into_response()
    }
}
