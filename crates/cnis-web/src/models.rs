use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cnis_core::ParseResult;
use cnis_parsing::ParsingError;
use serde::{Deserialize, Serialize};

// ── Request / response JSON (Portuguese keys, as the service has always answered) ──

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub texto: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub mensagem: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub status: &'static str,
    pub resultado: ParseResult,
}

impl ProcessResponse {
    pub fn success(resultado: ParseResult) -> Self {
        Self {
            status: "sucesso",
            resultado,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub mensagem: String,
}

/// Handler error rendered as `{"status":"erro","mensagem":...}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

/// Every parsing failure stems from the submitted document, so all are client errors.
impl From<ParsingError> for ApiError {
    fn from(e: ParsingError) -> Self {
        let message = match &e {
            ParsingError::EmptyText => "O texto do CNIS está vazio.".to_string(),
            ParsingError::Backend(inner) => format!("Não foi possível ler o PDF: {}", inner),
            other => other.to_string(),
        };
        Self::bad_request(message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, message = %self.message, "request failed");
        } else {
            tracing::debug!(status = %self.status, message = %self.message, "request rejected");
        }
        let body = ErrorBody {
            status: "erro",
            mensagem: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
