use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use opentelemetry::trace::TraceContextExt;
use serde_json::json;
use thiserror::Error;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Internal error: {0}")]
    #[allow(dead_code)]
    Internal(String),
}

fn get_trace_id() -> Option<String> {
    let span = Span::current();
    let context = span.context();
    let span_ref = context.span();
    let span_context = span_ref.span_context();

    if span_context.is_valid() {
        Some(span_context.trace_id().to_string())
    } else {
        None
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::InvalidQuestion(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::SessionNotFound(_) => (
                StatusCode::NOT_FOUND,
                "No report found. Please upload a report first.".to_string(),
            ),
            AppError::ModelUnavailable(msg) => {
                tracing::error!(error = %msg, "Model unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "The language model is unavailable, please retry".to_string(),
                )
            }
            AppError::MalformedResponse(msg) => {
                tracing::error!(error = %msg, "Malformed model response");
                (
                    StatusCode::BAD_GATEWAY,
                    "The language model returned an unusable reply, please retry".to_string(),
                )
            }
            AppError::Upload(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = if let Some(trace_id) = get_trace_id() {
            json!({
                "error": error_message,
                "status": status.as_u16(),
                "trace_id": trace_id,
            })
        } else {
            json!({
                "error": error_message,
                "status": status.as_u16(),
            })
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
