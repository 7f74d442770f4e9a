use std::{io, path::PathBuf};

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Failures of the document reader.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("invalid document {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },
}

/// Outcome classes of a single generation call. The retry loop matches on
/// these variants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("rate limited by generation service: {0}")]
    RateLimited(String),
    #[error("generation service error: {0}")]
    Service(String),
    #[error("missing API credential: {0} is not set")]
    MissingCredential(String),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Call(#[from] CallError),
    #[error("generation service returned no content")]
    EmptyResult,
    #[error("failed to write output {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("document task failed: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotFound,
    InvalidDocument,
    RateLimited,
    ServiceError,
    MissingCredential,
    EmptyResult,
    Output,
    Internal,
}

impl PipelineError {
    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineError::Document(DocumentError::NotFound { .. }) => FailureKind::NotFound,
            PipelineError::Document(DocumentError::Invalid { .. }) => FailureKind::InvalidDocument,
            PipelineError::Call(CallError::RateLimited(_)) => FailureKind::RateLimited,
            PipelineError::Call(CallError::Service(_)) => FailureKind::ServiceError,
            PipelineError::Call(CallError::MissingCredential(_)) => FailureKind::MissingCredential,
            PipelineError::EmptyResult => FailureKind::EmptyResult,
            PipelineError::Output { .. } => FailureKind::Output,
            PipelineError::Internal(_) => FailureKind::Internal,
        }
    }
}

/// Uniform wrapper for any failure of the generation pipeline.
#[derive(Debug, Error)]
#[error("generation failed: {cause}")]
pub struct GenerationFailed {
    #[source]
    cause: PipelineError,
}

impl GenerationFailed {
    pub fn kind(&self) -> FailureKind {
        self.cause.kind()
    }

    pub fn cause(&self) -> &PipelineError {
        &self.cause
    }
}

impl From<PipelineError> for GenerationFailed {
    fn from(cause: PipelineError) -> Self {
        Self { cause }
    }
}

#[derive(Debug, PartialEq, Error)]
pub enum DashboardError {
    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error("division by zero")]
    DivisionByZero,
    #[error("minimum {min} is greater than maximum {max}")]
    InvertedBounds { min: i64, max: i64 },
    #[error("count must be between 1 and {max}, got {count}")]
    CountOutOfRange { count: usize, max: usize },
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("sampling setup failed: {0}")]
    Sampling(String),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Generation(#[from] GenerationFailed),
    #[error(transparent)]
    Dashboard(#[from] DashboardError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ServiceError {
    fn from(rejection: QueryRejection) -> Self {
        ServiceError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::BadRequest(_) | ServiceError::Dashboard(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Generation(failed) => match failed.kind() {
                FailureKind::NotFound | FailureKind::InvalidDocument => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                FailureKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                FailureKind::ServiceError | FailureKind::EmptyResult => StatusCode::BAD_GATEWAY,
                FailureKind::MissingCredential => StatusCode::SERVICE_UNAVAILABLE,
                FailureKind::Output | FailureKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServiceError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            ServiceError::Generation(failed) => serde_json::json!({
                "error": self.to_string(),
                "kind": failed.kind(),
            }),
            _ => serde_json::json!({ "error": self.to_string() }),
        };

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_failed_keeps_cause_kind() {
        let failed = GenerationFailed::from(PipelineError::from(CallError::RateLimited(
            "slow down".into(),
        )));
        assert_eq!(failed.kind(), FailureKind::RateLimited);
        assert!(failed.to_string().starts_with("generation failed: "));
        assert!(failed.to_string().contains("slow down"));
    }

    #[test]
    fn generation_failures_map_to_status_codes() {
        let cases = [
            (
                PipelineError::from(DocumentError::NotFound {
                    path: "missing.docx".into(),
                }),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                PipelineError::from(CallError::RateLimited("429".into())),
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (PipelineError::EmptyResult, StatusCode::BAD_GATEWAY),
            (
                PipelineError::from(CallError::MissingCredential("OPENAI_API_KEY".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (cause, expected) in cases {
            let response = ServiceError::from(GenerationFailed::from(cause)).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
