//! Error types for ebook generation jobs.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// Failures at the completion backend boundary.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("failed to reach the completion backend: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("completion backend error ({status}): {body}")]
    Backend { status: u16, body: String },

    #[error("malformed completion response: {0}")]
    MalformedResponse(String),

    #[error("the backend returned no chapter names")]
    EmptyOutline,
}

/// The pipeline step a generation failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Outline,
    Draft(usize),
    Summary(usize),
    Compaction(usize),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Outline => write!(f, "outline generation"),
            Stage::Draft(i) => write!(f, "drafting chapter {}", i),
            Stage::Summary(i) => write!(f, "summarizing chapter {}", i),
            Stage::Compaction(i) => write!(f, "compacting the summary before chapter {}", i),
        }
    }
}

/// Job-level errors surfaced to the submitter.
#[derive(Debug, Error)]
pub enum EbookError {
    #[error("invalid ebook request: {0}")]
    Validation(String),

    #[error("{stage} failed: {source}")]
    Generation {
        stage: Stage,
        #[source]
        source: GenerationError,
    },

    #[error("ebook export failed: {0}")]
    Export(String),
}

impl EbookError {
    pub fn generation(stage: Stage) -> impl FnOnce(GenerationError) -> Self {
        move |source| EbookError::Generation { stage, source }
    }
}

impl IntoResponse for EbookError {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": self.to_string() })),
        )
            .into_response()
    }
}
