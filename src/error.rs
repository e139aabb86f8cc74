use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed: {}", summarize(.0))]
    Validation(Vec<FieldError>),

    #[error("Network error: {message}")]
    Network { message: String, code: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("A booking submission is already in progress")]
    SubmissionInProgress,

    #[error("Step {0} has not been reached yet")]
    StepLocked(String),

    #[error("Booking is not ready to submit: {0}")]
    NotReady(String),

    #[error("Sign in required")]
    Unauthorized,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type AppResult<T> = Result<T, AppError>;

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|err| format!("{}: {}", err.field, err.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl AppError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }

    pub fn network(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            code: code.into(),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Network { code, .. } => code,
            Self::NotFound(_) => "not_found",
            Self::SubmissionInProgress => "submission_in_progress",
            Self::StepLocked(_) => "step_locked",
            Self::NotReady(_) => "not_ready",
            Self::Unauthorized => "unauthorized",
            Self::Database(_) => "database_error",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: String,
    code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a [FieldError]>,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::NotReady(_) => StatusCode::BAD_REQUEST,
            Self::Network { .. } => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::SubmissionInProgress | Self::StepLocked(_) => StatusCode::CONFLICT,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let Self::Database(err) = self {
            log::error!("Database failure: {err}");
        }
        let fields = match self {
            Self::Validation(fields) => Some(fields.as_slice()),
            _ => None,
        };
        HttpResponse::build(self.status_code()).json(ErrorBody {
            message: self.to_string(),
            code: self.code(),
            fields,
        })
    }
}
