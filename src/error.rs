use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde_json::json;

/// Failures raised by a [`CinemaStore`](crate::store::CinemaStore) backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    /// A uniqueness constraint rejected the write.
    #[error("Constraint violated: {0}")]
    Constraint(String),
}

/// Domain errors surfaced by the hall, movie and show-time services.
///
/// None of these are retried: every variant aborts the running unit of work
/// before anything is committed.
#[derive(Debug, thiserror::Error)]
pub enum CinemaError {
    #[error("{entity} with id {id} not found.")]
    NotFound { entity: &'static str, id: ObjectId },

    #[error("Show time end time ({end}) must be after start time ({start}).")]
    InvalidTimeRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Cinema hall '{hall_name}' is already occupied between {start} and {end}.")]
    ScheduleConflict {
        hall_name: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("{entity} '{name}' already exists.")]
    DuplicateName { entity: &'static str, name: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CinemaError {
    pub fn not_found(entity: &'static str, id: ObjectId) -> Self {
        CinemaError::NotFound { entity, id }
    }
}

pub type CinemaResult<T> = Result<T, CinemaError>;

/// Error type returned by HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Cinema(#[from] CinemaError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::BadRequest(errors.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Cinema(CinemaError::Store(err))
    }
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Status code, machine-readable code and client-facing message.
    pub fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Cinema(err) => match err {
                CinemaError::NotFound { .. } => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string())
                }
                CinemaError::InvalidTimeRange { .. } => {
                    (StatusCode::BAD_REQUEST, "INVALID_TIME_RANGE", err.to_string())
                }
                CinemaError::ScheduleConflict { .. } => {
                    (StatusCode::CONFLICT, "SCHEDULE_CONFLICT", err.to_string())
                }
                CinemaError::DuplicateName { .. } => {
                    (StatusCode::CONFLICT, "DUPLICATE_NAME", err.to_string())
                }
                CinemaError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CinemaError::Store(StoreError::Constraint(msg)) => {
                    (StatusCode::CONFLICT, "CONFLICT", msg.clone())
                }
                CinemaError::Store(store) => {
                    tracing::error!(error = %store, "Store failure");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let body = json!({
            "error": message,
            "code": code,
        });
        (status, axum::Json(body)).into_response()
    }
}
