use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::services::checklist::capacity_error_text;
use persistence::repositories::{ChecklistError, IssueError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A limited resource is exhausted; shown to the user as-is.
    #[error("{title}: {message}")]
    Capacity { title: String, message: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut title = None;
        let (status, error_code, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::Capacity {
                title: t,
                message,
            } => {
                title = Some(t);
                (StatusCode::CONFLICT, "capacity_exceeded", message)
            }
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                )
            }
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg)
            }
        };

        let body = ErrorBody {
            error: error_code.into(),
            title,
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".into()),
            sqlx::Error::Database(db_err) => {
                if let Some(code) = db_err.code() {
                    match code.as_ref() {
                        "23505" => ApiError::Conflict("Resource already exists".into()),
                        "23503" => ApiError::NotFound("Referenced resource not found".into()),
                        _ => ApiError::Internal(format!("Database error: {}", db_err)),
                    }
                } else {
                    ApiError::Internal(format!("Database error: {}", db_err))
                }
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid {}", field))
                })
            })
            .collect();

        let message = if messages.len() == 1 {
            messages[0].clone()
        } else {
            format!("{} validation errors", messages.len())
        };

        ApiError::Validation(message)
    }
}

impl From<IssueError> for ApiError {
    fn from(err: IssueError) -> Self {
        match err {
            IssueError::EventNotFound(id) => ApiError::NotFound(format!("Event {} not found", id)),
            IssueError::TicketTypeNotFound(id) => {
                ApiError::NotFound(format!("Ticket type {} not found", id))
            }
            IssueError::SoldOut { name, .. } => ApiError::Capacity {
                title: "Sold out".to_string(),
                message: format!("All tickets of type {} are sold", name),
            },
            IssueError::PerUserLimitExceeded { limit, .. } => ApiError::Capacity {
                title: "Ticket limit reached".to_string(),
                message: format!("Only {} tickets of this type per person", limit),
            },
            IssueError::Database(e) => e.into(),
        }
    }
}

impl From<ChecklistError> for ApiError {
    fn from(err: ChecklistError) -> Self {
        match err {
            ChecklistError::OptionLimitReached { item, limit } => {
                let (title, message) = capacity_error_text(&item, limit);
                ApiError::Capacity { title, message }
            }
            ChecklistError::UnknownOption { answer, .. } => {
                ApiError::Validation(format!("Unknown option: {}", answer))
            }
            ChecklistError::NotInTicketType(id) => {
                ApiError::NotFound(format!("Checklist {} not found for this ticket", id))
            }
            ChecklistError::Database(e) => e.into(),
        }
    }
}
