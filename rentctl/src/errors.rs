use crate::db::errors::DbError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Missing or malformed request data
    #[error("{message}")]
    InvalidInput { message: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// The operation would break an occupancy or uniqueness rule
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Storage operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// The four error categories callers distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    Conflict,
    Internal,
}

impl Error {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Error::InvalidInput { message: message.into() }
    }

    pub fn not_found(resource: &str, id: impl ToString) -> Self {
        Error::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Error::Conflict { message: message.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidInput { .. } => ErrorKind::InvalidInput,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Conflict { .. } => ErrorKind::Conflict,
            Error::Internal { .. } | Error::Other(_) => ErrorKind::Internal,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => ErrorKind::NotFound,
                DbError::UniqueViolation { .. } => ErrorKind::Conflict,
                DbError::ForeignKeyViolation { .. } | DbError::CheckViolation { .. } => ErrorKind::InvalidInput,
                DbError::Other(_) => ErrorKind::Internal,
            },
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::InvalidInput { message } => message.clone(),
            Error::NotFound { resource, id } => format!("{resource} with ID {id} not found"),
            Error::Conflict { message } => message.clone(),
            Error::Internal { .. } | Error::Other(_) => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation {
                    constraint,
                    conflicting_value,
                    ..
                } => match (constraint.as_deref(), conflicting_value.as_deref()) {
                    (Some("rooms_room_number_unique"), Some(value)) => format!("Room number {value} already exists"),
                    (Some("rooms_room_number_unique"), None) => "Room number already exists".to_string(),
                    (Some("tenants_citizen_id_unique"), _) => "A tenant with this citizen ID already exists".to_string(),
                    (Some("rooms_tenant_id_unique"), _) => "Tenant already occupies another room".to_string(),
                    _ => "Resource already exists".to_string(),
                },
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match self.kind() {
            ErrorKind::Internal => tracing::error!("Internal service error: {:#}", self),
            ErrorKind::Conflict => tracing::warn!("Conflict error: {}", self),
            ErrorKind::InvalidInput | ErrorKind::NotFound => tracing::debug!("Client error: {}", self),
        }

        let body = json!({
            "kind": self.kind(),
            "message": self.user_message(),
        });

        (self.status_code(), Json(body)).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use rstest::rstest;

    #[rstest]
    #[case(Error::invalid_input("name is required"), StatusCode::BAD_REQUEST)]
    #[case(Error::not_found("Room", "abc"), StatusCode::NOT_FOUND)]
    #[case(Error::conflict("room already occupied"), StatusCode::CONFLICT)]
    #[case(Error::Internal { operation: "load rooms".into() }, StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(Error::Database(DbError::NotFound), StatusCode::NOT_FOUND)]
    #[case(Error::Database(DbError::unique_violation("rooms", "rooms_room_number_unique", "101")), StatusCode::CONFLICT)]
    #[case(Error::Database(DbError::CheckViolation { constraint: None, table: None, message: "bad".into() }), StatusCode::BAD_REQUEST)]
    #[case(Error::Other(anyhow::anyhow!("boom")), StatusCode::INTERNAL_SERVER_ERROR)]
    fn test_status_codes(#[case] error: Error, #[case] expected: StatusCode) {
        assert_eq!(error.status_code(), expected);
    }

    #[test]
    fn test_internal_details_are_not_leaked() {
        let error = Error::Other(anyhow::anyhow!("connection refused to 10.0.0.3"));
        assert_eq!(error.user_message(), "Internal server error");
    }

    #[test]
    fn test_room_number_conflict_message() {
        let error = Error::Database(DbError::unique_violation("rooms", "rooms_room_number_unique", "101"));
        assert_eq!(error.user_message(), "Room number 101 already exists");
        assert_eq!(error.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_response_body_carries_kind() {
        let response = Error::conflict("room already occupied").into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["kind"], "conflict");
        assert_eq!(body["message"], "room already occupied");
    }
}
