//! # Error Handling for the HTTP surface
//!
//! Expected outcomes (validation failures, duplicate keys, partially
//! completed bulk operations) are *values*: the handlers return them as
//! `Failure` / `PartialSuccess` envelopes with `200 OK`. [`ApiError`] covers
//! the remaining cases, where the request cannot be answered at all.
//!
//! Whatever the variant, the body is still a `Failure` envelope, so a client
//! only ever has to parse one shape:
//!
//! ```json
//! { "status": "Failure", "messages": { "$": ["Supplier not found"] } }
//! ```
//!
//! Internal details (database errors, driver messages) are logged with
//! `tracing` and never sent to the caller.
//!
//! ## Usage
//!
//! ```rust,ignore
//! async fn my_handler() -> Result<Json<ResponseEnvelope<Supplier>>, ApiError> {
//!     let model = supplier::Entity::find_by_id(id)
//!         .one(db)
//!         .await?
//!         .ok_or_else(|| ApiError::not_found("supplier"))?;
//!     Ok(Json(ResponseEnvelope::success(model.into())))
//! }
//! ```

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use std::fmt;

use crate::envelope::{ENTITY_KEY, Messages, ResponseEnvelope};

/// API error type with automatic logging and sanitized responses
#[derive(Debug)]
pub enum ApiError {
    /// 404 Not Found - Resource doesn't exist
    NotFound {
        /// Resource type (e.g., "supplier")
        resource: String,
    },

    /// 400 Bad Request - Malformed body, path or query
    BadRequest {
        /// Field-keyed messages; request-level problems live under `"$"`
        messages: Messages,
    },

    /// 500 Internal Server Error - Database error (details logged, not exposed)
    Database {
        /// User-facing generic message
        message: String,
        /// Internal error (logged, not sent to user)
        internal: DbErr,
    },
}

impl ApiError {
    /// Create a 404 Not Found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a 400 Bad Request error with a single request-level message
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            messages: Messages::entity(message),
        }
    }

    /// Create a 400 Bad Request error whose message belongs to one field
    pub fn bad_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            messages: Messages::field(field, message),
        }
    }

    /// Create a 500 Internal Server Error from a database error
    ///
    /// The database error details are logged but NOT sent to the user.
    pub fn database(err: DbErr) -> Self {
        Self::Database {
            message: "A database error occurred".to_string(),
            internal: err,
        }
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The sanitized messages sent to the caller.
    #[must_use]
    pub fn messages(&self) -> Messages {
        match self {
            Self::NotFound { resource } => Messages::entity(format!("{resource} not found")),
            Self::BadRequest { messages } => messages.clone(),
            Self::Database { message, .. } => Messages::entity(message.clone()),
        }
    }

    /// The failure envelope this error renders as.
    #[must_use]
    pub fn envelope<T>(&self) -> ResponseEnvelope<T> {
        ResponseEnvelope::failure(self.messages())
    }

    /// Log internal error details (not sent to user)
    fn log_internal(&self) {
        match self {
            Self::Database { internal, .. } => {
                tracing::error!(error = ?internal, "Database error occurred");
            }
            _ => {
                tracing::debug!(
                    error = %self,
                    status = %self.status_code(),
                    "API error"
                );
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log_internal();
        let status = self.status_code();
        (status, Json(self.envelope::<()>())).into_response()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages = self.messages();
        let mut first = true;
        for (field, entries) in messages.iter() {
            for entry in entries {
                if !first {
                    write!(f, "; ")?;
                }
                first = false;
                if field == ENTITY_KEY {
                    write!(f, "{entry}")?;
                } else {
                    write!(f, "{field}: {entry}")?;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Convert `SeaORM` `DbErr` to `ApiError`
///
/// - `DbErr::RecordNotFound` becomes 404 Not Found
/// - every other variant becomes 500 (logged internally, sanitized for users)
///
/// Unique-key violations are not converted here: the write operations turn
/// them into `Failure` envelopes before they reach this point.
impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        match &err {
            DbErr::RecordNotFound(msg) => {
                Self::not_found(msg.strip_suffix(" not found").unwrap_or("Resource"))
            }
            _ => Self::database(err),
        }
    }
}

/// Malformed or missing JSON bodies.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

/// Path segments that do not parse, e.g. a non-UUID id.
impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "rejected path");
        Self::bad_field("id", "Invalid identifier")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::ResultStatus;

    #[test]
    fn test_not_found() {
        let err = ApiError::not_found("Supplier");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Supplier not found");
    }

    #[test]
    fn test_bad_field_keeps_field_key() {
        let err = ApiError::bad_field("pageNumber", "invalid type");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let envelope: ResponseEnvelope<()> = err.envelope();
        assert_eq!(envelope.status, ResultStatus::Failure);
        assert_eq!(envelope.field_errors("pageNumber"), ["invalid type".to_string()]);
        assert_eq!(err.to_string(), "pageNumber: invalid type");
    }

    #[test]
    fn test_envelope_body_uses_entity_key() {
        let envelope: ResponseEnvelope<()> = ApiError::bad_request("Expected a JSON body").envelope();
        assert!(envelope.is_failure());
        assert_eq!(envelope.messages.entity_messages(), ["Expected a JSON body".to_string()]);
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_database_error_is_sanitized() {
        let err = ApiError::database(DbErr::Type("column \"secret\" mismatch".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "A database error occurred");
    }

    #[test]
    fn test_dberr_record_not_found_becomes_404() {
        let api_err: ApiError = DbErr::RecordNotFound("Supplier not found".to_string()).into();
        assert_eq!(api_err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(api_err.to_string(), "Supplier not found");

        let api_err: ApiError = DbErr::RecordNotFound("maintenance record not found".to_string()).into();
        assert_eq!(api_err.to_string(), "maintenance record not found");
    }

    #[test]
    fn test_all_other_dberr_become_500() {
        let test_cases = vec![
            DbErr::Custom("Any custom error".to_string()),
            DbErr::Type("Type error".to_string()),
            DbErr::Json("JSON error".to_string()),
        ];

        for db_err in test_cases {
            let api_err: ApiError = db_err.into();
            assert_eq!(api_err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(api_err.to_string(), "A database error occurred");
        }
    }

    #[tokio::test]
    async fn test_into_response_renders_failure_envelope() {
        let response = ApiError::not_found("Vehicle").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "Failure");
        assert_eq!(body["messages"]["$"][0], "Vehicle not found");
    }
}
