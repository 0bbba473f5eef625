//! Structured error taxonomy.
//!
//! # Responsibilities
//! - Define the client-safe structured error (`AppError`)
//! - Map error kinds to HTTP status codes and machine-readable codes
//! - Unwrap nested causes for operator logging (`root_error`)
//! - Serialize only the client-visible fields
//!
//! # Design Decisions
//! - `root_cause` is mandatory at construction and never serialized
//! - `with_code` returns a copy; error values are never mutated in place
//! - Predefined constructors are pure value factories, not logic

pub mod validation;

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::errors::validation::{translate, ValidationErrors};

/// Client-safe structured error.
///
/// The serialized form carries `code`, `log`, `status_code` and `message`;
/// the root cause stays process-internal. `log` intentionally may contain
/// internal detail and is an implementer-controlled disclosure.
#[derive(Debug, Clone, Serialize)]
pub struct AppError {
    /// Root cause, never shown to clients.
    #[serde(skip)]
    root_cause: Arc<dyn Error + Send + Sync>,
    /// Short machine-readable key. May be empty.
    pub code: String,
    /// Snapshot of the cause text, computed once.
    pub log: String,
    /// HTTP status to respond with.
    pub status_code: u16,
    /// User-facing text. Never empty.
    pub message: String,
}

impl AppError {
    /// Create a structured error from a cause, a status and a client message.
    ///
    /// Every structured error must carry a cause; callers without one should
    /// use [`AppError::from_message`], which synthesizes the cause from the
    /// message text.
    pub fn new(
        cause: impl Into<Box<dyn Error + Send + Sync>>,
        status_code: u16,
        message: impl Into<String>,
    ) -> Self {
        let cause: Arc<dyn Error + Send + Sync> = Arc::from(cause.into());
        Self {
            log: cause.to_string(),
            root_cause: cause,
            code: String::new(),
            status_code,
            message: message.into(),
        }
    }

    /// Create a structured error whose cause is synthesized from the message.
    pub fn from_message(status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(
            Box::<dyn Error + Send + Sync>::from(message.clone()),
            status_code,
            message,
        )
    }

    /// Return a copy carrying the given code. The receiver is not mutated.
    pub fn with_code(&self, code: impl Into<String>) -> Self {
        let mut copy = self.clone();
        copy.code = code.into();
        copy
    }

    /// Innermost non-taxonomy cause.
    ///
    /// Nested `AppError` causes are unwrapped recursively; the returned
    /// value is never itself an `AppError`. Used for operator logging only.
    pub fn root_error(&self) -> &(dyn Error + Send + Sync + 'static) {
        let mut cause: &(dyn Error + Send + Sync + 'static) = self.root_cause.as_ref();
        while let Some(nested) = cause.downcast_ref::<AppError>() {
            cause = nested.root_cause.as_ref();
        }
        cause
    }

    /// Return a copy whose `log` snapshot is refreshed from the root cause.
    ///
    /// The recovery boundary calls this before responding so operators see
    /// the innermost failure rather than an intermediate wrapper.
    pub fn with_root_log(self) -> Self {
        let log = self.root_error().to_string();
        Self { log, ..self }
    }

    /// Build a 400 `ValidateError` from a validation failure list.
    ///
    /// Only the first failure is surfaced; the rest are dropped on purpose
    /// so a multi-field submission does not overwhelm the caller.
    pub fn validation(failures: &ValidationErrors) -> Self {
        let message = translate(failures);
        Self::from_message(StatusCode::BAD_REQUEST.as_u16(), message).with_code("ValidateError")
    }

    // Predefined factories. Fixed status/message/code; treat as a lookup
    // table.

    pub fn no_permission() -> Self {
        Self::from_message(
            StatusCode::FORBIDDEN.as_u16(),
            "you don't have permission to access",
        )
        .with_code("ErrNoPermission")
    }

    pub fn token_invalid() -> Self {
        Self::from_message(StatusCode::UNAUTHORIZED.as_u16(), "invalid access token")
            .with_code("ErrAccessTokenInvalid")
    }

    pub fn token_inactivated() -> Self {
        Self::from_message(
            StatusCode::UNAUTHORIZED.as_u16(),
            "access token is disabled",
        )
        .with_code("ErrAccessTokenInactivated")
    }

    pub fn data_not_found() -> Self {
        Self::from_message(StatusCode::NOT_FOUND.as_u16(), "data not found")
            .with_code("ErrDataNotFound")
    }

    pub fn invalid_request(cause: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self::new(cause, StatusCode::BAD_REQUEST.as_u16(), "invalid request")
            .with_code("invalid_request")
    }

    pub fn db_error(cause: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self::new(cause, StatusCode::BAD_REQUEST.as_u16(), "db error").with_code("db_error")
    }

    pub fn cannot_fetch_data(cause: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self::new(cause, StatusCode::BAD_REQUEST.as_u16(), "can not fetch data")
            .with_code("cannot_fetch_data")
    }

    /// Generic 500 with a fixed client message; the cause goes to `log`.
    pub fn internal(cause: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self::new(
            cause,
            StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            "internal server errors",
        )
    }

    /// Structured error from a keyed message: code and message travel
    /// together, status defaults to 400.
    pub fn custom(cause: impl Into<Box<dyn Error + Send + Sync>>, keyed: &KeyedError) -> Self {
        Self::new(cause, StatusCode::BAD_REQUEST.as_u16(), keyed.message.clone())
            .with_code(keyed.key.clone())
    }

    pub fn unauthorized(cause: impl Into<Box<dyn Error + Send + Sync>>, keyed: &KeyedError) -> Self {
        Self::new(
            cause,
            StatusCode::UNAUTHORIZED.as_u16(),
            keyed.message.clone(),
        )
        .with_code(keyed.key.clone())
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        let cause: &(dyn Error + 'static) = self.root_cause.as_ref();
        Some(cause)
    }
}

/// Client-visible error envelope: `{"errors": {...}}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub errors: AppError,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorBody { errors: self })).into_response()
    }
}

/// A plain error carrying a stable machine key alongside its message.
#[derive(Debug, Clone)]
pub struct KeyedError {
    pub key: String,
    pub message: String,
}

impl KeyedError {
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for KeyedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for KeyedError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_error_unwraps_nested_app_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "connection reset");
        let inner = AppError::new(io, 400, "inner");
        let middle = AppError::new(inner, 400, "middle");
        let outer = AppError::new(middle, 500, "outer");

        let root = outer.root_error();
        assert!(root.downcast_ref::<AppError>().is_none());
        assert_eq!(root.to_string(), "connection reset");
    }

    #[test]
    fn test_with_code_does_not_mutate_receiver() {
        let original = AppError::from_message(400, "bad input");
        let coded = original.with_code("invalid_request");

        assert_eq!(original.code, "");
        assert_eq!(coded.code, "invalid_request");
        assert_eq!(original.message, coded.message);
        assert_eq!(original.status_code, coded.status_code);
        assert_eq!(original.log, coded.log);
    }

    #[test]
    fn test_serialization_excludes_root_cause() {
        let err = AppError::from_message(401, "invalid access token").with_code("token_invalid");
        let value = serde_json::to_value(&err).unwrap();

        let obj = value.as_object().unwrap();
        assert!(!obj.contains_key("root_cause"));
        assert_eq!(obj["code"], "token_invalid");
        assert_eq!(obj["status_code"], 401);
        assert_eq!(obj["message"], "invalid access token");
        assert_eq!(obj["log"], "invalid access token");
    }

    #[test]
    fn test_with_root_log_snapshots_innermost_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let wrapped = AppError::new(AppError::internal(io), 500, "outer");

        let refreshed = wrapped.with_root_log();
        assert_eq!(refreshed.log, "disk full");
    }

    #[test]
    fn test_predefined_factories_fixed_values() {
        let err = AppError::token_invalid();
        assert_eq!(err.status_code, 401);
        assert_eq!(err.code, "ErrAccessTokenInvalid");
        assert_eq!(err.message, "invalid access token");

        let err = AppError::data_not_found();
        assert_eq!(err.status_code, 404);

        let err = AppError::internal(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert_eq!(err.status_code, 500);
        assert_eq!(err.message, "internal server errors");
        assert_eq!(err.log, "boom");

        let err = AppError::db_error(std::io::Error::new(
            std::io::ErrorKind::Other,
            "duplicate key",
        ));
        assert_eq!(err.code, "db_error");
        assert_eq!(err.message, "db error");
        assert_eq!(err.log, "duplicate key");
    }

    #[test]
    fn test_keyed_error_carries_code_and_message() {
        let keyed = KeyedError::new("sign_not_matched", "sign not matched");
        let err = AppError::custom(keyed.clone(), &keyed);
        assert_eq!(err.status_code, 400);
        assert_eq!(err.code, "sign_not_matched");
        assert_eq!(err.message, "sign not matched");

        let keyed = KeyedError::new("token_expired", "token expired");
        let err = AppError::unauthorized(keyed.clone(), &keyed);
        assert_eq!(err.status_code, 401);
        assert_eq!(err.code, "token_expired");
    }
}
