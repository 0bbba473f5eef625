//! Last-resort recovery boundary for request handling.
//!
//! # Responsibilities
//! - Guarantee no single request failure terminates the process
//! - Convert an unwound panic into exactly one structured JSON response
//! - Route the failure's internal detail to the process log, not the client
//!
//! # Design Decisions
//! - Routine business failures travel as returned `AppError`s; this layer
//!   only catches truly unexpected faults
//! - Classification order: AppError → validation failures → plain error →
//!   anything else
//! - The panic is considered handled after the response; it is never
//!   re-raised. `TraceLayer` sits outside this layer so observability still
//!   sees every recovered request

use std::any::Any;
use std::error::Error;
use std::panic::AssertUnwindSafe;

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use futures_util::FutureExt;

use crate::errors::validation::ValidationErrors;
use crate::errors::AppError;

/// Axum middleware wrapping one unit of request processing.
///
/// On normal completion the response passes through unchanged. On an unwound
/// panic the captured payload is classified into a structured error and
/// written as `{"errors": ...}` with the chosen status. If writing fails the
/// connection is already broken and the failure is dropped.
pub async fn recover(request: Request, next: Next) -> Response {
    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => classify_panic(payload).into_response(),
    }
}

/// Map a captured panic payload onto the error taxonomy.
fn classify_panic(payload: Box<dyn Any + Send>) -> AppError {
    // Already structured: respond with its own status, log the root cause.
    let payload = match payload.downcast::<AppError>() {
        Ok(app) => {
            let app = (*app).with_root_log();
            tracing::error!(
                status = app.status_code,
                code = %app.code,
                root_cause = %app.log,
                "request failed"
            );
            return app;
        }
        Err(payload) => payload,
    };

    // Validation failures: first entry translated, fixed 400/ValidateError.
    let payload = match payload.downcast::<ValidationErrors>() {
        Ok(failures) => {
            let app = AppError::validation(&failures);
            tracing::error!(message = %app.message, "request validation failed");
            return app;
        }
        Err(payload) => payload,
    };

    // Plain error: generic client message, original text for operators only.
    let payload = match payload.downcast::<Box<dyn Error + Send + Sync>>() {
        Ok(cause) => {
            tracing::error!(error = %cause, "request handler panicked");
            return AppError::internal(*cause);
        }
        Err(payload) => payload,
    };

    // Anything else: surface the payload's string form.
    let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unhandled panic".to_string()
    };
    tracing::error!(message = %message, "request handler panicked");
    AppError::from_message(StatusCode::INTERNAL_SERVER_ERROR.as_u16(), message)
}
