//! Translation of field-level validation failures into client messages.
//!
//! # Design Decisions
//! - Only the first failure is surfaced; a multi-field dump would overwhelm
//!   the caller
//! - Unknown rule tags fall back to a generic message naming field and tag
//! - Pure and total: always returns a string, never fails

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field name as submitted (e.g. "Name").
    pub field: String,
    /// Rule tag that failed (e.g. "required", "max", "oneof").
    pub tag: String,
    /// Optional rule parameter (e.g. the bound for "min"/"max").
    pub param: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, tag: impl Into<String>, param: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            tag: tag.into(),
            param: param.into(),
        }
    }
}

/// Ordered collection of validation failures, as produced by a request-body
/// validator.
#[derive(Debug, Clone, Default)]
pub struct ValidationErrors(pub Vec<FieldError>);

/// Produce a single human-readable message from a failure list.
///
/// Dispatches on the first failure's rule tag. An empty list maps to the
/// generic invalid-request text.
pub fn translate(failures: &ValidationErrors) -> String {
    let Some(failure) = failures.0.first() else {
        return "invalid request".to_string();
    };

    match failure.tag.as_str() {
        "required" => format!("{} is a required field", failure.field),
        "max" => format!(
            "{} must be a maximum of {} in length",
            failure.field, failure.param
        ),
        "min" => format!(
            "{} must be a minimum of {} in length",
            failure.field, failure.param
        ),
        "url" => format!("{} must be a valid URL", failure.field),
        "email" => format!("{} must be a valid Email", failure.field),
        "oneof" => format!("{} must be one of enums {}", failure.field, failure.param),
        "hourtime" => format!("{} must be between 00:00 and 23:59", failure.field),
        "requirethenmust" => format!("leng {} must be {}", failure.field, failure.param),
        "gtcsfield" => format!("{} must be greater than {}", failure.field, failure.param),
        _ => format!("something wrong on {}; {}", failure.field, failure.tag),
    }
}
