use thiserror::Error;

use crate::lifecycle::{EventStatus, Transition};

/// Error type shared by the store, the rule engines and every plugin.
///
/// Each variant maps to an HTTP status code via [`HubError::status_code`].
/// Use [`HubError::into_response`] to produce the standard JSON body
/// `{ "message": "..." }`.
#[derive(Error, Debug)]
pub enum HubError {
    // --- 400 Bad Request ---
    #[error("{0}")]
    BadRequest(String),

    #[error("Cannot {transition} an event that is {from}")]
    InvalidTransition {
        from: EventStatus,
        transition: Transition,
    },

    // --- 401 Unauthorized ---
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Authentication required")]
    Unauthenticated,

    // --- 403 Forbidden ---
    #[error("{0}")]
    Forbidden(String),

    // --- 404 Not Found ---
    #[error("{0}")]
    NotFound(String),

    // --- 409 Conflict ---
    #[error("{0}")]
    Conflict(String),

    // --- 422 Unprocessable Entity ---
    #[error("Validation error: {0}")]
    Validation(String),

    // --- 429 Too Many Requests ---
    #[error("Too many requests")]
    RateLimited,

    // --- 500 Internal Server Error ---
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl HubError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) | Self::InvalidTransition { .. } => 400,
            Self::InvalidCredentials | Self::Unauthenticated => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Validation(_) => 422,
            Self::RateLimited => 429,
            Self::Config(_)
            | Self::Store(_)
            | Self::Serialization(_)
            | Self::PasswordHash(_)
            | Self::Internal(_) => 500,
        }
    }

    /// Convert this error into a `{ "message": "..." }` response.
    ///
    /// Internal errors (500) use a generic message to avoid leaking details.
    pub fn into_response(self) -> crate::types::HubResponse {
        let status = self.status_code();
        let message = match status {
            500 => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        crate::types::HubResponse::json(
            status,
            &crate::types::ErrorMessageResponse {
                message: message.clone(),
            },
        )
        .unwrap_or_else(|_| crate::types::HubResponse::text(status, message))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

pub type HubResult<T> = Result<T, HubError>;

/// Convert `validator::ValidationErrors` into a 422 response with
/// `{ "code": "VALIDATION_ERROR", "message": "...", "errors": {...} }`.
pub fn validation_error_response(
    errors: &validator::ValidationErrors,
) -> crate::types::HubResponse {
    let field_errors: std::collections::HashMap<String, Vec<String>> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let field = field.to_string();
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {}", field))
                })
                .collect();
            (field, messages)
        })
        .collect();

    let body = crate::types::ValidationErrorResponse {
        code: "VALIDATION_ERROR",
        message: "Validation failed",
        errors: field_errors,
    };

    crate::types::HubResponse::json(422, &body)
        .unwrap_or_else(|_| crate::types::HubResponse::text(422, "Validation failed"))
}

/// Parse and validate a JSON request body, or produce the error response
/// the caller should return as-is.
pub fn validate_request_body<T>(
    req: &crate::types::HubRequest,
) -> Result<T, crate::types::HubResponse>
where
    T: serde::de::DeserializeOwned + validator::Validate,
{
    let value: T = req.body_as_json().map_err(|e| {
        HubError::bad_request(format!("Invalid JSON: {}", e)).into_response()
    })?;

    value.validate().map_err(|e| validation_error_response(&e))?;

    Ok(value)
}
