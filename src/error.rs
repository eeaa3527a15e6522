//! Error types shared across the seller API boundary.

use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single call against the seller backend.
///
/// Transport failures, non-success statuses and unreadable bodies are kept
/// apart here so the CLI can print something useful. The order dashboard
/// collapses all of them into a logged fallback.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Transport(String),

    #[error("{message} (HTTP {})", .status.as_u16())]
    Status { status: StatusCode, message: String },

    #[error("Invalid response body from seller backend: {0}")]
    Decode(String),

    #[error("Session expired, sign in again")]
    SessionExpired,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// A form field that failed client-side validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("All fields are required")]
    MissingFields,
    #[error("{0} is required")]
    Required(&'static str),
    #[error("Login id may only contain English letters and digits")]
    LoginIdCharset,
    #[error("Login id duplicate check has not been completed")]
    LoginIdNotChecked,
    #[error("E-mail verification has not been completed")]
    EmailNotVerified,
    #[error("Phone number verification has not been completed")]
    PhoneNotVerified,
    #[error("Password must be between {min} and {max} characters")]
    PasswordLength { min: usize, max: usize },
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Seller name must be at least {0} characters")]
    UsernameTooShort(usize),
    #[error("Corporate registration number must be exactly 10 digits")]
    RegistrationNumberFormat,
    #[error("Open date must not be after close date")]
    DateRange,
}
