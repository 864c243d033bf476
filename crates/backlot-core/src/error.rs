//! # Validation Errors
//!
//! Structured validation errors for domain primitives, built with
//! `thiserror`. Each variant carries the offending input so callers can
//! surface a descriptive message without inspecting logs.

use thiserror::Error;

/// Errors raised when constructing or combining domain primitives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// VIN failed format validation.
    #[error("invalid VIN \"{vin}\": {reason}")]
    InvalidVin {
        /// The rejected input.
        vin: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Email address failed format validation.
    #[error("invalid email address: \"{0}\"")]
    InvalidEmail(String),

    /// Model year outside the accepted range.
    #[error("model year {0} is outside the accepted range 1900..=2100")]
    InvalidYear(i32),

    /// A required text field was empty or whitespace-only.
    #[error("{field} must not be empty")]
    EmptyField {
        /// Name of the offending field.
        field: &'static str,
    },

    /// Monetary amount string could not be parsed.
    #[error("invalid monetary amount: \"{0}\"")]
    InvalidAmount(String),

    /// A monetary amount that must be positive was zero or negative.
    #[error("{field} must be a positive amount, got {amount}")]
    NonPositiveAmount {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected amount, in canonical decimal form.
        amount: String,
    },

    /// Checked monetary arithmetic overflowed.
    #[error("monetary arithmetic overflow")]
    AmountOverflow,
}
