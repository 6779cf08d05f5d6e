//! Common types and utilities shared across phonetrace crates.
//!
//! This crate defines the shared error taxonomy and the observability helpers
//! used throughout the workspace. It stays small so that every
//! crate can depend on it without introducing heavy transitive costs.
//!
//! # Overview
//!
//! - [`PhonetraceError`] and [`Result`]: Shared error handling
//! - [`observability`]: Centralised tracing/logging initialisation
//!
//! # Examples
//!
//! ```rust
//! use phonetrace_common::PhonetraceError;
//!
//! let err = PhonetraceError::Service("Rate limit exceeded".to_string());
//! assert_eq!(err.user_message(), "Rate limit exceeded");
//! assert!(!err.is_config());
//! ```

pub mod observability;

/// Message shown to the user when the model output cannot be used.
pub const INTERPRET_FAILURE_MESSAGE: &str =
    "Failed to interpret the lookup results. Please try again in a moment.";

/// Error types used across the phonetrace system.
#[derive(thiserror::Error, Debug)]
pub enum PhonetraceError {
    /// Configuration was incomplete or invalid (for example, no API key).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The caller handed us something we refuse to send upstream.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The model service or the transport underneath it reported a failure.
    #[error("Service error: {0}")]
    Service(String),

    /// The service answered, but the payload was empty or did not match the
    /// expected shape.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl PhonetraceError {
    /// Text suitable for showing directly to an end user.
    ///
    /// Configuration, input, and service errors pass their message through;
    /// malformed responses collapse to a generic message since the detail is
    /// only useful in logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(msg) | Self::InvalidInput(msg) | Self::Service(msg) => msg.clone(),
            Self::Malformed(_) => INTERPRET_FAILURE_MESSAGE.to_string(),
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Convenient alias for results that use [`PhonetraceError`].
pub type Result<T> = std::result::Result<T, PhonetraceError>;
