//! Error types and result aliases for Hireline.
//!
//! This module defines the shared error taxonomy used across all Hireline
//! components. Errors are structured for programmatic handling: backend
//! failures carry an HTTP-status-derived kind so callers can change UI
//! affordances (disable submit, redirect, re-enable retry) instead of
//! treating every failure as a generic banner.

use std::fmt;

/// The result type used throughout Hireline.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Hireline operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A client-side field validation failed. Never reaches the network layer.
    #[error("validation failed for '{field}': {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// Description of the failure, suitable for display next to the field.
        message: String,
    },

    /// The backend reports an active lock on the identifying field.
    ///
    /// Blocks submission; the lock holder and remaining window are surfaced
    /// so the agent knows who is working the record and for how long.
    #[error("record locked by {locked_by} ({remaining} remaining)")]
    DuplicateLocked {
        /// Display name of the agent holding the lock.
        locked_by: String,
        /// Human-readable remaining lock time, verbatim from the backend.
        remaining: String,
    },

    /// The backend reports no existing record where one was expected.
    ///
    /// Not an error banner: consumers navigate to a pre-filled intake form.
    #[error("no existing record for {identifier}")]
    NotFoundRedirect {
        /// The identifier that was looked up (a 10-digit phone number).
        identifier: String,
    },

    /// The requested resource was not found (plain 404 on a by-id fetch).
    #[error("not found: {0}")]
    NotFound(String),

    /// The backend rejected the payload (HTTP 400/422).
    #[error("rejected by server: {message}")]
    ValidationFailed {
        /// The backend's message, verbatim.
        message: String,
    },

    /// The resource is locked or conflicted (HTTP 409/423).
    #[error("locked: {message}")]
    Locked {
        /// The backend's message, verbatim.
        message: String,
    },

    /// The backend failed (HTTP 5xx).
    #[error("server error ({status}): {message}")]
    Server {
        /// The HTTP status code.
        status: u16,
        /// The backend's message, or a generic fallback when the body was empty.
        message: String,
    },

    /// The request never produced a response (DNS, connect, timeout).
    #[error("network error: {message}")]
    Network {
        /// Description of the transport failure.
        message: String,
    },

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },

    /// Invalid input was provided to a Hireline API.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A configuration value was missing or malformed.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Creates a validation error for a field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Maps an HTTP status code plus backend message to the error kind the
    /// UI layer dispatches on.
    ///
    /// 404 becomes [`Error::NotFound`]; 409 and 423 become [`Error::Locked`];
    /// 400 and 422 become [`Error::ValidationFailed`]; everything else is a
    /// [`Error::Server`]. Transport failures never reach this function.
    #[must_use]
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.is_empty() {
            "request failed".to_string()
        } else {
            message
        };
        match status {
            404 => Self::NotFound(message),
            409 | 423 => Self::Locked { message },
            400 | 422 => Self::ValidationFailed { message },
            _ => Self::Server { status, message },
        }
    }

    /// Returns the kind label for this error, for logging and metrics.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::DuplicateLocked { .. } => ErrorKind::DuplicateLocked,
            Self::NotFoundRedirect { .. } => ErrorKind::NotFoundRedirect,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::ValidationFailed { .. } => ErrorKind::ValidationFailed,
            Self::Locked { .. } => ErrorKind::Locked,
            Self::Server { .. } => ErrorKind::Server,
            Self::Network { .. } => ErrorKind::Network,
            Self::Serialization { .. } => ErrorKind::Serialization,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// Returns true if this error must block submission of the current draft.
    ///
    /// Validation and lock errors are blocking; network and server errors are
    /// terminal for the attempt but leave the draft editable for retry.
    #[must_use]
    pub fn blocks_submission(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::DuplicateLocked { .. } | Self::Locked { .. }
        )
    }
}

/// Stable error kind labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Client-side field validation.
    Validation,
    /// Backend lock on the identifying field.
    DuplicateLocked,
    /// Expected record missing; navigate instead of erroring.
    NotFoundRedirect,
    /// Resource not found.
    NotFound,
    /// Backend rejected the payload.
    ValidationFailed,
    /// Resource locked or conflicted.
    Locked,
    /// Backend failure.
    Server,
    /// Transport failure.
    Network,
    /// Serialization failure.
    Serialization,
    /// Invalid input to a Hireline API.
    InvalidInput,
    /// Missing or malformed configuration.
    Configuration,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Validation => "validation",
            Self::DuplicateLocked => "duplicate_locked",
            Self::NotFoundRedirect => "not_found_redirect",
            Self::NotFound => "not_found",
            Self::ValidationFailed => "validation_failed",
            Self::Locked => "locked",
            Self::Server => "server",
            Self::Network => "network",
            Self::Serialization => "serialization",
            Self::InvalidInput => "invalid_input",
            Self::Configuration => "configuration",
        };
        write!(f, "{label}")
    }
}
