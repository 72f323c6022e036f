//! Error taxonomy shared by every MDR crate.
//!
//! The variants map one-to-one onto the client-facing error classes the
//! service layer reports. None of them is retried: a failed operation leaves
//! the aggregate untouched and the error is returned to the caller as-is.

use std::fmt;

use thiserror::Error;

/// Coarse error classification used by callers to pick a response class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A business rule was violated (illegal transition, locked library, broken reference).
    BusinessLogic,
    /// A uniqueness constraint was violated.
    AlreadyExists,
    /// The requested uid does not resolve to an item.
    NotFound,
    /// An input value is malformed.
    Validation,
}

impl ErrorKind {
    /// Returns the HTTP-equivalent status class for this kind.
    pub fn default_status(&self) -> u16 {
        match self {
            ErrorKind::BusinessLogic => 400,
            ErrorKind::AlreadyExists => 409,
            ErrorKind::NotFound => 404,
            ErrorKind::Validation => 422,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BusinessLogic => "business_logic",
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Validation => "validation",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by library item construction, lifecycle transitions and lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MdrError {
    /// A business rule check failed.
    #[error("{message}")]
    BusinessLogic { message: String },

    /// A name or code is already used by another item.
    #[error("{message}")]
    AlreadyExists { message: String },

    /// The requested item does not exist.
    #[error("{message}")]
    NotFound { message: String },

    /// An input value is malformed.
    #[error("{message}")]
    Validation { message: String },

    /// A lifecycle transition is not allowed in the current state.
    ///
    /// Classified as [`ErrorKind::BusinessLogic`], but carries its own
    /// machine-readable code and status.
    #[error("{message}")]
    Versioning {
        message: String,
        code: &'static str,
        status: u16,
    },
}

impl MdrError {
    pub fn business_logic(message: impl Into<String>) -> Self {
        Self::BusinessLogic {
            message: message.into(),
        }
    }

    /// `{resource} with {field} '{value}' didn't pass a business rule.`
    pub fn business_rule(resource: &str, field: &str, value: impl fmt::Display) -> Self {
        Self::business_logic(format!(
            "{resource} with {field} '{value}' didn't pass a business rule."
        ))
    }

    /// `{resource} with {field} '{value}' already exists.`
    pub fn already_exists(resource: &str, field: &str, value: impl fmt::Display) -> Self {
        Self::AlreadyExists {
            message: format!("{resource} with {field} '{value}' already exists."),
        }
    }

    pub fn already_exists_with(message: impl Into<String>) -> Self {
        Self::AlreadyExists {
            message: message.into(),
        }
    }

    /// `{resource} with {field} '{value}' doesn't exist.`
    pub fn not_found(resource: &str, field: &str, value: impl fmt::Display) -> Self {
        Self::NotFound {
            message: format!("{resource} with {field} '{value}' doesn't exist."),
        }
    }

    pub fn not_found_with(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// `Provided {field} '{value}' is invalid for {resource}.`
    pub fn invalid_value(resource: &str, field: &str, value: impl fmt::Display) -> Self {
        Self::validation(format!(
            "Provided {field} '{value}' is invalid for {resource}."
        ))
    }

    /// Generic illegal-transition error.
    pub fn versioning(message: impl Into<String>) -> Self {
        Self::versioning_with(message, "invalid_transition", 400)
    }

    pub fn versioning_with(message: impl Into<String>, code: &'static str, status: u16) -> Self {
        Self::Versioning {
            message: message.into(),
            code,
            status,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BusinessLogic { .. } | Self::Versioning { .. } => ErrorKind::BusinessLogic,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Validation { .. } => ErrorKind::Validation,
        }
    }

    /// HTTP-equivalent status the service layer reports for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Versioning { status, .. } => *status,
            other => other.kind().default_status(),
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Versioning { code, .. } => code,
            other => other.kind().as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BusinessLogic { message }
            | Self::AlreadyExists { message }
            | Self::NotFound { message }
            | Self::Validation { message }
            | Self::Versioning { message, .. } => message,
        }
    }

    /// All MDR errors are caused by the request, never by the server.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

pub type Result<T> = std::result::Result<T, MdrError>;
