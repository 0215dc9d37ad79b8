//! The single failure type that crosses the gateway boundary.

use crate::schema::Issues;
use std::fmt;
use thiserror::Error;

/// Status classes the client distinguishes. Each maps to one HTTP status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatusClass {
    ClientValidation,
    Unauthenticated,
    NotFound,
    Conflict,
    TwoFactorRequired,
    RateLimited,
    Server,
}

impl StatusClass {
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            StatusClass::ClientValidation => 400,
            StatusClass::Unauthenticated => 401,
            StatusClass::NotFound => 404,
            StatusClass::Conflict => 409,
            StatusClass::TwoFactorRequired => 428,
            StatusClass::RateLimited => 429,
            StatusClass::Server => 500,
        }
    }

    #[must_use]
    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            400 => Some(StatusClass::ClientValidation),
            401 => Some(StatusClass::Unauthenticated),
            404 => Some(StatusClass::NotFound),
            409 => Some(StatusClass::Conflict),
            428 => Some(StatusClass::TwoFactorRequired),
            429 => Some(StatusClass::RateLimited),
            500 => Some(StatusClass::Server),
            _ => None,
        }
    }
}

impl fmt::Display for StatusClass {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusClass::ClientValidation => "client-validation",
            StatusClass::Unauthenticated => "unauthenticated",
            StatusClass::NotFound => "not-found",
            StatusClass::Conflict => "conflict",
            StatusClass::TwoFactorRequired => "two-factor-required",
            StatusClass::RateLimited => "rate-limited",
            StatusClass::Server => "server",
        };
        formatter.write_str(name)
    }
}

/// Failure of a gateway operation: a status class, the raw status and a
/// user-facing message. Validation failures also carry their issues.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message} ({status})")]
pub struct AuthError {
    class: StatusClass,
    status: u16,
    message: String,
    issues: Option<Issues>,
}

impl AuthError {
    pub fn new(class: StatusClass, message: impl Into<String>) -> Self {
        Self {
            class,
            status: class.code(),
            message: message.into(),
            issues: None,
        }
    }

    /// Builds an error from any HTTP status. Codes outside the known set keep
    /// their raw value and are classified as [`StatusClass::Server`].
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            class: StatusClass::from_code(status).unwrap_or(StatusClass::Server),
            status,
            message: message.into(),
            issues: None,
        }
    }

    pub fn client_validation(message: impl Into<String>) -> Self {
        Self::new(StatusClass::ClientValidation, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(StatusClass::Server, message)
    }

    #[must_use]
    pub fn invalid_request(issues: Issues) -> Self {
        Self {
            message: issues.to_string(),
            issues: Some(issues),
            ..Self::client_validation(String::new())
        }
    }

    #[must_use]
    pub fn invalid_response(issues: Issues) -> Self {
        Self {
            message: format!("Invalid response format: {issues}"),
            issues: Some(issues),
            ..Self::server(String::new())
        }
    }

    #[must_use]
    pub fn class(&self) -> StatusClass {
        self.class
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn issues(&self) -> Option<&Issues> {
        self.issues.as_ref()
    }

    #[must_use]
    pub fn is(&self, class: StatusClass) -> bool {
        self.class == class
    }
}
