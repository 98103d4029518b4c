//! Unified application error model.
//! This module provides the common error enum used across the identity layer,
//! the mock directory API and the dashboard shell, along with a stable string
//! code per variant and an HTTP-style status classification. The status is what
//! the simulated REST surface reports and what callers use to tell 4xx-class
//! failures (never retried) from 5xx-class ones.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, Error, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    /// Empty email or password handed to a credential provider.
    #[error("missing_credentials: {message}")]
    MissingCredentials { message: String },
    /// A session token segment that cannot be decoded.
    #[error("malformed_token: {message}")]
    MalformedToken { message: String },
    /// Directory entity lookup miss.
    #[error("not_found: {message}")]
    NotFound { message: String },
    /// The mock directory's randomized failure injection fired.
    #[error("simulated_server: {message}")]
    SimulatedServer { message: String },
    /// Authentication rejected or no active session where one is required.
    #[error("auth: {message}")]
    Auth { message: String },
    /// An authenticated caller lacking the role/permission for an operation.
    #[error("forbidden: {message}")]
    Forbidden { message: String },
    #[error("io: {message}")]
    Io { message: String },
    #[error("internal: {message}")]
    Internal { message: String },
}

impl AppError {
    pub fn code_str(&self) -> &'static str {
        match self {
            AppError::MissingCredentials { .. } => "missing_credentials",
            AppError::MalformedToken { .. } => "malformed_token",
            AppError::NotFound { .. } => "not_found",
            AppError::SimulatedServer { .. } => "simulated_server",
            AppError::Auth { .. } => "auth",
            AppError::Forbidden { .. } => "forbidden",
            AppError::Io { .. } => "io",
            AppError::Internal { .. } => "internal",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::MissingCredentials { message }
            | AppError::MalformedToken { message }
            | AppError::NotFound { message }
            | AppError::SimulatedServer { message }
            | AppError::Auth { message }
            | AppError::Forbidden { message }
            | AppError::Io { message }
            | AppError::Internal { message } => message.as_str(),
        }
    }

    pub fn missing_credentials<S: Into<String>>(msg: S) -> Self { AppError::MissingCredentials { message: msg.into() } }
    pub fn malformed_token<S: Into<String>>(msg: S) -> Self { AppError::MalformedToken { message: msg.into() } }
    pub fn not_found<S: Into<String>>(msg: S) -> Self { AppError::NotFound { message: msg.into() } }
    pub fn simulated<S: Into<String>>(msg: S) -> Self { AppError::SimulatedServer { message: msg.into() } }
    pub fn auth<S: Into<String>>(msg: S) -> Self { AppError::Auth { message: msg.into() } }
    pub fn forbidden<S: Into<String>>(msg: S) -> Self { AppError::Forbidden { message: msg.into() } }
    pub fn io<S: Into<String>>(msg: S) -> Self { AppError::Io { message: msg.into() } }
    pub fn internal<S: Into<String>>(msg: S) -> Self { AppError::Internal { message: msg.into() } }

    /// Map to the HTTP status code the simulated REST layer reports.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::MissingCredentials { .. } => 400,
            AppError::MalformedToken { .. } => 401,
            AppError::NotFound { .. } => 404,
            AppError::SimulatedServer { .. } => 500,
            AppError::Auth { .. } => 401,
            AppError::Forbidden { .. } => 403,
            AppError::Io { .. } => 503,
            AppError::Internal { .. } => 500,
        }
    }

    /// 4xx-class failures are never worth retrying.
    pub fn is_client_error(&self) -> bool {
        let s = self.http_status();
        (400..500).contains(&s)
    }
}

pub type AppResult<T> = Result<T, AppError>;

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        // Default mapping: treat as Internal unless downcasted elsewhere
        AppError::Internal { message: err.to_string() }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io { message: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_mapping() {
        assert_eq!(AppError::missing_credentials("empty").http_status(), 400);
        assert_eq!(AppError::malformed_token("bad segment").http_status(), 401);
        assert_eq!(AppError::not_found("missing").http_status(), 404);
        assert_eq!(AppError::simulated("injected").http_status(), 500);
        assert_eq!(AppError::auth("no").http_status(), 401);
        assert_eq!(AppError::forbidden("blocked").http_status(), 403);
        assert_eq!(AppError::io("disk").http_status(), 503);
        assert_eq!(AppError::internal("panic").http_status(), 500);
    }

    #[test]
    fn client_error_classification() {
        assert!(AppError::missing_credentials("empty").is_client_error());
        assert!(AppError::not_found("missing").is_client_error());
        assert!(!AppError::simulated("injected").is_client_error());
        assert!(!AppError::io("disk").is_client_error());
    }

    #[test]
    fn display_includes_code_and_message() {
        let e = AppError::malformed_token("segment 2 not base64");
        assert_eq!(e.to_string(), "malformed_token: segment 2 not base64");
        assert_eq!(e.code_str(), "malformed_token");
        assert_eq!(e.message(), "segment 2 not base64");
    }
}
