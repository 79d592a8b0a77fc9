//! Common Error Types
//!
//! User-facing notes returned by access checks and dispatch, each carrying a
//! stable string code that front ends map to translated messages.

use serde::{Serialize, Serializer};
use std::fmt;

/// Note codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Action requires an authenticated session
    LoginRequired,
    /// Action requires an anonymous session
    LogoutRequired,
    /// A named permission is missing from the session grants
    InsufficientPrivilege,
    /// Nothing in the manifest matched the request and no default exists
    NoSuitableAction,
    /// Caller cannot reach the application at all
    NoAccess,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::LoginRequired => "app_login_required",
            ErrorCode::LogoutRequired => "app_logout_required",
            ErrorCode::InsufficientPrivilege => "app_no_access",
            ErrorCode::NoSuitableAction => "app_no_suitable_action",
            ErrorCode::NoAccess => "app_no_access",
        }
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// Structured, user-facing error note
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Create a login required error
    pub fn login_required(action: &str, app: &str) -> Self {
        Self::new(
            ErrorCode::LoginRequired,
            format!(
                "The {} action of the application {} requires to be logged in.",
                action, app
            ),
        )
    }

    /// Create a logout required error
    pub fn logout_required(action: &str, app: &str) -> Self {
        Self::new(
            ErrorCode::LogoutRequired,
            format!(
                "The {} action of the application {} requires to be logged out.",
                action, app
            ),
        )
    }

    /// Create an insufficient privilege error naming the missing permission
    pub fn insufficient_privilege(action: &str, app: &str, permission: &str) -> Self {
        Self::new(
            ErrorCode::InsufficientPrivilege,
            format!(
                "You need the '{}' privilege to access the action {} in the application {}.",
                permission, action, app
            ),
        )
        .with_data(serde_json::json!({ "permission": permission }))
    }

    /// Create a no suitable action error
    pub fn no_suitable_action(app: &str) -> Self {
        Self::new(
            ErrorCode::NoSuitableAction,
            format!(
                "No suitable action to trigger was found in the application {}.",
                app
            ),
        )
    }

    /// Create an application access error
    pub fn no_access(app: &str) -> Self {
        Self::new(
            ErrorCode::NoAccess,
            format!("You do not have access to the application {}.", app),
        )
    }

    /// Missing permission carried by an insufficient privilege note
    pub fn permission(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|d| d.get("permission"))
            .and_then(|v| v.as_str())
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl std::error::Error for AppError {}
