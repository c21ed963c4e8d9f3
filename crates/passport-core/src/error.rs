//! Domain error taxonomy.
//!
//! Failures cross service boundaries as stable wire codes ([`ErrorCode`]),
//! never as transport-specific exceptions. [`AuthError`] is the typed form
//! the server services return; `AuthError::code()` is the only place the
//! two are bridged.

use std::fmt;

use thiserror::Error;

/// Closed enumeration of wire-level error codes.
///
/// Shared between the domain layer and the client's error-action resolver.
/// `Unknown` is the explicit catch-all for codes this build does not map;
/// it must never be produced by the server services themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    PhoneInvalid,
    CodeInvalid,
    CodeExpired,
    CodeTooFrequent,
    UserBanned,
    RefreshExpired,
    RefreshMismatch,
    AccessExpired,
    AccessInvalid,
    AppIdMismatch,
    SessionNotFound,
    Internal,
    Unknown,
}

impl ErrorCode {
    /// Stable wire representation of the code.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::PhoneInvalid => "ERR_PHONE_INVALID",
            ErrorCode::CodeInvalid => "ERR_CODE_INVALID",
            ErrorCode::CodeExpired => "ERR_CODE_EXPIRED",
            ErrorCode::CodeTooFrequent => "ERR_CODE_TOO_FREQUENT",
            ErrorCode::UserBanned => "ERR_USER_BANNED",
            ErrorCode::RefreshExpired => "ERR_REFRESH_EXPIRED",
            ErrorCode::RefreshMismatch => "ERR_REFRESH_MISMATCH",
            ErrorCode::AccessExpired => "ERR_ACCESS_EXPIRED",
            ErrorCode::AccessInvalid => "ERR_ACCESS_INVALID",
            ErrorCode::AppIdMismatch => "ERR_APP_ID_MISMATCH",
            ErrorCode::SessionNotFound => "ERR_SESSION_NOT_FOUND",
            ErrorCode::Internal => "ERR_INTERNAL",
            ErrorCode::Unknown => "ERR_UNKNOWN",
        }
    }

    /// Parse a wire code. Anything unrecognized maps to `Unknown` so the
    /// resolver can fall through to a no-op instead of guessing.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "ERR_PHONE_INVALID" => ErrorCode::PhoneInvalid,
            "ERR_CODE_INVALID" => ErrorCode::CodeInvalid,
            "ERR_CODE_EXPIRED" => ErrorCode::CodeExpired,
            "ERR_CODE_TOO_FREQUENT" => ErrorCode::CodeTooFrequent,
            "ERR_USER_BANNED" => ErrorCode::UserBanned,
            "ERR_REFRESH_EXPIRED" => ErrorCode::RefreshExpired,
            "ERR_REFRESH_MISMATCH" => ErrorCode::RefreshMismatch,
            "ERR_ACCESS_EXPIRED" => ErrorCode::AccessExpired,
            "ERR_ACCESS_INVALID" => ErrorCode::AccessInvalid,
            "ERR_APP_ID_MISMATCH" => ErrorCode::AppIdMismatch,
            "ERR_SESSION_NOT_FOUND" => ErrorCode::SessionNotFound,
            "ERR_INTERNAL" => ErrorCode::Internal,
            _ => ErrorCode::Unknown,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed domain error returned by the server services.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid phone number format")]
    PhoneInvalid,

    #[error("verification code mismatch")]
    CodeInvalid,

    #[error("verification code expired")]
    CodeExpired,

    #[error("user is banned")]
    UserBanned,

    #[error("refresh token expired or session missing")]
    RefreshExpired,

    #[error("refresh token mismatch")]
    RefreshMismatch,

    #[error("access token expired")]
    AccessExpired,

    #[error("access token invalid")]
    AccessInvalid,

    #[error("app id does not own this access token")]
    AppIdMismatch,

    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Wire code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            AuthError::PhoneInvalid => ErrorCode::PhoneInvalid,
            AuthError::CodeInvalid => ErrorCode::CodeInvalid,
            AuthError::CodeExpired => ErrorCode::CodeExpired,
            AuthError::UserBanned => ErrorCode::UserBanned,
            AuthError::RefreshExpired => ErrorCode::RefreshExpired,
            AuthError::RefreshMismatch => ErrorCode::RefreshMismatch,
            AuthError::AccessExpired => ErrorCode::AccessExpired,
            AuthError::AccessInvalid => ErrorCode::AccessInvalid,
            AuthError::AppIdMismatch => ErrorCode::AppIdMismatch,
            AuthError::Internal(_) => ErrorCode::Internal,
        }
    }
}

/// Result type for the server services.
pub type AuthResult<T> = Result<T, AuthError>;
