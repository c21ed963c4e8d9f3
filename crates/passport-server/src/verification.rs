//! Verification code gate.
//!
//! Validates a one-time code against the stored (code, expiry) pair.
//! Delivery (SMS) and issuance rate limiting live outside this crate.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use passport_core::{AuthError, AuthResult, CodeStore};

/// Issued codes stay redeemable for this long.
pub const CODE_TTL_MINUTES: i64 = 10;

pub struct VerificationService {
    codes: Arc<CodeStore>,
}

impl VerificationService {
    pub fn new(codes: Arc<CodeStore>) -> Self {
        Self { codes }
    }

    /// Record a code for `phone`. Overwrites any previous pending code.
    pub fn issue_code(&self, phone: &str, code: &str, now: DateTime<Utc>) {
        let expires_at = now + Duration::minutes(CODE_TTL_MINUTES);
        debug!(phone = %phone, expires_at = %expires_at, "verification code issued");
        self.codes.save(phone, code, expires_at);
    }

    /// Check `code` against the stored pair. A phone with no pending code
    /// reports `PhoneInvalid`, not a distinct code.
    pub fn validate_code(&self, phone: &str, code: &str, now: DateTime<Utc>) -> AuthResult<()> {
        let (saved_code, expires_at) = self
            .codes
            .get(phone)
            .ok_or(AuthError::PhoneInvalid)?;

        if now >= expires_at {
            return Err(AuthError::CodeExpired);
        }
        if code != saved_code {
            return Err(AuthError::CodeInvalid);
        }
        Ok(())
    }
}
