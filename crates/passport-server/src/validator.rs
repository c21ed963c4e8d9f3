//! Access-token resolution.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use passport_core::{AuthError, AuthResult, PassportContext, SessionStore};

/// What a valid access token resolves to.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessClaims {
    pub guid: String,
    pub app_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Resolves an access token back to (guid, app_id) and checks liveness.
///
/// Lookup is a linear scan over all sessions and app entries. Fine at
/// prototype scale; a production store needs a reverse index
/// (access_token → (guid, app_id)) maintained alongside the session map.
pub struct TokenValidator {
    sessions: Arc<SessionStore>,
}

impl TokenValidator {
    pub fn new(ctx: &PassportContext) -> Self {
        Self {
            sessions: ctx.sessions.clone(),
        }
    }

    /// Checks run in order: existence, expiry, then app ownership. An
    /// expired token reports `AccessExpired` even when the app id is also
    /// wrong.
    pub fn validate(
        &self,
        access_token: &str,
        app_id: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<AccessClaims> {
        let mut found: Option<AccessClaims> = None;
        self.sessions.for_each(|guid, session| {
            if found.is_some() {
                return;
            }
            for (aid, app) in &session.apps {
                if app.access_token == access_token {
                    found = Some(AccessClaims {
                        guid: guid.to_string(),
                        app_id: aid.clone(),
                        expires_at: app.access_token_expires_at,
                    });
                    return;
                }
            }
        });

        let claims = found.ok_or(AuthError::AccessInvalid)?;
        if claims.expires_at <= now {
            return Err(AuthError::AccessExpired);
        }
        if claims.app_id != app_id {
            return Err(AuthError::AppIdMismatch);
        }
        Ok(claims)
    }

    /// Resolve a token to its owning guid, ignoring expiry and app id.
    /// Used by the logout path, where a dead token must still tear the
    /// session down.
    pub fn resolve_guid(&self, access_token: &str) -> Option<String> {
        let mut found = None;
        self.sessions.for_each(|guid, session| {
            if found.is_none()
                && session
                    .apps
                    .values()
                    .any(|app| app.access_token == access_token)
            {
                found = Some(guid.to_string());
            }
        });
        found
    }
}
