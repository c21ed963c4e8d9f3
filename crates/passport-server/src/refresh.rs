//! Per-app access-token renewal: the SSO fan-out.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use passport_core::{
    access_expires_from, AppSession, AuthError, AuthResult, PassportContext, SessionStore,
    UserStatus,
};

use crate::auth::LoginOutput;
use crate::token::generate_access_token;

/// Issues and renews per-app access tokens against a valid refresh token.
pub struct TokenRefreshService {
    sessions: Arc<SessionStore>,
}

impl TokenRefreshService {
    pub fn new(ctx: &PassportContext) -> Self {
        Self {
            sessions: ctx.sessions.clone(),
        }
    }

    /// Mint a fresh access token for (guid, app_id).
    ///
    /// A second client application, knowing only the shared refresh token,
    /// acquires its own access token here without a new login. The refresh
    /// token itself never rotates; only access tokens do.
    pub fn refresh(&self, guid: &str, refresh_token: &str, app_id: &str) -> AuthResult<LoginOutput> {
        let now = Utc::now();

        // The whole read-modify-write runs under the store lock, so
        // concurrent refreshes for the same (guid, app_id) serialize.
        let outcome = self.sessions.update(guid, |session| {
            if !session.is_refresh_valid(now) {
                return Err(AuthError::RefreshExpired);
            }
            if session.refresh_token != refresh_token {
                return Err(AuthError::RefreshMismatch);
            }

            let access_token = generate_access_token();
            let access_token_expires_at = access_expires_from(now);
            session.apps.insert(
                app_id.to_string(),
                AppSession {
                    access_token: access_token.clone(),
                    access_token_expires_at,
                    last_active_at: now,
                },
            );

            Ok(LoginOutput {
                guid: session.guid.clone(),
                access_token,
                refresh_token: session.refresh_token.clone(),
                user_status: UserStatus::Active,
                account_source: "phone".to_string(),
                user_type: 1,
                access_token_expires_at,
                refresh_token_expires_at: session.refresh_token_expires_at,
            })
        });

        match outcome {
            // Missing session and time-expired refresh report the same code.
            None => Err(AuthError::RefreshExpired),
            Some(result) => {
                if result.is_ok() {
                    debug!(guid = %guid, app_id = %app_id, "access token refreshed");
                }
                result
            }
        }
    }
}
