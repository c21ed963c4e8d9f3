//! Login/registration flow.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use passport_core::{
    access_expires_from, refresh_expires_from, AppSession, AuthError, AuthResult, PassportContext,
    Session, SessionStore, User, UserRepo, UserStatus,
};

use crate::token::{generate_access_token, generate_refresh_token, GuidGenerator};
use crate::verification::VerificationService;

/// Successful login or refresh payload. Field set matches the wire
/// contract of the `login` operation.
#[derive(Debug, Clone)]
pub struct LoginOutput {
    pub guid: String,
    pub access_token: String,
    pub refresh_token: String,
    pub user_status: UserStatus,
    pub account_source: String,
    pub user_type: i32,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

/// Phone login/registration service.
pub struct AuthService {
    users: Arc<UserRepo>,
    sessions: Arc<SessionStore>,
    gate: VerificationService,
}

impl AuthService {
    pub fn new(ctx: &PassportContext) -> Self {
        Self {
            users: ctx.users.clone(),
            sessions: ctx.sessions.clone(),
            gate: VerificationService::new(ctx.codes.clone()),
        }
    }

    /// Authenticate a phone + one-time code and open a session for `app_id`.
    ///
    /// Registers the phone on first login; a second login for the same
    /// phone replaces the whole session, invalidating the previous refresh
    /// token for every app.
    pub fn login(&self, phone: &str, code: &str, app_id: &str) -> AuthResult<LoginOutput> {
        // 1. Phone format gate.
        if !is_valid_phone(phone) {
            return Err(AuthError::PhoneInvalid);
        }

        let now = Utc::now();

        // 2. One-time code gate.
        self.gate.validate_code(phone, code, now)?;

        // 3. Resolve or create the user.
        let user = match self.users.find_by_phone(phone) {
            None => {
                let guid = GuidGenerator::generate(1, now);
                info!(guid = %guid, "registering new user");
                self.users.upsert(User::new(guid, phone.to_string(), now))
            }
            Some(user) if user.status == UserStatus::Banned => {
                return Err(AuthError::UserBanned);
            }
            Some(user) if user.status == UserStatus::Deleted => {
                // A deleted account re-registers under a fresh guid; the
                // old guid and its session are abandoned, type and source
                // carry forward.
                let guid = GuidGenerator::generate(user.user_type, now);
                info!(old_guid = %user.guid, guid = %guid, "re-registering deleted user");
                let mut fresh = User::new(guid, phone.to_string(), now);
                fresh.user_type = user.user_type;
                fresh.account_source = user.account_source;
                self.users.upsert(fresh)
            }
            Some(user) => user,
        };

        // 4. Issue a fresh token pair and replace any prior session.
        let refresh_token = generate_refresh_token();
        let access_token = generate_access_token();
        let refresh_token_expires_at = refresh_expires_from(now);
        let access_token_expires_at = access_expires_from(now);

        let mut apps = HashMap::new();
        apps.insert(
            app_id.to_string(),
            AppSession {
                access_token: access_token.clone(),
                access_token_expires_at,
                last_active_at: now,
            },
        );
        self.sessions.put(Session {
            guid: user.guid.clone(),
            refresh_token: refresh_token.clone(),
            refresh_token_expires_at,
            apps,
        });

        info!(guid = %user.guid, app_id = %app_id, "login succeeded");

        Ok(LoginOutput {
            guid: user.guid,
            access_token,
            refresh_token,
            user_status: user.status,
            account_source: user.account_source,
            user_type: user.user_type,
            access_token_expires_at,
            refresh_token_expires_at,
        })
    }

    /// Store a pending verification code for `phone` (delivery is external).
    pub fn issue_code(&self, phone: &str, code: &str) -> AuthResult<()> {
        if !is_valid_phone(phone) {
            return Err(AuthError::PhoneInvalid);
        }
        self.gate.issue_code(phone, code, Utc::now());
        Ok(())
    }
}

/// 11 digits, leading `1`, second digit 3-9 (mainland mobile prefix range).
fn is_valid_phone(phone: &str) -> bool {
    let bytes = phone.as_bytes();
    bytes.len() == 11
        && bytes[0] == b'1'
        && (b'3'..=b'9').contains(&bytes[1])
        && bytes.iter().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_format() {
        assert!(is_valid_phone("13800138000"));
        assert!(is_valid_phone("19912345678"));

        assert!(!is_valid_phone("12800138000")); // prefix 12 out of range
        assert!(!is_valid_phone("23800138000")); // must start with 1
        assert!(!is_valid_phone("1380013800")); // too short
        assert!(!is_valid_phone("138001380001")); // too long
        assert!(!is_valid_phone("1380013800a"));
        assert!(!is_valid_phone(""));
    }

    fn logged_in(ctx: &PassportContext, phone: &str) -> LoginOutput {
        let auth = AuthService::new(ctx);
        auth.issue_code(phone, "246810").unwrap();
        auth.login(phone, "246810", "app-a").unwrap()
    }

    #[test]
    fn login_rejects_bad_phone_before_the_gate() {
        let ctx = PassportContext::new();
        let auth = AuthService::new(&ctx);
        let err = auth.login("not-a-phone", "246810", "app-a").unwrap_err();
        assert!(matches!(err, AuthError::PhoneInvalid));
    }

    #[test]
    fn first_login_registers_user_and_session() {
        let ctx = PassportContext::new();
        let out = logged_in(&ctx, "13800138000");

        assert_eq!(ctx.users.len(), 1);
        assert_eq!(ctx.sessions.len(), 1);
        assert_eq!(out.user_status, UserStatus::Active);
        assert_eq!(out.user_type, 1);
        assert_eq!(out.account_source, "phone");
        assert!(out.refresh_token_expires_at > out.access_token_expires_at);

        let session = ctx.sessions.get(&out.guid).unwrap();
        assert_eq!(session.apps.len(), 1);
        assert_eq!(session.apps["app-a"].access_token, out.access_token);
    }

    #[test]
    fn banned_user_cannot_login_and_nothing_mutates() {
        let ctx = PassportContext::new();
        let out = logged_in(&ctx, "13800138000");

        let mut user = ctx.users.find_by_phone("13800138000").unwrap();
        user.status = UserStatus::Banned;
        ctx.users.upsert(user);
        ctx.sessions.delete(&out.guid);

        let auth = AuthService::new(&ctx);
        auth.issue_code("13800138000", "246810").unwrap();
        let err = auth.login("13800138000", "246810", "app-a").unwrap_err();
        assert!(matches!(err, AuthError::UserBanned));
        assert!(ctx.sessions.is_empty());
    }

    #[test]
    fn deleted_user_gets_a_fresh_guid() {
        let ctx = PassportContext::new();
        let first = logged_in(&ctx, "13800138000");

        let mut user = ctx.users.find_by_phone("13800138000").unwrap();
        user.status = UserStatus::Deleted;
        user.account_source = "imported".to_string();
        ctx.users.upsert(user);

        let second = logged_in(&ctx, "13800138000");
        assert_ne!(second.guid, first.guid);
        assert_eq!(second.user_status, UserStatus::Active);
        assert_eq!(second.account_source, "imported");
    }
}
