//! Session teardown and account status changes.

use std::sync::Arc;

use tracing::info;

use passport_core::{PassportContext, SessionStore, UserRepo, UserStatus};

/// Destroys sessions by guid. The caller is responsible for having
/// resolved the guid from a credential it trusts.
pub struct LogoutService {
    sessions: Arc<SessionStore>,
}

impl LogoutService {
    pub fn new(ctx: &PassportContext) -> Self {
        Self {
            sessions: ctx.sessions.clone(),
        }
    }

    /// Idempotent: logging out a guid without a session is a success.
    pub fn logout(&self, guid: &str) {
        if self.sessions.delete(guid) {
            info!(guid = %guid, "session destroyed");
        }
    }
}

/// Flips account status and tears down live sessions on ban.
pub struct BanService {
    users: Arc<UserRepo>,
    sessions: Arc<SessionStore>,
}

impl BanService {
    pub fn new(ctx: &PassportContext) -> Self {
        Self {
            users: ctx.users.clone(),
            sessions: ctx.sessions.clone(),
        }
    }

    /// Ban the account and delete its session wholesale; every app's
    /// access token dies with it. Unknown phones are ignored.
    pub fn ban_by_phone(&self, phone: &str) {
        let Some(mut user) = self.users.find_by_phone(phone) else {
            return;
        };
        user.status = UserStatus::Banned;
        let user = self.users.upsert(user);
        self.sessions.delete(&user.guid);
        info!(guid = %user.guid, "user banned, session revoked");
    }

    /// Lift a ban. Does not restore any session; the user logs in again.
    pub fn unban_by_phone(&self, phone: &str) {
        let Some(mut user) = self.users.find_by_phone(phone) else {
            return;
        };
        user.status = UserStatus::Active;
        self.users.upsert(user);
        info!(phone = %phone, "user unbanned");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthService;

    #[test]
    fn logout_is_idempotent() {
        let ctx = PassportContext::new();
        let logout = LogoutService::new(&ctx);
        logout.logout("no-such-guid");

        let auth = AuthService::new(&ctx);
        auth.issue_code("13800138000", "246810").unwrap();
        let out = auth.login("13800138000", "246810", "app-a").unwrap();

        logout.logout(&out.guid);
        logout.logout(&out.guid);
        assert!(ctx.sessions.is_empty());
    }

    #[test]
    fn ban_revokes_session_and_unban_restores_status_only() {
        let ctx = PassportContext::new();
        let auth = AuthService::new(&ctx);
        auth.issue_code("13800138000", "246810").unwrap();
        let out = auth.login("13800138000", "246810", "app-a").unwrap();

        let bans = BanService::new(&ctx);
        bans.ban_by_phone("13800138000");

        let user = ctx.users.find_by_phone("13800138000").unwrap();
        assert_eq!(user.status, UserStatus::Banned);
        assert!(ctx.sessions.get(&out.guid).is_none());

        bans.unban_by_phone("13800138000");
        let user = ctx.users.find_by_phone("13800138000").unwrap();
        assert_eq!(user.status, UserStatus::Active);
        assert!(ctx.sessions.get(&out.guid).is_none());
    }

    #[test]
    fn unknown_phone_is_a_noop() {
        let ctx = PassportContext::new();
        let bans = BanService::new(&ctx);
        bans.ban_by_phone("13800138000");
        bans.unban_by_phone("13800138000");
        assert!(ctx.users.is_empty());
    }
}
