//! Domain entities and token lifetime rules.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

/// Refresh tokens live for days; access tokens for hours. The client's
/// local trust window (2 hours, see the storage crate) is intentionally
/// shorter than both.
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 2;
pub const ACCESS_TOKEN_TTL_HOURS: i64 = 4;

/// Expiry of a refresh token issued at `now`.
pub fn refresh_expires_from(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::days(REFRESH_TOKEN_TTL_DAYS)
}

/// Expiry of an access token issued at `now`.
pub fn access_expires_from(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::hours(ACCESS_TOKEN_TTL_HOURS)
}

/// Account lifecycle status.
///
/// `Deleted` is a status, not a removal: the record stays in the repository
/// and a later login for the same phone registers a fresh guid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStatus {
    Active,
    Banned,
    Deleted,
}

/// A registered account, keyed by phone for lookup and by guid for
/// session linkage.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub guid: String,
    pub phone: String,
    pub user_type: i32,
    pub account_source: String,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// New active account with default type and source.
    pub fn new(guid: String, phone: String, now: DateTime<Utc>) -> Self {
        Self {
            guid,
            phone,
            user_type: 1,
            account_source: "phone".to_string(),
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Per-application slice of a session. Replaced in place on every
/// successful refresh for that app; never shared across app ids.
#[derive(Debug, Clone, PartialEq)]
pub struct AppSession {
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

/// One session per guid. Every entry in `apps` trusts the same
/// `refresh_token`; that shared credential is what makes SSO work.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub guid: String,
    pub refresh_token: String,
    pub refresh_token_expires_at: DateTime<Utc>,
    pub apps: HashMap<String, AppSession>,
}

impl Session {
    pub fn is_refresh_valid(&self, now: DateTime<Utc>) -> bool {
        now < self.refresh_token_expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_outlives_access() {
        let now = Utc::now();
        assert!(refresh_expires_from(now) > access_expires_from(now));
        assert!(access_expires_from(now) > now);
    }

    #[test]
    fn refresh_validity_is_strict() {
        let now = Utc::now();
        let session = Session {
            guid: "G1".into(),
            refresh_token: "R.x".into(),
            refresh_token_expires_at: now,
            apps: HashMap::new(),
        };
        assert!(!session.is_refresh_valid(now));
        assert!(session.is_refresh_valid(now - Duration::seconds(1)));
    }

    #[test]
    fn new_user_defaults() {
        let now = Utc::now();
        let user = User::new("G1".into(), "13800138000".into(), now);
        assert_eq!(user.user_type, 1);
        assert_eq!(user.account_source, "phone");
        assert_eq!(user.status, UserStatus::Active);
        assert_eq!(user.created_at, user.updated_at);
    }
}
