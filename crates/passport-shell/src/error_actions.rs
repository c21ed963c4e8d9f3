//! Error-code-driven recovery.
//!
//! A pure mapping from server error codes to client actions, plus the
//! executor that applies an action through injected cleanup/broadcast
//! hooks. This is the only place error codes are interpreted client-side.

use serde::{Deserialize, Serialize};

use passport_core::ErrorCode;

/// Session status vocabulary broadcast to frontends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    None,
    Active,
    SsoAvailable,
    Banned,
    RateLimited,
    AppMismatch,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::None => "none",
            SessionStatus::Active => "active",
            SessionStatus::SsoAvailable => "sso_available",
            SessionStatus::Banned => "banned",
            SessionStatus::RateLimited => "rate_limited",
            SessionStatus::AppMismatch => "app_mismatch",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recovery action resolved from a server error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    Logout,
    RetryRefresh,
    Ban,
    AppMismatch,
    RateLimit,
    Internal,
    Noop,
}

/// Resolve a (possibly absent) error code to its recovery action.
pub fn map_error_to_action(code: Option<ErrorCode>) -> ErrorAction {
    match code {
        Some(ErrorCode::RefreshExpired)
        | Some(ErrorCode::RefreshMismatch)
        | Some(ErrorCode::SessionNotFound) => ErrorAction::Logout,
        Some(ErrorCode::AccessExpired) | Some(ErrorCode::AccessInvalid) => {
            ErrorAction::RetryRefresh
        }
        Some(ErrorCode::UserBanned) => ErrorAction::Ban,
        Some(ErrorCode::AppIdMismatch) => ErrorAction::AppMismatch,
        Some(ErrorCode::CodeTooFrequent) => ErrorAction::RateLimit,
        Some(ErrorCode::Internal) => ErrorAction::Internal,
        _ => ErrorAction::Noop,
    }
}

/// Apply a resolved action.
///
/// - `Logout`/`Ban` run `logout` (local cleanup, expected idempotent) and
///   broadcast `none`/`banned`.
/// - `RetryRefresh`/`Internal` deliberately clean nothing up; the
///   scheduler or caller owns the retry.
/// - `RateLimit`/`AppMismatch` invoke their optional hook when supplied.
pub fn handle_error_action(
    action: ErrorAction,
    logout: &mut dyn FnMut(),
    broadcast: &mut dyn FnMut(SessionStatus),
    on_rate_limit: Option<&mut dyn FnMut()>,
    on_app_mismatch: Option<&mut dyn FnMut()>,
) {
    match action {
        ErrorAction::Logout => {
            logout();
            broadcast(SessionStatus::None);
        }
        ErrorAction::Ban => {
            logout();
            broadcast(SessionStatus::Banned);
        }
        ErrorAction::RetryRefresh | ErrorAction::Internal => {}
        ErrorAction::RateLimit => {
            if let Some(hook) = on_rate_limit {
                hook();
            }
        }
        ErrorAction::AppMismatch => {
            if let Some(hook) = on_app_mismatch {
                hook();
            }
        }
        ErrorAction::Noop => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_table() {
        assert_eq!(
            map_error_to_action(Some(ErrorCode::RefreshExpired)),
            ErrorAction::Logout
        );
        assert_eq!(
            map_error_to_action(Some(ErrorCode::RefreshMismatch)),
            ErrorAction::Logout
        );
        assert_eq!(
            map_error_to_action(Some(ErrorCode::SessionNotFound)),
            ErrorAction::Logout
        );
        assert_eq!(
            map_error_to_action(Some(ErrorCode::AccessExpired)),
            ErrorAction::RetryRefresh
        );
        assert_eq!(
            map_error_to_action(Some(ErrorCode::AccessInvalid)),
            ErrorAction::RetryRefresh
        );
        assert_eq!(
            map_error_to_action(Some(ErrorCode::UserBanned)),
            ErrorAction::Ban
        );
        assert_eq!(
            map_error_to_action(Some(ErrorCode::AppIdMismatch)),
            ErrorAction::AppMismatch
        );
        assert_eq!(
            map_error_to_action(Some(ErrorCode::CodeTooFrequent)),
            ErrorAction::RateLimit
        );
        assert_eq!(
            map_error_to_action(Some(ErrorCode::Internal)),
            ErrorAction::Internal
        );
    }

    #[test]
    fn unmapped_and_absent_codes_are_noops() {
        assert_eq!(map_error_to_action(None), ErrorAction::Noop);
        assert_eq!(
            map_error_to_action(Some(ErrorCode::Unknown)),
            ErrorAction::Noop
        );
        // Login-path codes never reach the recovery path.
        assert_eq!(
            map_error_to_action(Some(ErrorCode::PhoneInvalid)),
            ErrorAction::Noop
        );
        assert_eq!(
            map_error_to_action(Some(ErrorCode::CodeInvalid)),
            ErrorAction::Noop
        );
    }

    #[test]
    fn banned_wire_code_always_resolves_to_ban() {
        assert_eq!(
            map_error_to_action(Some(ErrorCode::parse("ERR_USER_BANNED"))),
            ErrorAction::Ban
        );
        assert_eq!(
            map_error_to_action(Some(ErrorCode::parse("ERR_SOMETHING_ELSE"))),
            ErrorAction::Noop
        );
    }

    fn run(action: ErrorAction) -> (u32, Vec<SessionStatus>, u32, u32) {
        let mut logouts = 0;
        let mut statuses = Vec::new();
        let mut rate_limits = 0;
        let mut mismatches = 0;
        handle_error_action(
            action,
            &mut || logouts += 1,
            &mut |s| statuses.push(s),
            Some(&mut || rate_limits += 1),
            Some(&mut || mismatches += 1),
        );
        (logouts, statuses, rate_limits, mismatches)
    }

    #[test]
    fn logout_cleans_up_and_broadcasts_none() {
        let (logouts, statuses, ..) = run(ErrorAction::Logout);
        assert_eq!(logouts, 1);
        assert_eq!(statuses, vec![SessionStatus::None]);
    }

    #[test]
    fn ban_cleans_up_and_broadcasts_banned() {
        let (logouts, statuses, ..) = run(ErrorAction::Ban);
        assert_eq!(logouts, 1);
        assert_eq!(statuses, vec![SessionStatus::Banned]);
    }

    #[test]
    fn retry_and_internal_touch_nothing() {
        for action in [ErrorAction::RetryRefresh, ErrorAction::Internal, ErrorAction::Noop] {
            let (logouts, statuses, rate_limits, mismatches) = run(action);
            assert_eq!((logouts, rate_limits, mismatches), (0, 0, 0));
            assert!(statuses.is_empty());
        }
    }

    #[test]
    fn optional_hooks_fire_when_supplied() {
        let (_, _, rate_limits, _) = run(ErrorAction::RateLimit);
        assert_eq!(rate_limits, 1);
        let (_, _, _, mismatches) = run(ErrorAction::AppMismatch);
        assert_eq!(mismatches, 1);

        // And their absence is a no-op, not a panic.
        handle_error_action(
            ErrorAction::RateLimit,
            &mut || {},
            &mut |_| {},
            None,
            None,
        );
    }

    #[test]
    fn status_wire_strings() {
        assert_eq!(SessionStatus::SsoAvailable.as_str(), "sso_available");
        assert_eq!(SessionStatus::RateLimited.as_str(), "rate_limited");
        assert_eq!(
            serde_json::to_string(&SessionStatus::AppMismatch).unwrap(),
            "\"app_mismatch\""
        );
    }
}
