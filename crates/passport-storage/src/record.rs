//! The client-persisted session record and its trust rules.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A locally cached record is distrusted this long after it was written,
/// regardless of the refresh token's real lifetime. Shared machines with
/// rotating users must re-validate against the server periodically.
pub fn local_trust_window() -> Duration {
    Duration::hours(2)
}

/// The portable refresh credential a client persists to resume SSO
/// without re-entering a code. Not a mirror of the server session;
/// it has its own lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalSessionRecord {
    pub guid: String,
    pub phone: String,
    pub user_type: i32,
    pub refresh_token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Outcome of validating a freshly read record against the current time.
///
/// `Corrupted` and `ExpiredLocal` both mean "no usable local session";
/// they stay distinct for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStatus {
    Valid,
    Corrupted,
    ExpiredLocal,
}

impl LocalSessionRecord {
    /// Structural check applied before writing and after parsing:
    /// required fields present, `expires_at >= created_at`.
    pub fn ensure_well_formed(&self) -> Result<(), String> {
        if self.guid.is_empty() {
            return Err("missing field: guid".into());
        }
        if self.phone.is_empty() {
            return Err("missing field: phone".into());
        }
        if self.refresh_token.is_empty() {
            return Err("missing field: refresh_token".into());
        }
        if self.expires_at < self.created_at {
            return Err("expires_at earlier than created_at".into());
        }
        Ok(())
    }

    /// Classify the record at `now`.
    ///
    /// Past `expires_at` the refresh token is dead remotely too, so the
    /// record counts as corrupted rather than merely locally expired.
    pub fn validation_status(&self, now: DateTime<Utc>) -> ValidationStatus {
        if self.ensure_well_formed().is_err() {
            return ValidationStatus::Corrupted;
        }
        if now > self.expires_at {
            return ValidationStatus::Corrupted;
        }
        if now - self.created_at > local_trust_window() {
            return ValidationStatus::ExpiredLocal;
        }
        ValidationStatus::Valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(created_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> LocalSessionRecord {
        LocalSessionRecord {
            guid: "G1".into(),
            phone: "13800138000".into(),
            user_type: 1,
            refresh_token: "R.token".into(),
            created_at,
            expires_at,
        }
    }

    #[test]
    fn fresh_record_is_valid() {
        let now = Utc::now();
        let r = record(now, now + Duration::days(2));
        assert_eq!(r.validation_status(now), ValidationStatus::Valid);
        assert_eq!(
            r.validation_status(now + Duration::hours(2)),
            ValidationStatus::Valid
        );
    }

    #[test]
    fn past_trust_window_is_expired_local_even_with_days_left() {
        let now = Utc::now();
        let r = record(now - Duration::hours(3), now + Duration::days(1));
        assert_eq!(r.validation_status(now), ValidationStatus::ExpiredLocal);
    }

    #[test]
    fn past_real_expiry_is_corrupted() {
        let now = Utc::now();
        let r = record(now - Duration::days(3), now - Duration::seconds(1));
        assert_eq!(r.validation_status(now), ValidationStatus::Corrupted);
    }

    #[test]
    fn inverted_timestamps_are_corrupted() {
        let now = Utc::now();
        let r = record(now, now - Duration::hours(1));
        assert_eq!(r.validation_status(now), ValidationStatus::Corrupted);
        assert!(r.ensure_well_formed().is_err());
    }

    #[test]
    fn empty_required_fields_are_rejected() {
        let now = Utc::now();
        let mut r = record(now, now + Duration::days(2));
        r.refresh_token.clear();
        assert!(r.ensure_well_formed().is_err());
        assert_eq!(r.validation_status(now), ValidationStatus::Corrupted);
    }

    #[test]
    fn serde_round_trip_keeps_fields() {
        let now = Utc::now();
        let r = record(now, now + Duration::days(2));
        let json = serde_json::to_string(&r).unwrap();
        let back: LocalSessionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn unparsable_timestamp_fails_deserialization() {
        let json = r#"{
            "guid": "G1",
            "phone": "13800138000",
            "user_type": 1,
            "refresh_token": "R.token",
            "created_at": "not-a-timestamp",
            "expires_at": "2025-01-03T00:00:00Z"
        }"#;
        assert!(serde_json::from_str::<LocalSessionRecord>(json).is_err());
    }
}
