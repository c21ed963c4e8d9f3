//! Boot-time SSO decision.
//!
//! Reads the local cache, classifies it, and broadcasts the resulting
//! session state. A `sso_available` broadcast carries the record so the
//! frontend can drive an automatic refresh with it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use passport_core::ErrorCode;
use passport_storage::{LocalSessionRecord, SessionFileCache, StorageError, ValidationStatus};

use crate::error_actions::{handle_error_action, map_error_to_action, SessionStatus};

/// Broadcast hook: status plus the record backing it, when there is one.
pub type StartupBroadcast = Box<dyn Fn(SessionStatus, Option<&LocalSessionRecord>) + Send + Sync>;

pub struct StartupCoordinator {
    cache: Arc<SessionFileCache>,
    broadcast: StartupBroadcast,
}

impl StartupCoordinator {
    pub fn new(cache: Arc<SessionFileCache>, broadcast: StartupBroadcast) -> Self {
        Self { cache, broadcast }
    }

    /// Decide the client's boot-time session state.
    pub fn handle_startup(&self, now: DateTime<Utc>) {
        let record = match self.cache.read() {
            Err(StorageError::NotFound) => {
                (self.broadcast)(SessionStatus::None, None);
                return;
            }
            Err(e) => {
                // Unreadable also covers a file sealed by another
                // user/machine whose key we do not hold.
                warn!(error = %e, "local session unreadable, clearing");
                let _ = self.cache.delete();
                (self.broadcast)(SessionStatus::None, None);
                return;
            }
            Ok(record) => record,
        };

        match record.validation_status(now) {
            ValidationStatus::Valid => {
                info!(guid = %record.guid, "local session valid, SSO available");
                (self.broadcast)(SessionStatus::SsoAvailable, Some(&record));
            }
            status @ (ValidationStatus::Corrupted | ValidationStatus::ExpiredLocal) => {
                info!(status = ?status, "local session unusable, clearing");
                let _ = self.cache.delete();
                (self.broadcast)(SessionStatus::None, None);
            }
        }
    }

    /// Route a server error code received during startup/refresh through
    /// the resolver.
    pub fn handle_error_code(&self, code: ErrorCode) {
        let action = map_error_to_action(Some(code));
        let cache = &self.cache;
        let broadcast = &self.broadcast;
        handle_error_action(
            action,
            &mut || {
                let _ = cache.delete();
            },
            &mut |status| broadcast(status, None),
            Some(&mut || broadcast(SessionStatus::RateLimited, None)),
            Some(&mut || broadcast(SessionStatus::AppMismatch, None)),
        );
    }
}
