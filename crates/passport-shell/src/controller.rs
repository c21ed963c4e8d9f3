//! Client auth controller: login/refresh/logout composition.

use std::sync::{Arc, Mutex, Weak};

use chrono::Utc;
use tracing::{debug, info, warn};

use passport_core::ErrorCode;
use passport_server::LoginOutput;
use passport_storage::{LocalSessionRecord, SessionFileCache};

use crate::error_actions::{handle_error_action, map_error_to_action, SessionStatus};
use crate::gateway::PassportGateway;
use crate::scheduler::RefreshScheduler;

/// Status broadcast hook (IPC in a real shell, a channel in tests).
pub type StatusSink = Box<dyn Fn(SessionStatus) + Send + Sync>;

/// Wires the gateway, the local cache, and the refresh scheduler into the
/// flows a client application actually runs.
///
/// The scheduler's callback holds a weak handle back to the controller,
/// and the refresh path never touches the scheduler; rescheduling is
/// `tick`'s job. Only the user-driven flows (`login`, `logout`,
/// `on_banned`) start or cancel it.
pub struct AuthController {
    gateway: Arc<dyn PassportGateway>,
    cache: Arc<SessionFileCache>,
    broadcast: StatusSink,
    app_id: String,
    scheduler: Arc<Mutex<RefreshScheduler>>,
}

impl AuthController {
    pub fn new(
        gateway: Arc<dyn PassportGateway>,
        cache: Arc<SessionFileCache>,
        broadcast: StatusSink,
        app_id: String,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<AuthController>| {
            let callback = weak.clone();
            let scheduler = Arc::new(Mutex::new(RefreshScheduler::new(Box::new(move || {
                match callback.upgrade() {
                    Some(controller) => controller.refresh(),
                    None => false,
                }
            }))));
            Self {
                gateway,
                cache,
                broadcast,
                app_id,
                scheduler,
            }
        })
    }

    /// Shared scheduler handle for a driver task.
    pub fn scheduler(&self) -> Arc<Mutex<RefreshScheduler>> {
        self.scheduler.clone()
    }

    /// Phone + code login. On success the refresh credential is persisted
    /// and periodic renewal starts.
    pub fn login(&self, phone: &str, code: &str) -> Result<LoginOutput, ErrorCode> {
        let out = self.gateway.login(phone, code, &self.app_id)?;
        self.persist(&out, phone)?;
        self.scheduler.lock().unwrap().start(Utc::now());
        (self.broadcast)(SessionStatus::Active);
        info!(guid = %out.guid, app_id = %self.app_id, "logged in");
        Ok(out)
    }

    /// One renewal attempt against the cached credential. Invoked by the
    /// scheduler; also the entry point for an SSO-driven refresh after
    /// startup reported `sso_available`.
    pub fn refresh(&self) -> bool {
        let record = match self.cache.read() {
            Ok(record) => record,
            Err(e) => {
                debug!(error = %e, "no cached credential to refresh");
                return false;
            }
        };

        match self
            .gateway
            .refresh(&record.guid, &record.refresh_token, &self.app_id)
        {
            Ok(out) => {
                if let Err(e) = self.persist(&out, &record.phone) {
                    warn!(code = %e, "refreshed but failed to persist record");
                }
                (self.broadcast)(SessionStatus::Active);
                true
            }
            Err(code) => {
                self.recover_from(code);
                false
            }
        }
    }

    /// User-driven logout: best-effort server call, then local cleanup,
    /// scheduler cancellation, and a `none` broadcast. Local cleanup runs even when
    /// the server call fails.
    pub fn logout(&self, access_token: Option<&str>) {
        if let Err(code) = self.gateway.logout(access_token) {
            warn!(code = %code, "server logout failed, clearing local state anyway");
        }
        self.scheduler.lock().unwrap().stop();
        let _ = self.cache.delete();
        (self.broadcast)(SessionStatus::None);
        info!("logged out");
    }

    /// Ban notification: clear local state and tell the frontend.
    pub fn on_banned(&self) {
        self.scheduler.lock().unwrap().stop();
        let _ = self.cache.delete();
        (self.broadcast)(SessionStatus::Banned);
    }

    /// Resolve a refresh failure into its recovery action.
    ///
    /// Runs inside the scheduler's callback, so it must not lock the
    /// scheduler; after a `Logout`-class cleanup the remaining retries
    /// fail on the now-missing cache and the schedule winds down on its
    /// own.
    fn recover_from(&self, code: ErrorCode) {
        let action = map_error_to_action(Some(code));
        debug!(code = %code, action = ?action, "refresh failed");
        let cache = &self.cache;
        let broadcast = &self.broadcast;
        handle_error_action(
            action,
            &mut || {
                let _ = cache.delete();
            },
            &mut |status| broadcast(status),
            Some(&mut || broadcast(SessionStatus::RateLimited)),
            Some(&mut || broadcast(SessionStatus::AppMismatch)),
        );
    }

    /// Write the credential record; `created_at = now` restarts the local
    /// trust window.
    fn persist(&self, out: &LoginOutput, phone: &str) -> Result<(), ErrorCode> {
        let record = LocalSessionRecord {
            guid: out.guid.clone(),
            phone: phone.to_string(),
            user_type: out.user_type,
            refresh_token: out.refresh_token.clone(),
            created_at: Utc::now(),
            expires_at: out.refresh_token_expires_at,
        };
        self.cache.write(&record).map_err(|e| {
            warn!(error = %e, "failed to persist session record");
            ErrorCode::Internal
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::InProcessGateway;
    use passport_core::PassportContext;
    use passport_storage::PlainProtector;
    use std::sync::Mutex as StdMutex;
    use tempfile::tempdir;

    const PHONE: &str = "13800138000";
    const CODE: &str = "246810";

    struct Fixture {
        ctx: PassportContext,
        gateway: Arc<InProcessGateway>,
        controller: Arc<AuthController>,
        cache: Arc<SessionFileCache>,
        statuses: Arc<StdMutex<Vec<SessionStatus>>>,
        _dir: tempfile::TempDir,
    }

    fn fixture(app_id: &str) -> Fixture {
        let dir = tempdir().unwrap();
        let ctx = PassportContext::new();
        let gateway = Arc::new(InProcessGateway::new(&ctx));
        let cache = Arc::new(SessionFileCache::new(
            dir.path().join("session.dat"),
            Box::new(PlainProtector),
        ));
        let statuses = Arc::new(StdMutex::new(Vec::new()));
        let sink = statuses.clone();
        let controller = AuthController::new(
            gateway.clone(),
            cache.clone(),
            Box::new(move |s| sink.lock().unwrap().push(s)),
            app_id.to_string(),
        );
        Fixture {
            ctx,
            gateway,
            controller,
            cache,
            statuses,
            _dir: dir,
        }
    }

    #[test]
    fn login_persists_starts_scheduler_and_broadcasts_active() {
        let f = fixture("app-a");
        f.gateway.issue_code(PHONE, CODE).unwrap();
        let out = f.controller.login(PHONE, CODE).unwrap();

        let record = f.cache.read().unwrap();
        assert_eq!(record.guid, out.guid);
        assert_eq!(record.refresh_token, out.refresh_token);
        assert_eq!(record.phone, PHONE);

        assert!(f.controller.scheduler().lock().unwrap().state().is_some());
        assert_eq!(*f.statuses.lock().unwrap(), vec![SessionStatus::Active]);
    }

    #[test]
    fn failed_login_leaves_no_local_trace() {
        let f = fixture("app-a");
        f.gateway.issue_code(PHONE, CODE).unwrap();
        let err = f.controller.login(PHONE, "999999").unwrap_err();

        assert_eq!(err, ErrorCode::CodeInvalid);
        assert!(!f.cache.path().exists());
        assert!(f.controller.scheduler().lock().unwrap().state().is_none());
        assert!(f.statuses.lock().unwrap().is_empty());
    }

    #[test]
    fn refresh_renews_the_cached_credential() {
        let f = fixture("app-a");
        f.gateway.issue_code(PHONE, CODE).unwrap();
        f.controller.login(PHONE, CODE).unwrap();
        let before = f.cache.read().unwrap();

        assert!(f.controller.refresh());

        let after = f.cache.read().unwrap();
        assert_eq!(after.guid, before.guid);
        assert_eq!(after.refresh_token, before.refresh_token);
        assert!(after.created_at >= before.created_at);
        assert_eq!(
            *f.statuses.lock().unwrap(),
            vec![SessionStatus::Active, SessionStatus::Active]
        );
    }

    #[test]
    fn refresh_with_no_cache_is_a_clean_failure() {
        let f = fixture("app-a");
        assert!(!f.controller.refresh());
        assert!(f.statuses.lock().unwrap().is_empty());
    }

    #[test]
    fn orphaned_credential_triggers_local_logout() {
        let f = fixture("app-a");
        f.gateway.issue_code(PHONE, CODE).unwrap();
        let out = f.controller.login(PHONE, CODE).unwrap();

        // Server side loses the session (ban, admin revoke, …).
        f.ctx.sessions.delete(&out.guid);

        assert!(!f.controller.refresh());
        assert!(!f.cache.path().exists());
        assert_eq!(
            *f.statuses.lock().unwrap(),
            vec![SessionStatus::Active, SessionStatus::None]
        );
    }

    #[test]
    fn logout_cancels_the_scheduler_and_clears_state() {
        let f = fixture("app-a");
        f.gateway.issue_code(PHONE, CODE).unwrap();
        let out = f.controller.login(PHONE, CODE).unwrap();

        f.controller.logout(Some(&out.access_token));

        assert!(f.ctx.sessions.is_empty());
        assert!(!f.cache.path().exists());
        assert!(f.controller.scheduler().lock().unwrap().state().is_none());
        assert_eq!(
            *f.statuses.lock().unwrap(),
            vec![SessionStatus::Active, SessionStatus::None]
        );
    }

    #[test]
    fn scheduler_callback_drives_controller_refresh() {
        let f = fixture("app-a");
        f.gateway.issue_code(PHONE, CODE).unwrap();
        f.controller.login(PHONE, CODE).unwrap();

        let scheduler = f.controller.scheduler();
        let due = {
            let sched = scheduler.lock().unwrap();
            sched.next_scheduled_at().unwrap()
        };
        scheduler.lock().unwrap().tick(due);

        // The tick ran a real refresh through the gateway.
        assert_eq!(
            *f.statuses.lock().unwrap(),
            vec![SessionStatus::Active, SessionStatus::Active]
        );
        assert_eq!(scheduler.lock().unwrap().retry_count(), 0);
    }

    #[test]
    fn on_banned_clears_and_broadcasts_banned() {
        let f = fixture("app-a");
        f.gateway.issue_code(PHONE, CODE).unwrap();
        f.controller.login(PHONE, CODE).unwrap();

        f.controller.on_banned();
        assert!(!f.cache.path().exists());
        assert_eq!(
            f.statuses.lock().unwrap().last(),
            Some(&SessionStatus::Banned)
        );
    }
}
