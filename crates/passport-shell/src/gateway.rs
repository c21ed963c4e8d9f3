//! The server operations the shell consumes.
//!
//! Transport is an external collaborator; only the field contracts are
//! binding here. Failures cross this boundary as wire codes.

use tracing::warn;

use passport_core::{ErrorCode, PassportContext};
use passport_server::{
    AuthService, LoginOutput, LogoutService, TokenRefreshService, TokenValidator,
};

/// The three logical server operations.
pub trait PassportGateway: Send + Sync {
    fn login(&self, phone: &str, code: &str, app_id: &str) -> Result<LoginOutput, ErrorCode>;

    fn refresh(
        &self,
        guid: &str,
        refresh_token: &str,
        app_id: &str,
    ) -> Result<LoginOutput, ErrorCode>;

    /// Idempotent; a missing or dead token is not an error.
    fn logout(&self, access_token: Option<&str>) -> Result<(), ErrorCode>;
}

/// Gateway bound directly to the in-process server services.
///
/// Serves the integration tests and the demo daemon; a deployment swaps
/// this for a transport-backed implementation of the same trait.
pub struct InProcessGateway {
    auth: AuthService,
    refresh: TokenRefreshService,
    validator: TokenValidator,
    logout: LogoutService,
}

impl InProcessGateway {
    pub fn new(ctx: &PassportContext) -> Self {
        Self {
            auth: AuthService::new(ctx),
            refresh: TokenRefreshService::new(ctx),
            validator: TokenValidator::new(ctx),
            logout: LogoutService::new(ctx),
        }
    }

    /// Test/demo hook: seed a pending verification code.
    pub fn issue_code(&self, phone: &str, code: &str) -> Result<(), ErrorCode> {
        self.auth.issue_code(phone, code).map_err(|e| e.code())
    }
}

impl PassportGateway for InProcessGateway {
    fn login(&self, phone: &str, code: &str, app_id: &str) -> Result<LoginOutput, ErrorCode> {
        self.auth.login(phone, code, app_id).map_err(|e| {
            warn!(code = %e.code(), "login rejected");
            e.code()
        })
    }

    fn refresh(
        &self,
        guid: &str,
        refresh_token: &str,
        app_id: &str,
    ) -> Result<LoginOutput, ErrorCode> {
        self.refresh
            .refresh(guid, refresh_token, app_id)
            .map_err(|e| e.code())
    }

    fn logout(&self, access_token: Option<&str>) -> Result<(), ErrorCode> {
        if let Some(guid) = access_token.and_then(|t| self.validator.resolve_guid(t)) {
            self.logout.logout(&guid);
        }
        Ok(())
    }
}
