//! Client-side resilience layer: the pieces that make SSO survive process
//! restarts and multiple installed clients.
//!
//! - [`RefreshScheduler`] renews the credential periodically with jitter
//!   and bounded retry.
//! - [`map_error_to_action`] turns server error codes into recovery
//!   actions; callers never pattern-match codes directly.
//! - [`StartupCoordinator`] decides the boot-time session state from the
//!   local cache.
//! - [`AuthController`] composes the gateway, cache, and scheduler into
//!   the login/refresh/logout flows.

mod controller;
mod driver;
mod error_actions;
mod gateway;
mod scheduler;
mod startup;

pub use controller::{AuthController, StatusSink};
pub use driver::SchedulerDriver;
pub use error_actions::{handle_error_action, map_error_to_action, ErrorAction, SessionStatus};
pub use gateway::{InProcessGateway, PassportGateway};
pub use scheduler::{
    jitter_max, refresh_interval, retry_interval, RefreshScheduler, RefreshState, MAX_RETRY,
};
pub use startup::StartupCoordinator;
