//! Core types, stores, and configuration for the Passport SSO suite.
//!
//! Everything the server services and the client shell share lives here:
//! the domain entities (`User`, `Session`, `AppSession`), the in-memory
//! repositories behind [`PassportContext`], the closed error-code
//! enumeration, and the ambient config/path/logging plumbing.

mod config;
mod error;
mod logging;
mod model;
mod paths;
mod store;

pub use config::{Config, DEFAULT_APP_ID, DEFAULT_LOG_LEVEL};
pub use error::{AuthError, AuthResult, ErrorCode};
pub use logging::{init_logging, parse_level};
pub use model::{
    access_expires_from, refresh_expires_from, AppSession, Session, User, UserStatus,
    ACCESS_TOKEN_TTL_HOURS, REFRESH_TOKEN_TTL_DAYS,
};
pub use paths::Paths;
pub use store::{CodeStore, PassportContext, SessionStore, UserRepo};
