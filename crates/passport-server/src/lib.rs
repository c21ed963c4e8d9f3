//! Server-side session core: login/registration, per-app token issuance,
//! access-token verification, and session teardown.
//!
//! Services are plain structs over the shared repositories in
//! [`passport_core::PassportContext`]; request paths are synchronous.

mod admin;
mod auth;
mod refresh;
mod token;
mod validator;
mod verification;

pub use admin::{BanService, LogoutService};
pub use auth::{AuthService, LoginOutput};
pub use refresh::TokenRefreshService;
pub use token::{generate_access_token, generate_refresh_token, GuidGenerator};
pub use validator::{AccessClaims, TokenValidator};
pub use verification::{VerificationService, CODE_TTL_MINUTES};
