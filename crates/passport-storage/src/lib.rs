//! Encrypted, atomically-written local session cache.
//!
//! The client persists one [`LocalSessionRecord`] so it can resume SSO
//! across process restarts without the user re-entering a code. The record
//! passes through an [`AtRestProtector`] on its way to disk:
//! - **macOS**: sealing key held in Keychain via `security-framework`
//! - **Linux**: Secret Service (GNOME Keyring / KWallet) via `secret-service`
//! - **Windows**: Credential Vault via the `windows` crate
//!
//! When no platform store is reachable the protector degrades to a
//! reversible base64 encoding; writes never fail on protector trouble.

mod cache;
mod protector;
mod record;
mod traits;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "windows")]
mod windows;

pub use cache::SessionFileCache;
pub use protector::{PlainProtector, SealedProtector};
pub use record::{local_trust_window, LocalSessionRecord, ValidationStatus};
pub use traits::{generate_master_key, AtRestProtector, MasterKeyStore, MASTER_KEY_LEN};

use thiserror::Error;
use tracing::warn;

/// Service name under which the master key is filed in the platform store.
pub const SERVICE_NAME: &str = "dev.passport.client";

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// No usable local session (absent, or stale and reaped).
    #[error("no local session")]
    NotFound,

    /// The on-disk record could not be decoded, parsed, or validated.
    #[error("local session corrupted: {0}")]
    Corrupted(String),

    /// The record was rejected before touching disk.
    #[error("invalid session record: {0}")]
    InvalidRecord(String),

    /// Platform secret-store failure.
    #[error("platform secret store error: {0}")]
    Platform(String),

    /// Encoding/decoding failure.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// IO error outside the corruption-absorbing read path.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Build the best protector this host supports.
///
/// Chain: platform secret store (master key, created on first use) keying
/// an AEAD protector → reversible base64 fallback. Falling back is logged
/// but never an error; the cache must keep working on hosts without a
/// secret store (headless CI, stripped-down desktops).
pub fn create_protector() -> Box<dyn AtRestProtector> {
    match platform_key_store() {
        Ok(store) => match store.get_or_create() {
            Ok(key) => return Box::new(SealedProtector::new(&key)),
            Err(e) => {
                warn!(error = %e, "platform key store unusable, falling back to plain encoding");
            }
        },
        Err(e) => {
            warn!(error = %e, "no platform secret store, falling back to plain encoding");
        }
    }
    Box::new(PlainProtector)
}

/// The platform-preferred master-key store, if this OS has one.
fn platform_key_store() -> StorageResult<Box<dyn MasterKeyStore>> {
    #[cfg(target_os = "macos")]
    {
        Ok(Box::new(macos::KeychainKeyStore::new(SERVICE_NAME)))
    }

    #[cfg(target_os = "linux")]
    {
        Ok(Box::new(linux::SecretServiceKeyStore::new(SERVICE_NAME)?))
    }

    #[cfg(target_os = "windows")]
    {
        Ok(Box::new(windows::CredentialVaultKeyStore::new(
            SERVICE_NAME,
        )?))
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        Err(StorageError::Platform(
            "no secure storage implementation for this platform".to_string(),
        ))
    }
}
