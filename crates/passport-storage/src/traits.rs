//! Protector and key-store capabilities.

use rand::RngCore;

use crate::StorageResult;

/// Master key length (ChaCha20-Poly1305, 256 bits).
pub const MASTER_KEY_LEN: usize = 32;

/// Holds the per-user master key in a platform secret store.
pub trait MasterKeyStore: Send + Sync {
    /// Load the stored key, `None` when absent.
    fn load(&self) -> StorageResult<Option<[u8; MASTER_KEY_LEN]>>;

    /// Persist the key, replacing any existing one.
    fn store(&self, key: &[u8; MASTER_KEY_LEN]) -> StorageResult<()>;

    /// Load the key, generating and persisting a fresh one when absent.
    fn get_or_create(&self) -> StorageResult<[u8; MASTER_KEY_LEN]> {
        if let Some(key) = self.load()? {
            return Ok(key);
        }
        let key = generate_master_key();
        self.store(&key)?;
        tracing::info!("generated new session master key");
        Ok(key)
    }
}

/// At-rest protection capability for the session file.
///
/// `protect` must not fail the write path: implementations degrade to a
/// reversible encoding instead of returning an error. `unprotect` reports
/// failures so the cache can classify the file as corrupted.
pub trait AtRestProtector: Send + Sync {
    fn protect(&self, plaintext: &[u8]) -> String;

    fn unprotect(&self, payload: &str) -> StorageResult<Vec<u8>>;
}

/// Fresh random master key.
pub fn generate_master_key() -> [u8; MASTER_KEY_LEN] {
    let mut key = [0u8; MASTER_KEY_LEN];
    rand::thread_rng().fill_bytes(&mut key);
    key
}
