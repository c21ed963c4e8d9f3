//! At-rest protector implementations.
//!
//! Output is self-describing opaque text: a short mode prefix followed by
//! base64. A record written under the fallback still reads after a
//! platform store appears, and a sealed record read on a machine without
//! the key reports a decode failure instead of crashing.

use base64::Engine;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use tracing::warn;

use crate::traits::{AtRestProtector, MASTER_KEY_LEN};
use crate::{StorageError, StorageResult};

const BASE64: base64::engine::GeneralPurpose = base64::engine::general_purpose::STANDARD;

/// AEAD-sealed payload: nonce(12) || ciphertext || tag(16), base64-encoded.
const SEALED_PREFIX: &str = "sealed.v1.";
/// Reversible fallback payload: plain base64.
const PLAIN_PREFIX: &str = "plain.v1.";

/// Nonce size for ChaCha20-Poly1305 (96 bits).
const NONCE_LEN: usize = 12;

/// HKDF context separating the sealing key from other uses of the master key.
const SEALING_KEY_CONTEXT: &[u8] = b"passport-session-at-rest-v1";

/// AEAD protector keyed from the platform-held master key.
pub struct SealedProtector {
    sealing_key: [u8; MASTER_KEY_LEN],
}

impl SealedProtector {
    /// Derive the sealing key from `master_key` via HKDF-SHA256.
    pub fn new(master_key: &[u8; MASTER_KEY_LEN]) -> Self {
        let hkdf = Hkdf::<Sha256>::new(None, master_key);
        let mut sealing_key = [0u8; MASTER_KEY_LEN];
        hkdf.expand(SEALING_KEY_CONTEXT, &mut sealing_key)
            .expect("32-byte HKDF output is always valid");
        Self { sealing_key }
    }

    fn seal(&self, plaintext: &[u8]) -> StorageResult<String> {
        let cipher = ChaCha20Poly1305::new_from_slice(&self.sealing_key)
            .map_err(|e| StorageError::Encoding(e.to_string()))?;

        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|e| StorageError::Encoding(e.to_string()))?;

        let mut framed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        framed.extend_from_slice(&nonce);
        framed.extend_from_slice(&ciphertext);
        Ok(format!("{SEALED_PREFIX}{}", BASE64.encode(framed)))
    }

    fn unseal(&self, body: &str) -> StorageResult<Vec<u8>> {
        let framed = BASE64
            .decode(body)
            .map_err(|e| StorageError::Encoding(format!("base64: {e}")))?;
        if framed.len() <= NONCE_LEN {
            return Err(StorageError::Encoding("sealed payload too short".into()));
        }
        let (nonce, ciphertext) = framed.split_at(NONCE_LEN);

        let cipher = ChaCha20Poly1305::new_from_slice(&self.sealing_key)
            .map_err(|e| StorageError::Encoding(e.to_string()))?;
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| StorageError::Encoding("decryption failed".into()))
    }
}

impl AtRestProtector for SealedProtector {
    fn protect(&self, plaintext: &[u8]) -> String {
        match self.seal(plaintext) {
            Ok(payload) => payload,
            Err(e) => {
                // The write path must not fail on protector trouble.
                warn!(error = %e, "sealing failed, writing fallback encoding");
                format!("{PLAIN_PREFIX}{}", BASE64.encode(plaintext))
            }
        }
    }

    fn unprotect(&self, payload: &str) -> StorageResult<Vec<u8>> {
        if let Some(body) = payload.strip_prefix(SEALED_PREFIX) {
            return self.unseal(body);
        }
        if let Some(body) = payload.strip_prefix(PLAIN_PREFIX) {
            return BASE64
                .decode(body)
                .map_err(|e| StorageError::Encoding(format!("base64: {e}")));
        }
        Err(StorageError::Encoding("unrecognized payload prefix".into()))
    }
}

/// Reversible fallback for hosts without a platform secret store.
pub struct PlainProtector;

impl AtRestProtector for PlainProtector {
    fn protect(&self, plaintext: &[u8]) -> String {
        format!("{PLAIN_PREFIX}{}", BASE64.encode(plaintext))
    }

    fn unprotect(&self, payload: &str) -> StorageResult<Vec<u8>> {
        if let Some(body) = payload.strip_prefix(PLAIN_PREFIX) {
            return BASE64
                .decode(body)
                .map_err(|e| StorageError::Encoding(format!("base64: {e}")));
        }
        if payload.starts_with(SEALED_PREFIX) {
            // Written on a machine whose key we do not hold.
            return Err(StorageError::Encoding(
                "sealed record but no platform key available".into(),
            ));
        }
        Err(StorageError::Encoding("unrecognized payload prefix".into()))
    }
}
