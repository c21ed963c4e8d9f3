//! Linux Secret Service master-key store.

use std::collections::HashMap;

use base64::Engine;
use secret_service::{blocking::SecretService, EncryptionType};
use tracing::debug;

use crate::traits::{MasterKeyStore, MASTER_KEY_LEN};
use crate::{StorageError, StorageResult};

const BASE64: base64::engine::GeneralPurpose = base64::engine::general_purpose::STANDARD;

/// Attribute value the master key item is tagged with.
const KEY_NAME: &str = "session-master-key";

pub struct SecretServiceKeyStore {
    service_name: String,
}

impl SecretServiceKeyStore {
    /// Connects once to verify a Secret Service daemon is reachable.
    pub fn new(service_name: &str) -> StorageResult<Self> {
        SecretService::connect(EncryptionType::Dh)
            .map_err(|e| StorageError::Platform(format!("connect to Secret Service: {e}")))?;
        Ok(Self {
            service_name: service_name.to_string(),
        })
    }

    fn with_collection<F, T>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&secret_service::blocking::Collection) -> StorageResult<T>,
    {
        let ss = SecretService::connect(EncryptionType::Dh)
            .map_err(|e| StorageError::Platform(e.to_string()))?;
        let collection = ss
            .get_default_collection()
            .map_err(|e| StorageError::Platform(e.to_string()))?;
        if collection.is_locked().unwrap_or(false) {
            collection
                .unlock()
                .map_err(|e| StorageError::Platform(format!("unlock collection: {e}")))?;
        }
        f(&collection)
    }

    fn attributes(&self) -> HashMap<&str, &str> {
        let mut attrs = HashMap::new();
        attrs.insert("service", self.service_name.as_str());
        attrs.insert("key", KEY_NAME);
        attrs
    }
}

impl MasterKeyStore for SecretServiceKeyStore {
    fn load(&self) -> StorageResult<Option<[u8; MASTER_KEY_LEN]>> {
        debug!(service = %self.service_name, "loading master key from Secret Service");
        self.with_collection(|collection| {
            let items = collection
                .search_items(self.attributes())
                .map_err(|e| StorageError::Platform(e.to_string()))?;
            let Some(item) = items.first() else {
                return Ok(None);
            };
            let secret = item
                .get_secret()
                .map_err(|e| StorageError::Platform(e.to_string()))?;
            let decoded = BASE64
                .decode(&secret)
                .map_err(|e| StorageError::Encoding(format!("secret item: {e}")))?;
            decoded
                .try_into()
                .map(Some)
                .map_err(|_| StorageError::Encoding("master key has wrong length".into()))
        })
    }

    fn store(&self, key: &[u8; MASTER_KEY_LEN]) -> StorageResult<()> {
        debug!(service = %self.service_name, "storing master key in Secret Service");
        self.with_collection(|collection| {
            let label = format!("{}/{}", self.service_name, KEY_NAME);
            collection
                .create_item(
                    &label,
                    self.attributes(),
                    BASE64.encode(key).as_bytes(),
                    true, // replace
                    "text/plain",
                )
                .map_err(|e| StorageError::Platform(e.to_string()))?;
            Ok(())
        })
    }
}
