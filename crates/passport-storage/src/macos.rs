//! macOS Keychain master-key store.

use base64::Engine;
use security_framework::item::{ItemClass, ItemSearchOptions, Limit, SearchResult};
use security_framework::passwords::{delete_generic_password, set_generic_password};
use tracing::debug;

use crate::traits::{MasterKeyStore, MASTER_KEY_LEN};
use crate::{StorageError, StorageResult};

const BASE64: base64::engine::GeneralPurpose = base64::engine::general_purpose::STANDARD;

/// Keychain account name the master key is filed under.
const KEY_ACCOUNT: &str = "session-master-key";

pub struct KeychainKeyStore {
    service_name: String,
}

impl KeychainKeyStore {
    pub fn new(service_name: &str) -> Self {
        Self {
            service_name: service_name.to_string(),
        }
    }

    fn search(&self) -> StorageResult<Option<Vec<u8>>> {
        let mut search = ItemSearchOptions::new();
        search
            .class(ItemClass::generic_password())
            .service(&self.service_name)
            .account(KEY_ACCOUNT)
            .limit(Limit::Max(1))
            .load_data(true);

        match search.search() {
            Ok(results) => {
                if let Some(SearchResult::Data(data)) = results.into_iter().next() {
                    return Ok(Some(data));
                }
                Ok(None)
            }
            Err(e) => {
                let message = e.to_string().to_lowercase();
                // errSecItemNotFound surfaces in several textual forms.
                if message.contains("not found")
                    || message.contains("could not be found")
                    || message.contains("-25300")
                {
                    Ok(None)
                } else {
                    Err(StorageError::Platform(format!("keychain search: {e}")))
                }
            }
        }
    }
}

impl MasterKeyStore for KeychainKeyStore {
    fn load(&self) -> StorageResult<Option<[u8; MASTER_KEY_LEN]>> {
        debug!(service = %self.service_name, "loading master key from keychain");
        let Some(data) = self.search()? else {
            return Ok(None);
        };
        let decoded = BASE64
            .decode(&data)
            .map_err(|e| StorageError::Encoding(format!("keychain item: {e}")))?;
        decoded
            .try_into()
            .map(Some)
            .map_err(|_| StorageError::Encoding("master key has wrong length".into()))
    }

    fn store(&self, key: &[u8; MASTER_KEY_LEN]) -> StorageResult<()> {
        debug!(service = %self.service_name, "storing master key in keychain");
        let _ = delete_generic_password(&self.service_name, KEY_ACCOUNT);
        set_generic_password(
            &self.service_name,
            KEY_ACCOUNT,
            BASE64.encode(key).as_bytes(),
        )
        .map_err(|e| StorageError::Platform(format!("keychain store: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SERVICE: &str = "dev.passport.client.test";

    #[test]
    #[ignore] // Requires macOS Keychain access
    fn keychain_round_trip() {
        let store = KeychainKeyStore::new(TEST_SERVICE);
        let key = crate::traits::generate_master_key();

        store.store(&key).unwrap();
        assert_eq!(store.load().unwrap(), Some(key));

        let _ = delete_generic_password(TEST_SERVICE, KEY_ACCOUNT);
    }
}
