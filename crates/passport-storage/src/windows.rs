//! Windows Credential Vault master-key store.

use base64::Engine;
use tracing::debug;
use windows::{
    core::HSTRING,
    Security::Credentials::{PasswordCredential, PasswordVault},
};

use crate::traits::{MasterKeyStore, MASTER_KEY_LEN};
use crate::{StorageError, StorageResult};

const BASE64: base64::engine::GeneralPurpose = base64::engine::general_purpose::STANDARD;

/// Credential user name the master key is filed under.
const KEY_ACCOUNT: &str = "session-master-key";

/// ERROR_NOT_FOUND as surfaced by the vault API.
const NOT_FOUND: u32 = 0x8007_0490;

pub struct CredentialVaultKeyStore {
    resource_name: String,
}

impl CredentialVaultKeyStore {
    /// Opens the vault once to verify it is reachable.
    pub fn new(service_name: &str) -> StorageResult<Self> {
        PasswordVault::new()
            .map_err(|e| StorageError::Platform(format!("open Credential Vault: {e}")))?;
        Ok(Self {
            resource_name: service_name.to_string(),
        })
    }

    fn vault(&self) -> StorageResult<PasswordVault> {
        PasswordVault::new()
            .map_err(|e| StorageError::Platform(format!("open Credential Vault: {e}")))
    }
}

impl MasterKeyStore for CredentialVaultKeyStore {
    fn load(&self) -> StorageResult<Option<[u8; MASTER_KEY_LEN]>> {
        debug!(resource = %self.resource_name, "loading master key from Credential Vault");
        let vault = self.vault()?;
        let resource = HSTRING::from(&self.resource_name);
        let user_name = HSTRING::from(KEY_ACCOUNT);

        let credential = match vault.Retrieve(&resource, &user_name) {
            Ok(credential) => credential,
            Err(e) if e.code().0 as u32 == NOT_FOUND => return Ok(None),
            Err(e) => {
                return Err(StorageError::Platform(format!("retrieve credential: {e}")));
            }
        };

        credential
            .RetrievePassword()
            .map_err(|e| StorageError::Platform(format!("retrieve password: {e}")))?;
        let password = credential
            .Password()
            .map_err(|e| StorageError::Platform(format!("read password: {e}")))?;

        let decoded = BASE64
            .decode(password.to_string())
            .map_err(|e| StorageError::Encoding(format!("credential: {e}")))?;
        decoded
            .try_into()
            .map(Some)
            .map_err(|_| StorageError::Encoding("master key has wrong length".into()))
    }

    fn store(&self, key: &[u8; MASTER_KEY_LEN]) -> StorageResult<()> {
        debug!(resource = %self.resource_name, "storing master key in Credential Vault");
        let vault = self.vault()?;
        let resource = HSTRING::from(&self.resource_name);
        let user_name = HSTRING::from(KEY_ACCOUNT);

        // Replace any existing credential.
        if let Ok(existing) = vault.Retrieve(&resource, &user_name) {
            vault
                .Remove(&existing)
                .map_err(|e| StorageError::Platform(format!("remove credential: {e}")))?;
        }

        let password = HSTRING::from(BASE64.encode(key));
        let credential = PasswordCredential::CreatePasswordCredential(
            &resource, &user_name, &password,
        )
        .map_err(|e| StorageError::Platform(format!("create credential: {e}")))?;
        vault
            .Add(&credential)
            .map_err(|e| StorageError::Platform(format!("add credential: {e}")))
    }
}
