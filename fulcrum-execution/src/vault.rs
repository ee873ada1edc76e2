//! Credential Vault (spec.md §4.2).
//!
//! Broker credentials are encrypted at rest with AES-256-GCM under a key
//! sourced from process configuration. Plaintext [`BrokerCredentials`]
//! exist only on the stack during one [`fetch`](CredentialVault::fetch)
//! call's return frame; nothing here persists a decrypted copy.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use dashmap::DashMap;
use fulcrum_markets::{BrokerCredentials, BrokerLinkId, EncryptedCredentials};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use totp_rs::{Algorithm, Secret, TOTP};
use tracing::info;

use crate::error::ExecutionError;

#[derive(Serialize, Deserialize)]
struct StoredSecrets {
    client_code: SmolStr,
    api_key: SmolStr,
    api_secret: SmolStr,
    totp_seed: Option<SmolStr>,
}

/// AEAD-encrypted broker secret store, keyed by [`BrokerLinkId`].
pub struct CredentialVault {
    cipher: Aes256Gcm,
    store: DashMap<BrokerLinkId, EncryptedCredentials>,
}

impl std::fmt::Debug for CredentialVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVault")
            .field("entries", &self.store.len())
            .finish()
    }
}

impl CredentialVault {
    /// `key` must be exactly 32 bytes (AES-256). Sourced from
    /// `FulcrumConfig` in `fulcrum-core`, never hardcoded.
    pub fn new(key: &[u8; 32]) -> Self {
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key)),
            store: DashMap::new(),
        }
    }

    pub fn store(
        &self,
        link: BrokerLinkId,
        secrets: &BrokerCredentials,
    ) -> Result<(), ExecutionError> {
        let plaintext = serde_json::to_vec(&StoredSecrets {
            client_code: secrets.client_code.clone(),
            api_key: secrets.api_key.clone(),
            api_secret: secrets.api_secret.clone(),
            totp_seed: secrets.totp_seed.clone(),
        })
        .map_err(|e| ExecutionError::Vault(e.to_string()))?;

        let mut nonce_bytes = [0u8; 12];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_ref())
            .map_err(|_| ExecutionError::Vault("encryption failed".into()))?;

        self.store.insert(
            link,
            EncryptedCredentials {
                nonce: nonce_bytes.to_vec(),
                ciphertext,
            },
        );
        info!(%link, "stored broker credentials");
        Ok(())
    }

    /// Decrypts and returns credentials for `link`. The returned value
    /// must not outlive the single adapter call it is passed into.
    pub fn fetch(&self, link: &BrokerLinkId) -> Result<BrokerCredentials, ExecutionError> {
        let encrypted = self
            .store
            .get(link)
            .ok_or_else(|| ExecutionError::Vault("no credentials for link".into()))?;

        let nonce = Nonce::from_slice(&encrypted.nonce);
        let plaintext = self
            .cipher
            .decrypt(nonce, encrypted.ciphertext.as_ref())
            .map_err(|_| ExecutionError::Vault("decryption failed".into()))?;

        let stored: StoredSecrets =
            serde_json::from_slice(&plaintext).map_err(|e| ExecutionError::Vault(e.to_string()))?;

        info!(%link, "fetched broker credentials");
        Ok(BrokerCredentials {
            client_code: stored.client_code,
            api_key: stored.api_key,
            api_secret: stored.api_secret,
            totp_seed: stored.totp_seed,
        })
    }

    pub fn forget(&self, link: &BrokerLinkId) {
        self.store.remove(link);
        info!(%link, "forgot broker credentials");
    }

    /// Derives a 6-digit TOTP code at call time from `credentials`'
    /// `totp_seed`, returning `None` when the link has no seed configured.
    pub fn totp_code(credentials: &BrokerCredentials) -> Result<Option<String>, ExecutionError> {
        let Some(seed) = &credentials.totp_seed else {
            return Ok(None);
        };
        let secret = Secret::Encoded(seed.to_string())
            .to_bytes()
            .map_err(|e| ExecutionError::Vault(format!("invalid totp seed: {e}")))?;
        let totp = TOTP::new(Algorithm::SHA1, 6, 1, 30, secret)
            .map_err(|e| ExecutionError::Vault(format!("invalid totp config: {e}")))?;
        let code = totp
            .generate_current()
            .map_err(|e| ExecutionError::Vault(format!("totp generation failed: {e}")))?;
        Ok(Some(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fulcrum_markets::Id;

    fn creds() -> BrokerCredentials {
        BrokerCredentials {
            client_code: "ABC123".into(),
            api_key: "key".into(),
            api_secret: "secret".into(),
            totp_seed: None,
        }
    }

    #[test]
    fn round_trips_through_encryption() {
        let vault = CredentialVault::new(&[7u8; 32]);
        let link: BrokerLinkId = Id::new();
        vault.store(link, &creds()).unwrap();

        let fetched = vault.fetch(&link).unwrap();
        assert_eq!(fetched.client_code, "ABC123");
        assert_eq!(fetched.api_secret, "secret");
    }

    #[test]
    fn forget_removes_the_entry() {
        let vault = CredentialVault::new(&[3u8; 32]);
        let link: BrokerLinkId = Id::new();
        vault.store(link, &creds()).unwrap();
        vault.forget(&link);
        assert!(vault.fetch(&link).is_err());
    }
}
