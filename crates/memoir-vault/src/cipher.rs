// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`BodyCipher`] backed by AES-256-GCM.

use memoir_config::model::VaultConfig;
use memoir_core::{BodyCipher, MemoirError};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use zeroize::Zeroizing;

use crate::{crypto, kdf};

/// Encrypts and decrypts journal bodies with a single 256-bit key.
///
/// Debug output omits the key.
pub struct AesBodyCipher {
    key: Zeroizing<[u8; 32]>,
}

impl std::fmt::Debug for AesBodyCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesBodyCipher")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl AesBodyCipher {
    pub fn from_key(key: [u8; 32]) -> Self {
        Self {
            key: Zeroizing::new(key),
        }
    }

    /// A cipher with a fresh random key. Bodies sealed with it are
    /// unreadable once it is dropped.
    pub fn ephemeral() -> Result<Self, MemoirError> {
        Ok(Self::from_key(crypto::generate_random_key()?))
    }

    /// Derive the key from a passphrase and salt with the configured Argon2id cost.
    pub fn from_passphrase(
        passphrase: &SecretString,
        salt: &[u8; 16],
        config: &VaultConfig,
    ) -> Result<Self, MemoirError> {
        let key = kdf::derive_key(
            passphrase.expose_secret().as_bytes(),
            salt,
            config.kdf_memory_cost,
            config.kdf_iterations,
            config.kdf_parallelism,
        )?;
        debug!("body key derived");
        Ok(Self { key })
    }

    /// Read the passphrase from `config.passphrase_env` and the salt from
    /// `config.salt_hex`.
    pub fn from_config(config: &VaultConfig) -> Result<Self, MemoirError> {
        let salt_hex = config.salt_hex.as_deref().ok_or_else(|| {
            MemoirError::Vault("vault.salt_hex is not configured".to_string())
        })?;
        let salt = kdf::parse_salt_hex(salt_hex)?;

        let passphrase = std::env::var(&config.passphrase_env)
            .map(SecretString::from)
            .map_err(|_| {
                MemoirError::Vault(format!(
                    "passphrase environment variable {} is not set",
                    config.passphrase_env
                ))
            })?;

        Self::from_passphrase(&passphrase, &salt, config)
    }
}

impl BodyCipher for AesBodyCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, MemoirError> {
        crypto::seal_envelope(&self.key, plaintext)
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, MemoirError> {
        crypto::open_envelope(&self.key, ciphertext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap_config() -> VaultConfig {
        VaultConfig {
            kdf_memory_cost: 32768,
            kdf_iterations: 2,
            kdf_parallelism: 1,
            ..VaultConfig::default()
        }
    }

    #[test]
    fn same_passphrase_and_salt_share_bodies() {
        let config = cheap_config();
        let salt = [7u8; 16];
        let passphrase = SecretString::from("correct horse".to_string());

        let writer = AesBodyCipher::from_passphrase(&passphrase, &salt, &config).unwrap();
        let reader = AesBodyCipher::from_passphrase(&passphrase, &salt, &config).unwrap();

        let envelope = writer.encrypt("walked along the river").unwrap();
        assert_ne!(envelope, "walked along the river");
        assert_eq!(reader.decrypt(&envelope).unwrap(), "walked along the river");
    }

    #[test]
    fn wrong_passphrase_is_vault_error() {
        let config = cheap_config();
        let salt = [7u8; 16];
        let writer =
            AesBodyCipher::from_passphrase(&SecretString::from("a".to_string()), &salt, &config)
                .unwrap();
        let reader =
            AesBodyCipher::from_passphrase(&SecretString::from("b".to_string()), &salt, &config)
                .unwrap();

        let envelope = writer.encrypt("secret").unwrap();
        assert!(matches!(reader.decrypt(&envelope), Err(MemoirError::Vault(_))));
    }

    #[test]
    fn from_config_requires_salt() {
        let err = AesBodyCipher::from_config(&cheap_config()).unwrap_err();
        assert!(err.to_string().contains("salt_hex"));
    }

    #[test]
    fn from_config_requires_passphrase_env() {
        let config = VaultConfig {
            passphrase_env: "MEMOIR_TEST_PASSPHRASE_THAT_IS_NEVER_SET".to_string(),
            salt_hex: Some("00112233445566778899aabbccddeeff".to_string()),
            ..cheap_config()
        };
        let err = AesBodyCipher::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("MEMOIR_TEST_PASSPHRASE_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn debug_redacts_key() {
        let cipher = AesBodyCipher::ephemeral().unwrap();
        let rendered = format!("{cipher:?}");
        assert!(rendered.contains("[REDACTED]"));
    }
}
