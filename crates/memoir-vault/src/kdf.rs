// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Argon2id key derivation from a passphrase.
//!
//! Derives a 32-byte key using Argon2id (Version::V0x13) with the cost
//! parameters from `[vault]`.

use memoir_core::MemoirError;
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroizing;

/// Derive a 32-byte key from a passphrase. The key is zeroed on drop.
pub fn derive_key(
    passphrase: &[u8],
    salt: &[u8; 16],
    memory_cost: u32,
    iterations: u32,
    parallelism: u32,
) -> Result<Zeroizing<[u8; 32]>, MemoirError> {
    let params = argon2::Params::new(memory_cost, iterations, parallelism, Some(32))
        .map_err(|e| MemoirError::Vault(format!("invalid Argon2id parameters: {e}")))?;

    let argon2 = argon2::Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let mut output = Zeroizing::new([0u8; 32]);
    argon2
        .hash_password_into(passphrase, salt, output.as_mut())
        .map_err(|e| MemoirError::Vault(format!("Argon2id key derivation failed: {e}")))?;

    Ok(output)
}

/// Generate a random 16-byte salt.
pub fn generate_salt() -> Result<[u8; 16], MemoirError> {
    let mut salt = [0u8; 16];
    SystemRandom::new()
        .fill(&mut salt)
        .map_err(|_| MemoirError::Vault("failed to generate random salt".to_string()))?;
    Ok(salt)
}

/// Parse the `vault.salt_hex` setting.
pub fn parse_salt_hex(salt_hex: &str) -> Result<[u8; 16], MemoirError> {
    let bytes = hex::decode(salt_hex.trim())
        .map_err(|e| MemoirError::Vault(format!("salt is not valid hex: {e}")))?;
    <[u8; 16]>::try_from(bytes.as_slice()).map_err(|_| {
        MemoirError::Vault(format!("salt must be 16 bytes, got {}", bytes.len()))
    })
}
