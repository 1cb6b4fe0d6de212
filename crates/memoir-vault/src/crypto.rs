// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AES-256-GCM primitives and the body envelope format.
//!
//! Every call to [`seal`] draws a fresh 96-bit nonce from the system CSPRNG.
//! An envelope is `v1:` followed by base64 of `nonce || ciphertext || tag`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use memoir_core::MemoirError;
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};
use ring::rand::{SecureRandom, SystemRandom};

const ENVELOPE_PREFIX: &str = "v1:";

fn aead_key(key: &[u8; 32]) -> Result<LessSafeKey, MemoirError> {
    let unbound = UnboundKey::new(&AES_256_GCM, key)
        .map_err(|_| MemoirError::Vault("failed to create AES-256-GCM key".to_string()))?;
    Ok(LessSafeKey::new(unbound))
}

/// Encrypt with a random nonce. Returns `(ciphertext_with_tag, nonce)`.
pub fn seal(key: &[u8; 32], plaintext: &[u8]) -> Result<(Vec<u8>, [u8; NONCE_LEN]), MemoirError> {
    let key = aead_key(key)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    SystemRandom::new()
        .fill(&mut nonce_bytes)
        .map_err(|_| MemoirError::Vault("failed to generate random nonce".to_string()))?;

    let mut in_out = plaintext.to_vec();
    key.seal_in_place_append_tag(
        Nonce::assume_unique_for_key(nonce_bytes),
        Aad::empty(),
        &mut in_out,
    )
    .map_err(|_| MemoirError::Vault("AES-256-GCM encryption failed".to_string()))?;

    Ok((in_out, nonce_bytes))
}

/// Decrypt a ciphertext produced by [`seal`].
pub fn open(
    key: &[u8; 32],
    nonce_bytes: &[u8; NONCE_LEN],
    ciphertext: &[u8],
) -> Result<Vec<u8>, MemoirError> {
    let key = aead_key(key)?;
    let mut in_out = ciphertext.to_vec();
    let plaintext = key
        .open_in_place(Nonce::assume_unique_for_key(*nonce_bytes), Aad::empty(), &mut in_out)
        .map_err(|_| {
            MemoirError::Vault("AES-256-GCM decryption failed -- wrong key or corrupted data".to_string())
        })?;
    Ok(plaintext.to_vec())
}

/// Seal `plaintext` into a text envelope.
pub fn seal_envelope(key: &[u8; 32], plaintext: &str) -> Result<String, MemoirError> {
    let (ciphertext, nonce) = seal(key, plaintext.as_bytes())?;
    let mut packed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    packed.extend_from_slice(&nonce);
    packed.extend_from_slice(&ciphertext);
    Ok(format!("{ENVELOPE_PREFIX}{}", STANDARD.encode(packed)))
}

/// Open a text envelope produced by [`seal_envelope`].
pub fn open_envelope(key: &[u8; 32], envelope: &str) -> Result<String, MemoirError> {
    let encoded = envelope
        .strip_prefix(ENVELOPE_PREFIX)
        .ok_or_else(|| MemoirError::Vault("unrecognized body envelope".to_string()))?;
    let packed = STANDARD
        .decode(encoded)
        .map_err(|e| MemoirError::Vault(format!("malformed body envelope: {e}")))?;
    if packed.len() < NONCE_LEN {
        return Err(MemoirError::Vault("body envelope too short".to_string()));
    }

    let (nonce, ciphertext) = packed.split_at(NONCE_LEN);
    let mut nonce_bytes = [0u8; NONCE_LEN];
    nonce_bytes.copy_from_slice(nonce);

    let plaintext = open(key, &nonce_bytes, ciphertext)?;
    String::from_utf8(plaintext)
        .map_err(|_| MemoirError::Vault("decrypted body is not valid UTF-8".to_string()))
}

/// Generate a random 32-byte key suitable for AES-256-GCM.
pub fn generate_random_key() -> Result<[u8; 32], MemoirError> {
    let mut key = [0u8; 32];
    SystemRandom::new()
        .fill(&mut key)
        .map_err(|_| MemoirError::Vault("failed to generate random key".to_string()))?;
    Ok(key)
}
