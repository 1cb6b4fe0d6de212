// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Body encryption trait.

use crate::error::MemoirError;

/// Encrypts and decrypts entry bodies.
///
/// Decryption of corrupt or foreign ciphertext must fail with
/// [`MemoirError::Vault`] so callers can skip the item.
pub trait BodyCipher: Send + Sync {
    /// Encrypt plaintext into an opaque, storable string.
    fn encrypt(&self, plaintext: &str) -> Result<String, MemoirError>;

    /// Decrypt a string previously produced by [`BodyCipher::encrypt`].
    fn decrypt(&self, ciphertext: &str) -> Result<String, MemoirError>;
}
