// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Journal body encryption for Memoir.
//!
//! Bodies are sealed with AES-256-GCM under a key derived from the journal
//! passphrase via Argon2id. Only titles, moods and the derived keyword index
//! are stored in plaintext.

pub mod cipher;
pub mod crypto;
pub mod kdf;

pub use cipher::AesBodyCipher;
