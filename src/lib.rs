//! fieldcrypt - Passphrase-based encryption of document fields
//!
//! Derives an AES-256 key from a passphrase with PBKDF2-HMAC-SHA256 and
//! encrypts the `content` field of each document with AES-256-CBC, emitting
//! a JSON batch that carries the salt and IV(s) needed to reverse it.

#![forbid(unsafe_code)]

pub mod cipher;
pub mod document;
pub mod envelope;
pub mod error;
pub mod file_ops;
pub mod kdf;
pub mod passphrase;
pub mod random;
pub mod transport;
