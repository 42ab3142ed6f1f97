//! Field encryption/decryption using AES-256-CBC with PKCS#7 padding
//!
//! A field is UTF-8 text. Its ciphertext is the raw CBC output (no IV or
//! length prefix), base64-encoded for transport. The IV travels separately
//! in the envelope.

use crate::error::{ErrorCategory, ErrorKind, FieldcryptError, Result};
use crate::kdf::KEY_LEN;
use crate::transport::{self, IV_LEN};
use aes::Aes256;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// AES block size in bytes
const BLOCK_LEN: usize = 16;

/// Encrypt `plaintext` under `key` and `iv`, returning base64 ciphertext.
///
/// Pure: identical arguments always produce identical output. An empty
/// plaintext still yields one full padding block.
pub fn encrypt_field(plaintext: &str, key: &[u8], iv: &[u8]) -> Result<String> {
    check_key_and_iv(key, iv)?;
    let encryptor = Aes256CbcEnc::new_from_slices(key, iv).map_err(|_| {
        FieldcryptError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::InvalidKeyLength,
            "cipher rejected key or IV",
        )
    })?;
    let ciphertext = encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
    Ok(transport::encode_ciphertext(&ciphertext))
}

/// Decrypt base64 ciphertext produced by [`encrypt_field`].
pub fn decrypt_field(encoded: &str, key: &[u8], iv: &[u8]) -> Result<String> {
    check_key_and_iv(key, iv)?;
    let ciphertext = transport::decode_ciphertext(encoded)?;

    if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
        return Err(FieldcryptError::with_kind(
            ErrorCategory::User,
            ErrorKind::DecryptionFailed,
            format!(
                "ciphertext length {} is not a positive multiple of the block size",
                ciphertext.len()
            ),
        ));
    }

    let decryptor = Aes256CbcDec::new_from_slices(key, iv).map_err(|_| {
        FieldcryptError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::InvalidKeyLength,
            "cipher rejected key or IV",
        )
    })?;
    let plaintext = decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| {
            FieldcryptError::with_kind(
                ErrorCategory::User,
                ErrorKind::DecryptionFailed,
                "invalid padding: corrupt input, mismatched IV, or bad passphrase",
            )
        })?;

    String::from_utf8(plaintext).map_err(|e| {
        FieldcryptError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Encoding,
            "decrypted field is not valid UTF-8",
            e,
        )
    })
}

fn check_key_and_iv(key: &[u8], iv: &[u8]) -> Result<()> {
    if key.len() != KEY_LEN {
        return Err(FieldcryptError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::InvalidKeyLength,
            format!("key must be {} bytes, got {}", KEY_LEN, key.len()),
        ));
    }
    if iv.len() != IV_LEN {
        return Err(FieldcryptError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::InvalidKeyLength,
            format!("IV must be {} bytes, got {}", IV_LEN, iv.len()),
        ));
    }
    Ok(())
}
