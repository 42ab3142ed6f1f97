//! Passphrase-based key derivation using PBKDF2-HMAC-SHA256

use crate::error::{ErrorCategory, ErrorKind, FieldcryptError, Result};
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroizing;

/// PBKDF2 iteration count used for every envelope
pub const PBKDF2_ITERATIONS: u32 = 10_000;

/// Length of the derived AES-256 key in bytes
pub const KEY_LEN: usize = 32;

/// Derive `key_len` bytes from a passphrase and salt.
///
/// Deterministic for identical inputs. The returned key is wiped from memory
/// when dropped.
pub fn derive_key(
    passphrase: &[u8],
    salt: &[u8],
    iterations: u32,
    key_len: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    if iterations == 0 {
        return Err(invalid_parameter("PBKDF2 iteration count must be positive"));
    }
    if key_len == 0 {
        return Err(invalid_parameter("derived key length must be positive"));
    }
    if passphrase.is_empty() {
        return Err(invalid_parameter("passphrase must not be empty"));
    }

    tracing::debug!(iterations, key_len, salt_len = salt.len(), "deriving key");

    let mut key = Zeroizing::new(vec![0u8; key_len]);
    pbkdf2_hmac::<Sha256>(passphrase, salt, iterations, &mut key);
    Ok(key)
}

fn invalid_parameter(msg: &str) -> FieldcryptError {
    FieldcryptError::with_kind(ErrorCategory::Internal, ErrorKind::InvalidParameter, msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conformance_vector() {
        // Salt is fed as its hex text, the way envelopes use it.
        let key = derive_key(
            b"SecretPassphrase2024",
            b"a1b2c3d4e5f60718293a4b5c6d7e8f90",
            PBKDF2_ITERATIONS,
            KEY_LEN,
        )
        .unwrap();

        assert_eq!(
            hex::encode(&*key),
            "d31f2df6e1296d9ff0f17486e975493c7932b442b2ca79f2f2f8930717927e1f"
        );
    }

    #[test]
    fn test_deterministic() {
        let k1 = derive_key(b"pass", b"salt", 1000, KEY_LEN).unwrap();
        let k2 = derive_key(b"pass", b"salt", 1000, KEY_LEN).unwrap();
        assert_eq!(*k1, *k2);
    }

    #[test]
    fn test_different_salt_different_key() {
        let k1 = derive_key(b"pass", b"salt-one", 1000, KEY_LEN).unwrap();
        let k2 = derive_key(b"pass", b"salt-two", 1000, KEY_LEN).unwrap();
        assert_ne!(*k1, *k2);
    }

    #[test]
    fn test_key_length_independent_of_passphrase_length() {
        for passphrase in [&b"x"[..], &b"SecretPassphrase2024"[..], &[0x61u8; 4096][..]] {
            let key = derive_key(passphrase, b"salt", 10, KEY_LEN).unwrap();
            assert_eq!(key.len(), KEY_LEN);
        }
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let err = derive_key(b"pass", b"salt", 0, KEY_LEN).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::InvalidParameter));
    }

    #[test]
    fn test_zero_key_length_rejected() {
        let err = derive_key(b"pass", b"salt", 10, 0).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::InvalidParameter));
    }

    #[test]
    fn test_empty_passphrase_rejected() {
        let err = derive_key(b"", b"salt", 10, KEY_LEN).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::InvalidParameter));
    }
}
