//! Text encodings for envelope material
//!
//! Everything that leaves the process as JSON is text:
//! - ciphertext: standard base64 with padding
//! - IV: standard base64 with padding (16 raw bytes)
//! - salt: lowercase hex (16 raw bytes, 32 characters)

use crate::error::{ErrorCategory, ErrorKind, FieldcryptError, Result};
use base64::{Engine, engine::general_purpose::STANDARD};

/// Length of the IV in raw bytes
pub const IV_LEN: usize = 16;

/// Length of the salt in raw bytes
pub const SALT_LEN: usize = 16;

/// Encode raw ciphertext bytes for transport.
pub fn encode_ciphertext(ciphertext: &[u8]) -> String {
    STANDARD.encode(ciphertext)
}

/// Decode a transported ciphertext back to raw bytes.
pub fn decode_ciphertext(encoded: &str) -> Result<Vec<u8>> {
    STANDARD.decode(encoded).map_err(|e| {
        FieldcryptError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Encoding,
            format!("ciphertext base64 decoding failed: {}", e),
            e,
        )
    })
}

/// Encode an IV for transport.
pub fn encode_iv(iv: &[u8; IV_LEN]) -> String {
    STANDARD.encode(iv)
}

/// Decode a transported IV, insisting on exactly `IV_LEN` bytes.
pub fn decode_iv(encoded: &str) -> Result<[u8; IV_LEN]> {
    let raw = STANDARD.decode(encoded).map_err(|e| {
        FieldcryptError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Encoding,
            format!("IV base64 decoding failed: {}", e),
            e,
        )
    })?;
    let len = raw.len();
    raw.try_into().map_err(|_| {
        FieldcryptError::with_kind(
            ErrorCategory::User,
            ErrorKind::Encoding,
            format!("IV must be {} bytes, got {}", IV_LEN, len),
        )
    })
}

/// Encode a salt for transport.
pub fn encode_salt(salt: &[u8; SALT_LEN]) -> String {
    hex::encode(salt)
}

/// Decode a transported salt, insisting on exactly `SALT_LEN` bytes.
pub fn decode_salt(encoded: &str) -> Result<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    hex::decode_to_slice(encoded, &mut salt).map_err(|e| {
        FieldcryptError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Encoding,
            format!("salt must be {} hex-encoded bytes: {}", SALT_LEN, e),
            e,
        )
    })?;
    Ok(salt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iv_encoding_is_padded_base64() {
        let iv = [0x24u8; IV_LEN];
        assert_eq!(encode_iv(&iv), "JCQkJCQkJCQkJCQkJCQkJA==");
        assert_eq!(decode_iv("JCQkJCQkJCQkJCQkJCQkJA==").unwrap(), iv);
    }

    #[test]
    fn test_salt_encoding_is_lowercase_hex() {
        let salt: [u8; SALT_LEN] = [
            0xa1, 0xb2, 0xc3, 0xd4, 0xe5, 0xf6, 0x07, 0x18, 0x29, 0x3a, 0x4b, 0x5c, 0x6d, 0x7e,
            0x8f, 0x90,
        ];
        let encoded = encode_salt(&salt);
        assert_eq!(encoded, "a1b2c3d4e5f60718293a4b5c6d7e8f90");
        assert_eq!(decode_salt(&encoded).unwrap(), salt);
    }

    #[test]
    fn test_decode_salt_accepts_uppercase() {
        let salt = decode_salt("A1B2C3D4E5F60718293A4B5C6D7E8F90").unwrap();
        assert_eq!(salt[0], 0xa1);
    }

    #[test]
    fn test_short_iv_rejected() {
        let err = decode_iv("AAECAw==").unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::Encoding));
    }

    #[test]
    fn test_bad_iv_base64_rejected() {
        let err = decode_iv("not$$base64").unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::Encoding));
    }

    #[test]
    fn test_wrong_length_salt_rejected() {
        let err = decode_salt("a1b2c3").unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::Encoding));
    }

    #[test]
    fn test_non_hex_salt_rejected() {
        let err = decode_salt("zzb2c3d4e5f60718293a4b5c6d7e8f90").unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::Encoding));
    }

    #[test]
    fn test_bad_ciphertext_base64() {
        let err = decode_ciphertext("bad$$").unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::Encoding));
    }

    #[test]
    fn test_ciphertext_uses_standard_alphabet() {
        let encoded = encode_ciphertext(&[0xfb, 0xff, 0xbf]);
        assert_eq!(encoded, "+/+/");
    }
}
