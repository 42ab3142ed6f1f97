//! Batch encryption envelope
//!
//! One batch gets exactly one random salt and one PBKDF2-derived key. IVs
//! follow the configured [`IvPolicy`]. The salt is fed to PBKDF2 as its
//! lowercase hex text, so a batch can be reversed by any implementation
//! holding the passphrase and the transported salt string.

use crate::cipher;
use crate::document::{Document, EncryptedBatch, EncryptedDocument};
use crate::error::{ErrorCategory, ErrorKind, FieldcryptError, Result};
use crate::kdf::{self, KEY_LEN, PBKDF2_ITERATIONS};
use crate::random::{OsRandomSource, RandomSource, random_array};
use crate::transport::{self, IV_LEN, SALT_LEN};
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroizing;

/// How IVs are assigned to the records of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IvPolicy {
    /// Fresh IV per encrypted record, stored on the record.
    #[default]
    PerRecord,
    /// One IV for the whole batch, stored at batch level. Equal plaintext
    /// prefixes across records produce equal ciphertext prefixes.
    Shared,
}

impl FromStr for IvPolicy {
    type Err = FieldcryptError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "per-record" => Ok(IvPolicy::PerRecord),
            "shared" => Ok(IvPolicy::Shared),
            other => Err(FieldcryptError::with_kind(
                ErrorCategory::User,
                ErrorKind::InvalidParameter,
                format!("unknown IV policy '{}' (expected per-record or shared)", other),
            )),
        }
    }
}

impl fmt::Display for IvPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IvPolicy::PerRecord => "per-record",
            IvPolicy::Shared => "shared",
        })
    }
}

/// A salt and the key derived from it.
pub struct Envelope {
    salt_hex: String,
    key: Zeroizing<Vec<u8>>,
}

impl Envelope {
    /// Draw a fresh salt and derive the key for it.
    pub fn generate(passphrase: &[u8], random: &dyn RandomSource) -> Result<Self> {
        let salt: [u8; SALT_LEN] = random_array(random)?;
        Self::derive(passphrase, transport::encode_salt(&salt))
    }

    /// Re-derive the envelope of an existing batch from its transported salt.
    pub fn from_salt_hex(passphrase: &[u8], salt_hex: &str) -> Result<Self> {
        // Validates length and alphabet; the hex text itself is the PBKDF2 salt.
        transport::decode_salt(salt_hex)?;
        Self::derive(passphrase, salt_hex.to_owned())
    }

    fn derive(passphrase: &[u8], salt_hex: String) -> Result<Self> {
        let key = kdf::derive_key(passphrase, salt_hex.as_bytes(), PBKDF2_ITERATIONS, KEY_LEN)?;
        Ok(Self { salt_hex, key })
    }

    pub fn salt_hex(&self) -> &str {
        &self.salt_hex
    }

    pub fn encrypt(&self, plaintext: &str, iv: &[u8; IV_LEN]) -> Result<String> {
        cipher::encrypt_field(plaintext, &self.key, iv)
    }

    pub fn decrypt(&self, ciphertext: &str, iv: &[u8; IV_LEN]) -> Result<String> {
        cipher::decrypt_field(ciphertext, &self.key, iv)
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("salt_hex", &self.salt_hex)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Encrypt the `content` of every document using the OS random source.
pub fn encrypt_batch(
    documents: Vec<Document>,
    passphrase: &[u8],
    policy: IvPolicy,
) -> Result<EncryptedBatch> {
    encrypt_batch_with(documents, passphrase, policy, &OsRandomSource)
}

/// Encrypt the `content` of every document, drawing salt and IVs from `random`.
///
/// Records with empty or absent content pass through unchanged. Any failure
/// aborts the whole batch.
pub fn encrypt_batch_with(
    documents: Vec<Document>,
    passphrase: &[u8],
    policy: IvPolicy,
    random: &dyn RandomSource,
) -> Result<EncryptedBatch> {
    let envelope = Envelope::generate(passphrase, random)?;
    let batch_iv: Option<[u8; IV_LEN]> = match policy {
        IvPolicy::Shared => Some(random_array(random)?),
        IvPolicy::PerRecord => None,
    };

    let total = documents.len();
    let mut encrypted = Vec::with_capacity(total);
    for doc in documents {
        let (content, iv) = match doc.content {
            Some(content) if !content.is_empty() => {
                let iv = match batch_iv {
                    Some(iv) => iv,
                    None => random_array(random)?,
                };
                let ciphertext = envelope
                    .encrypt(&content, &iv)
                    .map_err(|e| e.with_context(format!("failed to encrypt document {}", doc.id)))?;
                let record_iv = batch_iv.is_none().then(|| transport::encode_iv(&iv));
                (Some(ciphertext), record_iv)
            }
            other => {
                tracing::debug!(id = doc.id, "no content to encrypt, passing through");
                (other, None)
            }
        };
        encrypted.push(EncryptedDocument {
            id: doc.id,
            title: doc.title,
            content,
            iv,
        });
    }

    tracing::info!(documents = total, %policy, "encrypted batch");

    Ok(EncryptedBatch {
        documents: encrypted,
        iv: batch_iv.as_ref().map(transport::encode_iv),
        salt: envelope.salt_hex().to_owned(),
    })
}

/// Reverse [`encrypt_batch`] given the passphrase.
///
/// A record's own IV wins over the batch IV. Empty or absent content passes
/// through unchanged.
pub fn decrypt_batch(batch: EncryptedBatch, passphrase: &[u8]) -> Result<Vec<Document>> {
    let envelope = Envelope::from_salt_hex(passphrase, &batch.salt)?;
    let batch_iv = batch.iv.as_deref().map(transport::decode_iv).transpose()?;

    let total = batch.documents.len();
    let mut documents = Vec::with_capacity(total);
    for doc in batch.documents {
        let content = match doc.content {
            Some(ciphertext) if !ciphertext.is_empty() => {
                let iv = match (doc.iv.as_deref(), batch_iv) {
                    (Some(encoded), _) => transport::decode_iv(encoded)?,
                    (None, Some(iv)) => iv,
                    (None, None) => {
                        return Err(FieldcryptError::with_kind(
                            ErrorCategory::User,
                            ErrorKind::Encoding,
                            format!("document {} has no IV and the batch has none", doc.id),
                        ));
                    }
                };
                let plaintext = envelope
                    .decrypt(&ciphertext, &iv)
                    .map_err(|e| e.with_context(format!("failed to decrypt document {}", doc.id)))?;
                Some(plaintext)
            }
            other => other,
        };
        documents.push(Document {
            id: doc.id,
            title: doc.title,
            content,
        });
    }

    tracing::info!(documents = total, "decrypted batch");
    Ok(documents)
}
