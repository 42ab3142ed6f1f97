//! Document records and the sources they come from

use crate::error::{ErrorCategory, ErrorKind, FieldcryptError, Result};
use serde::{Deserialize, Serialize};
use std::io::Read;

/// A plaintext document. Only `content` is ever encrypted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Document {
    pub fn new(id: i64, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            content: Some(content.into()),
        }
    }
}

/// A document whose `content` holds base64 ciphertext.
///
/// `iv` is set only when the record was encrypted under its own IV rather
/// than the batch IV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedDocument {
    pub id: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iv: Option<String>,
}

/// The JSON response: encrypted documents plus what is needed to reverse
/// the encryption given the passphrase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedBatch {
    pub documents: Vec<EncryptedDocument>,
    /// Batch-wide IV (base64). Absent when every record carries its own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iv: Option<String>,
    /// PBKDF2 salt (hex).
    pub salt: String,
}

impl EncryptedBatch {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| {
            FieldcryptError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::DocumentFormat,
                "failed to serialize encrypted batch",
                e,
            )
        })
    }

    pub fn from_json(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(|e| {
            FieldcryptError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::DocumentFormat,
                format!("input is not an encrypted batch: {}", e),
                e,
            )
        })
    }
}

/// Supplies the ordered documents to encrypt.
pub trait DocumentSource {
    fn fetch_documents(&mut self) -> Result<Vec<Document>>;
}

/// Fixed pair of sample documents.
#[derive(Debug, Default)]
pub struct DemoDocumentSource;

impl DocumentSource for DemoDocumentSource {
    fn fetch_documents(&mut self) -> Result<Vec<Document>> {
        Ok(vec![
            Document::new(1, "Document 1", "This is a secret document."),
            Document::new(2, "Document 2", "Another secret document."),
        ])
    }
}

/// Reads a JSON array of documents from any io::Read source
pub struct JsonDocumentSource {
    reader: Box<dyn Read>,
}

impl JsonDocumentSource {
    pub fn new(reader: Box<dyn Read>) -> Self {
        Self { reader }
    }
}

impl DocumentSource for JsonDocumentSource {
    fn fetch_documents(&mut self) -> Result<Vec<Document>> {
        let mut data = Vec::new();
        self.reader.read_to_end(&mut data).map_err(|e| {
            FieldcryptError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("error reading documents: {}", e),
                e,
            )
        })?;
        let text = std::str::from_utf8(&data).map_err(|e| {
            FieldcryptError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::Encoding,
                "document input is not valid UTF-8",
                e,
            )
        })?;
        serde_json::from_str(text).map_err(|e| {
            FieldcryptError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::DocumentFormat,
                format!("input is not a JSON array of documents: {}", e),
                e,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_source() {
        let docs = DemoDocumentSource.fetch_documents().unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, 1);
        assert_eq!(docs[0].content.as_deref(), Some("This is a secret document."));
        assert_eq!(docs[1].title, "Document 2");
    }

    #[test]
    fn test_json_source() {
        let data = br#"[{"id":7,"title":"t","content":"c"},{"id":8,"title":"no content"}]"#;
        let mut source = JsonDocumentSource::new(Box::new(&data[..]));
        let docs = source.fetch_documents().unwrap();
        assert_eq!(docs[0], Document::new(7, "t", "c"));
        assert_eq!(docs[1].content, None);
    }

    #[test]
    fn test_json_source_null_content() {
        let data = br#"[{"id":1,"title":"t","content":null}]"#;
        let docs = JsonDocumentSource::new(Box::new(&data[..]))
            .fetch_documents()
            .unwrap();
        assert_eq!(docs[0].content, None);
    }

    #[test]
    fn test_json_source_rejects_non_utf8() {
        let data: &[u8] = &[0x5b, 0xff, 0x5d];
        let err = JsonDocumentSource::new(Box::new(data))
            .fetch_documents()
            .unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::Encoding));
    }

    #[test]
    fn test_json_source_rejects_wrong_shape() {
        let data = br#"{"id":1}"#;
        let err = JsonDocumentSource::new(Box::new(&data[..]))
            .fetch_documents()
            .unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::DocumentFormat));
    }

    #[test]
    fn test_batch_json_shape() {
        let batch = EncryptedBatch {
            documents: vec![EncryptedDocument {
                id: 1,
                title: "Document 1".into(),
                content: Some("abc=".into()),
                iv: None,
            }],
            iv: Some("JCQkJCQkJCQkJCQkJCQkJA==".into()),
            salt: "a1b2c3d4e5f60718293a4b5c6d7e8f90".into(),
        };
        assert_eq!(
            batch.to_json().unwrap(),
            r#"{"documents":[{"id":1,"title":"Document 1","content":"abc="}],"iv":"JCQkJCQkJCQkJCQkJCQkJA==","salt":"a1b2c3d4e5f60718293a4b5c6d7e8f90"}"#
        );
        assert_eq!(EncryptedBatch::from_json(batch.to_json().unwrap().as_bytes()).unwrap(), batch);
    }
}
