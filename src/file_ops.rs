//! Document file encryption/decryption operations
//!
//! This module ties document sources, passphrase readers and the batch
//! envelope together, and handles reading input and writing output. `None`
//! paths mean stdin/stdout.

use crate::document::{Document, DocumentSource, EncryptedBatch};
use crate::envelope::{self, IvPolicy};
use crate::error::{ErrorCategory, ErrorKind, FieldcryptError, Result};
use crate::passphrase::PassphraseReader;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

/// Encrypt every document from `source` and write the JSON batch to `output`.
///
/// Output files are written atomically with mode 0o600 on Unix systems.
pub fn encrypt_documents(
    source: &mut dyn DocumentSource,
    output: Option<&Path>,
    passphrase_reader: &mut dyn PassphraseReader,
    policy: IvPolicy,
) -> Result<()> {
    let documents = source
        .fetch_documents()
        .map_err(|e| e.with_context("failed to fetch documents"))?;
    let passphrase = passphrase_reader.read_passphrase()?;
    let batch = envelope::encrypt_batch(documents, &passphrase, policy)
        .map_err(|e| e.with_context("encryption failed"))?;

    let mut json = batch.to_json()?;
    json.push('\n');
    write_output(output, json.as_bytes())
}

/// Decrypt a JSON batch from `input` and write the plaintext documents to `output`.
///
/// Output files are written atomically with mode 0o600 on Unix systems.
pub fn decrypt_documents(
    input: Option<&Path>,
    output: Option<&Path>,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<()> {
    let data = read_input(input)?;
    let batch = EncryptedBatch::from_json(&data)?;
    let passphrase = passphrase_reader.read_passphrase()?;
    let documents = envelope::decrypt_batch(batch, &passphrase)
        .map_err(|e| e.with_context("failed to decrypt"))?;

    let mut json = documents_to_json(&documents)?;
    json.push('\n');
    write_output(output, json.as_bytes())
}

fn documents_to_json(documents: &[Document]) -> Result<String> {
    serde_json::to_string(documents).map_err(|e| {
        FieldcryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::DocumentFormat,
            "failed to serialize documents",
            e,
        )
    })
}

/// Read all of `path`, or stdin when no path is given.
pub fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(path) => fs::read(path).map_err(|e| read_error(path, e)),
        None => {
            let mut data = Vec::new();
            io::stdin().read_to_end(&mut data).map_err(|e| {
                FieldcryptError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    "failed to read from stdin",
                    e,
                )
            })?;
            Ok(data)
        }
    }
}

/// Write `contents` to `path`, or stdout when no path is given.
pub fn write_output(path: Option<&Path>, contents: &[u8]) -> Result<()> {
    match path {
        Some(path) => write_file_atomic(path, contents)
            .map_err(|e| e.with_context(format!("failed to write to {}", path.display()))),
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(contents)
                .and_then(|()| stdout.flush())
                .map_err(|e| {
                    FieldcryptError::with_kind_and_source(
                        ErrorCategory::Internal,
                        ErrorKind::Io,
                        "failed to write to stdout",
                        e,
                    )
                })
        }
    }
}

/// Write via tempfile + fsync + rename so that either the old file or the
/// complete new file exists, never a partial one.
fn write_file_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp_file = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
        FieldcryptError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Io,
            format!("failed to create tempfile in {}", dir.display()),
            e,
        )
    })?;

    temp_file.write_all(contents).map_err(|e| {
        FieldcryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to write to tempfile",
            e,
        )
    })?;
    temp_file.flush().map_err(|e| {
        FieldcryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to flush tempfile",
            e,
        )
    })?;
    temp_file.as_file().sync_all().map_err(|e| {
        FieldcryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to sync file prior to rename",
            e,
        )
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp_file
            .as_file()
            .set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(|e| {
                FieldcryptError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    "failed to set tempfile permissions",
                    e,
                )
            })?;
    }

    temp_file.persist(path).map_err(|e| {
        FieldcryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to rename to target file {}", path.display()),
            e,
        )
    })?;
    Ok(())
}

fn read_error(path: &Path, err: io::Error) -> FieldcryptError {
    let category = if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    FieldcryptError::with_kind_and_source(
        category,
        ErrorKind::Io,
        format!("failed to read from {}", path.display()),
        err,
    )
}
