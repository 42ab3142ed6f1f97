//! Source of salts and IVs

use crate::error::{ErrorCategory, ErrorKind, FieldcryptError, Result};
use rand::RngCore;
use rand::rngs::OsRng;

/// Fills buffers with cryptographically secure random bytes.
///
/// Implementations must never hand out the same bytes twice; envelopes rely
/// on every salt and IV being fresh.
pub trait RandomSource {
    fn fill(&self, dest: &mut [u8]) -> Result<()>;
}

/// Operating system CSPRNG. Stateless, so one instance may be shared freely
/// between threads.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandomSource;

impl RandomSource for OsRandomSource {
    fn fill(&self, dest: &mut [u8]) -> Result<()> {
        OsRng.try_fill_bytes(dest).map_err(|e| {
            FieldcryptError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::RandomSourceUnavailable,
                format!("secure random source unavailable: {}", e),
                e,
            )
        })
    }
}

/// Fill a fixed-size array from `source`.
pub(crate) fn random_array<const N: usize>(source: &dyn RandomSource) -> Result<[u8; N]> {
    let mut out = [0u8; N];
    source.fill(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_source_fills_distinct_buffers() {
        let a: [u8; 16] = random_array(&OsRandomSource).unwrap();
        let b: [u8; 16] = random_array(&OsRandomSource).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_failure_propagates() {
        struct Broken;
        impl RandomSource for Broken {
            fn fill(&self, _dest: &mut [u8]) -> Result<()> {
                Err(FieldcryptError::with_kind(
                    ErrorCategory::Internal,
                    ErrorKind::RandomSourceUnavailable,
                    "simulated",
                ))
            }
        }

        let err = random_array::<16>(&Broken).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::RandomSourceUnavailable));
    }
}
