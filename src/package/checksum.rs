use crate::cache::{Cache, ChecksumAlgorithm};
use crate::core::{OctpkgError, OctpkgResult};
use std::path::Path;

/// Outcome of comparing an archive against its published checksum
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChecksumStatus {
    Verified,
    /// Nothing to compare against, or verification is disabled
    Skipped,
    Mismatch { expected: String, actual: String },
}

/// Verifies source archives before they are unpacked
#[derive(Debug, Clone, Copy)]
pub struct ChecksumVerifier {
    enabled: bool,
}

impl ChecksumVerifier {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Calculate checksum for a file at a given path
    pub fn calculate_for_file(file_path: &Path) -> OctpkgResult<String> {
        if !file_path.exists() {
            return Err(OctpkgError::Package(format!(
                "File not found: {}",
                file_path.display()
            )));
        }
        Cache::checksum(file_path)
    }

    /// Compare `archive` with `expected`. A mismatch is reported, not
    /// raised; the caller decides whether to continue.
    pub fn verify(&self, archive: &Path, expected: &str) -> OctpkgResult<ChecksumStatus> {
        if !self.enabled || expected.is_empty() {
            return Ok(ChecksumStatus::Skipped);
        }
        if Cache::verify_checksum(archive, expected)? {
            return Ok(ChecksumStatus::Verified);
        }
        let actual =
            Cache::checksum_with_algorithm(archive, ChecksumAlgorithm::from_checksum(expected))?;
        Ok(ChecksumStatus::Mismatch {
            expected: expected.to_string(),
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_calculate_for_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.tar.gz");
        fs::write(&file, b"test data").unwrap();
        let sum = ChecksumVerifier::calculate_for_file(&file).unwrap();
        assert_eq!(sum.len(), 64);
        assert!(ChecksumVerifier::calculate_for_file(&temp.path().join("missing")).is_err());
    }

    #[test]
    fn test_verify_statuses() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.tar.gz");
        fs::write(&file, b"test data").unwrap();
        let sum = Cache::checksum(&file).unwrap();

        let verifier = ChecksumVerifier::new(true);
        assert_eq!(verifier.verify(&file, &sum).unwrap(), ChecksumStatus::Verified);
        assert_eq!(
            verifier.verify(&file, &sum.to_uppercase()).unwrap(),
            ChecksumStatus::Verified
        );
        assert_eq!(verifier.verify(&file, "").unwrap(), ChecksumStatus::Skipped);
        assert!(matches!(
            verifier.verify(&file, "deadbeef").unwrap(),
            ChecksumStatus::Mismatch { .. }
        ));

        let blake = Cache::checksum_with_algorithm(&file, ChecksumAlgorithm::Blake3).unwrap();
        assert_eq!(verifier.verify(&file, &blake).unwrap(), ChecksumStatus::Verified);

        let disabled = ChecksumVerifier::new(false);
        assert_eq!(disabled.verify(&file, "deadbeef").unwrap(), ChecksumStatus::Skipped);
    }
}
