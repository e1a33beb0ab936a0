use crate::core::path::ensure_dir;
use crate::core::{OctpkgError, OctpkgResult};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Checksum algorithm for verifying package integrity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChecksumAlgorithm {
    /// SHA-256, the format package indices publish (bare hex)
    #[default]
    Sha256,
    /// BLAKE3, written with a `blake3:` prefix
    Blake3,
}

impl ChecksumAlgorithm {
    /// Parse algorithm from a possibly prefixed checksum string
    pub fn from_checksum(checksum: &str) -> Self {
        if checksum.starts_with("blake3:") {
            ChecksumAlgorithm::Blake3
        } else {
            ChecksumAlgorithm::Sha256
        }
    }
}

/// On-disk cache for downloaded sources and fetched indices
#[derive(Debug, Clone)]
pub struct Cache {
    root: PathBuf,
}

impl Cache {
    /// Create a new cache instance
    pub fn new(cache_root: PathBuf) -> OctpkgResult<Self> {
        ensure_dir(&cache_root)?;
        Ok(Self { root: cache_root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the sources cache directory
    pub fn sources_dir(&self) -> PathBuf {
        self.root.join("sources")
    }

    /// Get the index cache directory
    pub fn indices_dir(&self) -> PathBuf {
        self.root.join("indices")
    }

    /// Scratch space for archive extraction
    pub fn scratch_dir(&self) -> PathBuf {
        self.root.join("scratch")
    }

    /// Initialize cache directory structure
    pub fn init(&self) -> OctpkgResult<()> {
        ensure_dir(&self.sources_dir())?;
        ensure_dir(&self.indices_dir())?;
        ensure_dir(&self.scratch_dir())?;
        Ok(())
    }

    /// Get the cached path for a source archive
    pub fn source_path(&self, url: &str) -> PathBuf {
        // Use URL hash as filename to avoid path issues
        let hash = Self::url_hash(url);
        let extension = if url.ends_with(".tar.gz") {
            "tar.gz"
        } else {
            Path::new(url)
                .extension()
                .and_then(|s| s.to_str())
                .unwrap_or("tar.gz")
        };
        self.sources_dir().join(format!("{}.{}", hash, extension))
    }

    /// Get the cached path for a fetched index document
    pub fn index_path(&self, url: &str) -> PathBuf {
        self.indices_dir()
            .join(format!("{}.json", Self::url_hash(url)))
    }

    /// Check if a file exists in cache
    pub fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    /// Read a file from cache
    pub fn read(&self, path: &Path) -> OctpkgResult<Vec<u8>> {
        fs::read(path).map_err(|e| {
            OctpkgError::Package(format!(
                "Failed to read from cache: {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Write a file to cache
    pub fn write(&self, path: &Path, data: &[u8]) -> OctpkgResult<()> {
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }
        let mut file = fs::File::create(path).map_err(|e| {
            OctpkgError::Package(format!(
                "Failed to create cache file: {}: {}",
                path.display(),
                e
            ))
        })?;
        file.write_all(data).map_err(|e| {
            OctpkgError::Package(format!(
                "Failed to write to cache: {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(())
    }

    /// Calculate checksum of a file using the specified algorithm
    pub fn checksum_with_algorithm(
        path: &Path,
        algorithm: ChecksumAlgorithm,
    ) -> OctpkgResult<String> {
        let data = fs::read(path)?;
        match algorithm {
            ChecksumAlgorithm::Sha256 => {
                let mut hasher = Sha256::new();
                hasher.update(&data);
                Ok(hex::encode(hasher.finalize()))
            }
            ChecksumAlgorithm::Blake3 => {
                let hash = blake3::hash(&data);
                Ok(format!("blake3:{}", hash.to_hex()))
            }
        }
    }

    /// Calculate checksum of a file (SHA-256, bare hex)
    pub fn checksum(path: &Path) -> OctpkgResult<String> {
        Self::checksum_with_algorithm(path, ChecksumAlgorithm::default())
    }

    /// Verify a file's checksum matches the expected value
    pub fn verify_checksum(path: &Path, expected: &str) -> OctpkgResult<bool> {
        let algorithm = ChecksumAlgorithm::from_checksum(expected);
        let actual = Self::checksum_with_algorithm(path, algorithm)?;

        let expected_hash = expected.split_once(':').map(|(_, h)| h).unwrap_or(expected);
        let actual_hash = actual.split_once(':').map(|(_, h)| h).unwrap_or(&actual);

        Ok(expected_hash.eq_ignore_ascii_case(actual_hash))
    }

    /// Hash a URL for use as a filename
    fn url_hash(url: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        let hash = hasher.finalize();
        hex::encode(&hash[..16]) // Use first 16 bytes for shorter filename
    }
}

/// Session-wide memoized value with a time-to-live.
///
/// Populated lazily on first access and dropped with the owning session.
#[derive(Debug)]
pub struct IndexCache<T> {
    ttl: Duration,
    entry: Option<(Instant, T)>,
}

impl<T> IndexCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    /// The cached value, if present and younger than the TTL
    pub fn get(&self) -> Option<&T> {
        match self.entry {
            Some((stored, ref value)) if stored.elapsed() < self.ttl => Some(value),
            _ => None,
        }
    }

    pub fn store(&mut self, value: T) {
        self.entry = Some((Instant::now(), value));
    }

    /// Drop the cached value so the next access reloads it
    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}
