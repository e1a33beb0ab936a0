use crate::core::path::{
    cache_dir, config_file, default_global_prefix, default_local_prefix, ensure_dir,
};
use crate::core::{OctpkgError, OctpkgResult};
use crate::index::IndexKind;
use crate::registry::Scope;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// One remote (or local) package index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSource {
    /// `https://...`, `file://...` or a plain filesystem path
    pub url: String,

    /// Whether the index exposes dependency graphs (`packages`) or only a
    /// flat name/version listing (`forge`)
    #[serde(default)]
    pub kind: IndexKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Package indices, consulted in order
    #[serde(default = "default_indices")]
    pub indices: Vec<IndexSource>,

    /// Cache directory (defaults to platform-specific cache directory)
    ///
    /// Default locations:
    /// - Windows: %LOCALAPPDATA%\octpkg\cache
    /// - Linux: ~/.cache/octpkg
    /// - macOS: ~/Library/Caches/octpkg
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<String>,

    /// Per-user install prefix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_prefix: Option<String>,

    /// System-wide install prefix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_prefix: Option<String>,

    /// Prefix for compiled artifacts of local installs (defaults to `local_prefix`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_archprefix: Option<String>,

    /// Prefix for compiled artifacts of global installs (defaults to `global_prefix`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_archprefix: Option<String>,

    /// Version of the host interpreter, matched against `octave` dependencies
    #[serde(default = "default_host_version")]
    pub host_version: String,

    /// Architecture tag used for arch directories
    #[serde(default = "default_arch")]
    pub arch: String,

    /// Whether to verify checksums on install
    #[serde(default = "default_true")]
    pub verify_checksums: bool,

    /// How long a fetched index stays valid within one session
    #[serde(default = "default_index_cache_ttl_minutes")]
    pub index_cache_ttl_minutes: u64,
}

fn default_indices() -> Vec<IndexSource> {
    vec![IndexSource {
        url: "https://gnu-octave.github.io/packages/packages/".to_string(),
        kind: IndexKind::Packages,
    }]
}

fn default_host_version() -> String {
    "9.2.0".to_string()
}

fn default_arch() -> String {
    format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS)
}

fn default_true() -> bool {
    true
}

fn default_index_cache_ttl_minutes() -> u64 {
    60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            indices: default_indices(),
            cache_dir: None,
            local_prefix: None,
            global_prefix: None,
            local_archprefix: None,
            global_archprefix: None,
            host_version: default_host_version(),
            arch: default_arch(),
            verify_checksums: true,
            index_cache_ttl_minutes: default_index_cache_ttl_minutes(),
        }
    }
}

impl Config {
    /// Load config from the octpkg home directory, creating default if it doesn't exist
    ///
    /// Config locations (`OCTPKG_HOME` overrides all of them):
    /// - Windows: %APPDATA%\octpkg\config.yaml
    /// - Linux: ~/.config/octpkg/config.yaml
    /// - macOS: ~/Library/Application Support/octpkg/config.yaml
    pub fn load() -> OctpkgResult<Self> {
        let config_path = config_file()?;

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = fs::read_to_string(&config_path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate a YAML config document
    pub fn from_yaml(content: &str) -> OctpkgResult<Self> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| OctpkgError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the octpkg home directory
    pub fn save(&self) -> OctpkgResult<()> {
        let config_path = config_file()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| OctpkgError::Path("Invalid config path".to_string()))?;

        ensure_dir(config_dir)?;

        let content = serde_yaml::to_string(self)
            .map_err(|e| OctpkgError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, content)?;
        Ok(())
    }

    fn validate(&self) -> OctpkgResult<()> {
        if self.indices.is_empty() {
            return Err(OctpkgError::Config(
                "At least one package index must be configured".to_string(),
            ));
        }
        octpkg_core::core::version::Version::parse(&self.host_version).map_err(|e| {
            OctpkgError::Config(format!("Invalid host_version '{}': {}", self.host_version, e))
        })?;
        if self.arch.trim().is_empty() {
            return Err(OctpkgError::Config("arch must not be empty".to_string()));
        }
        Ok(())
    }

    /// Get the cache directory path
    pub fn get_cache_dir(&self) -> OctpkgResult<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            Ok(PathBuf::from(dir))
        } else {
            cache_dir()
        }
    }

    /// Install prefix of a scope
    pub fn prefix(&self, scope: Scope) -> OctpkgResult<PathBuf> {
        match scope {
            Scope::Local => match self.local_prefix {
                Some(ref dir) => Ok(PathBuf::from(dir)),
                None => default_local_prefix(),
            },
            Scope::Global => match self.global_prefix {
                Some(ref dir) => Ok(PathBuf::from(dir)),
                None => default_global_prefix(),
            },
        }
    }

    /// Arch prefix of a scope (falls back to the install prefix)
    pub fn archprefix(&self, scope: Scope) -> OctpkgResult<PathBuf> {
        let configured = match scope {
            Scope::Local => self.local_archprefix.as_ref(),
            Scope::Global => self.global_archprefix.as_ref(),
        };
        match configured {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => self.prefix(scope),
        }
    }
}
