use crate::core::error::{OctpkgError, OctpkgResult};
use std::path::{Path, PathBuf};

/// Environment variable overriding the octpkg home directory.
pub const HOME_ENV: &str = "OCTPKG_HOME";

/// Registry file name inside a scope prefix.
pub const REGISTRY_FILE: &str = "registry.json";

/// Search path file name inside the local prefix.
pub const SEARCH_PATH_FILE: &str = "searchpath";

fn home_override() -> Option<PathBuf> {
    std::env::var_os(HOME_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Get the octpkg home directory
///
/// `OCTPKG_HOME` wins when set. Otherwise:
/// - Windows: %APPDATA%\octpkg
/// - Linux: ~/.config/octpkg
/// - macOS: ~/Library/Application Support/octpkg
pub fn octpkg_home() -> OctpkgResult<PathBuf> {
    if let Some(home) = home_override() {
        return Ok(home);
    }
    let config_dir = dirs::config_dir()
        .ok_or_else(|| OctpkgError::Path("Could not determine config directory".to_string()))?;
    Ok(config_dir.join("octpkg"))
}

/// Get the cache directory
///
/// - Windows: %LOCALAPPDATA%\octpkg\cache
/// - Linux: ~/.cache/octpkg
/// - macOS: ~/Library/Caches/octpkg
pub fn cache_dir() -> OctpkgResult<PathBuf> {
    if let Some(home) = home_override() {
        return Ok(home.join("cache"));
    }
    let cache_dir = dirs::cache_dir()
        .ok_or_else(|| OctpkgError::Path("Could not determine cache directory".to_string()))?;
    Ok(cache_dir.join("octpkg"))
}

/// Get the config file path (`<home>/config.yaml`)
pub fn config_file() -> OctpkgResult<PathBuf> {
    Ok(octpkg_home()?.join("config.yaml"))
}

/// Default per-user installation prefix
pub fn default_local_prefix() -> OctpkgResult<PathBuf> {
    if let Some(home) = home_override() {
        return Ok(home.join("packages"));
    }
    let data_dir = dirs::data_dir()
        .ok_or_else(|| OctpkgError::Path("Could not determine data directory".to_string()))?;
    Ok(data_dir.join("octpkg").join("packages"))
}

/// Default system-wide installation prefix
pub fn default_global_prefix() -> OctpkgResult<PathBuf> {
    if let Some(home) = home_override() {
        return Ok(home.join("global"));
    }
    if cfg!(windows) {
        let program_data = std::env::var_os("PROGRAMDATA")
            .ok_or_else(|| OctpkgError::Path("PROGRAMDATA not set".to_string()))?;
        Ok(PathBuf::from(program_data).join("octpkg").join("packages"))
    } else {
        Ok(PathBuf::from("/usr/local/share/octpkg/packages"))
    }
}

/// Registry file of a scope prefix
pub fn registry_file(prefix: &Path) -> PathBuf {
    prefix.join(REGISTRY_FILE)
}

/// Persisted interpreter search path, kept next to the local registry
pub fn search_path_file(local_prefix: &Path) -> PathBuf {
    local_prefix.join(SEARCH_PATH_FILE)
}

/// Architecture-independent install directory: `<prefix>/<name>-<version>`
pub fn install_dir(prefix: &Path, name: &str, version: &str) -> PathBuf {
    prefix.join(format!("{}-{}", name, version))
}

/// Architecture-specific directory: `<archprefix>/<name>-<version>/<arch>`
pub fn arch_dir(archprefix: &Path, name: &str, version: &str, arch: &str) -> PathBuf {
    archprefix.join(format!("{}-{}", name, version)).join(arch)
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> OctpkgResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_dir() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("a").join("b");

        ensure_dir(&dir).unwrap();
        assert!(dir.is_dir());
        // Second call is a no-op
        ensure_dir(&dir).unwrap();
    }

    #[test]
    fn test_install_and_arch_dirs() {
        let prefix = Path::new("/opt/pkgs");
        assert_eq!(
            install_dir(prefix, "io", "2.6.3"),
            PathBuf::from("/opt/pkgs/io-2.6.3")
        );
        assert_eq!(
            arch_dir(prefix, "io", "2.6.3", "x86_64-linux"),
            PathBuf::from("/opt/pkgs/io-2.6.3/x86_64-linux")
        );
    }

    #[test]
    #[serial]
    fn test_home_override() {
        let temp = TempDir::new().unwrap();
        std::env::set_var(HOME_ENV, temp.path());

        assert_eq!(octpkg_home().unwrap(), temp.path());
        assert_eq!(config_file().unwrap(), temp.path().join("config.yaml"));
        assert_eq!(cache_dir().unwrap(), temp.path().join("cache"));
        assert_eq!(default_local_prefix().unwrap(), temp.path().join("packages"));
        assert_eq!(default_global_prefix().unwrap(), temp.path().join("global"));

        std::env::remove_var(HOME_ENV);
    }
}
