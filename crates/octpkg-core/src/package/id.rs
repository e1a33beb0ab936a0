use crate::core::error::{OctpkgError, OctpkgResult};
use crate::core::version::Version;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A concrete package version, written `name@version`.
///
/// Equality is exact string equality on both halves; use [`PackageId::version`]
/// to compare versions semantically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageId {
    pub name: String,
    pub version: String,
}

impl PackageId {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into().to_lowercase(),
            version: version.into(),
        }
    }

    /// Parse `name@version`. Names are lowercased.
    pub fn parse(s: &str) -> OctpkgResult<Self> {
        let (name, version) = s.trim().split_once('@').ok_or_else(|| {
            OctpkgError::Package(format!("Invalid package id '{}'. Expected 'name@version'", s))
        })?;
        if name.is_empty() || version.is_empty() {
            return Err(OctpkgError::Package(format!(
                "Invalid package id '{}'. Expected 'name@version'",
                s
            )));
        }
        Ok(Self::new(name, version))
    }

    /// Parsed version, for comparisons.
    pub fn version(&self) -> OctpkgResult<Version> {
        Version::parse(&self.version)
    }

    /// Prefix every id of this package name starts with (`name@`).
    pub fn prefix_for(name: &str) -> String {
        format!("{}@", name)
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// Whether a request token carries an explicit version (`name@version`).
pub fn has_version_suffix(token: &str) -> bool {
    token.contains('@')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let id = PackageId::parse("Signal@1.4.5").unwrap();
        assert_eq!(id.name, "signal");
        assert_eq!(id.version, "1.4.5");
        assert_eq!(id.to_string(), "signal@1.4.5");
    }

    #[test]
    fn test_parse_rejects_missing_parts() {
        assert!(PackageId::parse("signal").is_err());
        assert!(PackageId::parse("@1.0").is_err());
        assert!(PackageId::parse("signal@").is_err());
    }

    #[test]
    fn test_equality_is_exact() {
        assert_ne!(PackageId::new("io", "2.6"), PackageId::new("io", "2.6.0"));
        assert_eq!(
            PackageId::new("io", "2.6").version().unwrap(),
            PackageId::new("io", "2.6.0").version().unwrap()
        );
    }

    #[test]
    fn test_version_suffix() {
        assert!(has_version_suffix("io@2.6.3"));
        assert!(!has_version_suffix("io"));
        assert_eq!(PackageId::prefix_for("io"), "io@");
    }
}
