use thiserror::Error;

pub type OctpkgResult<T> = Result<T, OctpkgError>;

#[derive(Error, Debug)]
pub enum OctpkgError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WalkDir error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Path error: {0}")]
    Path(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Package error: {0}")]
    Package(String),

    #[error("Version error: {0}")]
    Version(String),

    /// One request matched more than one index row.
    #[error("Ambiguous input '{input}': matches {}", .matches.join(", "))]
    AmbiguousInput { input: String, matches: Vec<String> },

    /// The package index is internally inconsistent.
    #[error("Index lookup error: {0}")]
    Lookup(String),

    /// A dependency cycle was found while resolving.
    #[error("Circular dependency detected involving '{0}'")]
    CircularDependency(String),

    /// One line per unmet dependency.
    #[error("Unsatisfied dependencies:\n  {}", .0.join("\n  "))]
    UnsatisfiedDependency(Vec<String>),

    /// Requests that could not be matched to any index entry.
    #[error("Could not resolve: {}", .0.join(", "))]
    Unresolved(Vec<String>),

    #[error("Failed to persist {path}: {reason}")]
    Persistence { path: String, reason: String },

    /// A step of an install or uninstall failed; everything created for the
    /// package was removed before this was returned.
    #[error("{step} failed for {package}: {source}")]
    TransactionStep {
        package: String,
        step: String,
        #[source]
        source: Box<OctpkgError>,
    },
}

impl OctpkgError {
    /// Wrap an error as the failure of one transaction step.
    pub fn step(package: impl Into<String>, step: impl Into<String>, source: OctpkgError) -> Self {
        OctpkgError::TransactionStep {
            package: package.into(),
            step: step.into(),
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguous_input_lists_matches() {
        let err = OctpkgError::AmbiguousInput {
            input: "io".to_string(),
            matches: vec!["io@2.6.3".to_string(), "io@2.6.2".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Ambiguous input 'io': matches io@2.6.3, io@2.6.2"
        );
    }

    #[test]
    fn test_unsatisfied_lists_every_line() {
        let err = OctpkgError::UnsatisfiedDependency(vec![
            "signal needs io >= 2.0.0".to_string(),
            "signal needs control".to_string(),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("signal needs io >= 2.0.0"));
        assert!(msg.contains("signal needs control"));
    }

    #[test]
    fn test_transaction_step_keeps_source() {
        let err = OctpkgError::step(
            "io@2.6.3",
            "extract",
            OctpkgError::Package("bad archive".to_string()),
        );
        assert_eq!(
            err.to_string(),
            "extract failed for io@2.6.3: Package error: bad archive"
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
