//! Human-oriented rendering of errors with remediation hints.

use crate::core::error::OctpkgError;

/// Remediation hints attached to an error.
pub trait ErrorHelp {
    /// Short suggestions shown below the error message.
    fn help(&self) -> Vec<&'static str>;
}

impl ErrorHelp for OctpkgError {
    fn help(&self) -> Vec<&'static str> {
        match self {
            OctpkgError::AmbiguousInput { .. } => vec![
                "Pass a full id such as 'name@version' instead of a url or checksum",
            ],
            OctpkgError::Lookup(_) => vec![
                "The package index is corrupt; retry with -nocache to refetch it",
            ],
            OctpkgError::CircularDependency(_) => vec![
                "Use -force to continue with a warning (the plan will be incomplete)",
            ],
            OctpkgError::UnsatisfiedDependency(_) => vec![
                "Install the missing dependencies first",
                "Use -nodeps to skip dependency checks",
            ],
            OctpkgError::Unresolved(_) => vec![
                "Run 'octpkg list' to see installed packages",
                "Check the package name or pass a local archive path",
            ],
            OctpkgError::Persistence { .. } => vec![
                "Check write permissions on the installation prefix",
                "Use -local to install into your per-user prefix",
            ],
            OctpkgError::Http(_) => vec!["Check your network connection and index url"],
            OctpkgError::Config(_) => vec!["Check config.yaml in the octpkg home directory"],
            OctpkgError::TransactionStep { source, .. } => source.help(),
            _ => Vec::new(),
        }
    }
}

/// Format an error followed by its help lines.
pub fn format_error_with_help(err: &OctpkgError) -> String {
    let mut out = format!("error: {}", err);
    for hint in err.help() {
        out.push_str("\n  help: ");
        out.push_str(hint);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_dependency_suggests_force() {
        let err = OctpkgError::CircularDependency("a@1.0.0".to_string());
        let text = format_error_with_help(&err);
        assert!(text.starts_with("error: Circular dependency"));
        assert!(text.contains("-force"));
    }

    #[test]
    fn test_transaction_step_uses_inner_help() {
        let err = OctpkgError::step(
            "io@2.6.3",
            "dependency check",
            OctpkgError::UnsatisfiedDependency(vec!["io needs octave >= 99".to_string()]),
        );
        assert!(format_error_with_help(&err).contains("-nodeps"));
    }

    #[test]
    fn test_plain_error_has_no_help() {
        let err = OctpkgError::Package("boom".to_string());
        assert_eq!(format_error_with_help(&err), "error: Package error: boom");
    }
}
