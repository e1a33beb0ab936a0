use crate::core::error::{OctpkgError, OctpkgResult};
use std::cmp::Ordering;
use std::fmt;

/// One dot-separated component of a version string.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Num(u64),
    Text(String),
}

impl Part {
    fn parse(s: &str) -> Self {
        match s.parse::<u64>() {
            Ok(n) => Part::Num(n),
            Err(_) => Part::Text(s.to_string()),
        }
    }

    fn cmp_part(&self, other: &Part) -> Ordering {
        match (self, other) {
            (Part::Num(a), Part::Num(b)) => a.cmp(b),
            // Numeric components sort below textual ones ("1.0" < "1.rc")
            (Part::Num(_), Part::Text(_)) => Ordering::Less,
            (Part::Text(_), Part::Num(_)) => Ordering::Greater,
            (Part::Text(a), Part::Text(b)) => a.cmp(b),
        }
    }
}

/// A package version such as `2.6.3`.
///
/// Components are split on `.` and `-`. Numeric components compare
/// numerically and missing trailing components count as zero, so
/// `1.2 == 1.2.0`. The original text is kept for display.
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    parts: Vec<Part>,
}

impl Version {
    /// Parse a version string (e.g. "1.2.3", "4.0", "1.0.0-rc1")
    pub fn parse(s: &str) -> OctpkgResult<Self> {
        let raw = s.trim();
        if raw.is_empty() {
            return Err(OctpkgError::Version("Empty version string".to_string()));
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(OctpkgError::Version(format!(
                "Invalid version format: {}",
                raw
            )));
        }

        let parts: Vec<Part> = raw.split(['.', '-']).map(Part::parse).collect();
        if parts
            .iter()
            .any(|p| matches!(p, Part::Text(t) if t.is_empty()))
        {
            return Err(OctpkgError::Version(format!(
                "Invalid version format: {}",
                raw
            )));
        }

        Ok(Self {
            raw: raw.to_string(),
            parts,
        })
    }

    /// The version text as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        let zero = Part::Num(0);
        for i in 0..len {
            let a = self.parts.get(i).unwrap_or(&zero);
            let b = other.parts.get(i).unwrap_or(&zero);
            match a.cmp_part(b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

/// Compare two version strings.
///
/// Strings that fail to parse fall back to plain lexical comparison.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (Version::parse(a), Version::parse(b)) {
        (Ok(va), Ok(vb)) => va.cmp(&vb),
        _ => a.cmp(b),
    }
}
