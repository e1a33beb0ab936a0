use crate::core::error::{OctpkgError, OctpkgResult};
use crate::core::version::Version;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Version comparator of a dependency constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "==", alias = "=")]
    Eq,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = ">")]
    Gt,
    /// No comparator: any version is acceptable.
    #[default]
    #[serde(rename = "")]
    Any,
}

impl Operator {
    pub fn parse(s: &str) -> OctpkgResult<Self> {
        match s.trim() {
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Le),
            "==" | "=" => Ok(Operator::Eq),
            ">=" => Ok(Operator::Ge),
            ">" => Ok(Operator::Gt),
            "" => Ok(Operator::Any),
            other => Err(OctpkgError::Version(format!(
                "Unknown version operator '{}'",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Eq => "==",
            Operator::Ge => ">=",
            Operator::Gt => ">",
            Operator::Any => "",
        }
    }

    /// Whether `have <op> want` holds.
    pub fn holds(&self, have: &Version, want: &Version) -> bool {
        match self {
            Operator::Lt => have < want,
            Operator::Le => have <= want,
            Operator::Eq => have == want,
            Operator::Ge => have >= want,
            Operator::Gt => have > want,
            Operator::Any => true,
        }
    }
}

/// A dependency on another package, optionally bounded by one comparator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyConstraint {
    pub package: String,
    #[serde(default)]
    pub operator: Operator,
    #[serde(default)]
    pub version: String,
}

impl DependencyConstraint {
    /// A constraint accepting any version of `package`.
    pub fn any(package: impl Into<String>) -> Self {
        Self {
            package: package.into().to_lowercase(),
            operator: Operator::Any,
            version: String::new(),
        }
    }

    pub fn new(package: impl Into<String>, operator: Operator, version: impl Into<String>) -> Self {
        let version = version.into();
        // An operator without a version (or the reverse) accepts anything
        let (operator, version) = if operator == Operator::Any || version.trim().is_empty() {
            (Operator::Any, String::new())
        } else {
            (operator, version.trim().to_string())
        };
        Self {
            package: package.into().trim().to_lowercase(),
            operator,
            version,
        }
    }

    /// Parse `name`, `name (op version)` or `name op version`.
    pub fn parse(s: &str) -> OctpkgResult<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(OctpkgError::Package("Empty dependency".to_string()));
        }

        let (name, rest) = match s.find(|c: char| c == '(' || c == '<' || c == '>' || c == '=') {
            Some(pos) => (s[..pos].trim(), s[pos..].trim()),
            None => (s, ""),
        };
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(OctpkgError::Package(format!("Invalid dependency '{}'", s)));
        }

        let rest = rest
            .strip_prefix('(')
            .map(|r| r.strip_suffix(')').unwrap_or(r))
            .unwrap_or(rest)
            .trim();
        if rest.is_empty() {
            return Ok(Self::any(name));
        }

        let op_len = rest
            .find(|c: char| c != '<' && c != '>' && c != '=')
            .unwrap_or(rest.len());
        let operator = Operator::parse(&rest[..op_len])?;
        let version = rest[op_len..].trim();
        if operator == Operator::Any || version.is_empty() {
            return Err(OctpkgError::Package(format!("Invalid dependency '{}'", s)));
        }
        Version::parse(version)?;

        Ok(Self::new(name, operator, version))
    }

    /// Parse a comma separated `Depends:` list.
    pub fn parse_list(s: &str) -> OctpkgResult<Vec<Self>> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(Self::parse)
            .collect()
    }

    /// Whether this constraint places no bound on the version.
    pub fn is_any(&self) -> bool {
        self.operator == Operator::Any || self.version.is_empty()
    }

    /// Whether `version` satisfies this constraint. Unparseable versions
    /// only satisfy unbounded constraints.
    pub fn is_satisfied_by(&self, version: &str) -> bool {
        if self.is_any() {
            return true;
        }
        match (Version::parse(version), Version::parse(&self.version)) {
            (Ok(have), Ok(want)) => self.operator.holds(&have, &want),
            _ => false,
        }
    }
}

impl fmt::Display for DependencyConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_any() {
            write!(f, "{}", self.package)
        } else {
            write!(f, "{} {} {}", self.package, self.operator.as_str(), self.version)
        }
    }
}
