//! Package DESCRIPTION files
//!
//! RFC-822 style `Key: value` lines. Lines starting with whitespace continue
//! the previous value; lines starting with `#` are comments. Keys are
//! case-insensitive.

use crate::core::version::Version;
use crate::core::{OctpkgError, OctpkgResult};
use octpkg_core::package::{DependencyConstraint, BOOTSTRAP_DEPENDENCY};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Keys every DESCRIPTION must carry
pub const REQUIRED_FIELDS: &[&str] = &[
    "name",
    "version",
    "date",
    "author",
    "maintainer",
    "title",
    "description",
];

/// Parsed DESCRIPTION.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub name: String,
    pub version: String,
    pub title: String,
    pub description: String,
    pub depends: Vec<DependencyConstraint>,
    /// `Autoload: yes|no`; absent means the package decides at load time
    pub autoload: Option<bool>,
    /// Every field, keyed by lowercase name
    pub fields: BTreeMap<String, String>,
}

impl Descriptor {
    pub fn load(path: &Path) -> OctpkgResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            OctpkgError::Package(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> OctpkgResult<Self> {
        let fields = parse_fields(content)?;

        let missing: Vec<&str> = REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|k| fields.get(*k).map_or(true, |v| v.is_empty()))
            .collect();
        if !missing.is_empty() {
            return Err(OctpkgError::Package(format!(
                "DESCRIPTION is missing required field(s): {}",
                missing.join(", ")
            )));
        }

        let name = fields["name"].to_lowercase();
        if name.contains(char::is_whitespace) || name.contains('@') {
            return Err(OctpkgError::Package(format!("Invalid package name '{}'", name)));
        }

        let version = fields["version"].clone();
        Version::parse(&version)?;

        let depends = match fields.get("depends") {
            Some(list) => DependencyConstraint::parse_list(list)?
                .into_iter()
                .filter(|d| d.package != BOOTSTRAP_DEPENDENCY)
                .collect(),
            None => Vec::new(),
        };

        let autoload = match fields.get("autoload").map(|v| v.to_lowercase()) {
            None => None,
            Some(v) if matches!(v.as_str(), "yes" | "on" | "true") => Some(true),
            Some(v) if matches!(v.as_str(), "no" | "off" | "false") => Some(false),
            Some(v) => {
                return Err(OctpkgError::Package(format!(
                    "Invalid Autoload value '{}'",
                    v
                )))
            }
        };

        Ok(Self {
            name,
            version,
            title: fields["title"].clone(),
            description: fields["description"].clone(),
            depends,
            autoload,
            fields,
        })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(&key.to_lowercase()).map(String::as_str)
    }
}

fn parse_fields(content: &str) -> OctpkgResult<BTreeMap<String, String>> {
    let mut fields: BTreeMap<String, String> = BTreeMap::new();
    let mut current: Option<String> = None;

    for (lineno, line) in content.lines().enumerate() {
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with(char::is_whitespace) {
            let key = current.as_ref().ok_or_else(|| {
                OctpkgError::Package(format!(
                    "DESCRIPTION line {}: continuation without a field",
                    lineno + 1
                ))
            })?;
            if let Some(value) = fields.get_mut(key) {
                value.push(' ');
                value.push_str(line.trim());
            }
            continue;
        }

        let (key, value) = line.split_once(':').ok_or_else(|| {
            OctpkgError::Package(format!(
                "DESCRIPTION line {}: expected 'Key: value'",
                lineno + 1
            ))
        })?;
        let key = key.trim().to_lowercase();
        fields.insert(key.clone(), value.trim().to_string());
        current = Some(key);
    }

    Ok(fields)
}
