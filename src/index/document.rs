//! Wire format of a package index document.
//!
//! ```json
//! { "io": { "description": "...",
//!           "versions": [ { "id": "2.6.3", "url": "...", "sha256": "...",
//!                           "depends": [ { "name": "octave (>= 4.0.0)" } ] } ] } }
//! ```

use crate::core::{OctpkgError, OctpkgResult};
use octpkg_core::package::{DependencyConstraint, Operator};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Raw index document: package name to package record.
pub type RawIndex = BTreeMap<String, RawPackage>;

#[derive(Debug, Clone, Deserialize)]
pub struct RawPackage {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub versions: Vec<RawVersion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawVersion {
    /// Either a bare version or a full `name@version` id
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, alias = "checksum")]
    pub sha256: String,
    #[serde(default)]
    pub depends: Vec<RawDependency>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawDependency {
    Text(String),
    Structured {
        name: String,
        #[serde(default)]
        operator: String,
        #[serde(default)]
        version: String,
    },
}

impl RawDependency {
    /// Normalize into a constraint. The `name` field may carry the
    /// `name (op version)` shorthand when no operator is given.
    pub fn to_constraint(&self) -> OctpkgResult<DependencyConstraint> {
        match self {
            RawDependency::Text(text) => DependencyConstraint::parse(text),
            RawDependency::Structured {
                name,
                operator,
                version,
            } => {
                if operator.trim().is_empty() && version.trim().is_empty() {
                    DependencyConstraint::parse(name)
                } else {
                    Ok(DependencyConstraint::new(
                        name.as_str(),
                        Operator::parse(operator)?,
                        version.as_str(),
                    ))
                }
            }
        }
    }
}

/// Parse an index document from JSON text
pub fn parse(content: &str) -> OctpkgResult<RawIndex> {
    serde_json::from_str(content)
        .map_err(|e| OctpkgError::Lookup(format!("Invalid index document: {}", e)))
}
