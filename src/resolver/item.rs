use crate::cache::Cache;
use crate::core::OctpkgResult;
use octpkg_core::package::{DependencyConstraint, PackageId};
use std::path::{Path, PathBuf};

/// One request on its way through the resolver.
///
/// Every field may start out empty; resolution fills them from the index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionItem {
    /// What the user typed, for messages
    pub input: String,
    pub url: String,
    /// A bare name, a full `name@version`, or empty
    pub id: String,
    pub checksum: String,
    /// Source archive already on disk
    pub local_path: Option<PathBuf>,
    /// Ids of the items in the same request that depend on this one
    pub needed_by: Vec<String>,
    /// Dependencies not yet satisfied
    pub deps: Vec<DependencyConstraint>,
}

fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://") || input.starts_with("file://")
}

impl ResolutionItem {
    /// Classify raw input: an existing file is a local archive (checksummed
    /// now), something url-shaped is a url, anything else is an id.
    pub fn from_input(input: &str) -> OctpkgResult<Self> {
        let trimmed = input.trim();
        let path = Path::new(trimmed);

        if !is_url(trimmed) && path.is_file() {
            let local = path.canonicalize()?;
            return Ok(Self {
                input: trimmed.to_string(),
                url: local.to_string_lossy().into_owned(),
                checksum: Cache::checksum(&local)?,
                local_path: Some(local),
                ..Default::default()
            });
        }

        if is_url(trimmed) {
            return Ok(Self {
                input: trimmed.to_string(),
                url: trimmed.to_string(),
                ..Default::default()
            });
        }

        Ok(Self::from_id(trimmed))
    }

    /// An item naming a package (`name` or `name@version`)
    pub fn from_id(id: &str) -> Self {
        Self {
            input: id.to_string(),
            id: id.to_lowercase(),
            ..Default::default()
        }
    }

    /// The id, if it is a full `name@version`
    pub fn package_id(&self) -> Option<PackageId> {
        PackageId::parse(&self.id).ok()
    }

    /// Package name part of the id
    pub fn name(&self) -> &str {
        self.id.split_once('@').map(|(n, _)| n).unwrap_or(&self.id)
    }

    pub fn is_finished(&self) -> bool {
        self.deps.is_empty() && !self.id.is_empty()
    }
}

/// A resolved unit of work for the transaction engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanItem {
    /// Known when the item matched the index
    pub id: Option<PackageId>,
    pub url: String,
    pub checksum: String,
    pub local_path: Option<PathBuf>,
}

impl PlanItem {
    pub fn label(&self) -> String {
        match &self.id {
            Some(id) => id.to_string(),
            None => self.url.clone(),
        }
    }
}

impl From<ResolutionItem> for PlanItem {
    fn from(item: ResolutionItem) -> Self {
        Self {
            id: item.package_id(),
            url: item.url,
            checksum: item.checksum,
            local_path: item.local_path,
        }
    }
}
