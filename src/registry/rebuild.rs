//! Regenerate a scope's registry from what is on disk.

use super::{InstalledRecord, Registry};
use crate::core::path::arch_dir;
use crate::core::OctpkgResult;
use crate::package::descriptor::Descriptor;
use std::path::Path;
use walkdir::WalkDir;

/// Find `<prefix>/<dir>/packinfo/DESCRIPTION` files and build a record for
/// each. Unreadable descriptors are skipped with a warning.
pub fn scan_prefix(prefix: &Path, archprefix: &Path, arch: &str) -> OctpkgResult<Vec<InstalledRecord>> {
    if !prefix.is_dir() {
        return Ok(Vec::new());
    }

    let mut records = Vec::new();
    let walker = WalkDir::new(prefix)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let descriptor_path = entry.path().join("packinfo").join("DESCRIPTION");
        if !descriptor_path.is_file() {
            continue;
        }

        let descriptor = match Descriptor::load(&descriptor_path) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", entry.path().display(), e);
                continue;
            }
        };

        records.push(InstalledRecord {
            archdir: arch_dir(archprefix, &descriptor.name, &descriptor.version, arch),
            archprefix: archprefix.to_path_buf(),
            dir: entry.path().to_path_buf(),
            name: descriptor.name,
            version: descriptor.version,
            dependencies: descriptor.depends,
            description: descriptor.title,
            autoload: descriptor.autoload.unwrap_or(false),
            loaded: false,
        });
    }

    Ok(records)
}

/// Replace the registry with what `scan_prefix` finds. Packages the old
/// registry already knew keep their relative position. Returns the number
/// of records written.
pub fn rebuild(registry: &mut Registry, prefix: &Path, archprefix: &Path, arch: &str) -> OctpkgResult<usize> {
    let mut found = scan_prefix(prefix, archprefix, arch)?;

    let position = |r: &InstalledRecord| {
        registry
            .list()
            .iter()
            .position(|old| old.name == r.name && old.version == r.version)
            .unwrap_or(usize::MAX)
    };
    found.sort_by_key(|r| position(r));

    let count = found.len();
    registry.replace_all(found)?;
    Ok(count)
}
