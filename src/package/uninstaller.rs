use crate::core::{OctpkgError, OctpkgResult};
use crate::di::ServiceContainer;
use crate::loader::SearchPath;
use crate::package::hooks::ON_UNINSTALL;
use crate::registry::{InstalledRecord, RegistryStore, Scope};
use crate::suggest;
use octpkg_core::package::{PackageId, HOST_RUNTIME};
use std::fs;
use std::path::{Path, PathBuf};

/// Uninstall settings
#[derive(Debug, Clone)]
pub struct UninstallOptions {
    pub scope: Scope,
    pub nodeps: bool,
    /// File backing the interpreter search path
    pub search_path_file: PathBuf,
}

/// Removes installed packages from one scope
pub struct PackageUninstaller<'a> {
    services: &'a ServiceContainer,
    options: UninstallOptions,
}

impl<'a> PackageUninstaller<'a> {
    pub fn new(services: &'a ServiceContainer, options: UninstallOptions) -> Self {
        Self { services, options }
    }

    /// Pick the records named by `requests`: an exact `name@version`, or
    /// the first record with that name in the scope listing
    pub fn select_targets(&self, requests: &[String], registry: &RegistryStore) -> OctpkgResult<Vec<InstalledRecord>> {
        let records = registry.list(self.options.scope);
        let mut targets: Vec<InstalledRecord> = Vec::new();

        for request in requests {
            let request = request.trim().to_lowercase();
            let found = if request.contains('@') {
                let id = PackageId::parse(&request)?;
                records.iter().find(|r| r.id() == id)
            } else {
                records.iter().find(|r| r.name == request)
            };

            match found {
                Some(record) => {
                    if !targets.iter().any(|t| t.id() == record.id()) {
                        targets.push(record.clone());
                    }
                }
                None => {
                    let name = request.split('@').next().unwrap_or(&request);
                    let hint = suggest::hint(name, records.iter().map(|r| r.name.as_str()));
                    return Err(OctpkgError::Package(format!(
                        "Package '{}' is not installed in the {} scope{}",
                        request, self.options.scope, hint
                    )));
                }
            }
        }

        Ok(targets)
    }

    /// Uninstall every request, returning the removed records
    pub fn uninstall(&self, requests: &[String], registry: &mut RegistryStore) -> OctpkgResult<Vec<InstalledRecord>> {
        let targets = self.select_targets(requests, registry)?;
        if targets.is_empty() {
            return Ok(targets);
        }

        let unmet = unmet_after_removal(&registry.merged(), &targets);
        if !unmet.is_empty() {
            if self.options.nodeps {
                for line in &unmet {
                    tracing::warn!("{}", line);
                }
            } else {
                return Err(OctpkgError::UnsatisfiedDependency(unmet));
            }
        }

        let mut search_path = SearchPath::load(&self.options.search_path_file)?;
        for target in &targets {
            self.remove_one(target, registry)?;
            // A package stays on the path until its removal has gone through
            if search_path.remove([target.dir.as_path(), target.archdir.as_path()]) > 0 {
                search_path.save(&self.options.search_path_file)?;
            }
        }
        Ok(targets)
    }

    fn remove_one(&self, target: &InstalledRecord, registry: &mut RegistryStore) -> OctpkgResult<()> {
        let id = target.id();
        let label = id.to_string();
        println!("Uninstalling {}", label);

        let hook = target.dir.join("packinfo").join(ON_UNINSTALL);
        if hook.is_file() {
            self.services
                .hooks()
                .run(&hook, &target.dir)
                .map_err(|e| OctpkgError::step(label.as_str(), "on_uninstall", e))?;
        }

        if target.archdir != target.dir {
            remove_dir(&target.archdir).map_err(|e| OctpkgError::step(label.as_str(), "remove files", e))?;
            // archprefix/name-version is left behind once its arch dir goes
            if let Some(parent) = target.archdir.parent() {
                if parent != target.archprefix && parent != target.dir {
                    let _ = fs::remove_dir(parent);
                }
            }
        }
        remove_dir(&target.dir).map_err(|e| OctpkgError::step(label.as_str(), "remove files", e))?;

        registry
            .remove(|r| r.id() == id, self.options.scope)
            .map_err(|e| OctpkgError::step(label.as_str(), "register", e))?;

        println!("  ✓ Removed {}", label);
        Ok(())
    }
}

/// Dependency lines of the remaining records that nothing left satisfies
pub fn unmet_after_removal(records: &[InstalledRecord], targets: &[InstalledRecord]) -> Vec<String> {
    let is_target = |r: &InstalledRecord| targets.iter().any(|t| t.name == r.name && t.version == r.version);
    let remaining: Vec<&InstalledRecord> = records.iter().filter(|r| !is_target(r)).collect();

    let mut lines = Vec::new();
    for record in &remaining {
        for dep in &record.dependencies {
            if dep.package == HOST_RUNTIME {
                continue;
            }
            // Only edges onto a target can break
            if !targets.iter().any(|t| t.name == dep.package) {
                continue;
            }
            let still_met = remaining
                .iter()
                .any(|r| r.name == dep.package && dep.is_satisfied_by(&r.version));
            if !still_met {
                lines.push(format!("{} needs {}", record.id(), dep));
            }
        }
    }
    lines
}

fn remove_dir(dir: &Path) -> OctpkgResult<()> {
    if !dir.exists() {
        tracing::warn!("Directory {} does not exist", dir.display());
        return Ok(());
    }
    fs::remove_dir_all(dir)?;
    Ok(())
}
