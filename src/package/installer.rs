//! Install transaction
//!
//! Each plan item is installed on its own: a failure removes everything
//! created for that item and stops the run, while items installed before it
//! stay registered.

use crate::core::path::{arch_dir, ensure_dir, install_dir};
use crate::core::{OctpkgError, OctpkgResult};
use crate::di::{BuildOutput, ServiceContainer};
use crate::package::checksum::{ChecksumStatus, ChecksumVerifier};
use crate::package::descriptor::Descriptor;
use crate::package::directives;
use crate::package::downloader::PreparedItem;
use crate::package::extractor::PackageExtractor;
use crate::package::hooks::{ON_UNINSTALL, POST_INSTALL, PRE_INSTALL};
use crate::package::rollback::with_rollback;
use crate::registry::{InstalledRecord, RegistryStore, Scope};
use octpkg_core::package::HOST_RUNTIME;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Files every package must ship at its root
pub const REQUIRED_FILES: &[&str] = &["DESCRIPTION", "COPYING"];

/// Optional top-level files copied into `packinfo/`
const PACKINFO_FILES: &[&str] = &["CITATION", "NEWS", "ONEWS", "ChangeLog", "INDEX", ON_UNINSTALL];

/// Where and how packages get installed
#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub scope: Scope,
    pub prefix: PathBuf,
    pub archprefix: PathBuf,
    pub arch: String,
    /// Parent of per-archive scratch directories
    pub scratch_dir: PathBuf,
    pub host_version: String,
    pub nodeps: bool,
    pub verify_checksums: bool,
}

/// Runs install transactions against one scope
pub struct PackageInstaller<'a> {
    services: &'a ServiceContainer,
    options: InstallOptions,
    extractor: PackageExtractor,
    verifier: ChecksumVerifier,
}

impl<'a> PackageInstaller<'a> {
    pub fn new(services: &'a ServiceContainer, options: InstallOptions) -> Self {
        Self {
            services,
            extractor: PackageExtractor::new(options.scratch_dir.clone()),
            verifier: ChecksumVerifier::new(options.verify_checksums),
            options,
        }
    }

    /// Initialize the directory structure
    pub fn init(&self) -> OctpkgResult<()> {
        ensure_dir(&self.options.prefix)?;
        ensure_dir(&self.options.archprefix)?;
        ensure_dir(&self.options.scratch_dir)?;
        Ok(())
    }

    /// Install every item in order, stopping at the first failure
    pub fn install_all(
        &self,
        items: Vec<PreparedItem>,
        registry: &mut RegistryStore,
    ) -> OctpkgResult<Vec<InstalledRecord>> {
        self.init()?;
        let mut installed = Vec::with_capacity(items.len());
        for item in items {
            installed.push(self.install(&item, registry)?);
        }
        Ok(installed)
    }

    /// Install one prepared item
    pub fn install(&self, item: &PreparedItem, registry: &mut RegistryStore) -> OctpkgResult<InstalledRecord> {
        let label = item.plan.label();
        println!("Installing {}", label);

        let step = |name: &str, e: OctpkgError| OctpkgError::step(label.as_str(), name, e);

        match self.verifier.verify(&item.archive, &item.plan.checksum).map_err(|e| step("checksum", e))? {
            ChecksumStatus::Mismatch { expected, actual } => tracing::warn!(
                "Checksum mismatch for {}: expected {}, got {}",
                label,
                expected,
                actual
            ),
            ChecksumStatus::Verified => tracing::debug!("Checksum verified for {}", label),
            ChecksumStatus::Skipped => {}
        }

        let (record, scratch) = with_rollback(|rb| {
            let extracted = self.extractor.extract(&item.archive).map_err(|e| step("extract", e))?;
            rb.track(&extracted.scratch);
            let root = extracted.root.as_path();

            for required in REQUIRED_FILES {
                if !root.join(required).is_file() {
                    return Err(step(
                        "validate",
                        OctpkgError::Package(format!("package is missing {}", required)),
                    ));
                }
            }

            let descriptor =
                Descriptor::load(&root.join("DESCRIPTION")).map_err(|e| step("read DESCRIPTION", e))?;
            if let Some(id) = &item.plan.id {
                if id.name != descriptor.name || id.version != descriptor.version {
                    tracing::warn!(
                        "{} unpacked as {}@{}",
                        id,
                        descriptor.name,
                        descriptor.version
                    );
                }
            }

            if !self.options.nodeps {
                self.check_dependencies(&descriptor, registry)
                    .map_err(|e| step("check dependencies", e))?;
            }

            self.run_hook(root, PRE_INSTALL).map_err(|e| step("pre_install", e))?;

            let build = self.build(root).map_err(|e| step("build", e))?;

            let dir = install_dir(&self.options.prefix, &descriptor.name, &descriptor.version);
            let archdir = arch_dir(
                &self.options.archprefix,
                &descriptor.name,
                &descriptor.version,
                &self.options.arch,
            );
            // An existing install of this id comes back if a later step fails
            rb.set_aside(&dir).map_err(|e| step("copy files", e))?;
            rb.set_aside(&archdir).map_err(|e| step("copy files", e))?;
            rb.create_dir(&dir).map_err(|e| step("copy files", e))?;
            if !build.arch_files.is_empty() {
                rb.create_dir(&archdir).map_err(|e| step("copy files", e))?;
            }
            self.copy_files(root, &dir, &archdir, &build)
                .map_err(|e| step("copy files", e))?;

            let mut found = directives::scan(&dir).map_err(|e| step("generate PKG_ADD", e))?;
            let from_src = directives::scan(&root.join("src")).map_err(|e| step("generate PKG_ADD", e))?;
            found.add.extend(from_src.add);
            found.del.extend(from_src.del);
            directives::write(&dir, &found).map_err(|e| step("generate PKG_ADD", e))?;

            self.run_hook(root, POST_INSTALL).map_err(|e| step("post_install", e))?;

            let record = InstalledRecord {
                name: descriptor.name.clone(),
                version: descriptor.version.clone(),
                dir,
                archdir,
                archprefix: self.options.archprefix.clone(),
                dependencies: descriptor.depends.clone(),
                description: descriptor.title.clone(),
                autoload: descriptor.autoload.unwrap_or(false),
                loaded: false,
            };

            let replaced = registry
                .add(record.clone(), self.options.scope)
                .map_err(|e| step("register", e))?;
            if let Some(old) = replaced {
                remove_replaced(&old, &record);
            }

            Ok((record, extracted.scratch.clone()))
        })?;

        if let Err(e) = fs::remove_dir_all(&scratch) {
            tracing::debug!("Could not remove scratch {}: {}", scratch.display(), e);
        }

        println!("  ✓ Installed {}", record.id());
        Ok(record)
    }

    /// Every dependency must be met by the host runtime or the current
    /// registry (which includes items installed earlier in this run)
    fn check_dependencies(&self, descriptor: &Descriptor, registry: &RegistryStore) -> OctpkgResult<()> {
        let installed = registry.merged();
        let unmet: Vec<String> = descriptor
            .depends
            .iter()
            .filter(|dep| {
                if dep.package == HOST_RUNTIME {
                    return !dep.is_satisfied_by(&self.options.host_version);
                }
                !installed
                    .iter()
                    .any(|r| r.name == dep.package && dep.is_satisfied_by(&r.version))
            })
            .map(|dep| format!("{}@{} needs {}", descriptor.name, descriptor.version, dep))
            .collect();

        if unmet.is_empty() {
            Ok(())
        } else {
            Err(OctpkgError::UnsatisfiedDependency(unmet))
        }
    }

    fn run_hook(&self, root: &Path, script: &str) -> OctpkgResult<()> {
        let path = root.join(script);
        if !path.is_file() {
            return Ok(());
        }
        tracing::debug!("Running {}", path.display());
        self.services.hooks().run(&path, root)
    }

    fn build(&self, root: &Path) -> OctpkgResult<BuildOutput> {
        let src = root.join("src");
        if !src.is_dir() {
            return Ok(BuildOutput::default());
        }
        println!("  Building native code...");
        self.services.builder().build(root, &src)
    }

    fn copy_files(&self, root: &Path, dir: &Path, archdir: &Path, build: &BuildOutput) -> OctpkgResult<()> {
        copy_tree(&root.join("inst"), dir)?;
        for sub in ["doc", "bin"] {
            let from = root.join(sub);
            if from.is_dir() {
                copy_tree(&from, &dir.join(sub))?;
            }
        }

        for file in &build.inst_files {
            copy_into(file, dir)?;
        }
        for file in &build.arch_files {
            copy_into(file, archdir)?;
        }

        let packinfo = dir.join("packinfo");
        fs::create_dir_all(&packinfo)?;
        for name in REQUIRED_FILES.iter().chain(PACKINFO_FILES) {
            let from = root.join(name);
            if from.is_file() {
                fs::copy(&from, packinfo.join(name))?;
            }
        }
        Ok(())
    }
}

fn copy_into(file: &Path, dir: &Path) -> OctpkgResult<()> {
    let name = file
        .file_name()
        .ok_or_else(|| OctpkgError::Path(format!("Not a file: {}", file.display())))?;
    fs::copy(file, dir.join(name))?;
    Ok(())
}

/// Copy the contents of `from` into `to`; a missing `from` copies nothing
pub fn copy_tree(from: &Path, to: &Path) -> OctpkgResult<()> {
    if !from.is_dir() {
        return Ok(());
    }
    for entry in WalkDir::new(from).min_depth(1) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| OctpkgError::Path(e.to_string()))?;
        let target = to.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Remove the directories of a same-name record that was just replaced
fn remove_replaced(old: &InstalledRecord, new: &InstalledRecord) {
    for (old_dir, new_dir) in [(&old.dir, &new.dir), (&old.archdir, &new.archdir)] {
        if old_dir == new_dir || !old_dir.exists() {
            continue;
        }
        match fs::remove_dir_all(old_dir) {
            Ok(()) => tracing::info!("Removed {} ({})", old_dir.display(), old.id()),
            Err(e) => tracing::warn!("Could not remove {}: {}", old_dir.display(), e),
        }
    }
}
