//! Native builds of a package's `src/` directory

use crate::core::{OctpkgError, OctpkgResult};
use crate::di::{BuildOutput, NativeBuilder};
use std::path::{Path, PathBuf};
use std::process::Command;
use walkdir::WalkDir;

/// Extensions of compiled interpreter extensions
pub const ARCH_EXTENSIONS: &[&str] = &["oct", "mex"];

/// Runs `configure` and `make` with the interpreter's build tools
#[derive(Debug, Clone, Default)]
pub struct MakeBuilder;

impl MakeBuilder {
    pub fn new() -> Self {
        Self
    }

    fn run(cmd: &mut Command, what: &str) -> OctpkgResult<()> {
        tracing::debug!("Running {:?}", cmd);
        let status = cmd.status().map_err(|e| {
            OctpkgError::Package(format!("Failed to start {}: {}", what, e))
        })?;
        if !status.success() {
            return Err(OctpkgError::Package(format!(
                "{} failed with exit code: {}",
                what,
                status.code().unwrap_or(1)
            )));
        }
        Ok(())
    }
}

impl NativeBuilder for MakeBuilder {
    fn build(&self, package_dir: &Path, src_dir: &Path) -> OctpkgResult<BuildOutput> {
        let mkoctfile = which::which("mkoctfile").ok();

        let configure = src_dir.join("configure");
        if configure.is_file() {
            let mut cmd = Command::new("sh");
            cmd.arg("./configure").current_dir(src_dir);
            if let Some(mk) = &mkoctfile {
                cmd.env("MKOCTFILE", mk);
            }
            Self::run(&mut cmd, "configure")?;
        }

        if src_dir.join("Makefile").is_file() {
            let make = which::which("make")
                .map_err(|_| OctpkgError::Package("'make' is required to build this package".to_string()))?;
            let mut cmd = Command::new(make);
            cmd.current_dir(src_dir)
                .env("OCTPKG_PACKAGE_DIR", package_dir);
            if let Some(mk) = &mkoctfile {
                cmd.env("MKOCTFILE", mk);
            }
            Self::run(&mut cmd, "make")?;
        }

        collect_outputs(src_dir)
    }
}

/// Sort the files a build left in `src_dir` into arch and inst files
pub fn collect_outputs(src_dir: &Path) -> OctpkgResult<BuildOutput> {
    let mut output = BuildOutput::default();
    for entry in WalkDir::new(src_dir).max_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path: PathBuf = entry.path().to_path_buf();
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ARCH_EXTENSIONS.contains(&ext) => output.arch_files.push(path),
            Some("m") => output.inst_files.push(path),
            _ => {}
        }
    }
    Ok(output)
}
