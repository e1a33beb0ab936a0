//! Trait definitions for dependency injection
//!
//! The transaction engine only talks to the outside world (network, native
//! toolchain, interpreter) through these traits.

use crate::core::OctpkgResult;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Fetches package source archives
///
/// Implementations should be thread-safe (Send + Sync).
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Make the archive at `url` available locally and return its path
    async fn fetch(&self, url: &str) -> OctpkgResult<PathBuf>;
}

/// Files produced by a native build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOutput {
    /// Architecture-specific artifacts (`.oct`, `.mex`)
    pub arch_files: Vec<PathBuf>,
    /// Architecture-independent files generated into `src/` (`.m`)
    pub inst_files: Vec<PathBuf>,
}

/// Builds the `src/` directory of an unpacked package
pub trait NativeBuilder: Send + Sync {
    /// Build in `src_dir`; `package_dir` is the unpacked package root
    fn build(&self, package_dir: &Path, src_dir: &Path) -> OctpkgResult<BuildOutput>;
}

/// Runs package hook scripts through the interpreter
pub trait HookRunner: Send + Sync {
    /// Run `script` with `working_dir` as the current directory
    fn run(&self, script: &Path, working_dir: &Path) -> OctpkgResult<()>;

    /// Run `%!test` blocks for one function file; returns whether all passed
    fn run_tests(&self, function_file: &Path, search_path: &[PathBuf]) -> OctpkgResult<bool>;
}
