//! Package hook scripts, run through the `octave` interpreter

use crate::core::{OctpkgError, OctpkgResult};
use crate::di::HookRunner;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Runs before anything is copied into the install directory
pub const PRE_INSTALL: &str = "pre_install.m";
/// Runs after files are in place, before the package is registered
pub const POST_INSTALL: &str = "post_install.m";
/// Lives in `packinfo/`, runs before the install directories are removed
pub const ON_UNINSTALL: &str = "on_uninstall.m";

const INTERPRETER: &str = "octave";

/// Hook runner backed by the `octave` executable found on `PATH`
#[derive(Debug, Clone, Default)]
pub struct OctaveHookRunner {
    interpreter: Option<PathBuf>,
}

impl OctaveHookRunner {
    pub fn new() -> Self {
        Self {
            interpreter: which::which(INTERPRETER).ok(),
        }
    }

    /// Use a specific interpreter binary
    pub fn with_interpreter(path: PathBuf) -> Self {
        Self {
            interpreter: Some(path),
        }
    }

    fn interpreter(&self) -> OctpkgResult<&Path> {
        self.interpreter.as_deref().ok_or_else(|| {
            OctpkgError::Package(format!(
                "'{}' was not found on PATH; it is needed to run package scripts",
                INTERPRETER
            ))
        })
    }

    fn eval(&self, code: &str, working_dir: &Path, search_path: &[PathBuf]) -> OctpkgResult<bool> {
        let mut cmd = Command::new(self.interpreter()?);
        cmd.args(["--no-gui", "--no-window-system", "--quiet", "--norc", "--eval", code])
            .current_dir(working_dir);
        if !search_path.is_empty() {
            let joined = std::env::join_paths(search_path)
                .map_err(|e| OctpkgError::Path(format!("Cannot build search path: {}", e)))?;
            cmd.env("OCTAVE_PATH", joined);
        }
        tracing::debug!("Running {:?}", cmd);
        Ok(cmd.status()?.success())
    }
}

/// Quote a path as an interpreter string literal
fn quote(path: &Path) -> String {
    format!("'{}'", path.to_string_lossy().replace('\'', "''"))
}

impl HookRunner for OctaveHookRunner {
    fn run(&self, script: &Path, working_dir: &Path) -> OctpkgResult<()> {
        let code = format!("source({});", quote(script));
        if self.eval(&code, working_dir, &[])? {
            Ok(())
        } else {
            Err(OctpkgError::Package(format!(
                "{} exited with an error",
                script.display()
            )))
        }
    }

    fn run_tests(&self, function_file: &Path, search_path: &[PathBuf]) -> OctpkgResult<bool> {
        let code = format!("exit(!test({}, 'quiet'));", quote(function_file));
        let dir = function_file.parent().unwrap_or(Path::new("."));
        self.eval(&code, dir, search_path)
    }
}
