use crate::core::path::ensure_dir;
use crate::core::{OctpkgError, OctpkgResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Interpreter search path: ordered directories, highest priority first.
///
/// Persisted as one directory per line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    /// Load from `path`; a missing file is an empty search path
    pub fn load(path: &Path) -> OctpkgResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let dirs = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(PathBuf::from)
            .collect();
        Ok(Self { dirs })
    }

    pub fn save(&self, path: &Path) -> OctpkgResult<()> {
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }
        let mut content = String::new();
        for dir in &self.dirs {
            content.push_str(&dir.to_string_lossy());
            content.push('\n');
        }
        fs::write(path, content).map_err(|e| OctpkgError::Persistence {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    pub fn contains(&self, dir: &Path) -> bool {
        self.dirs.iter().any(|d| d == dir)
    }

    /// Put `dirs` at the front in the given order, like `addpath`.
    /// Directories already present move to their new position.
    pub fn prepend<I>(&mut self, dirs: I)
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut front: Vec<PathBuf> = Vec::new();
        for dir in dirs {
            if !front.contains(&dir) {
                front.push(dir);
            }
        }
        self.dirs.retain(|d| !front.contains(d));
        front.append(&mut self.dirs);
        self.dirs = front;
    }

    /// Remove every occurrence of the given directories; returns how many
    /// entries were dropped
    pub fn remove<'a, I>(&mut self, dirs: I) -> usize
    where
        I: IntoIterator<Item = &'a Path>,
    {
        let before = self.dirs.len();
        for dir in dirs {
            self.dirs.retain(|d| d != dir);
        }
        before - self.dirs.len()
    }

    /// Platform path-list form, suitable for `OCTAVE_PATH`
    pub fn to_env_string(&self) -> OctpkgResult<String> {
        let joined = std::env::join_paths(&self.dirs)
            .map_err(|e| OctpkgError::Path(format!("Cannot build search path: {}", e)))?;
        Ok(joined.to_string_lossy().into_owned())
    }
}
