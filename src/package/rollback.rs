use crate::core::OctpkgResult;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
enum Action {
    /// A path created during the step
    Remove(PathBuf),
    /// An existing path moved out of the way, put back on rollback
    Restore { aside: PathBuf, original: PathBuf },
}

/// Undoes the filesystem changes of an install step if the step fails.
///
/// Created paths are removed and set-aside paths are moved back, in reverse
/// registration order. Committing deletes the set-aside copies. Dropping a
/// manager that was never committed rolls back.
#[derive(Debug, Default)]
pub struct RollbackManager {
    actions: Vec<Action>,
    committed: bool,
}

impl RollbackManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a path to remove on rollback
    pub fn track(&mut self, path: impl Into<PathBuf>) {
        self.actions.push(Action::Remove(path.into()));
    }

    /// Create `path` (and parents) and track the topmost directory that did
    /// not exist before
    pub fn create_dir(&mut self, path: &Path) -> OctpkgResult<()> {
        let mut first_missing = None;
        for ancestor in path.ancestors() {
            if ancestor.exists() {
                break;
            }
            first_missing = Some(ancestor.to_path_buf());
        }
        fs::create_dir_all(path)?;
        if let Some(dir) = first_missing {
            self.track(dir);
        }
        Ok(())
    }

    /// Move an existing `path` to a hidden sibling so it can be replaced.
    /// Rollback moves it back; commit deletes it. A missing path is a no-op.
    pub fn set_aside(&mut self, path: &Path) -> OctpkgResult<()> {
        if !path.exists() {
            return Ok(());
        }
        let aside = aside_path(path);
        if aside.exists() {
            fs::remove_dir_all(&aside)?;
        }
        fs::rename(path, &aside)?;
        tracing::debug!("Moved {} aside", path.display());
        self.actions.push(Action::Restore {
            aside,
            original: path.to_path_buf(),
        });
        Ok(())
    }

    /// Keep the changes and drop the set-aside copies
    pub fn commit(mut self) {
        self.committed = true;
        for action in self.actions.drain(..) {
            if let Action::Restore { aside, .. } = action {
                if let Err(e) = fs::remove_dir_all(&aside) {
                    tracing::warn!("Could not remove {}: {}", aside.display(), e);
                }
            }
        }
    }

    /// Undo every action, newest first. Missing paths are ignored; other
    /// failures are logged.
    pub fn rollback(mut self) {
        self.undo_all();
        self.committed = true;
    }

    fn undo_all(&mut self) {
        while let Some(action) = self.actions.pop() {
            match action {
                Action::Remove(path) => remove_path(&path),
                Action::Restore { aside, original } => {
                    remove_path(&original);
                    match fs::rename(&aside, &original) {
                        Ok(()) => tracing::debug!("Restored {}", original.display()),
                        Err(e) => tracing::warn!(
                            "Could not restore {} from {}: {}",
                            original.display(),
                            aside.display(),
                            e
                        ),
                    }
                }
            }
        }
    }
}

impl Drop for RollbackManager {
    fn drop(&mut self) {
        if !self.committed {
            self.undo_all();
        }
    }
}

fn remove_path(path: &Path) {
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else if path.exists() {
        fs::remove_file(path)
    } else {
        return;
    };
    match result {
        Ok(()) => tracing::debug!("Rolled back {}", path.display()),
        Err(e) => tracing::warn!("Could not remove {}: {}", path.display(), e),
    }
}

fn aside_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(".octpkg-old");
    path.with_file_name(name)
}

/// Execute a function with automatic rollback on error
pub fn with_rollback<F, T>(f: F) -> OctpkgResult<T>
where
    F: FnOnce(&mut RollbackManager) -> OctpkgResult<T>,
{
    let mut rollback = RollbackManager::new();
    match f(&mut rollback) {
        Ok(result) => {
            rollback.commit();
            Ok(result)
        }
        Err(e) => {
            rollback.rollback();
            Err(e)
        }
    }
}
