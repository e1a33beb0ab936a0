//! Mock implementations of service traits for testing

use super::traits::{BuildOutput, HookRunner, NativeBuilder, SourceFetcher};
use crate::core::{OctpkgError, OctpkgResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Serves archives from a url -> path table
#[derive(Clone, Default)]
pub struct MockSourceFetcher {
    sources: Arc<Mutex<HashMap<String, PathBuf>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockSourceFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source(&self, url: &str, path: PathBuf) {
        self.sources.lock().unwrap().insert(url.to_string(), path);
    }

    /// Urls fetched so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceFetcher for MockSourceFetcher {
    async fn fetch(&self, url: &str) -> OctpkgResult<PathBuf> {
        self.requests.lock().unwrap().push(url.to_string());
        self.sources
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| OctpkgError::Package(format!("No mock source for {}", url)))
    }
}

/// Builder that writes one `.oct` file per package, or fails on request
#[derive(Clone, Default)]
pub struct MockNativeBuilder {
    pub fail: bool,
    builds: Arc<Mutex<Vec<PathBuf>>>,
}

impl MockNativeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn builds(&self) -> Vec<PathBuf> {
        self.builds.lock().unwrap().clone()
    }
}

impl NativeBuilder for MockNativeBuilder {
    fn build(&self, _package_dir: &Path, src_dir: &Path) -> OctpkgResult<BuildOutput> {
        self.builds.lock().unwrap().push(src_dir.to_path_buf());
        if self.fail {
            return Err(OctpkgError::Package("make exited with status 2".to_string()));
        }
        let artifact = src_dir.join("native.oct");
        std::fs::write(&artifact, b"\x7fELF")?;
        Ok(BuildOutput {
            arch_files: vec![artifact],
            inst_files: Vec::new(),
        })
    }
}

/// Records hook invocations; fails for scripts whose file name is listed
#[derive(Clone, Default)]
pub struct MockHookRunner {
    pub failing_scripts: Vec<String>,
    pub test_result: bool,
    runs: Arc<Mutex<Vec<PathBuf>>>,
}

impl MockHookRunner {
    pub fn new() -> Self {
        Self {
            test_result: true,
            ..Self::default()
        }
    }

    pub fn failing_on(script: &str) -> Self {
        Self {
            failing_scripts: vec![script.to_string()],
            ..Self::new()
        }
    }

    pub fn runs(&self) -> Vec<PathBuf> {
        self.runs.lock().unwrap().clone()
    }
}

impl HookRunner for MockHookRunner {
    fn run(&self, script: &Path, _working_dir: &Path) -> OctpkgResult<()> {
        self.runs.lock().unwrap().push(script.to_path_buf());
        let name = script
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.failing_scripts.contains(&name) {
            return Err(OctpkgError::Package(format!("{} raised an error", name)));
        }
        Ok(())
    }

    fn run_tests(&self, function_file: &Path, _search_path: &[PathBuf]) -> OctpkgResult<bool> {
        self.runs.lock().unwrap().push(function_file.to_path_buf());
        Ok(self.test_result)
    }
}
