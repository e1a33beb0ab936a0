//! Service container for dependency injection

use super::traits::{HookRunner, NativeBuilder, SourceFetcher};
use crate::cache::Cache;
use crate::core::OctpkgResult;
use crate::package::builder::MakeBuilder;
use crate::package::downloader::SourceDownloader;
use crate::package::hooks::OctaveHookRunner;
use std::sync::Arc;

/// Holds the collaborators of the transaction engine as trait objects so
/// tests can swap in mocks.
#[derive(Clone)]
pub struct ServiceContainer {
    pub fetcher: Arc<dyn SourceFetcher>,
    pub builder: Arc<dyn NativeBuilder>,
    pub hooks: Arc<dyn HookRunner>,
}

impl ServiceContainer {
    /// Production implementations: HTTP downloads into `cache`, `make`
    /// builds and the `octave` interpreter for hooks
    pub fn new(cache: Cache) -> OctpkgResult<Self> {
        Ok(Self {
            fetcher: Arc::new(SourceDownloader::new(cache)?),
            builder: Arc::new(MakeBuilder::new()),
            hooks: Arc::new(OctaveHookRunner::new()),
        })
    }

    pub fn with_providers(
        fetcher: Arc<dyn SourceFetcher>,
        builder: Arc<dyn NativeBuilder>,
        hooks: Arc<dyn HookRunner>,
    ) -> Self {
        Self {
            fetcher,
            builder,
            hooks,
        }
    }

    pub fn fetcher(&self) -> &dyn SourceFetcher {
        self.fetcher.as_ref()
    }

    pub fn builder(&self) -> &dyn NativeBuilder {
        self.builder.as_ref()
    }

    pub fn hooks(&self) -> &dyn HookRunner {
        self.hooks.as_ref()
    }
}
