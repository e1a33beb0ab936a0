use crate::cache::Cache;
use crate::core::{OctpkgError, OctpkgResult};
use crate::di::SourceFetcher;
use crate::resolver::PlanItem;
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

/// Downloads source archives into the cache
pub struct SourceDownloader {
    client: Client,
    cache: Cache,
}

impl SourceDownloader {
    pub fn new(cache: Cache) -> OctpkgResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("octpkg/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, cache })
    }

    /// Download a source archive, reusing the cached copy when present.
    /// `file://` urls and plain paths are used in place.
    pub async fn download_source(&self, url: &str) -> OctpkgResult<PathBuf> {
        if let Some(path) = local_path(url) {
            if !path.is_file() {
                return Err(OctpkgError::Package(format!(
                    "Source archive not found: {}",
                    path.display()
                )));
            }
            return Ok(path);
        }

        let cache_path = self.cache.source_path(url);
        if self.cache.exists(&cache_path) {
            tracing::debug!("Using cached source {}", cache_path.display());
            return Ok(cache_path);
        }

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner.set_message(format!("Downloading {}", url));

        let result = self.get_bytes(url).await;
        spinner.finish_and_clear();
        let bytes = result?;

        self.cache.write(&cache_path, &bytes)?;
        Ok(cache_path)
    }

    async fn get_bytes(&self, url: &str) -> OctpkgResult<Vec<u8>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl SourceFetcher for SourceDownloader {
    async fn fetch(&self, url: &str) -> OctpkgResult<PathBuf> {
        self.download_source(url).await
    }
}

/// Path of a `file://` url or a plain filesystem path
pub fn local_path(url: &str) -> Option<PathBuf> {
    if let Some(rest) = url.strip_prefix("file://") {
        return Some(PathBuf::from(rest));
    }
    if url.contains("://") {
        return None;
    }
    Some(Path::new(url).to_path_buf())
}

/// A plan item whose source bytes are on disk
#[derive(Debug, Clone)]
pub struct PreparedItem {
    pub plan: PlanItem,
    pub archive: PathBuf,
}

/// Fetches the sources of a plan concurrently
pub struct ParallelDownloader {
    fetcher: Arc<dyn SourceFetcher>,
    max_concurrent: usize,
}

impl ParallelDownloader {
    pub fn new(fetcher: Arc<dyn SourceFetcher>, max_concurrent: Option<usize>) -> Self {
        Self {
            fetcher,
            max_concurrent: max_concurrent.unwrap_or(4).max(1),
        }
    }

    /// Fetch every item without a local archive. The result keeps plan
    /// order; the first failure is returned after all tasks finish.
    pub async fn prepare(&self, plan: Vec<PlanItem>) -> OctpkgResult<Vec<PreparedItem>> {
        let mut archives: Vec<Option<PathBuf>> = plan.iter().map(|p| p.local_path.clone()).collect();
        let mut join_set = JoinSet::new();
        let mut first_error = None;

        for (slot, item) in plan.iter().enumerate() {
            if archives[slot].is_some() {
                continue;
            }
            if join_set.len() >= self.max_concurrent {
                if let Some(joined) = join_set.join_next().await {
                    record(joined, &mut archives, &mut first_error);
                }
            }
            let fetcher = Arc::clone(&self.fetcher);
            let url = item.url.clone();
            join_set.spawn(async move { (slot, fetcher.fetch(&url).await) });
        }

        while let Some(joined) = join_set.join_next().await {
            record(joined, &mut archives, &mut first_error);
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        plan.into_iter()
            .zip(archives)
            .map(|(plan, archive)| {
                let archive = archive.ok_or_else(|| {
                    OctpkgError::Package(format!("No source archive for {}", plan.label()))
                })?;
                Ok(PreparedItem { plan, archive })
            })
            .collect()
    }
}

type Joined = Result<(usize, OctpkgResult<PathBuf>), tokio::task::JoinError>;

fn record(joined: Joined, archives: &mut [Option<PathBuf>], first_error: &mut Option<OctpkgError>) {
    match joined {
        Ok((slot, Ok(path))) => archives[slot] = Some(path),
        Ok((_, Err(e))) => {
            first_error.get_or_insert(e);
        }
        Err(e) => {
            first_error.get_or_insert(OctpkgError::Package(format!("Download task failed: {}", e)));
        }
    }
}
