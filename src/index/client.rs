use crate::cache::{Cache, IndexCache};
use crate::config::{Config, IndexSource};
use crate::core::{OctpkgError, OctpkgResult};
use crate::index::PackageIndex;
use crate::package::downloader::local_path;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// A cached index older than this triggers a warning when it is used
pub const STALE_AFTER_DAYS: i64 = 7;

/// Fetches, caches and merges the configured package indices
pub struct IndexClient {
    client: Client,
    cache: Cache,
    sources: Vec<IndexSource>,
    session: IndexCache<PackageIndex>,
    nocache: bool,
}

impl IndexClient {
    /// Create a new index client. With `nocache` every call refetches and a
    /// failed fetch is not answered from disk.
    pub fn new(config: &Config, cache: Cache, nocache: bool) -> OctpkgResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("octpkg/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            cache,
            sources: config.indices.clone(),
            session: IndexCache::new(Duration::from_secs(config.index_cache_ttl_minutes * 60)),
            nocache,
        })
    }

    /// The merged index, fetched on first use
    pub async fn index(&mut self) -> OctpkgResult<&PackageIndex> {
        if self.nocache || self.session.get().is_none() {
            let merged = self.fetch_all().await?;
            self.session.store(merged);
        }
        self.session
            .get()
            .ok_or_else(|| OctpkgError::Package("Index cache is empty".to_string()))
    }

    /// Forget the in-process copy
    pub fn invalidate(&mut self) {
        self.session.invalidate();
    }

    async fn fetch_all(&self) -> OctpkgResult<PackageIndex> {
        if self.sources.is_empty() {
            return Err(OctpkgError::Config("No package indices configured".to_string()));
        }
        let mut indices = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            let content = self.fetch_document(&source.url).await?;
            let index = PackageIndex::from_json(source.kind, &content)?;
            tracing::debug!("Loaded index {} ({} packages)", source.url, index.list_names().len());
            indices.push(index);
        }
        PackageIndex::merge(indices)
    }

    /// Raw index document for `url`
    pub async fn fetch_document(&self, url: &str) -> OctpkgResult<String> {
        if let Some(path) = local_path(url) {
            return Ok(fs::read_to_string(&path)?);
        }

        let cache_path = self.cache.index_path(url);
        match self.download(url).await {
            Ok(content) => {
                if let Err(e) = self.cache.write(&cache_path, content.as_bytes()) {
                    tracing::warn!("Could not cache index {}: {}", url, e);
                }
                Ok(content)
            }
            Err(e) if !self.nocache && self.cache.exists(&cache_path) => {
                tracing::warn!("Fetching {} failed ({}); using cached copy", url, e);
                warn_if_stale(url, &cache_path);
                let bytes = self.cache.read(&cache_path)?;
                String::from_utf8(bytes)
                    .map_err(|e| OctpkgError::Package(format!("Corrupt cached index {}: {}", url, e)))
            }
            Err(e) => Err(e),
        }
    }

    async fn download(&self, url: &str) -> OctpkgResult<String> {
        println!("Fetching package index {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

/// Age of a cached file in whole days
pub fn cache_age_days(path: &Path) -> OctpkgResult<i64> {
    let modified: DateTime<Utc> = fs::metadata(path)?.modified()?.into();
    Ok((Utc::now() - modified).num_days())
}

/// Warn when the cached copy at `path` is older than `STALE_AFTER_DAYS`;
/// returns whether it was
fn warn_if_stale(url: &str, path: &Path) -> bool {
    match cache_age_days(path) {
        Ok(days) if days > STALE_AFTER_DAYS => {
            tracing::warn!("Cached index for {} is {} days old; run with network access to refresh", url, days);
            true
        }
        Ok(_) => false,
        Err(e) => {
            tracing::debug!("Cannot determine age of {}: {}", path.display(), e);
            false
        }
    }
}
