use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::ModelSpec;
use hf_hub::api::sync::{Api, ApiBuilder};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Fetches a complete repository snapshot into the local cache.
pub trait SnapshotFetcher {
    fn fetch(&self, repo_id: &str) -> Result<PathBuf>;
}

/// Snapshot fetcher backed by the hub's blocking client.
pub struct HubFetcher {
    api: Api,
}

impl HubFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = ApiBuilder::new()
            .with_cache_dir(config.cache_dir.clone())
            .with_progress(config.download.progress);
        if let Some(token) = &config.token {
            builder = builder.with_token(Some(token.clone()));
        }

        let api = builder
            .build()
            .map_err(|e| Error::DownloadFailed(format!("Failed to create hub client: {}", e)))?;

        Ok(Self { api })
    }
}

impl SnapshotFetcher for HubFetcher {
    fn fetch(&self, repo_id: &str) -> Result<PathBuf> {
        let repo = self.api.model(repo_id.to_string());

        let info = repo.info()?;
        if info.siblings.is_empty() {
            return Err(Error::DownloadFailed(format!(
                "Repository {} lists no files",
                repo_id
            )));
        }

        tracing::info!("Fetching {} files for {}", info.siblings.len(), repo_id);

        let mut snapshot_dir = None;
        for sibling in &info.siblings {
            // `get` returns the cached copy when the file is already present.
            let path = repo.get(&sibling.rfilename)?;
            tracing::debug!(repo_id = %repo_id, file = %sibling.rfilename, "cached");

            if snapshot_dir.is_none() {
                snapshot_dir = snapshot_root(&path, &sibling.rfilename);
            }
        }

        snapshot_dir.ok_or_else(|| Error::DownloadFailed("Invalid snapshot path".to_string()))
    }
}

/// Strip the repository-relative file path off a cached file's location.
fn snapshot_root(path: &Path, rfilename: &str) -> Option<PathBuf> {
    let depth = Path::new(rfilename).components().count();
    path.ancestors().nth(depth).map(Path::to_path_buf)
}

/// Fixed-delay retry ceiling: no backoff, no jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.download.max_attempts,
            delay: Duration::from_secs(config.download.retry_delay_secs),
        }
    }
}

pub struct ModelDownloader<F: SnapshotFetcher> {
    fetcher: F,
    retry: RetryPolicy,
}

impl ModelDownloader<HubFetcher> {
    pub fn new(config: &Config) -> Result<Self> {
        let fetcher = HubFetcher::new(config)?;
        Ok(Self::with_fetcher(fetcher, RetryPolicy::from_config(config)))
    }
}

impl<F: SnapshotFetcher> ModelDownloader<F> {
    pub fn with_fetcher(fetcher: F, retry: RetryPolicy) -> Self {
        Self { fetcher, retry }
    }

    pub fn pull(&self, repo_id: &str) -> Result<PathBuf> {
        self.pull_with_sleep(repo_id, std::thread::sleep)
    }

    /// Every error counts as retryable. Sleeps only between attempts, never
    /// after the last one.
    pub fn pull_with_sleep<S>(&self, repo_id: &str, mut sleep: S) -> Result<PathBuf>
    where
        S: FnMut(Duration),
    {
        let max_attempts = self.retry.max_attempts;
        if max_attempts == 0 {
            return Err(Error::ConfigError("max_attempts must be at least 1".to_string()));
        }

        let mut attempt = 1;
        loop {
            tracing::info!(
                "Downloading {} (attempt {}/{})...",
                repo_id,
                attempt,
                max_attempts
            );

            match self.fetcher.fetch(repo_id) {
                Ok(path) => {
                    tracing::info!("{} downloaded to {}", repo_id, path.display());
                    return Ok(path);
                }
                Err(e) if attempt < max_attempts => {
                    tracing::warn!(
                        repo_id = %repo_id,
                        attempt,
                        error = %e,
                        "Attempt {} failed, retrying in {:?}",
                        attempt,
                        self.retry.delay
                    );
                    sleep(self.retry.delay);
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(repo_id = %repo_id, attempt, error = %e, "Giving up");
                    return Err(Error::RetriesExhausted {
                        repo_id: repo_id.to_string(),
                        attempts: attempt,
                        last_error: e.to_string(),
                    });
                }
            }
        }
    }

    /// Pull every model in order, stopping at the first one that exhausts
    /// its attempts.
    pub fn pull_all(&self, models: &[ModelSpec]) -> Result<Vec<PathBuf>> {
        models.iter().map(|model| self.pull(&model.repo_id)).collect()
    }
}
