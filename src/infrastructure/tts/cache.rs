use moka::future::Cache;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use uuid::Uuid;

use crate::domain::tts::{AudioFormat, CacheKey, ProviderError};

/// Content-addressed audio store for one provider.
///
/// Files live at `<root>/_cache/<namespace>/<key>.<ext>`. Producers write to a
/// staging file that is renamed into place, and concurrent requests for the
/// same key share a single production run.
pub struct AudioCache {
    namespace: String,
    dir: PathBuf,
    in_flight: Cache<String, PathBuf>,
}

impl AudioCache {
    pub fn new(root: impl AsRef<Path>, namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            dir: root.as_ref().join("_cache").join(namespace),
            in_flight: Cache::builder()
                .max_capacity(10_000)
                .time_to_idle(Duration::from_secs(30 * 60))
                .build(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &CacheKey, format: AudioFormat) -> PathBuf {
        self.dir.join(format!("{}.{}", key, format.extension()))
    }

    /// Cached artifact for `key`, if a non-empty one exists on disk
    pub async fn lookup(&self, key: &CacheKey, format: AudioFormat) -> Option<PathBuf> {
        let path = self.path_for(key, format);
        is_non_empty_file(&path).await.then_some(path)
    }

    /// Return the cached artifact or run `produce` to create it.
    ///
    /// `produce` receives the staging path it must write to. An empty or
    /// missing staging file counts as a failure.
    pub async fn get_or_produce<F, Fut>(
        &self,
        key: &CacheKey,
        format: AudioFormat,
        produce: F,
    ) -> Result<PathBuf, ProviderError>
    where
        F: FnOnce(PathBuf) -> Fut + Send,
        Fut: Future<Output = Result<(), ProviderError>> + Send,
    {
        if let Some(path) = self.lookup(key, format).await {
            tracing::debug!(provider = %self.namespace, key = %key, "TTS cache hit");
            return Ok(path);
        }

        // a remembered path whose file has since disappeared must be rebuilt
        self.in_flight.invalidate(key.as_str()).await;

        let target = self.path_for(key, format);
        let staging = self.dir.join(format!(
            ".{}.{}.partial.{}",
            key,
            Uuid::new_v4().simple(),
            format.extension()
        ));

        let init = async {
            if is_non_empty_file(&target).await {
                return Ok(target.clone());
            }

            fs::create_dir_all(&self.dir)
                .await
                .map_err(|e| ProviderError::io(&self.namespace, e))?;

            if let Err(err) = produce(staging.clone()).await {
                let _ = fs::remove_file(&staging).await;
                return Err(err);
            }

            if !is_non_empty_file(&staging).await {
                let _ = fs::remove_file(&staging).await;
                return Err(ProviderError::EmptyOutput {
                    provider: self.namespace.clone(),
                });
            }

            fs::rename(&staging, &target)
                .await
                .map_err(|e| ProviderError::io(&self.namespace, e))?;

            tracing::debug!(provider = %self.namespace, key = %key, "TTS result cached");
            Ok(target.clone())
        };

        self.in_flight
            .try_get_with(key.to_string(), init)
            .await
            .map_err(|err| (*err).clone())
    }
}

pub(crate) async fn is_non_empty_file(path: &Path) -> bool {
    fs::metadata(path)
        .await
        .map(|meta| meta.is_file() && meta.len() > 0)
        .unwrap_or(false)
}
