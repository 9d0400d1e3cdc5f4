use anyhow::Context;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::domain::article::{is_valid_article_id, Article, ArticleSummary};

/// Article metadata keyed by article id
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    async fn save(&self, article: &Article) -> anyhow::Result<()>;

    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<Article>>;

    /// Newest first
    async fn list(&self) -> anyhow::Result<Vec<ArticleSummary>>;

    /// Returns `false` when there was nothing to delete
    async fn delete(&self, id: &str) -> anyhow::Result<bool>;
}

/// One pretty-printed JSON file per article
pub struct FileArticleRepository {
    dir: PathBuf,
}

impl FileArticleRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, id: &str) -> Option<PathBuf> {
        is_valid_article_id(id).then(|| self.dir.join(format!("{}.json", id)))
    }

    async fn read_article(path: &Path) -> anyhow::Result<Option<Article>> {
        match fs::read(path).await {
            Ok(bytes) => {
                let article = serde_json::from_slice(&bytes)
                    .with_context(|| format!("corrupt article file {}", path.display()))?;
                Ok(Some(article))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
        }
    }
}

#[async_trait]
impl ArticleRepository for FileArticleRepository {
    async fn save(&self, article: &Article) -> anyhow::Result<()> {
        let path = self
            .path_for(&article.id)
            .with_context(|| format!("invalid article id {:?}", article.id))?;
        fs::create_dir_all(&self.dir)
            .await
            .context("failed to create article directory")?;

        let json = serde_json::to_vec_pretty(article)?;
        let temp = self.dir.join(format!(".{}.{}.tmp", article.id, Uuid::new_v4().simple()));
        fs::write(&temp, json).await.context("failed to write article")?;
        fs::rename(&temp, &path).await.context("failed to publish article")?;

        tracing::debug!(article_id = %article.id, path = %path.display(), "Article saved");
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<Article>> {
        match self.path_for(id) {
            Some(path) => Self::read_article(&path).await,
            None => Ok(None),
        }
    }

    async fn list(&self) -> anyhow::Result<Vec<ArticleSummary>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).context("failed to list articles"),
        };

        let mut articles = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_json = path.extension().is_some_and(|ext| ext == "json");
            let is_hidden = entry.file_name().to_string_lossy().starts_with('.');
            if !is_json || is_hidden {
                continue;
            }

            match Self::read_article(&path).await {
                Ok(Some(article)) => articles.push(article),
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "Skipping unreadable article"),
            }
        }

        articles.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(articles.iter().map(ArticleSummary::from).collect())
    }

    async fn delete(&self, id: &str) -> anyhow::Result<bool> {
        let Some(path) = self.path_for(id) else {
            return Ok(false);
        };

        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).context("failed to delete article"),
        }
    }
}
