use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use async_trait::async_trait;
use url::Url;

use crate::compile::MANIFEST_FILE_NAME;
use crate::formats::{LessonDocument, LibraryItem, Manifest, Series};

/// Read access to compiled library artifacts.
#[async_trait]
pub trait LibrarySource: Send + Sync {
    async fn manifest(&self) -> anyhow::Result<Manifest>;

    /// `Ok(None)` when no lesson with this id exists.
    async fn lesson(&self, id: &str) -> anyhow::Result<Option<LessonDocument>>;
}

/// Lesson ids are file stems; anything that could leave the library is refused.
fn is_plain_id(id: &str) -> bool {
    !id.is_empty() && !id.contains(['/', '\\']) && id != "." && id != ".."
}

#[derive(Debug, Clone)]
pub struct DirLibrary {
    dir: PathBuf,
}

impl DirLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl LibrarySource for DirLibrary {
    async fn manifest(&self) -> anyhow::Result<Manifest> {
        let path = self.dir.join(MANIFEST_FILE_NAME);
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("read manifest: {}", path.display()))?;
        serde_json::from_slice(&bytes).with_context(|| format!("parse manifest: {}", path.display()))
    }

    async fn lesson(&self, id: &str) -> anyhow::Result<Option<LessonDocument>> {
        if !is_plain_id(id) {
            return Ok(None);
        }
        let path = self.dir.join(format!("{id}.json"));
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("read lesson: {}", path.display()));
            }
        };
        let doc = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse lesson: {}", path.display()))?;
        Ok(Some(doc))
    }
}

#[derive(Debug, Clone)]
pub struct HttpLibrary {
    base: Url,
    client: reqwest::Client,
}

impl HttpLibrary {
    pub fn new(base: &str) -> anyhow::Result<Self> {
        let mut base = Url::parse(base).with_context(|| format!("parse library url: {base}"))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            base,
            client: reqwest::Client::new(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        file_name: &str,
    ) -> anyhow::Result<Option<T>> {
        let url = self
            .base
            .join(file_name)
            .with_context(|| format!("build url for {file_name}"))?;
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("request {url}"))?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            anyhow::bail!("request {url} failed ({})", resp.status());
        }
        let value = resp
            .json()
            .await
            .with_context(|| format!("parse json from {url}"))?;
        Ok(Some(value))
    }
}

#[async_trait]
impl LibrarySource for HttpLibrary {
    async fn manifest(&self) -> anyhow::Result<Manifest> {
        self.get_json(MANIFEST_FILE_NAME)
            .await?
            .ok_or_else(|| anyhow::anyhow!("manifest not found under {}", self.base))
    }

    async fn lesson(&self, id: &str) -> anyhow::Result<Option<LessonDocument>> {
        if !is_plain_id(id) {
            return Ok(None);
        }
        self.get_json(&format!("{id}.json")).await
    }
}

/// Serves the built-in demo library whenever the wrapped source fails.
#[derive(Debug, Clone)]
pub struct WithDemoFallback<S> {
    inner: S,
}

impl<S> WithDemoFallback<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: LibrarySource> LibrarySource for WithDemoFallback<S> {
    async fn manifest(&self) -> anyhow::Result<Manifest> {
        match self.inner.manifest().await {
            Ok(manifest) => Ok(manifest),
            Err(err) => {
                tracing::warn!(error = ?err, "could not load manifest; using demo library");
                Ok(crate::demo::manifest())
            }
        }
    }

    async fn lesson(&self, id: &str) -> anyhow::Result<Option<LessonDocument>> {
        match self.inner.lesson(id).await {
            Ok(Some(doc)) => Ok(Some(doc)),
            Ok(None) => Ok(crate::demo::lesson(id)),
            Err(err) => {
                tracing::warn!(lesson = %id, error = ?err, "could not load lesson; using demo library");
                Ok(crate::demo::lesson(id))
            }
        }
    }
}

/// `location` is an http(s) base URL or a directory path.
pub fn open_source(location: &str, strict: bool) -> anyhow::Result<Arc<dyn LibrarySource>> {
    let is_url = location.starts_with("http://") || location.starts_with("https://");
    let source: Arc<dyn LibrarySource> = match (is_url, strict) {
        (true, true) => Arc::new(HttpLibrary::new(location)?),
        (true, false) => Arc::new(WithDemoFallback::new(HttpLibrary::new(location)?)),
        (false, true) => Arc::new(DirLibrary::new(location)),
        (false, false) => Arc::new(WithDemoFallback::new(DirLibrary::new(location))),
    };
    Ok(source)
}

/// Finds a series by id in the root catalog.
pub fn find_series<'a>(manifest: &'a [LibraryItem], series_id: &str) -> Option<&'a Series> {
    manifest.iter().find_map(|item| match item {
        LibraryItem::Series(series) if series.id == series_id => Some(series),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::Segment;
    use crate::json_file::write_json_atomic;

    #[tokio::test]
    async fn dir_library_reads_compiled_artifacts() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let doc = LessonDocument::new(
            "solo".to_owned(),
            "solo".to_owned(),
            None,
            vec![Segment {
                id: 1,
                primary: "Hi.".to_owned(),
                secondary: "嗨。".to_owned(),
            }],
        );
        write_json_atomic(&temp.path().join("solo.json"), &doc)?;
        write_json_atomic(
            &temp.path().join(MANIFEST_FILE_NAME),
            &vec![LibraryItem::Book(doc.lesson.clone())],
        )?;

        let library = DirLibrary::new(temp.path());
        assert_eq!(library.manifest().await?.len(), 1);
        assert_eq!(library.lesson("solo").await?, Some(doc));
        assert_eq!(library.lesson("absent").await?, None);
        assert_eq!(library.lesson("../solo").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn fallback_serves_demo_when_directory_is_missing() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let missing = temp.path().join("nothing-here");

        assert!(DirLibrary::new(&missing).manifest().await.is_err());

        let library = WithDemoFallback::new(DirLibrary::new(&missing));
        assert_eq!(library.manifest().await?, crate::demo::manifest());
        assert!(library.lesson("ep-001").await?.is_some());
        assert!(library.lesson("unknown").await?.is_none());
        Ok(())
    }

    #[test]
    fn find_series_matches_only_series_entries() {
        let manifest = crate::demo::manifest();
        assert!(find_series(&manifest, "series-english-pod").is_some());
        assert!(find_series(&manifest, "demo-steve-jobs").is_none());
    }
}
