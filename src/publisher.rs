//! Publish, update and delete pipelines for a single blog entry
//!
//! Each pipeline is a fixed sequence of steps. A failing step aborts the
//! pipeline; steps that already succeeded are not undone.

use crate::api::{BlogApi, BlogEntry, ImageHost};
use crate::auth::Credentials;
use crate::convert::DocumentConverter;
use crate::error::{errors, HatenaResult};
use crate::images::{DeleteReport, ImageSync};
use crate::progress::ProgressMode;
use std::path::{Path, PathBuf};
use tracing::info;

/// What to publish and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub title: String,
    pub document: PathBuf,
    pub with_images: bool,
    /// `false` publishes as a draft.
    pub publish: bool,
}

pub struct EntryPublisher<'a> {
    converter: &'a dyn DocumentConverter,
    blog: &'a dyn BlogApi,
    host: &'a dyn ImageHost,
    images: &'a ImageSync,
    progress: ProgressMode,
}

impl<'a> EntryPublisher<'a> {
    pub fn new(
        converter: &'a dyn DocumentConverter,
        blog: &'a dyn BlogApi,
        host: &'a dyn ImageHost,
        images: &'a ImageSync,
    ) -> Self {
        Self {
            converter,
            blog,
            host,
            images,
            progress: ProgressMode::default(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressMode) -> Self {
        self.progress = progress;
        self
    }

    /// convert -> upload images (optional) -> create entry.
    /// Returns the new entry id when the platform reports one.
    pub async fn create(
        &self,
        request: &PublishRequest,
        credentials: &Credentials,
    ) -> HatenaResult<Option<u64>> {
        let html_path = self.convert(&request.document).await?;
        if request.with_images {
            self.upload_images(request, &html_path, credentials).await?;
        }

        let entry = self.entry(request, &html_path).await?;
        let spinner = self.progress.spinner("Uploading HTML...");
        let entry_id = self.blog.create_entry(credentials, &entry).await;
        spinner.finish_and_clear();
        let entry_id = entry_id?;

        info!("Published {:?} (draft: {})", request.title, entry.draft);
        Ok(entry_id)
    }

    /// convert -> delete old images, upload new ones (optional) -> replace entry.
    /// The report is empty when images are left alone.
    pub async fn update(
        &self,
        entry_id: u64,
        request: &PublishRequest,
        credentials: &Credentials,
    ) -> HatenaResult<DeleteReport> {
        let html_path = self.convert(&request.document).await?;
        let mut report = DeleteReport::default();
        if request.with_images {
            report = self
                .images
                .delete_all(entry_id, credentials, self.blog, self.host)
                .await?;
            self.upload_images(request, &html_path, credentials).await?;
        }

        let entry = self.entry(request, &html_path).await?;
        let spinner = self.progress.spinner("Updating HTML...");
        let result = self.blog.update_entry(credentials, entry_id, &entry).await;
        spinner.finish_and_clear();
        result?;

        info!("Updated entry {} (draft: {})", entry_id, entry.draft);
        Ok(report)
    }

    /// delete images (optional) -> delete entry.
    pub async fn delete(
        &self,
        entry_id: u64,
        with_images: bool,
        credentials: &Credentials,
    ) -> HatenaResult<DeleteReport> {
        let report = if with_images {
            self.images
                .delete_all(entry_id, credentials, self.blog, self.host)
                .await?
        } else {
            DeleteReport::default()
        };

        let spinner = self.progress.spinner("Deleting HTML...");
        let result = self.blog.delete_entry(credentials, entry_id).await;
        spinner.finish_and_clear();
        result?;

        Ok(report)
    }

    async fn convert(&self, document: &Path) -> HatenaResult<PathBuf> {
        let spinner = self.progress.spinner("Converting Markdown to HTML...");
        let result = self.converter.convert(document).await;
        spinner.finish_and_clear();
        result
    }

    /// Rewrites the HTML file in place with hosted image URLs.
    async fn upload_images(
        &self,
        request: &PublishRequest,
        html_path: &Path,
        credentials: &Credentials,
    ) -> HatenaResult<()> {
        let html = read_text(html_path).await?;
        let base_dir = request
            .document
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let rewritten = self
            .images
            .upload_all(&html, &request.title, &base_dir, credentials, self.host)
            .await?;
        tokio::fs::write(html_path, rewritten).await.map_err(|e| {
            errors::filesystem_error("Failed to write HTML", html_path.display().to_string(), e)
        })
    }

    async fn entry(&self, request: &PublishRequest, html_path: &Path) -> HatenaResult<BlogEntry> {
        Ok(BlogEntry {
            title: request.title.clone(),
            content: read_text(html_path).await?,
            draft: !request.publish,
        })
    }
}

async fn read_text(path: &Path) -> HatenaResult<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| errors::filesystem_error("Failed to read HTML", path.display().to_string(), e))
}
