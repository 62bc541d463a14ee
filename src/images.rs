//! Image sync between entry HTML and Fotolife
//!
//! Upload runs in two phases: every match of the image pattern is collected
//! first, the referenced files are uploaded one by one in order of appearance,
//! and only then are the hosted URLs substituted into the HTML. Deletion
//! re-derives image ids from the entry's live HTML instead of tracking them
//! locally.

use crate::api::{BlogApi, ImageHost};
use crate::auth::Credentials;
use crate::config_store::ConfigStore;
use crate::error::{errors, HatenaResult};
use crate::progress::ProgressMode;
use regex::Regex;
use std::borrow::Cow;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const KEY_IMAGE_PATTERN: &str = "image:pattern";
pub const KEY_IMAGE_REPLACE: &str = "image:replace";

/// Placeholder in the replacement template that receives the hosted URL.
pub const URL_PLACEHOLDER: &str = r"\1";

/// One match of the image pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMatch {
    /// Byte range of the whole match in the scanned text.
    pub range: Range<usize>,
    /// First capture group, URL-decoded.
    pub reference: String,
}

/// Outcome of [`ImageSync::delete_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
    /// Images removed from the host.
    pub deleted: usize,
    /// References whose image id could not be derived; still on the host.
    pub skipped: Vec<String>,
}

pub struct ImageSync {
    pattern: Regex,
    replace: String,
    progress: ProgressMode,
}

impl ImageSync {
    pub fn new(pattern: &str, replace: impl Into<String>) -> HatenaResult<Self> {
        let regex = Regex::new(pattern).map_err(|e| {
            errors::validation_error(
                format!("Invalid image pattern: {e}"),
                Some(KEY_IMAGE_PATTERN.to_string()),
                Some(pattern.to_string()),
            )
        })?;
        if regex.captures_len() < 2 {
            return Err(errors::validation_error(
                "Image pattern must capture the image path in group 1",
                Some(KEY_IMAGE_PATTERN.to_string()),
                Some(pattern.to_string()),
            ));
        }
        Ok(Self {
            pattern: regex,
            replace: replace.into(),
            progress: ProgressMode::default(),
        })
    }

    pub fn from_config(store: &ConfigStore) -> HatenaResult<Self> {
        Self::new(
            &store.get_str(KEY_IMAGE_PATTERN)?,
            store.get_str(KEY_IMAGE_REPLACE)?,
        )
    }

    pub fn with_progress(mut self, progress: ProgressMode) -> Self {
        self.progress = progress;
        self
    }

    /// All matches in left-to-right order.
    pub fn collect_matches(&self, text: &str) -> Vec<ImageMatch> {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let reference = caps.get(1)?.as_str();
                Some(ImageMatch {
                    range: whole.range(),
                    reference: url_decode(reference).into_owned(),
                })
            })
            .collect()
    }

    /// Replacement text for one match.
    pub fn render_replacement(&self, hosted_url: &str) -> String {
        self.replace.replace(URL_PLACEHOLDER, hosted_url)
    }

    /// Substitute each match with the rendered template for its hosted URL.
    /// `hosted_urls[i]` belongs to `matches[i]`.
    pub fn apply_replacements(
        &self,
        html: &str,
        matches: &[ImageMatch],
        hosted_urls: &[String],
    ) -> String {
        let mut out = String::with_capacity(html.len());
        let mut last = 0;
        for (m, url) in matches.iter().zip(hosted_urls) {
            out.push_str(&html[last..m.range.start]);
            out.push_str(&self.render_replacement(url));
            last = m.range.end;
        }
        out.push_str(&html[last..]);
        out
    }

    /// Upload every local image referenced by `html` and return the HTML with
    /// references pointing at the hosted copies.
    ///
    /// Relative paths are resolved against `base_dir`, then against the
    /// working directory. The first failure aborts; images uploaded before it
    /// are left on the host.
    pub async fn upload_all(
        &self,
        html: &str,
        title: &str,
        base_dir: &Path,
        credentials: &Credentials,
        host: &dyn ImageHost,
    ) -> HatenaResult<String> {
        let matches = self.collect_matches(html);
        info!("Found {} image(s) to upload", matches.len());
        let cwd = std::env::current_dir().unwrap_or_default();

        let bar = self
            .progress
            .bar("Uploading images...", matches.len() as u64);
        let mut hosted_urls = Vec::with_capacity(matches.len());
        for m in &matches {
            let path = resolve_image_path(base_dir, &cwd, &m.reference);
            debug!("Uploading {}", path.display());
            let bytes = tokio::fs::read(&path).await.map_err(|e| {
                errors::filesystem_error("Failed to read image", path.display().to_string(), e)
            })?;

            let hosted = host.upload_image(credentials, title, &bytes).await;
            let hosted = match hosted {
                Ok(url) => url,
                Err(err) => {
                    bar.abandon();
                    return Err(err);
                }
            };
            hosted_urls.push(hosted);
            bar.inc(1);
        }
        bar.finish_and_clear();

        Ok(self.apply_replacements(html, &matches, &hosted_urls))
    }

    /// Delete every hosted image referenced by the entry's published HTML.
    /// The first failing delete aborts; no further deletes are issued.
    pub async fn delete_all(
        &self,
        entry_id: u64,
        credentials: &Credentials,
        blog: &dyn BlogApi,
        host: &dyn ImageHost,
    ) -> HatenaResult<DeleteReport> {
        let html = blog.fetch_entry_html(credentials, entry_id).await?;
        let html = url_decode(&html);

        let mut report = DeleteReport::default();
        let mut ids = Vec::new();
        for m in self.collect_matches(&html) {
            match image_id_from_url(&m.reference) {
                Some(id) => ids.push(id),
                None => {
                    warn!("Cannot derive an image id from {:?}", m.reference);
                    report.skipped.push(m.reference);
                }
            }
        }
        info!("Found {} image(s) to delete in entry {}", ids.len(), entry_id);

        let bar = self.progress.bar("Deleting images...", ids.len() as u64);
        for id in &ids {
            if let Err(err) = host.delete_image(credentials, id).await {
                bar.abandon();
                return Err(err);
            }
            report.deleted += 1;
            bar.inc(1);
        }
        bar.finish_and_clear();

        Ok(report)
    }
}

fn url_decode(text: &str) -> Cow<'_, str> {
    urlencoding::decode(text).unwrap_or(Cow::Borrowed(text))
}

/// Absolute paths as is; relative ones against the document directory, or
/// against `cwd` when only that copy exists.
fn resolve_image_path(base_dir: &Path, cwd: &Path, reference: &str) -> PathBuf {
    let path = Path::new(reference);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let beside_document = base_dir.join(path);
    if beside_document.exists() {
        return beside_document;
    }
    let from_cwd = cwd.join(path);
    if from_cwd.exists() {
        debug!("{} not next to the document, using {}", reference, from_cwd.display());
        return from_cwd;
    }
    beside_document
}

/// Fotolife image id: the basename of the image URL without its extension.
/// Host, query string and fragment are ignored.
pub fn image_id_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let basename = path.rsplit('/').next().unwrap_or(path);
    let stem = match basename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => basename,
    };
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}
