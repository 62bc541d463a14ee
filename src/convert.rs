//! Document to HTML conversion through an external pandoc process

use crate::error::{errors, HatenaResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// Turns a source document into an HTML file and returns that file's path.
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    async fn convert(&self, document: &Path) -> HatenaResult<PathBuf>;
}

/// The HTML sibling of a document: `post.md` -> `post.html`.
pub fn html_path(document: &Path) -> PathBuf {
    document.with_extension("html")
}

pub struct PandocConverter {
    pandoc: String,
    template: PathBuf,
}

impl PandocConverter {
    pub fn new(pandoc: impl Into<String>, template: impl Into<PathBuf>) -> Self {
        Self {
            pandoc: pandoc.into(),
            template: template.into(),
        }
    }

    /// Arguments passed after the pandoc executable.
    pub fn args(&self, document: &Path, output: &Path) -> Vec<String> {
        vec![
            "--quiet".to_string(),
            "--standalone".to_string(),
            "--template".to_string(),
            self.template.display().to_string(),
            "--output".to_string(),
            output.display().to_string(),
            document.display().to_string(),
        ]
    }
}

#[async_trait]
impl DocumentConverter for PandocConverter {
    async fn convert(&self, document: &Path) -> HatenaResult<PathBuf> {
        if !document.is_file() {
            return Err(errors::filesystem_error(
                "Source document not found",
                document.display().to_string(),
                std::io::Error::from(std::io::ErrorKind::NotFound),
            ));
        }

        let output = html_path(document);
        let args = self.args(document, &output);
        debug!("Running {} {}", self.pandoc, args.join(" "));

        let result = Command::new(&self.pandoc)
            .args(&args)
            .output()
            .await
            .map_err(|e| {
                errors::process_error(
                    format!("Failed to start converter: {e}"),
                    &self.pandoc,
                    None,
                )
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(errors::process_error(
                format!("Converter failed: {}", stderr.trim()),
                &self.pandoc,
                result.status.code(),
            ));
        }

        info!("Converted {} to {}", document.display(), output.display());
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use tempfile::TempDir;

    #[test]
    fn html_path_replaces_extension() {
        assert_eq!(html_path(Path::new("posts/a.md")), PathBuf::from("posts/a.html"));
        assert_eq!(html_path(Path::new("notes")), PathBuf::from("notes.html"));
    }

    #[test]
    fn builds_pandoc_command_line() {
        let converter = PandocConverter::new("pandoc", "/cfg/template.html");
        let args = converter.args(Path::new("/d/post.md"), Path::new("/d/post.html"));
        assert_eq!(
            args,
            vec![
                "--quiet",
                "--standalone",
                "--template",
                "/cfg/template.html",
                "--output",
                "/d/post.html",
                "/d/post.md"
            ]
        );
    }

    #[tokio::test]
    async fn missing_document_is_a_filesystem_error() {
        let dir = TempDir::new().unwrap();
        let converter = PandocConverter::new("pandoc", dir.path().join("template.html"));
        let err = converter
            .convert(&dir.path().join("missing.md"))
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Filesystem);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_is_a_process_error() {
        let dir = TempDir::new().unwrap();
        let doc = dir.path().join("post.md");
        std::fs::write(&doc, "# hi").unwrap();

        let converter = PandocConverter::new("false", dir.path().join("template.html"));
        let err = converter.convert(&doc).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Process);
    }
}
