use async_trait::async_trait;
use chrono::{Duration, Utc};
use hatena_cli::api::{BlogApi, BlogEntry, ImageHost};
use hatena_cli::auth::Credentials;
use hatena_cli::config_store::{DEFAULT_IMAGE_PATTERN, DEFAULT_IMAGE_REPLACE};
use hatena_cli::convert::{html_path, DocumentConverter};
use hatena_cli::error::{errors, HatenaResult, PublishPhase};
use hatena_cli::images::ImageSync;
use hatena_cli::publisher::{EntryPublisher, PublishRequest};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

type Log = Arc<Mutex<Vec<String>>>;

fn push(log: &Log, event: impl Into<String>) {
    log.lock().unwrap().push(event.into());
}

/// Writes a fixed HTML body next to the document.
struct StubConverter {
    html: String,
    log: Log,
}

#[async_trait]
impl DocumentConverter for StubConverter {
    async fn convert(&self, document: &Path) -> HatenaResult<PathBuf> {
        push(&self.log, "convert");
        let out = html_path(document);
        std::fs::write(&out, &self.html)?;
        Ok(out)
    }
}

struct StubBlog {
    live_html: String,
    log: Log,
    sent: Mutex<Vec<BlogEntry>>,
}

#[async_trait]
impl BlogApi for StubBlog {
    async fn create_entry(&self, _: &Credentials, entry: &BlogEntry) -> HatenaResult<Option<u64>> {
        push(&self.log, "create");
        self.sent.lock().unwrap().push(entry.clone());
        Ok(Some(99))
    }

    async fn update_entry(&self, _: &Credentials, id: u64, entry: &BlogEntry) -> HatenaResult<()> {
        push(&self.log, format!("update:{id}"));
        self.sent.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn fetch_entry_html(&self, _: &Credentials, id: u64) -> HatenaResult<String> {
        push(&self.log, format!("fetch:{id}"));
        Ok(self.live_html.clone())
    }

    async fn delete_entry(&self, _: &Credentials, id: u64) -> HatenaResult<()> {
        push(&self.log, format!("delete:{id}"));
        Ok(())
    }
}

struct StubHost {
    log: Log,
    fail_uploads: bool,
    fail_deletes: bool,
}

#[async_trait]
impl ImageHost for StubHost {
    async fn upload_image(&self, _: &Credentials, title: &str, image: &[u8]) -> HatenaResult<String> {
        let name = String::from_utf8_lossy(image).into_owned();
        push(&self.log, format!("upload:{name}"));
        if self.fail_uploads {
            return Err(errors::publish_error(PublishPhase::UploadingImages, "boom", Some(500)));
        }
        assert_eq!(title, "Hello");
        Ok(format!("https://cdn.example/fotolife/{name}"))
    }

    async fn delete_image(&self, _: &Credentials, image_id: &str) -> HatenaResult<()> {
        push(&self.log, format!("delete_image:{image_id}"));
        if self.fail_deletes {
            return Err(errors::publish_error(PublishPhase::DeletingImages, "boom", Some(500)));
        }
        Ok(())
    }
}

struct Fixture {
    _dir: TempDir,
    document: PathBuf,
    log: Log,
    converter: StubConverter,
    blog: StubBlog,
    host: StubHost,
    images: ImageSync,
}

impl Fixture {
    fn new(html: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let document = dir.path().join("post.md");
        std::fs::write(&document, "# Hello").unwrap();
        std::fs::write(dir.path().join("one.png"), "one").unwrap();
        std::fs::write(dir.path().join("two.png"), "two").unwrap();

        let log: Log = Arc::default();
        Self {
            document,
            converter: StubConverter {
                html: html.to_string(),
                log: log.clone(),
            },
            blog: StubBlog {
                live_html: r#"<img src="https://cdn.example/fotolife/20240101000000.png">"#.into(),
                log: log.clone(),
                sent: Mutex::default(),
            },
            host: StubHost {
                log: log.clone(),
                fail_uploads: false,
                fail_deletes: false,
            },
            images: ImageSync::new(DEFAULT_IMAGE_PATTERN, DEFAULT_IMAGE_REPLACE).unwrap(),
            log,
            _dir: dir,
        }
    }

    fn publisher(&self) -> EntryPublisher<'_> {
        EntryPublisher::new(&self.converter, &self.blog, &self.host, &self.images)
    }

    fn request(&self, with_images: bool, publish: bool) -> PublishRequest {
        PublishRequest {
            title: "Hello".into(),
            document: self.document.clone(),
            with_images,
            publish,
        }
    }

    fn events(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn sent(&self) -> Vec<BlogEntry> {
        self.blog.sent.lock().unwrap().clone()
    }
}

fn credentials() -> Credentials {
    Credentials {
        consumer_key: "ck".into(),
        consumer_secret: "cs".into(),
        access_token: "at".into(),
        access_secret: "as".into(),
        expires: Utc::now() + Duration::days(1),
    }
}

#[tokio::test]
async fn create_published_without_images() {
    let fx = Fixture::new("<p>hello</p>");
    let id = fx
        .publisher()
        .create(&fx.request(false, true), &credentials())
        .await
        .unwrap();

    assert_eq!(id, Some(99));
    assert_eq!(fx.events(), vec!["convert", "create"]);
    let sent = fx.sent();
    assert_eq!(sent.len(), 1);
    assert!(!sent[0].draft);
    assert_eq!(sent[0].content, "<p>hello</p>");
}

#[tokio::test]
async fn create_unpublished_is_a_draft() {
    let fx = Fixture::new("<p>hello</p>");
    fx.publisher()
        .create(&fx.request(false, false), &credentials())
        .await
        .unwrap();
    assert!(fx.sent()[0].draft);
}

#[tokio::test]
async fn create_with_images_rewrites_html_before_publishing() {
    let fx = Fixture::new(r#"<img src="one.png"><p>mid</p><img src="two.png">"#);
    fx.publisher()
        .create(&fx.request(true, true), &credentials())
        .await
        .unwrap();

    assert_eq!(fx.events(), vec!["convert", "upload:one", "upload:two", "create"]);
    let expected = r#"<img src="https://cdn.example/fotolife/one"><p>mid</p><img src="https://cdn.example/fotolife/two">"#;
    assert_eq!(fx.sent()[0].content, expected);
    // the sibling HTML file holds the rewritten content too
    assert_eq!(std::fs::read_to_string(html_path(&fx.document)).unwrap(), expected);
}

#[tokio::test]
async fn failed_image_upload_skips_publishing() {
    let mut fx = Fixture::new(r#"<img src="one.png"><img src="two.png">"#);
    fx.host.fail_uploads = true;

    let err = fx
        .publisher()
        .create(&fx.request(true, true), &credentials())
        .await
        .unwrap_err();

    assert_eq!(err.publish_phase(), Some(PublishPhase::UploadingImages));
    assert_eq!(fx.events(), vec!["convert", "upload:one"]);
    assert!(fx.sent().is_empty());
}

#[tokio::test]
async fn update_deletes_old_images_before_uploading_new_ones() {
    let fx = Fixture::new(r#"<img src="one.png">"#);
    fx.publisher()
        .update(7, &fx.request(true, false), &credentials())
        .await
        .unwrap();

    assert_eq!(
        fx.events(),
        vec![
            "convert",
            "fetch:7",
            "delete_image:20240101000000",
            "upload:one",
            "update:7"
        ]
    );
    assert!(fx.sent()[0].draft);
}

#[tokio::test]
async fn update_without_images_only_replaces_html() {
    let fx = Fixture::new(r#"<img src="one.png">"#);
    fx.publisher()
        .update(7, &fx.request(false, true), &credentials())
        .await
        .unwrap();

    assert_eq!(fx.events(), vec!["convert", "update:7"]);
    assert_eq!(fx.sent()[0].content, r#"<img src="one.png">"#);
}

#[tokio::test]
async fn delete_with_and_without_images() {
    let fx = Fixture::new("");
    let report = fx.publisher().delete(3, true, &credentials()).await.unwrap();
    assert_eq!(report.deleted, 1);
    assert_eq!(
        fx.events(),
        vec!["fetch:3", "delete_image:20240101000000", "delete:3"]
    );

    let fx = Fixture::new("");
    let report = fx.publisher().delete(3, false, &credentials()).await.unwrap();
    assert_eq!(fx.events(), vec!["delete:3"]);
    assert_eq!(report.deleted, 0);
}

#[tokio::test]
async fn failed_image_delete_keeps_the_entry() {
    let mut fx = Fixture::new("");
    fx.host.fail_deletes = true;

    let err = fx
        .publisher()
        .delete(3, true, &credentials())
        .await
        .unwrap_err();

    assert_eq!(err.publish_phase(), Some(PublishPhase::DeletingImages));
    assert_eq!(fx.events(), vec!["fetch:3", "delete_image:20240101000000"]);
}

#[tokio::test]
async fn failed_image_delete_skips_the_update() {
    let mut fx = Fixture::new(r#"<img src="one.png">"#);
    fx.host.fail_deletes = true;

    let err = fx
        .publisher()
        .update(7, &fx.request(true, true), &credentials())
        .await
        .unwrap_err();

    assert_eq!(err.publish_phase(), Some(PublishPhase::DeletingImages));
    assert_eq!(
        fx.events(),
        vec!["convert", "fetch:7", "delete_image:20240101000000"]
    );
    assert!(fx.sent().is_empty());
}
