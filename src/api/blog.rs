//! Hatena Blog AtomPub client

use super::atom;
use crate::auth::Credentials;
use crate::config::HATENA_BLOG_URL;
use crate::error::{errors, HatenaResult, PublishPhase};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use tracing::{debug, info};

/// One blog entry as sent to the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogEntry {
    pub title: String,
    pub content: String,
    pub draft: bool,
}

/// Operations the publisher needs from the blog platform.
#[async_trait]
pub trait BlogApi: Send + Sync {
    /// Create a new entry. Returns the platform id when the response carries one.
    async fn create_entry(&self, credentials: &Credentials, entry: &BlogEntry)
        -> HatenaResult<Option<u64>>;

    /// Replace the entry's title, content and draft flag.
    async fn update_entry(
        &self,
        credentials: &Credentials,
        entry_id: u64,
        entry: &BlogEntry,
    ) -> HatenaResult<()>;

    /// HTML of the entry as currently published.
    async fn fetch_entry_html(&self, credentials: &Credentials, entry_id: u64)
        -> HatenaResult<String>;

    async fn delete_entry(&self, credentials: &Credentials, entry_id: u64) -> HatenaResult<()>;
}

pub struct BlogClient {
    client: Client,
    base_url: String,
    username: String,
    domain: String,
}

impl BlogClient {
    pub fn new(username: impl Into<String>, domain: impl Into<String>) -> Self {
        Self::with_base_url(HATENA_BLOG_URL, username, domain, None)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        username: impl Into<String>,
        domain: impl Into<String>,
        client: Option<Client>,
    ) -> Self {
        Self {
            client: client.unwrap_or_default(),
            base_url: base_url.into(),
            username: username.into(),
            domain: domain.into(),
        }
    }

    pub fn collection_url(&self) -> String {
        format!(
            "{}/{}/{}/atom/entry",
            self.base_url.trim_end_matches('/'),
            self.username,
            self.domain
        )
    }

    pub fn entry_url(&self, entry_id: u64) -> String {
        format!("{}/{}", self.collection_url(), entry_id)
    }

    async fn send(
        &self,
        credentials: &Credentials,
        method: Method,
        url: &str,
        body: Option<String>,
    ) -> HatenaResult<(StatusCode, String)> {
        let header = credentials
            .signer()
            .authorization_header(method.as_str(), url, &[])?;
        debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method, url)
            .header(AUTHORIZATION, header);
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, "application/xml; charset=utf-8")
                .body(body.into_bytes());
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!("Response status: {}", status);
        Ok((status, text))
    }

    fn entry_xml(&self, entry: &BlogEntry) -> String {
        atom::blog_entry_xml(&entry.title, &self.username, &entry.content, entry.draft)
    }
}

fn expect_status(
    status: StatusCode,
    expected: StatusCode,
    phase: PublishPhase,
    body: &str,
) -> HatenaResult<()> {
    if status == expected {
        Ok(())
    } else {
        Err(errors::publish_error(
            phase,
            body.trim().chars().take(200).collect::<String>(),
            Some(status.as_u16()),
        ))
    }
}

#[async_trait]
impl BlogApi for BlogClient {
    async fn create_entry(
        &self,
        credentials: &Credentials,
        entry: &BlogEntry,
    ) -> HatenaResult<Option<u64>> {
        let url = self.collection_url();
        let (status, body) = self
            .send(credentials, Method::POST, &url, Some(self.entry_xml(entry)))
            .await?;
        expect_status(status, StatusCode::CREATED, PublishPhase::UploadingHtml, &body)?;

        let entry_id = atom::edit_link(&body)
            .as_deref()
            .and_then(atom::entry_id_from_edit_link);
        info!("Created entry {:?}", entry_id);
        Ok(entry_id)
    }

    async fn update_entry(
        &self,
        credentials: &Credentials,
        entry_id: u64,
        entry: &BlogEntry,
    ) -> HatenaResult<()> {
        let url = self.entry_url(entry_id);
        let (status, body) = self
            .send(credentials, Method::PUT, &url, Some(self.entry_xml(entry)))
            .await?;
        expect_status(status, StatusCode::OK, PublishPhase::UpdatingHtml, &body)?;
        info!("Updated entry {}", entry_id);
        Ok(())
    }

    async fn fetch_entry_html(
        &self,
        credentials: &Credentials,
        entry_id: u64,
    ) -> HatenaResult<String> {
        let url = self.entry_url(entry_id);
        let (status, body) = self.send(credentials, Method::GET, &url, None).await?;
        expect_status(status, StatusCode::OK, PublishPhase::DownloadingHtml, &body)?;

        atom::element_text(&body, "hatena:formatted-content")
            .or_else(|| atom::element_text(&body, "content"))
            .ok_or_else(|| {
                errors::publish_error(
                    PublishPhase::DownloadingHtml,
                    "Response has no entry content",
                    Some(status.as_u16()),
                )
            })
    }

    async fn delete_entry(&self, credentials: &Credentials, entry_id: u64) -> HatenaResult<()> {
        let url = self.entry_url(entry_id);
        let (status, body) = self.send(credentials, Method::DELETE, &url, None).await?;
        expect_status(status, StatusCode::OK, PublishPhase::DeletingHtml, &body)?;
        info!("Deleted entry {}", entry_id);
        Ok(())
    }
}
